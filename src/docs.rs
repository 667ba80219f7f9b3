// src/docs.rs

use crate::handlers;
use crate::models;
use crate::services;
use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,

        // --- Tenancy ---
        handlers::tenancy::create_tenant,
        handlers::tenancy::create_branch,

        // --- Inventory ---
        handlers::inventory::create_item,
        handlers::inventory::get_all_items,
        handlers::inventory::receive_batch,
        handlers::inventory::get_snapshot,
        handlers::inventory::request_adjustment,

        // --- Waste ---
        handlers::waste::log_waste,

        // --- Approvals ---
        handlers::approvals::list_pending,
        handlers::approvals::resolve_approval,
    ),
    components(
        schemas(

            // --- Auth ---
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Tenancy ---
            models::tenancy::Tenant,
            models::tenancy::Branch,
            models::tenancy::MemberRole,
            handlers::tenancy::CreateTenantPayload,
            handlers::tenancy::CreateBranchPayload,

            // --- Inventory ---
            models::inventory::InventoryItem,
            models::inventory::InventoryBatch,
            models::inventory::AdjustmentKind,
            models::inventory::RecordStatus,
            models::inventory::InventoryAdjustment,
            models::inventory::AdjustmentCommand,
            models::inventory::BatchDraw,
            models::inventory::StockSnapshot,
            handlers::inventory::CreateItemPayload,
            handlers::inventory::ReceiveBatchPayload,

            // --- Waste ---
            models::waste::WasteKind,
            models::waste::WasteEntry,
            models::waste::WasteCommand,

            // --- Approvals ---
            models::approvals::ApprovalType,
            models::approvals::ApprovalStatus,
            models::approvals::ApprovalPriority,
            models::approvals::ApprovalRequest,
            models::approvals::ApprovalDecision,
            handlers::approvals::ResolveApprovalPayload,
            services::approval_service::AdjustmentOutcome,
            services::approval_service::WasteOutcome,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Tenancy", description = "Gestão de Estabelecimentos e Filiais"),
        (name = "Inventory", description = "Itens, Lotes e Ajustes de Estoque"),
        (name = "Waste", description = "Registro de Desperdício (insumo e produto)"),
        (name = "Approvals", description = "Fila de Aprovação de Movimentações")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
