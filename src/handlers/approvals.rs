// src/handlers/approvals.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::tenancy::{ActorContext, RequireTenantAdmin},
    models::approvals::{ApprovalDecision, ApprovalRequest},
};

// GET /api/approvals
#[utoipa::path(
    get,
    path = "/api/approvals",
    tag = "Approvals",
    responses(
        (status = 200, description = "Pedidos pendentes (prioridade alta primeiro)", body = [ApprovalRequest])
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID do estabelecimento")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_pending(
    State(app_state): State<AppState>,
    actor: ActorContext,
) -> Result<impl IntoResponse, AppError> {
    let requests = app_state.approval_service.list_pending(&actor).await?;
    Ok((StatusCode::OK, Json(requests)))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResolveApprovalPayload {
    pub decision: ApprovalDecision,
}

// POST /api/approvals/{id}/resolve
// Só admins do tenant decidem. Aprovar reexecuta o pedido original; rejeitar
// descarta sem nunca tocar o estoque.
#[utoipa::path(
    post,
    path = "/api/approvals/{id}/resolve",
    tag = "Approvals",
    request_body = ResolveApprovalPayload,
    responses(
        (status = 200, description = "Pedido resolvido", body = ApprovalRequest),
        (status = 404, description = "Pedido não encontrado"),
        (status = 409, description = "Pedido já resolvido")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do pedido de aprovação"),
        ("x-tenant-id" = Uuid, Header, description = "ID do estabelecimento")
    ),
    security(("api_jwt" = []))
)]
pub async fn resolve_approval(
    State(app_state): State<AppState>,
    RequireTenantAdmin(actor): RequireTenantAdmin,
    Path(approval_id): Path<Uuid>,
    Json(payload): Json<ResolveApprovalPayload>,
) -> Result<impl IntoResponse, AppError> {
    let resolved = app_state
        .approval_service
        .resolve(&actor, approval_id, payload.decision)
        .await?;

    Ok((StatusCode::OK, Json(resolved)))
}
