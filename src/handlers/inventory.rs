// src/handlers/inventory.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::tenancy::ActorContext,
    models::inventory::{AdjustmentCommand, InventoryBatch, InventoryItem, StockSnapshot},
    services::approval_service::AdjustmentOutcome,
};

// ---
// Validações customizadas para Decimal
// ---
fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

fn validate_positive(val: &Decimal) -> Result<(), ValidationError> {
    if *val <= Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.message = Some("O valor deve ser maior que zero.".into());
        return Err(err);
    }
    Ok(())
}

// ---
// Payload: CreateItem
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemPayload {
    pub branch_id: Uuid,

    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,

    #[validate(length(min = 1, message = "A unidade de medida é obrigatória."))]
    #[schema(example = "kg")]
    pub unit: String,

    #[serde(default)]
    pub is_perishable: bool,

    #[validate(custom(function = validate_not_negative))]
    #[serde(default)]
    pub min_stock: Decimal,

    pub max_stock: Option<Decimal>,
}

// POST /api/inventory/items
#[utoipa::path(
    post,
    path = "/api/inventory/items",
    tag = "Inventory",
    request_body = CreateItemPayload,
    responses(
        (status = 201, description = "Item criado", body = InventoryItem)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID do estabelecimento")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_item(
    State(app_state): State<AppState>,
    actor: ActorContext,
    Json(payload): Json<CreateItemPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let new_item = app_state
        .inventory_service
        .create_item(
            &actor,
            payload.branch_id,
            &payload.name,
            &payload.unit,
            payload.is_perishable,
            payload.min_stock,
            payload.max_stock,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(new_item)))
}

// GET /api/inventory/items
#[utoipa::path(
    get,
    path = "/api/inventory/items",
    tag = "Inventory",
    responses(
        (status = 200, description = "Itens do estabelecimento", body = [InventoryItem])
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID do estabelecimento")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_all_items(
    State(app_state): State<AppState>,
    actor: ActorContext,
) -> Result<impl IntoResponse, AppError> {
    let items = app_state.inventory_service.get_all_items(&actor).await?;
    Ok((StatusCode::OK, Json(items)))
}

// ---
// Payload: ReceiveBatch
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveBatchPayload {
    #[validate(custom(function = validate_positive))]
    pub quantity: Decimal,

    #[validate(custom(function = validate_not_negative))]
    pub unit_cost: Decimal,

    #[validate(length(min = 1, message = "O número do lote é obrigatório."))]
    #[schema(example = "NF-20260815-03")]
    pub batch_number: String,

    pub expiry_date: Option<NaiveDate>,
}

// POST /api/inventory/items/{id}/receive
#[utoipa::path(
    post,
    path = "/api/inventory/items/{id}/receive",
    tag = "Inventory",
    request_body = ReceiveBatchPayload,
    responses(
        (status = 201, description = "Lote recebido", body = InventoryBatch),
        (status = 404, description = "Item não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do item"),
        ("x-tenant-id" = Uuid, Header, description = "ID do estabelecimento")
    ),
    security(("api_jwt" = []))
)]
pub async fn receive_batch(
    State(app_state): State<AppState>,
    actor: ActorContext,
    Path(item_id): Path<Uuid>,
    Json(payload): Json<ReceiveBatchPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let batch = app_state
        .inventory_service
        .receive_batch(
            &actor,
            item_id,
            payload.quantity,
            payload.unit_cost,
            &payload.batch_number,
            payload.expiry_date,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(batch)))
}

// GET /api/inventory/items/{id}/snapshot
#[utoipa::path(
    get,
    path = "/api/inventory/items/{id}/snapshot",
    tag = "Inventory",
    responses(
        (status = 200, description = "Estoque atual, custos e lotes abertos em ordem de consumo", body = StockSnapshot),
        (status = 404, description = "Item não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do item"),
        ("x-tenant-id" = Uuid, Header, description = "ID do estabelecimento")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_snapshot(
    State(app_state): State<AppState>,
    actor: ActorContext,
    Path(item_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let snapshot = app_state
        .inventory_service
        .get_snapshot(&actor, item_id)
        .await?;
    Ok((StatusCode::OK, Json(snapshot)))
}

// POST /api/inventory/adjustments
// O portão de aprovação decide: aplica na hora ou enfileira.
#[utoipa::path(
    post,
    path = "/api/inventory/adjustments",
    tag = "Inventory",
    request_body = AdjustmentCommand,
    responses(
        (status = 200, description = "Ajuste aplicado ou enfileirado", body = AdjustmentOutcome),
        (status = 422, description = "Estoque insuficiente ou quantidade inválida")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID do estabelecimento")
    ),
    security(("api_jwt" = []))
)]
pub async fn request_adjustment(
    State(app_state): State<AppState>,
    actor: ActorContext,
    Json(payload): Json<AdjustmentCommand>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let outcome = app_state
        .approval_service
        .submit_adjustment(&actor, payload)
        .await?;

    Ok((StatusCode::OK, Json(outcome)))
}
