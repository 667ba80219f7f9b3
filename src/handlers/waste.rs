// src/handlers/waste.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError, config::AppState, middleware::tenancy::ActorContext,
    models::waste::WasteCommand, services::approval_service::WasteOutcome,
};

// POST /api/waste
// Desperdício de insumo cru (item/lote) ou de produto acabado (receita).
// O segundo caso vira uma cascata: uma baixa FIFO por ingrediente, tudo ou
// nada.
#[utoipa::path(
    post,
    path = "/api/waste",
    tag = "Waste",
    request_body = WasteCommand,
    responses(
        (status = 200, description = "Desperdício aplicado ou enfileirado", body = WasteOutcome),
        (status = 404, description = "Item, lote ou receita não encontrado"),
        (status = 422, description = "Estoque insuficiente (cascata rejeitada por inteiro)")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID do estabelecimento")
    ),
    security(("api_jwt" = []))
)]
pub async fn log_waste(
    State(app_state): State<AppState>,
    actor: ActorContext,
    Json(payload): Json<WasteCommand>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    // Consistência entre kind e alvo (fora do alcance do derive).
    payload.validate_target().map_err(|e| {
        let mut errors = validator::ValidationErrors::new();
        errors.add("kind", e);
        AppError::ValidationError(errors)
    })?;

    let outcome = app_state.approval_service.submit_waste(&actor, payload).await?;

    Ok((StatusCode::OK, Json(outcome)))
}
