// src/handlers/tenancy.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, tenancy::RequireTenantAdmin},
    models::tenancy::{Branch, Tenant},
};

// ---
// Payload: CreateTenant
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTenantPayload {
    #[validate(length(min = 1, message = "O nome do estabelecimento é obrigatório."))]
    pub name: String,
    pub description: Option<String>,
}

// POST /api/tenants
#[utoipa::path(
    post,
    path = "/api/tenants",
    tag = "Tenancy",
    request_body = CreateTenantPayload,
    responses(
        (status = 201, description = "Estabelecimento criado", body = Tenant)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_tenant(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateTenantPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    // Quem cria o estabelecimento vira o admin dele.
    let new_tenant = app_state
        .tenancy_service
        .create_tenant_and_assign_owner(&payload.name, payload.description.as_deref(), user.0.id)
        .await?;

    Ok((StatusCode::CREATED, Json(new_tenant)))
}

// ---
// Payload: CreateBranch
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBranchPayload {
    #[validate(length(min = 1, message = "O nome da filial é obrigatório."))]
    pub name: String,
}

// POST /api/tenants/branches
#[utoipa::path(
    post,
    path = "/api/tenants/branches",
    tag = "Tenancy",
    request_body = CreateBranchPayload,
    responses(
        (status = 201, description = "Filial criada", body = Branch)
    ),
    params(
        ("x-tenant-id" = uuid::Uuid, Header, description = "ID do estabelecimento")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_branch(
    State(app_state): State<AppState>,
    RequireTenantAdmin(actor): RequireTenantAdmin,
    Json(payload): Json<CreateBranchPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let branch = app_state
        .tenancy_service
        .create_branch(&actor, &payload.name)
        .await?;

    Ok((StatusCode::CREATED, Json(branch)))
}
