// src/middleware/tenancy.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{common::error::AppError, config::AppState, models::tenancy::MemberRole};

// O nome do nosso cabeçalho HTTP customizado
const TENANT_ID_HEADER: &str = "x-tenant-id";

// ---
// ActorContext: quem está agindo, em qual tenant, com qual papel
// ---
// É o contexto que o portão de aprovação consome para classificar pedidos
// (admin do tenant x gerente de filial).
#[derive(Debug, Clone)]
pub struct ActorContext {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub role: MemberRole,
    pub branch_id: Option<Uuid>,
}

impl ActorContext {
    pub fn is_tenant_admin(&self) -> bool {
        self.role == MemberRole::TenantAdmin
    }
}

// ---
// Middleware: autentica E resolve o vínculo usuário-tenant
// ---
// Rotas de estoque/desperdício/aprovação exigem os dois; por isso este guard
// já faz a autenticação (em vez de empilhar auth_guard + tenant_guard).
pub async fn tenant_guard(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = crate::middleware::auth::authenticate(&app_state, request.headers()).await?;

    let tenant_id = request
        .headers()
        .get(TENANT_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value).ok())
        .ok_or(AppError::InvalidToken)?;

    // Sem vínculo com o tenant = acesso negado (não vaza se o tenant existe).
    let member = app_state
        .tenancy_repo
        .find_member(&app_state.db_pool, user.id, tenant_id)
        .await?
        .ok_or(AppError::Forbidden)?;

    let actor = ActorContext {
        user_id: user.id,
        tenant_id,
        role: member.role,
        branch_id: member.branch_id,
    };

    request.extensions_mut().insert(user);
    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}

// Extrator do contexto do ator (exige que tenant_guard tenha rodado antes)
impl<S> FromRequestParts<S> for ActorContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<ActorContext>()
            .cloned()
            .ok_or(AppError::InvalidToken)
    }
}

// ---
// Guardião: só admins do tenant passam
// ---
// Usado na rota de resolução de aprovações.
pub struct RequireTenantAdmin(pub ActorContext);

impl<S> FromRequestParts<S> for RequireTenantAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let actor = ActorContext::from_request_parts(parts, state).await?;
        if !actor.is_tenant_admin() {
            return Err(AppError::Forbidden);
        }
        Ok(RequireTenantAdmin(actor))
    }
}
