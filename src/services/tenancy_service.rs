// src/services/tenancy_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::TenancyRepository,
    middleware::tenancy::ActorContext,
    models::tenancy::{Branch, MemberRole, Tenant},
};

#[derive(Clone)]
pub struct TenancyService {
    tenancy_repo: TenancyRepository,
    pool: PgPool,
}

impl TenancyService {
    pub fn new(tenancy_repo: TenancyRepository, pool: PgPool) -> Self {
        Self { tenancy_repo, pool }
    }

    // Criar o tenant E tornar o criador admin é uma operação só: se o vínculo
    // falhar, o tenant órfão não pode ficar para trás.
    pub async fn create_tenant_and_assign_owner(
        &self,
        name: &str,
        description: Option<&str>,
        owner_id: Uuid,
    ) -> Result<Tenant, AppError> {
        let mut tx = self.pool.begin().await?;

        let tenant = self
            .tenancy_repo
            .create_tenant(&mut *tx, name, description)
            .await?;

        self.tenancy_repo
            .add_member(
                &mut *tx,
                owner_id,
                tenant.id,
                MemberRole::TenantAdmin,
                None,
            )
            .await?;

        tx.commit().await?;
        Ok(tenant)
    }

    pub async fn create_branch(
        &self,
        actor: &ActorContext,
        name: &str,
    ) -> Result<Branch, AppError> {
        self.tenancy_repo
            .create_branch(&self.pool, actor.tenant_id, name)
            .await
    }
}
