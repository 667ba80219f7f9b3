// src/db/tenancy_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::tenancy::{Branch, MemberRole, Tenant, TenantMember},
};

#[derive(Clone)]
pub struct TenancyRepository;

impl TenancyRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn create_tenant<'e, E>(
        &self,
        executor: E,
        name: &str,
        description: Option<&str>,
    ) -> Result<Tenant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            INSERT INTO tenants (name, description)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(description)
        .fetch_one(executor)
        .await?;
        Ok(tenant)
    }

    pub async fn create_branch<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        name: &str,
    ) -> Result<Branch, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let branch = sqlx::query_as::<_, Branch>(
            r#"
            INSERT INTO branches (tenant_id, name)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(name)
        .fetch_one(executor)
        .await?;
        Ok(branch)
    }

    pub async fn add_member<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        tenant_id: Uuid,
        role: MemberRole,
        branch_id: Option<Uuid>,
    ) -> Result<TenantMember, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let member = sqlx::query_as::<_, TenantMember>(
            r#"
            INSERT INTO tenant_members (user_id, tenant_id, role, branch_id)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(tenant_id)
        .bind(role)
        .bind(branch_id)
        .fetch_one(executor)
        .await?;
        Ok(member)
    }

    pub async fn find_member<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Option<TenantMember>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let member = sqlx::query_as::<_, TenantMember>(
            "SELECT * FROM tenant_members WHERE user_id = $1 AND tenant_id = $2",
        )
        .bind(user_id)
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;
        Ok(member)
    }

    pub async fn find_branch<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        branch_id: Uuid,
    ) -> Result<Option<Branch>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let branch =
            sqlx::query_as::<_, Branch>("SELECT * FROM branches WHERE id = $1 AND tenant_id = $2")
                .bind(branch_id)
                .bind(tenant_id)
                .fetch_optional(executor)
                .await?;
        Ok(branch)
    }
}
