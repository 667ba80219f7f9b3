// src/db/approval_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::approvals::{ApprovalPriority, ApprovalRequest, ApprovalStatus, ApprovalType},
};

#[derive(Clone)]
pub struct ApprovalRepository;

impl ApprovalRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn insert_request<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        request_type: ApprovalType,
        payload: serde_json::Value,
        priority: ApprovalPriority,
        requested_by: Uuid,
    ) -> Result<ApprovalRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, ApprovalRequest>(
            r#"
            INSERT INTO approval_requests (tenant_id, request_type, payload, priority, requested_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(request_type)
        .bind(payload)
        .bind(priority)
        .bind(requested_by)
        .fetch_one(executor)
        .await?;
        Ok(request)
    }

    pub async fn list_pending<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<Vec<ApprovalRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let requests = sqlx::query_as::<_, ApprovalRequest>(
            r#"
            SELECT * FROM approval_requests
            WHERE tenant_id = $1 AND status = 'PENDING'
            ORDER BY priority DESC, created_at ASC
            "#,
        )
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
        Ok(requests)
    }

    // Trava a linha do pedido: duas resoluções concorrentes serializam aqui,
    // e a segunda enxerga o status já resolvido (AlreadyResolved).
    pub async fn lock_request<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        approval_id: Uuid,
    ) -> Result<Option<ApprovalRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, ApprovalRequest>(
            "SELECT * FROM approval_requests WHERE id = $1 AND tenant_id = $2 FOR UPDATE",
        )
        .bind(approval_id)
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;
        Ok(request)
    }

    pub async fn mark_resolved<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        approval_id: Uuid,
        status: ApprovalStatus,
        resolved_by: Uuid,
    ) -> Result<ApprovalRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, ApprovalRequest>(
            r#"
            UPDATE approval_requests SET
                status = $3,
                resolved_by = $4,
                resolved_at = now()
            WHERE id = $1 AND tenant_id = $2
            RETURNING *
            "#,
        )
        .bind(approval_id)
        .bind(tenant_id)
        .bind(status)
        .bind(resolved_by)
        .fetch_one(executor)
        .await?;
        Ok(request)
    }
}
