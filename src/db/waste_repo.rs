// src/db/waste_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        inventory::RecordStatus,
        waste::{WasteEntry, WasteKind},
    },
};

#[derive(Clone)]
pub struct WasteRepository;

impl WasteRepository {
    pub fn new() -> Self {
        Self
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn insert_entry<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        kind: WasteKind,
        item_id: Option<Uuid>,
        recipe_id: Option<Uuid>,
        batch_id: Option<Uuid>,
        quantity: Decimal,
        unit: &str,
        reason: &str,
        estimated_cost: Decimal,
        status: RecordStatus,
        approval_request_id: Option<Uuid>,
        reported_by: Uuid,
    ) -> Result<WasteEntry, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let entry = sqlx::query_as::<_, WasteEntry>(
            r#"
            INSERT INTO waste_entries
                (tenant_id, kind, item_id, recipe_id, batch_id, quantity, unit, reason,
                 estimated_cost, status, approval_request_id, reported_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(kind)
        .bind(item_id)
        .bind(recipe_id)
        .bind(batch_id)
        .bind(quantity)
        .bind(unit)
        .bind(reason)
        .bind(estimated_cost)
        .bind(status)
        .bind(approval_request_id)
        .bind(reported_by)
        .fetch_one(executor)
        .await?;
        Ok(entry)
    }

    // PENDING -> APPROVED, exatamente uma vez; nunca volta.
    pub async fn approve_entry<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        approval_request_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE waste_entries SET status = 'APPROVED'
            WHERE tenant_id = $1 AND approval_request_id = $2 AND status = 'PENDING'
            "#,
        )
        .bind(tenant_id)
        .bind(approval_request_id)
        .execute(executor)
        .await?;
        Ok(())
    }
}
