// src/db/inventory_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::inventory::{
        AdjustmentKind, InventoryAdjustment, InventoryBatch, InventoryItem, RecordStatus,
    },
};

// O "Batch Store": a coleção autoritativa de lotes por item, mais os campos
// derivados do item e o histórico imutável de ajustes.
#[derive(Clone)]
pub struct InventoryRepository;

impl InventoryRepository {
    pub fn new() -> Self {
        Self
    }

    // ---
    // Itens
    // ---

    pub async fn create_item<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        branch_id: Uuid,
        name: &str,
        unit: &str,
        is_perishable: bool,
        min_stock: Decimal,
        max_stock: Option<Decimal>,
    ) -> Result<InventoryItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, InventoryItem>(
            r#"
            INSERT INTO inventory_items (tenant_id, branch_id, name, unit, is_perishable, min_stock, max_stock)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(branch_id)
        .bind(name)
        .bind(unit)
        .bind(is_perishable)
        .bind(min_stock)
        .bind(max_stock)
        .fetch_one(executor)
        .await?;
        Ok(item)
    }

    pub async fn get_all_items<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<Vec<InventoryItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, InventoryItem>(
            "SELECT * FROM inventory_items WHERE tenant_id = $1 AND is_active ORDER BY name ASC",
        )
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    pub async fn find_item<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        item_id: Uuid,
    ) -> Result<Option<InventoryItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, InventoryItem>(
            "SELECT * FROM inventory_items WHERE id = $1 AND tenant_id = $2",
        )
        .bind(item_id)
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;
        Ok(item)
    }

    // Trava a linha do item (FOR UPDATE). Toda operação que muda estoque passa
    // por aqui primeiro: duas baixas concorrentes no mesmo item serializam na
    // trava em vez de lerem o mesmo remaining_quantity (lost update).
    pub async fn lock_item<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        item_id: Uuid,
    ) -> Result<Option<InventoryItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, InventoryItem>(
            "SELECT * FROM inventory_items WHERE id = $1 AND tenant_id = $2 FOR UPDATE",
        )
        .bind(item_id)
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;
        Ok(item)
    }

    // Aplica o delta de estoque e, quando fornecidos, os novos custos.
    // average_cost = NULL preserva o valor atual (política do custo médio
    // quando o estoque zera).
    pub async fn update_item_stock<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        item_id: Uuid,
        quantity_delta: Decimal,
        new_average_cost: Option<Decimal>,
        new_last_cost: Option<Decimal>,
    ) -> Result<InventoryItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, InventoryItem>(
            r#"
            UPDATE inventory_items SET
                current_stock = current_stock + $3,
                average_cost = COALESCE($4, average_cost),
                last_cost = COALESCE($5, last_cost),
                updated_at = now()
            WHERE id = $1 AND tenant_id = $2
            RETURNING *
            "#,
        )
        .bind(item_id)
        .bind(tenant_id)
        .bind(quantity_delta)
        .bind(new_average_cost)
        .bind(new_last_cost)
        .fetch_one(executor)
        .await?;
        Ok(item)
    }

    // ---
    // Lotes
    // ---

    pub async fn insert_batch<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        item_id: Uuid,
        batch_number: &str,
        quantity: Decimal,
        unit_cost: Decimal,
        expiry_date: Option<NaiveDate>,
    ) -> Result<InventoryBatch, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let batch = sqlx::query_as::<_, InventoryBatch>(
            r#"
            INSERT INTO inventory_batches
                (tenant_id, item_id, batch_number, original_quantity, unit_cost, total_cost, remaining_quantity, expiry_date)
            VALUES ($1, $2, $3, $4, $5, $4 * $5, $4, $6)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(item_id)
        .bind(batch_number)
        .bind(quantity)
        .bind(unit_cost)
        .bind(expiry_date)
        .fetch_one(executor)
        .await?;
        Ok(batch)
    }

    // Só lotes com saldo. Lotes zerados ficam na tabela (auditoria) mas nunca
    // aparecem aqui. A ordem de consumo é decidida no serviço, a partir de
    // received_at/expiry_date.
    pub async fn list_open_batches<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        item_id: Uuid,
    ) -> Result<Vec<InventoryBatch>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let batches = sqlx::query_as::<_, InventoryBatch>(
            r#"
            SELECT * FROM inventory_batches
            WHERE item_id = $1 AND tenant_id = $2 AND remaining_quantity > 0
            ORDER BY received_at ASC, id ASC
            "#,
        )
        .bind(item_id)
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
        Ok(batches)
    }

    pub async fn find_batch<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        batch_id: Uuid,
    ) -> Result<Option<InventoryBatch>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let batch = sqlx::query_as::<_, InventoryBatch>(
            "SELECT * FROM inventory_batches WHERE id = $1 AND tenant_id = $2",
        )
        .bind(batch_id)
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;
        Ok(batch)
    }

    // Drena `amount` de um lote. O predicado `remaining_quantity >= $3` é a
    // última linha de defesa contra over-drain: se nenhuma linha for afetada,
    // o saldo não bastava e nada foi mutado.
    pub async fn drain_batch<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        batch_id: Uuid,
        amount: Decimal,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE inventory_batches SET
                remaining_quantity = remaining_quantity - $3,
                updated_at = now()
            WHERE id = $1 AND tenant_id = $2 AND remaining_quantity >= $3
            "#,
        )
        .bind(batch_id)
        .bind(tenant_id)
        .bind(amount)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::InvalidAmount);
        }
        Ok(())
    }

    // ---
    // Ajustes (histórico imutável)
    // ---

    pub async fn insert_adjustment<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        item_id: Uuid,
        quantity_change: Decimal,
        kind: AdjustmentKind,
        reason: &str,
        status: RecordStatus,
        approval_request_id: Option<Uuid>,
        requested_by: Uuid,
    ) -> Result<InventoryAdjustment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let adjustment = sqlx::query_as::<_, InventoryAdjustment>(
            r#"
            INSERT INTO inventory_adjustments
                (tenant_id, item_id, quantity_change, kind, reason, status, approval_request_id, requested_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(item_id)
        .bind(quantity_change)
        .bind(kind)
        .bind(reason)
        .bind(status)
        .bind(approval_request_id)
        .bind(requested_by)
        .fetch_one(executor)
        .await?;
        Ok(adjustment)
    }

    // Única transição permitida: PENDING -> APPROVED, exatamente uma vez.
    pub async fn approve_adjustment<'e, E>(
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
            UPDATE inventory_adjustments SET status = 'APPROVED'
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
