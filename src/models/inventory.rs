// src/models/inventory.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// ---
// 1. Item de Estoque
// ---
// current_stock, average_cost e last_cost são campos derivados ("cache"),
// mantidos em sincronia pelo motor de baixa dentro da mesma transação.
// Invariante: current_stock == soma de remaining_quantity dos lotes do item.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub branch_id: Uuid,
    #[schema(example = "Filé de salmão")]
    pub name: String,
    #[schema(example = "kg")]
    pub unit: String,
    pub is_perishable: bool,
    pub min_stock: Decimal,
    pub max_stock: Option<Decimal>,
    pub current_stock: Decimal,
    pub average_cost: Decimal,
    pub last_cost: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---
// 2. Lote (Batch)
// ---
// Criado no recebimento; remaining_quantity só diminui. Lotes zerados são
// "aposentados" (ficam para auditoria) mas saem das listagens de consumo.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryBatch {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub item_id: Uuid,
    #[schema(example = "NF-20260815-03")]
    pub batch_number: String,
    pub original_quantity: Decimal,
    pub unit_cost: Decimal,
    pub total_cost: Decimal,
    pub remaining_quantity: Decimal,
    pub received_at: DateTime<Utc>,
    pub expiry_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---
// 3. Motivo do ajuste
// ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "adjustment_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjustmentKind {
    Received,
    Sold,
    Waste,
    Transfer,
    Count,
    Damaged,
    Theft,
    Other,
}

// ---
// 4. Status de registros gated pelo portão de aprovação
// ---
// PENDING -> APPROVED acontece no máximo uma vez, nunca volta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "record_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordStatus {
    Pending,
    Approved,
}

// ---
// 5. Ajuste de Estoque (Histórico imutável)
// ---
// UM registro por evento lógico (efeito líquido), não um por lote drenado.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryAdjustment {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub item_id: Uuid,
    #[schema(example = "-2.5")]
    pub quantity_change: Decimal,
    pub kind: AdjustmentKind,
    pub reason: String,
    pub status: RecordStatus,
    pub approval_request_id: Option<Uuid>,
    pub requested_by: Uuid,
    pub created_at: DateTime<Utc>,
}

// ---
// 6. Comando de ajuste (também é o payload serializado na fila de aprovação)
// ---
// quantity_change é assinado: negativo = baixa FIFO, positivo = entrada
// (correção de contagem), que vira um lote sintético ao custo médio atual.
#[derive(Debug, Clone, Serialize, Deserialize, validator::Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentCommand {
    pub item_id: Uuid,
    pub kind: AdjustmentKind,
    #[validate(custom(function = validate_nonzero))]
    #[schema(example = "-2.5")]
    pub quantity_change: Decimal,
    #[validate(length(min = 1, message = "O motivo é obrigatório."))]
    pub reason: String,
}

pub(crate) fn validate_nonzero(val: &Decimal) -> Result<(), validator::ValidationError> {
    if val.is_zero() {
        let mut err = validator::ValidationError::new("nonzero");
        err.message = Some("A quantidade não pode ser zero.".into());
        return Err(err);
    }
    Ok(())
}

// ---
// 7. Resultado da baixa FIFO
// ---
// Quanto foi tirado de cada lote, ao custo daquele lote.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchDraw {
    pub batch_id: Uuid,
    pub amount: Decimal,
    pub unit_cost: Decimal,
}

// ---
// 8. Snapshot de estoque de um item
// ---
// Lotes abertos já na ordem de consumo (validade para perecíveis, FIFO
// por recebimento para os demais).
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockSnapshot {
    pub item_id: Uuid,
    pub current_stock: Decimal,
    pub average_cost: Decimal,
    pub last_cost: Decimal,
    pub batches: Vec<InventoryBatch>,
}
