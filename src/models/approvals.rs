// src/models/approvals.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "approval_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalType {
    InventoryAdjustment,
    WasteEntry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "approval_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "approval_priority", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalPriority {
    Medium,
    High,
}

// ---
// Pedido de aprovação
// ---
// Guarda o payload ORIGINAL serializado (AdjustmentCommand / WasteCommand).
// Na aprovação, o payload é reexecutado pelo caminho normal de baixa, como se
// tivesse acabado de ser submetido por um ator privilegiado; na rejeição,
// nada toca o livro-razão (defer-then-apply, sem transações compensatórias).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequest {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub request_type: ApprovalType,
    #[schema(value_type = Object)]
    pub payload: serde_json::Value,
    pub priority: ApprovalPriority,
    pub status: ApprovalStatus,
    pub requested_by: Uuid,
    pub resolved_by: Option<Uuid>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// Decisão enviada pelo aprovador
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalDecision {
    Approve,
    Reject,
}
