// src/models/waste.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

// ---
// 1. Tipo de desperdício
// ---
// RAW: insumo cru (um item, opcionalmente um lote específico).
// PRODUCT: produto acabado (uma receita + quantidade de porções), que o
// resolvedor de cascata expande em baixas por ingrediente.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "waste_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WasteKind {
    Raw,
    Product,
}

// ---
// 2. Registro de desperdício
// ---
// estimated_cost é calculado UMA vez, na criação (custo médio atual para
// insumo, custo por porção da receita para produto) e nunca recalculado.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WasteEntry {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub kind: WasteKind,
    pub item_id: Option<Uuid>,
    pub recipe_id: Option<Uuid>,
    pub batch_id: Option<Uuid>,
    pub quantity: Decimal,
    #[schema(example = "kg")]
    pub unit: String,
    #[schema(example = "Queda no transporte interno")]
    pub reason: String,
    pub estimated_cost: Decimal,
    pub status: crate::models::inventory::RecordStatus,
    pub approval_request_id: Option<Uuid>,
    pub reported_by: Uuid,
    pub created_at: DateTime<Utc>,
}

// ---
// 3. Comando de desperdício (payload HTTP e payload serializado na fila)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WasteCommand {
    pub kind: WasteKind,

    // RAW: obrigatório. batch_id é uma dica de atribuição de custo: o lote
    // nomeado é drenado primeiro, mas a baixa continua em FIFO se ele não
    // bastar.
    pub item_id: Option<Uuid>,
    pub batch_id: Option<Uuid>,

    // PRODUCT: obrigatório (quantidade = porções desperdiçadas).
    pub recipe_id: Option<Uuid>,

    #[validate(custom(function = validate_positive))]
    pub quantity: Decimal,

    #[validate(length(min = 1, message = "A unidade é obrigatória."))]
    #[schema(example = "porção")]
    pub unit: String,

    #[validate(length(min = 1, message = "O motivo é obrigatório."))]
    pub reason: String,
}

impl WasteCommand {
    // Regra de consistência entre kind e alvos, fora do alcance do derive.
    pub fn validate_target(&self) -> Result<(), ValidationError> {
        match self.kind {
            WasteKind::Raw if self.item_id.is_none() => {
                Err(ValidationError::new("ItemRequiredForRawWaste"))
            }
            WasteKind::Product if self.recipe_id.is_none() => {
                Err(ValidationError::new("RecipeRequiredForProductWaste"))
            }
            _ => Ok(()),
        }
    }
}

pub(crate) fn validate_positive(val: &Decimal) -> Result<(), ValidationError> {
    if *val <= Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.message = Some("A quantidade deve ser maior que zero.".into());
        return Err(err);
    }
    Ok(())
}
