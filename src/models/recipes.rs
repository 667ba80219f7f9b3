// src/models/recipes.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// O núcleo trata receitas como entrada SOMENTE-LEITURA: elas são consultadas
// para expandir desperdício de produto acabado e para estimar custo por porção.
// O CRUD completo de receitas vive fora deste serviço.

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "Moqueca de peixe")]
    pub name: String,
    // Quantas porções a receita rende
    #[schema(example = "8")]
    pub yield_quantity: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecipeIngredient {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub recipe_id: Uuid,
    pub item_id: Uuid,
    pub quantity: Decimal,
    // Aproveitamento após limpeza/preparo (ex.: 80 = 20% de perda).
    // Entra no custo estimado da receita, mas NÃO na baixa de desperdício:
    // o ingrediente desperdiçado já estava fisicamente incorporado ao prato.
    #[schema(example = "80")]
    pub yield_percent: Decimal,
}
