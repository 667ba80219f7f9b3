// src/services/waste_service.rs

use rust_decimal::Decimal;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{InventoryRepository, RecipeRepository, WasteRepository},
    models::{
        inventory::{AdjustmentKind, BatchDraw, InventoryBatch, RecordStatus},
        recipes::RecipeIngredient,
        waste::{WasteCommand, WasteEntry, WasteKind},
    },
    services::inventory_service::{InventoryService, order_for_consumption, plan_deduction},
};

// ---
// Funções puras da cascata
// ---

/// Expande um desperdício de produto acabado em quantidades por ingrediente:
/// `ratio = porções desperdiçadas / rendimento da receita`, e cada ingrediente
/// deve baixar `quantidade * ratio`.
///
/// O yield_percent NÃO entra aqui de propósito: ele modela perda de preparo e
/// só afeta a estimativa de custo "para frente"; o ingrediente desperdiçado já
/// estava fisicamente incorporado ao prato.
pub(crate) fn cascade_requirements(
    recipe_yield: Decimal,
    ingredients: &[RecipeIngredient],
    wasted_quantity: Decimal,
) -> Result<Vec<(Uuid, Decimal)>, AppError> {
    if recipe_yield <= Decimal::ZERO || wasted_quantity <= Decimal::ZERO {
        return Err(AppError::InvalidAmount);
    }
    let ratio = wasted_quantity / recipe_yield;
    Ok(ingredients
        .iter()
        .map(|ing| (ing.item_id, ing.quantity * ratio))
        .collect())
}

/// Planeja a cascata inteira contra os lotes abertos de cada ingrediente,
/// tudo ou nada: se um ingrediente não tem saldo, o plano é Err e nenhum draw
/// é produzido. Estoque insuficiente vira CascadeFailure carregando o item que
/// derrubou a cascata (o chamador nunca vê InsufficientStock parcial).
pub(crate) fn plan_cascade(
    requirements: &[(Uuid, Decimal)],
    stocks: &[(Uuid, &[InventoryBatch])],
) -> Result<Vec<(Uuid, Vec<BatchDraw>)>, AppError> {
    let mut plans = Vec::with_capacity(requirements.len());
    for (item_id, required) in requirements {
        if *required <= Decimal::ZERO {
            continue;
        }
        let batches = stocks
            .iter()
            .find(|(id, _)| id == item_id)
            .map(|(_, batches)| *batches)
            .ok_or(AppError::CascadeFailure { item_id: *item_id })?;

        let draws = plan_deduction(batches, *required, None).map_err(|e| match e {
            AppError::InsufficientStock { .. } => AppError::CascadeFailure { item_id: *item_id },
            other => other,
        })?;
        plans.push((*item_id, draws));
    }
    Ok(plans)
}

/// Custo estimado de UMA porção da receita, a partir do custo médio atual de
/// cada ingrediente. Aqui o yield_percent ENTRA: para servir `quantity` do
/// ingrediente limpo é preciso comprar `quantity / (yield_percent/100)`.
pub(crate) fn recipe_unit_cost(
    recipe_yield: Decimal,
    ingredients: &[(RecipeIngredient, Decimal)],
) -> Result<Decimal, AppError> {
    if recipe_yield <= Decimal::ZERO {
        return Err(AppError::InvalidAmount);
    }
    let hundred = Decimal::from(100);
    let mut total = Decimal::ZERO;
    for (ing, average_cost) in ingredients {
        let factor = if ing.yield_percent > Decimal::ZERO {
            ing.yield_percent / hundred
        } else {
            Decimal::ONE
        };
        total += (ing.quantity / factor) * *average_cost;
    }
    Ok(total / recipe_yield)
}

// ---
// O resolvedor
// ---

#[derive(Clone)]
pub struct WasteService {
    inventory_repo: InventoryRepository,
    recipe_repo: RecipeRepository,
    waste_repo: WasteRepository,
    inventory_service: InventoryService,
}

impl WasteService {
    pub fn new(
        inventory_repo: InventoryRepository,
        recipe_repo: RecipeRepository,
        waste_repo: WasteRepository,
        inventory_service: InventoryService,
    ) -> Self {
        Self {
            inventory_repo,
            recipe_repo,
            waste_repo,
            inventory_service,
        }
    }

    // Custo estimado do desperdício, calculado UMA vez na submissão (é também
    // o impacto monetário que o portão de aprovação classifica).
    pub(crate) async fn estimate_cost_in_tx(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        cmd: &WasteCommand,
    ) -> Result<Decimal, AppError> {
        match cmd.kind {
            WasteKind::Raw => {
                let item_id = cmd.item_id.ok_or(AppError::ItemNotFound)?;
                let item = self
                    .inventory_repo
                    .find_item(&mut *conn, tenant_id, item_id)
                    .await?
                    .ok_or(AppError::ItemNotFound)?;

                // Lote nomeado: custo daquele lote; senão, custo médio.
                let unit_cost = match cmd.batch_id {
                    Some(batch_id) => {
                        let batch = self
                            .inventory_repo
                            .find_batch(&mut *conn, tenant_id, batch_id)
                            .await?
                            .filter(|b| b.item_id == item_id)
                            .ok_or(AppError::BatchNotFound)?;
                        batch.unit_cost
                    }
                    None => item.average_cost,
                };
                Ok(cmd.quantity * unit_cost)
            }
            WasteKind::Product => {
                let recipe_id = cmd.recipe_id.ok_or(AppError::RecipeNotFound)?;
                let recipe = self
                    .recipe_repo
                    .find_recipe(&mut *conn, tenant_id, recipe_id)
                    .await?
                    .ok_or(AppError::RecipeNotFound)?;
                let ingredients = self
                    .recipe_repo
                    .list_ingredients(&mut *conn, tenant_id, recipe_id)
                    .await?;

                let mut costed = Vec::with_capacity(ingredients.len());
                for ing in ingredients {
                    let item = self
                        .inventory_repo
                        .find_item(&mut *conn, tenant_id, ing.item_id)
                        .await?
                        .ok_or(AppError::ItemNotFound)?;
                    costed.push((ing, item.average_cost));
                }

                let per_serving = recipe_unit_cost(recipe.yield_quantity, &costed)?;
                Ok(cmd.quantity * per_serving)
            }
        }
    }

    // Executa as baixas do desperdício dentro da transação do chamador.
    // Para produto acabado vale a atomicidade ENTRE itens: qualquer
    // ingrediente sem saldo aborta o evento inteiro (CascadeFailure) e o
    // rollback desfaz as baixas já aplicadas.
    pub(crate) async fn execute_in_tx(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        requested_by: Uuid,
        cmd: &WasteCommand,
    ) -> Result<(), AppError> {
        match cmd.kind {
            WasteKind::Raw => {
                let item_id = cmd.item_id.ok_or(AppError::ItemNotFound)?;
                let item = self
                    .inventory_repo
                    .lock_item(&mut *conn, tenant_id, item_id)
                    .await?
                    .ok_or(AppError::ItemNotFound)?;

                self.inventory_service
                    .deduct_in_tx(conn, &item, cmd.quantity, cmd.batch_id)
                    .await?;

                self.inventory_repo
                    .insert_adjustment(
                        &mut *conn,
                        tenant_id,
                        item_id,
                        -cmd.quantity,
                        AdjustmentKind::Waste,
                        &cmd.reason,
                        RecordStatus::Approved,
                        None,
                        requested_by,
                    )
                    .await?;
                Ok(())
            }
            WasteKind::Product => {
                let recipe_id = cmd.recipe_id.ok_or(AppError::RecipeNotFound)?;
                let recipe = self
                    .recipe_repo
                    .find_recipe(&mut *conn, tenant_id, recipe_id)
                    .await?
                    .ok_or(AppError::RecipeNotFound)?;
                let ingredients = self
                    .recipe_repo
                    .list_ingredients(&mut *conn, tenant_id, recipe_id)
                    .await?;

                let mut requirements =
                    cascade_requirements(recipe.yield_quantity, &ingredients, cmd.quantity)?;
                // Trava os itens sempre em ordem crescente de id: duas
                // cascatas concorrentes nunca se travam em ordem cruzada.
                requirements.sort_by_key(|(item_id, _)| *item_id);

                let mut locked = Vec::with_capacity(requirements.len());
                for (item_id, required) in &requirements {
                    if *required <= Decimal::ZERO {
                        continue;
                    }
                    let item = self
                        .inventory_repo
                        .lock_item(&mut *conn, tenant_id, *item_id)
                        .await?
                        .ok_or(AppError::CascadeFailure { item_id: *item_id })?;

                    let mut batches = self
                        .inventory_repo
                        .list_open_batches(&mut *conn, tenant_id, *item_id)
                        .await?;
                    order_for_consumption(&mut batches, item.is_perishable);
                    locked.push((item, batches));
                }

                // Planeja TODOS os ingredientes antes de drenar o primeiro:
                // um ingrediente sem saldo aborta o evento inteiro.
                let stocks: Vec<(Uuid, &[InventoryBatch])> = locked
                    .iter()
                    .map(|(item, batches)| (item.id, batches.as_slice()))
                    .collect();
                let plans = plan_cascade(&requirements, &stocks)?;

                for (item_id, draws) in plans {
                    let (item, batches) = locked
                        .iter()
                        .find(|(item, _)| item.id == item_id)
                        .ok_or(AppError::CascadeFailure { item_id })?;
                    let required: Decimal = draws.iter().map(|d| d.amount).sum();

                    self.inventory_service
                        .apply_draws_in_tx(conn, item, batches, &draws)
                        .await?;

                    self.inventory_repo
                        .insert_adjustment(
                            &mut *conn,
                            tenant_id,
                            item_id,
                            -required,
                            AdjustmentKind::Waste,
                            &cmd.reason,
                            RecordStatus::Approved,
                            None,
                            requested_by,
                        )
                        .await?;
                }
                Ok(())
            }
        }
    }

    // Grava o WasteEntry (o registro do evento, aplicado ou pendente).
    pub(crate) async fn record_entry_in_tx(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        cmd: &WasteCommand,
        estimated_cost: Decimal,
        status: RecordStatus,
        approval_request_id: Option<Uuid>,
        reported_by: Uuid,
    ) -> Result<WasteEntry, AppError> {
        self.waste_repo
            .insert_entry(
                &mut *conn,
                tenant_id,
                cmd.kind,
                cmd.item_id,
                cmd.recipe_id,
                cmd.batch_id,
                cmd.quantity,
                &cmd.unit,
                &cmd.reason,
                estimated_cost,
                status,
                approval_request_id,
                reported_by,
            )
            .await
    }
}

// ---
// Testes da cascata (funções puras)
// ---
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn batch(item_id: Uuid, remaining: i64, unit_cost: &str) -> InventoryBatch {
        let received = Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap();
        InventoryBatch {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            item_id,
            batch_number: "L-1".to_string(),
            original_quantity: Decimal::from(remaining),
            unit_cost: unit_cost.parse().unwrap(),
            total_cost: Decimal::from(remaining) * unit_cost.parse::<Decimal>().unwrap(),
            remaining_quantity: Decimal::from(remaining),
            received_at: received,
            expiry_date: None,
            created_at: received,
            updated_at: received,
        }
    }

    fn ingredient(item_id: Uuid, quantity: &str, yield_percent: &str) -> RecipeIngredient {
        RecipeIngredient {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            recipe_id: Uuid::nil(),
            item_id,
            quantity: quantity.parse().unwrap(),
            yield_percent: yield_percent.parse().unwrap(),
        }
    }

    #[test]
    fn requirements_are_proportional_to_recipe_yield() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        // Receita rende 8 porções; desperdiçadas 2 => ratio 0.25.
        let ingredients = vec![ingredient(a, "1.6", "80"), ingredient(b, "0.4", "100")];

        let reqs =
            cascade_requirements(Decimal::from(8), &ingredients, Decimal::from(2)).unwrap();

        assert_eq!(reqs.len(), 2);
        assert_eq!(reqs[0], (a, "0.4".parse().unwrap()));
        assert_eq!(reqs[1], (b, "0.1".parse().unwrap()));
    }

    #[test]
    fn requirements_ignore_yield_percent() {
        // Mesmo com 50% de aproveitamento, a baixa usa a quantidade da
        // receita: o que foi desperdiçado já estava incorporado ao prato.
        let a = Uuid::new_v4();
        let ingredients = vec![ingredient(a, "2", "50")];

        let reqs =
            cascade_requirements(Decimal::from(4), &ingredients, Decimal::from(4)).unwrap();
        assert_eq!(reqs[0].1, Decimal::from(2));
    }

    #[test]
    fn zero_yield_or_quantity_is_invalid() {
        let ingredients = vec![ingredient(Uuid::new_v4(), "1", "100")];
        assert!(matches!(
            cascade_requirements(Decimal::ZERO, &ingredients, Decimal::ONE),
            Err(AppError::InvalidAmount)
        ));
        assert!(matches!(
            cascade_requirements(Decimal::from(8), &ingredients, Decimal::ZERO),
            Err(AppError::InvalidAmount)
        ));
    }

    #[test]
    fn cascade_plan_covers_every_ingredient() {
        let fish = Uuid::new_v4();
        let rice = Uuid::new_v4();
        let fish_batches = [batch(fish, 10, "12.00")];
        let rice_batches = [batch(rice, 20, "0.80")];
        let stocks: Vec<(Uuid, &[InventoryBatch])> =
            vec![(fish, &fish_batches), (rice, &rice_batches)];

        let requirements = vec![
            (fish, "0.4".parse().unwrap()),
            (rice, "0.1".parse().unwrap()),
        ];
        let plans = plan_cascade(&requirements, &stocks).unwrap();

        assert_eq!(plans.len(), 2);
        let fish_total: Decimal = plans[0].1.iter().map(|d| d.amount).sum();
        let rice_total: Decimal = plans[1].1.iter().map(|d| d.amount).sum();
        assert_eq!(fish_total, "0.4".parse::<Decimal>().unwrap());
        assert_eq!(rice_total, "0.1".parse::<Decimal>().unwrap());
    }

    #[test]
    fn short_ingredient_fails_whole_cascade_naming_the_item() {
        let fish = Uuid::new_v4();
        let rice = Uuid::new_v4();
        // Peixe sobra; arroz só tem 1 unidade para uma exigência de 5.
        let fish_batches = [batch(fish, 100, "12.00")];
        let rice_batches = [batch(rice, 1, "0.80")];
        let stocks: Vec<(Uuid, &[InventoryBatch])> =
            vec![(fish, &fish_batches), (rice, &rice_batches)];

        let requirements = vec![(fish, Decimal::from(2)), (rice, Decimal::from(5))];
        let err = plan_cascade(&requirements, &stocks).unwrap_err();

        // Err carrega o ingrediente que derrubou a cascata e NENHUM plano é
        // devolvido: sem plano, nada é drenado de nenhum item.
        match err {
            AppError::CascadeFailure { item_id } => assert_eq!(item_id, rice),
            other => panic!("esperava CascadeFailure, veio {:?}", other),
        }
    }

    #[test]
    fn unknown_ingredient_stock_fails_the_cascade() {
        let known = Uuid::new_v4();
        let missing = Uuid::new_v4();
        let known_batches = [batch(known, 10, "1.00")];
        let stocks: Vec<(Uuid, &[InventoryBatch])> = vec![(known, &known_batches)];

        let requirements = vec![(known, Decimal::ONE), (missing, Decimal::ONE)];
        let err = plan_cascade(&requirements, &stocks).unwrap_err();

        assert!(matches!(err, AppError::CascadeFailure { item_id } if item_id == missing));
    }

    #[test]
    fn recipe_cost_applies_yield_percent() {
        // 1.6 kg a 80% de aproveitamento => compra de 2.0 kg; a 10.00/kg e
        // rendimento de 8 porções, o custo por porção é 2.50.
        let ing = ingredient(Uuid::new_v4(), "1.6", "80");
        let cost = recipe_unit_cost(
            Decimal::from(8),
            &[(ing, "10.00".parse().unwrap())],
        )
        .unwrap();
        assert_eq!(cost, "2.50".parse::<Decimal>().unwrap());
    }

    #[test]
    fn recipe_cost_treats_non_positive_yield_percent_as_full_yield() {
        let ing = ingredient(Uuid::new_v4(), "2", "0");
        let cost =
            recipe_unit_cost(Decimal::from(2), &[(ing, "3.00".parse().unwrap())]).unwrap();
        assert_eq!(cost, "3.00".parse::<Decimal>().unwrap());
    }
}
