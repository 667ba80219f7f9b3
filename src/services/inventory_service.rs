// src/services/inventory_service.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{InventoryRepository, TenancyRepository},
    middleware::tenancy::ActorContext,
    models::inventory::{
        AdjustmentCommand, AdjustmentKind, BatchDraw, InventoryAdjustment, InventoryBatch,
        InventoryItem, RecordStatus, StockSnapshot,
    },
};

// ---
// Funções puras do motor (planejamento, sem banco)
// ---
// A regra "tudo ou nada" da baixa é uma função explícita e testável: o plano
// inteiro é calculado (e rejeitado) ANTES de qualquer mutação.

/// Ordena lotes para consumo. Perecíveis: validade mais próxima primeiro
/// (lotes sem validade por último) — não é FIFO estrito por recebimento, é a
/// ordem que minimiza perda por vencimento. Não-perecíveis: FIFO por
/// recebimento. Desempate por received_at e id para ordem determinística.
pub(crate) fn order_for_consumption(batches: &mut [InventoryBatch], perishable: bool) {
    if perishable {
        batches.sort_by_key(|b| {
            (
                b.expiry_date.is_none(),
                b.expiry_date,
                b.received_at,
                b.id,
            )
        });
    } else {
        batches.sort_by_key(|b| (b.received_at, b.id));
    }
}

/// Calcula o plano de baixa: quanto tirar de cada lote, na ordem dada.
/// `preferred_batch` é a dica de atribuição de custo do desperdício de insumo:
/// o lote nomeado drena primeiro, e a baixa continua pelos demais se ele não
/// bastar (a dica não restringe QUAL estoque é consumido).
pub(crate) fn plan_deduction(
    ordered: &[InventoryBatch],
    quantity: Decimal,
    preferred_batch: Option<Uuid>,
) -> Result<Vec<BatchDraw>, AppError> {
    if quantity <= Decimal::ZERO {
        return Err(AppError::InvalidAmount);
    }

    let available: Decimal = ordered.iter().map(|b| b.remaining_quantity).sum();
    if available < quantity {
        return Err(AppError::InsufficientStock {
            available,
            requested: quantity,
        });
    }

    let mut draws = Vec::new();
    let mut still_needed = quantity;

    let preferred_first = ordered
        .iter()
        .filter(|b| Some(b.id) == preferred_batch)
        .chain(ordered.iter().filter(|b| Some(b.id) != preferred_batch));

    for batch in preferred_first {
        if still_needed <= Decimal::ZERO {
            break;
        }
        let take = batch.remaining_quantity.min(still_needed);
        if take <= Decimal::ZERO {
            continue;
        }
        draws.push(BatchDraw {
            batch_id: batch.id,
            amount: take,
            unit_cost: batch.unit_cost,
        });
        still_needed -= take;
    }

    Ok(draws)
}

/// Custo médio ponderado sobre os lotes com saldo.
/// Retorna None quando não sobra nada: o custo médio armazenado fica como
/// está (zerar corromperia a mistura de custo do próximo recebimento).
pub(crate) fn weighted_average_cost(batches: &[InventoryBatch]) -> Option<Decimal> {
    let total: Decimal = batches.iter().map(|b| b.remaining_quantity).sum();
    if total <= Decimal::ZERO {
        return None;
    }
    let value: Decimal = batches
        .iter()
        .map(|b| b.remaining_quantity * b.unit_cost)
        .sum();
    Some(value / total)
}

/// Custo médio que os lotes terão DEPOIS de aplicar o plano de baixa.
pub(crate) fn average_cost_after_draws(
    batches: &[InventoryBatch],
    draws: &[BatchDraw],
) -> Option<Decimal> {
    let drawn = |id: Uuid| -> Decimal {
        draws
            .iter()
            .filter(|d| d.batch_id == id)
            .map(|d| d.amount)
            .sum()
    };

    let mut total = Decimal::ZERO;
    let mut value = Decimal::ZERO;
    for batch in batches {
        let remaining = batch.remaining_quantity - drawn(batch.id);
        total += remaining;
        value += remaining * batch.unit_cost;
    }
    if total <= Decimal::ZERO {
        return None;
    }
    Some(value / total)
}

// ---
// O serviço
// ---

#[derive(Clone)]
pub struct InventoryService {
    inventory_repo: InventoryRepository,
    tenancy_repo: TenancyRepository,
    pool: PgPool,
}

impl InventoryService {
    pub fn new(
        inventory_repo: InventoryRepository,
        tenancy_repo: TenancyRepository,
        pool: PgPool,
    ) -> Self {
        Self {
            inventory_repo,
            tenancy_repo,
            pool,
        }
    }

    // --- CADASTRO DE ITEM ---
    // Criação de item é operação de catálogo; o núcleo só exige que ela exista
    // para o livro-razão ter onde pendurar lotes.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_item(
        &self,
        actor: &ActorContext,
        branch_id: Uuid,
        name: &str,
        unit: &str,
        is_perishable: bool,
        min_stock: Decimal,
        max_stock: Option<Decimal>,
    ) -> Result<InventoryItem, AppError> {
        self.tenancy_repo
            .find_branch(&self.pool, actor.tenant_id, branch_id)
            .await?
            .ok_or(AppError::BranchNotFound)?;

        self.inventory_repo
            .create_item(
                &self.pool,
                actor.tenant_id,
                branch_id,
                name,
                unit,
                is_perishable,
                min_stock,
                max_stock,
            )
            .await
    }

    pub async fn get_all_items(&self, actor: &ActorContext) -> Result<Vec<InventoryItem>, AppError> {
        self.inventory_repo
            .get_all_items(&self.pool, actor.tenant_id)
            .await
    }

    // --- RECEBIMENTO DE LOTE ---
    // Anexa um lote novo, soma ao estoque, recalcula o custo médio e grava o
    // ajuste RECEIVED. Tudo em uma transação.
    #[allow(clippy::too_many_arguments)]
    pub async fn receive_batch(
        &self,
        actor: &ActorContext,
        item_id: Uuid,
        quantity: Decimal,
        unit_cost: Decimal,
        batch_number: &str,
        expiry_date: Option<NaiveDate>,
    ) -> Result<InventoryBatch, AppError> {
        if quantity <= Decimal::ZERO || unit_cost < Decimal::ZERO {
            return Err(AppError::InvalidAmount);
        }

        let mut tx = self.pool.begin().await?;

        // Trava o item: recebimentos e baixas concorrentes serializam aqui.
        self.inventory_repo
            .lock_item(&mut *tx, actor.tenant_id, item_id)
            .await?
            .ok_or(AppError::ItemNotFound)?;

        let batch = self
            .inventory_repo
            .insert_batch(
                &mut *tx,
                actor.tenant_id,
                item_id,
                batch_number,
                quantity,
                unit_cost,
                expiry_date,
            )
            .await?;

        // O custo médio mistura o lote novo com o que sobrou dos antigos.
        // Se o estoque estava zerado, a lista aberta agora contém só o lote
        // novo e a média converge para o custo dele.
        let open = self
            .inventory_repo
            .list_open_batches(&mut *tx, actor.tenant_id, item_id)
            .await?;
        let new_average = weighted_average_cost(&open);

        self.inventory_repo
            .update_item_stock(
                &mut *tx,
                actor.tenant_id,
                item_id,
                quantity,
                new_average,
                Some(unit_cost),
            )
            .await?;

        self.inventory_repo
            .insert_adjustment(
                &mut *tx,
                actor.tenant_id,
                item_id,
                quantity,
                AdjustmentKind::Received,
                &format!("Recebimento do lote {}", batch_number),
                RecordStatus::Approved,
                None,
                actor.user_id,
            )
            .await?;

        tx.commit().await?;

        tracing::info!(
            "📦 Lote {} recebido: {} x {} para o item {}",
            batch_number,
            quantity,
            unit_cost,
            item_id
        );
        Ok(batch)
    }

    // --- SNAPSHOT ---
    // Estoque atual, custos e lotes abertos já na ordem de consumo.
    pub async fn get_snapshot(
        &self,
        actor: &ActorContext,
        item_id: Uuid,
    ) -> Result<StockSnapshot, AppError> {
        let item = self
            .inventory_repo
            .find_item(&self.pool, actor.tenant_id, item_id)
            .await?
            .ok_or(AppError::ItemNotFound)?;

        let mut batches = self
            .inventory_repo
            .list_open_batches(&self.pool, actor.tenant_id, item_id)
            .await?;
        order_for_consumption(&mut batches, item.is_perishable);

        Ok(StockSnapshot {
            item_id: item.id,
            current_stock: item.current_stock,
            average_cost: item.average_cost,
            last_cost: item.last_cost,
            batches,
        })
    }

    // --- BAIXA FIFO (dentro de uma transação já aberta) ---
    // Planeja, valida o total ANTES de mutar, drena lote a lote e atualiza o
    // estoque/custo do item. O chamador é dono da transação: qualquer erro
    // daqui pra frente desfaz todas as drenagens juntas.
    pub(crate) async fn deduct_in_tx(
        &self,
        conn: &mut PgConnection,
        item: &InventoryItem,
        quantity: Decimal,
        preferred_batch: Option<Uuid>,
    ) -> Result<Vec<BatchDraw>, AppError> {
        let mut batches = self
            .inventory_repo
            .list_open_batches(&mut *conn, item.tenant_id, item.id)
            .await?;
        order_for_consumption(&mut batches, item.is_perishable);

        let draws = plan_deduction(&batches, quantity, preferred_batch)?;
        self.apply_draws_in_tx(conn, item, &batches, &draws).await?;

        Ok(draws)
    }

    // Aplica um plano de baixa já calculado (e já validado): drena cada lote
    // e sincroniza estoque/custo do item. Usado pela baixa FIFO comum e pela
    // cascata de desperdício, que planeja todos os ingredientes antes de
    // drenar o primeiro.
    pub(crate) async fn apply_draws_in_tx(
        &self,
        conn: &mut PgConnection,
        item: &InventoryItem,
        batches: &[InventoryBatch],
        draws: &[BatchDraw],
    ) -> Result<(), AppError> {
        for draw in draws {
            self.inventory_repo
                .drain_batch(&mut *conn, item.tenant_id, draw.batch_id, draw.amount)
                .await?;
        }

        let quantity: Decimal = draws.iter().map(|d| d.amount).sum();
        let new_average = average_cost_after_draws(batches, draws);

        self.inventory_repo
            .update_item_stock(
                &mut *conn,
                item.tenant_id,
                item.id,
                -quantity,
                new_average,
                None,
            )
            .await?;

        Ok(())
    }

    // --- APLICAÇÃO DE AJUSTE (mutação, sem gravar o registro) ---
    // Quem grava/atualiza o InventoryAdjustment é o portão de aprovação, que
    // sabe se o evento é novo (auto-aplicado) ou um replay de aprovação.
    pub(crate) async fn mutate_for_adjustment_in_tx(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        cmd: &AdjustmentCommand,
    ) -> Result<Vec<BatchDraw>, AppError> {
        let item = self
            .inventory_repo
            .lock_item(&mut *conn, tenant_id, cmd.item_id)
            .await?
            .ok_or(AppError::ItemNotFound)?;

        if cmd.quantity_change > Decimal::ZERO {
            // Entrada (ex.: correção de contagem para cima): vira um lote
            // sintético ao custo médio atual, para que current_stock continue
            // igual à soma dos lotes sem caso especial.
            let batch = self
                .inventory_repo
                .insert_batch(
                    &mut *conn,
                    tenant_id,
                    cmd.item_id,
                    &format!("AJUSTE-{}", chrono::Utc::now().format("%Y%m%d%H%M%S")),
                    cmd.quantity_change,
                    item.average_cost,
                    None,
                )
                .await?;

            let open = self
                .inventory_repo
                .list_open_batches(&mut *conn, tenant_id, cmd.item_id)
                .await?;
            let new_average = weighted_average_cost(&open);

            self.inventory_repo
                .update_item_stock(
                    &mut *conn,
                    tenant_id,
                    cmd.item_id,
                    cmd.quantity_change,
                    new_average,
                    None,
                )
                .await?;

            Ok(vec![BatchDraw {
                batch_id: batch.id,
                amount: cmd.quantity_change,
                unit_cost: item.average_cost,
            }])
        } else {
            self.deduct_in_tx(conn, &item, -cmd.quantity_change, None)
                .await
        }
    }

    // Registro imutável do efeito líquido de um ajuste.
    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn record_adjustment_in_tx(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        cmd: &AdjustmentCommand,
        status: RecordStatus,
        approval_request_id: Option<Uuid>,
        requested_by: Uuid,
    ) -> Result<InventoryAdjustment, AppError> {
        self.inventory_repo
            .insert_adjustment(
                &mut *conn,
                tenant_id,
                cmd.item_id,
                cmd.quantity_change,
                cmd.kind,
                &cmd.reason,
                status,
                approval_request_id,
                requested_by,
            )
            .await
    }

    // Replay de aprovação: o registro PENDING já existe, só muda de status.
    pub(crate) async fn approve_linked_adjustment_in_tx(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        approval_request_id: Uuid,
    ) -> Result<(), AppError> {
        self.inventory_repo
            .approve_adjustment(&mut *conn, tenant_id, approval_request_id)
            .await
    }

    // Impacto monetário estimado de um ajuste (entrada da classificação do
    // portão de aprovação).
    pub(crate) async fn estimate_adjustment_impact(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        cmd: &AdjustmentCommand,
    ) -> Result<Decimal, AppError> {
        let item = self
            .inventory_repo
            .find_item(&mut *conn, tenant_id, cmd.item_id)
            .await?
            .ok_or(AppError::ItemNotFound)?;
        Ok(cmd.quantity_change.abs() * item.average_cost)
    }
}

// ---
// Testes do motor (funções puras)
// ---
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn batch(
        remaining: i64,
        unit_cost: &str,
        received_days_ago: i64,
        expiry_in_days: Option<i64>,
    ) -> InventoryBatch {
        let now = Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap();
        let received = now - Duration::days(received_days_ago);
        InventoryBatch {
            id: Uuid::new_v4(),
            tenant_id: Uuid::nil(),
            item_id: Uuid::nil(),
            batch_number: format!("L-{}", received_days_ago),
            original_quantity: Decimal::from(remaining),
            unit_cost: unit_cost.parse().unwrap(),
            total_cost: Decimal::from(remaining) * unit_cost.parse::<Decimal>().unwrap(),
            remaining_quantity: Decimal::from(remaining),
            received_at: received,
            expiry_date: expiry_in_days.map(|d| (now + Duration::days(d)).date_naive()),
            created_at: received,
            updated_at: received,
        }
    }

    #[test]
    fn perishable_order_puts_soonest_expiry_first() {
        let day10 = batch(50, "1.00", 5, Some(10));
        let day3 = batch(50, "1.00", 1, Some(3));
        let no_expiry = batch(50, "1.00", 9, None);
        let mut batches = vec![no_expiry.clone(), day10.clone(), day3.clone()];

        order_for_consumption(&mut batches, true);

        assert_eq!(batches[0].id, day3.id);
        assert_eq!(batches[1].id, day10.id);
        // Sem validade ordena por último, mesmo sendo o mais antigo.
        assert_eq!(batches[2].id, no_expiry.id);
    }

    #[test]
    fn non_perishable_order_is_fifo_by_receipt() {
        let older = batch(10, "1.00", 8, Some(2));
        let newer = batch(10, "1.00", 1, Some(30));
        let mut batches = vec![newer.clone(), older.clone()];

        order_for_consumption(&mut batches, false);

        // A validade é ignorada para não-perecíveis.
        assert_eq!(batches[0].id, older.id);
        assert_eq!(batches[1].id, newer.id);
    }

    #[test]
    fn small_deduction_drains_only_the_soonest_batch() {
        let day3 = batch(40, "2.00", 2, Some(3));
        let day10 = batch(60, "2.50", 1, Some(10));
        let mut batches = vec![day10.clone(), day3.clone()];
        order_for_consumption(&mut batches, true);

        let draws = plan_deduction(&batches, Decimal::from(25), None).unwrap();

        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].batch_id, day3.id);
        assert_eq!(draws[0].amount, Decimal::from(25));
    }

    #[test]
    fn deduction_walks_batches_in_order() {
        // Cenário da especificação: 100 @ 2.00, depois 50 @ 4.00, baixa de 120.
        let first = batch(100, "2.00", 10, None);
        let second = batch(50, "4.00", 5, None);
        let mut batches = vec![second.clone(), first.clone()];
        order_for_consumption(&mut batches, false);

        let draws = plan_deduction(&batches, Decimal::from(120), None).unwrap();

        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].batch_id, first.id);
        assert_eq!(draws[0].amount, Decimal::from(100));
        assert_eq!(draws[0].unit_cost, "2.00".parse::<Decimal>().unwrap());
        assert_eq!(draws[1].batch_id, second.id);
        assert_eq!(draws[1].amount, Decimal::from(20));

        // Sobram 30 unidades, todas do segundo lote, a 4.00.
        let after = average_cost_after_draws(&batches, &draws).unwrap();
        assert_eq!(after, "4.00".parse::<Decimal>().unwrap());
    }

    #[test]
    fn insufficient_stock_rejects_whole_plan() {
        let only = batch(30, "1.00", 1, None);
        let batches = vec![only];

        let err = plan_deduction(&batches, Decimal::from(31), None).unwrap_err();
        match err {
            AppError::InsufficientStock {
                available,
                requested,
            } => {
                assert_eq!(available, Decimal::from(30));
                assert_eq!(requested, Decimal::from(31));
            }
            other => panic!("esperava InsufficientStock, veio {:?}", other),
        }
    }

    #[test]
    fn non_positive_quantity_is_invalid() {
        let batches = vec![batch(10, "1.00", 1, None)];
        assert!(matches!(
            plan_deduction(&batches, Decimal::ZERO, None),
            Err(AppError::InvalidAmount)
        ));
        assert!(matches!(
            plan_deduction(&batches, Decimal::from(-5), None),
            Err(AppError::InvalidAmount)
        ));
    }

    #[test]
    fn preferred_batch_drains_first_then_falls_back_to_fifo() {
        let first = batch(20, "1.00", 10, None);
        let second = batch(20, "3.00", 5, None);
        let mut batches = vec![first.clone(), second.clone()];
        order_for_consumption(&mut batches, false);

        // Nomeia o lote mais NOVO; ele drena primeiro e o restante vem do
        // mais antigo (a dica não restringe o estoque consumido).
        let draws = plan_deduction(&batches, Decimal::from(30), Some(second.id)).unwrap();

        assert_eq!(draws[0].batch_id, second.id);
        assert_eq!(draws[0].amount, Decimal::from(20));
        assert_eq!(draws[1].batch_id, first.id);
        assert_eq!(draws[1].amount, Decimal::from(10));
    }

    #[test]
    fn weighted_average_blends_receipts() {
        // 100 @ 2.00 + 50 @ 4.00 => (100*2 + 50*4) / 150 = 2.67 (2 casas)
        let batches = vec![batch(100, "2.00", 2, None), batch(50, "4.00", 1, None)];
        let avg = weighted_average_cost(&batches).unwrap();
        assert_eq!(avg.round_dp(2), "2.67".parse::<Decimal>().unwrap());
    }

    #[test]
    fn average_is_none_when_nothing_remains() {
        // Sem lotes abertos não existe média "correta": o serviço preserva o
        // valor armazenado (política deliberada, não omissão).
        assert_eq!(weighted_average_cost(&[]), None);

        let drained = batch(10, "2.00", 1, None);
        let draws = vec![BatchDraw {
            batch_id: drained.id,
            amount: Decimal::from(10),
            unit_cost: drained.unit_cost,
        }];
        assert_eq!(average_cost_after_draws(&[drained], &draws), None);
    }

    #[test]
    fn plan_never_draws_more_than_remaining() {
        let batches = vec![
            batch(7, "1.10", 3, None),
            batch(13, "1.20", 2, None),
            batch(5, "1.30", 1, None),
        ];
        let draws = plan_deduction(&batches, Decimal::from(22), None).unwrap();

        let total: Decimal = draws.iter().map(|d| d.amount).sum();
        assert_eq!(total, Decimal::from(22));
        for draw in &draws {
            let source = batches.iter().find(|b| b.id == draw.batch_id).unwrap();
            assert!(draw.amount <= source.remaining_quantity);
            assert!(draw.amount > Decimal::ZERO);
        }
    }
}
