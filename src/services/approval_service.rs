// src/services/approval_service.rs

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ApprovalRepository, WasteRepository},
    middleware::tenancy::ActorContext,
    models::{
        approvals::{
            ApprovalDecision, ApprovalPriority, ApprovalRequest, ApprovalStatus, ApprovalType,
        },
        inventory::{AdjustmentCommand, InventoryAdjustment, RecordStatus},
        tenancy::MemberRole,
        waste::{WasteCommand, WasteEntry},
    },
    services::{inventory_service::InventoryService, waste_service::WasteService},
};

// ---
// Classificação (função pura, desacoplada da mutação)
// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    AutoApply,
    Queue(ApprovalPriority),
}

/// Decide se um pedido aplica na hora ou entra na fila de aprovação.
/// Admin do tenant sempre auto-aplica. Ator de filial auto-aplica apenas
/// abaixo do teto; acima, a prioridade sobe para HIGH quando o impacto passa
/// de 2x o teto.
pub fn classify(role: MemberRole, estimated_impact: Decimal, threshold: Decimal) -> GateDecision {
    if role == MemberRole::TenantAdmin {
        return GateDecision::AutoApply;
    }
    if estimated_impact < threshold {
        return GateDecision::AutoApply;
    }
    if estimated_impact > threshold * Decimal::from(2) {
        GateDecision::Queue(ApprovalPriority::High)
    } else {
        GateDecision::Queue(ApprovalPriority::Medium)
    }
}

/// Um pedido é resolvido no máximo uma vez: qualquer status que não seja
/// PENDING devolve AlreadyResolved, e a chamada repetida nunca muta estoque
/// (o guard roda antes de qualquer replay).
pub(crate) fn ensure_pending(status: ApprovalStatus) -> Result<(), AppError> {
    if status == ApprovalStatus::Pending {
        Ok(())
    } else {
        Err(AppError::AlreadyResolved)
    }
}

// ---
// Resultados de submissão
// ---

#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all_fields = "camelCase")]
pub enum AdjustmentOutcome {
    // Aplicado na hora: o livro-razão já reflete o ajuste.
    AutoApplied { adjustment: InventoryAdjustment },
    // Na fila: registro PENDING criado, ZERO mutação de estoque.
    PendingApproval {
        adjustment: InventoryAdjustment,
        approval_request: ApprovalRequest,
    },
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all_fields = "camelCase")]
pub enum WasteOutcome {
    AutoApplied { waste_entry: WasteEntry },
    PendingApproval {
        waste_entry: WasteEntry,
        approval_request: ApprovalRequest,
    },
}

// ---
// O portão
// ---

#[derive(Clone)]
pub struct ApprovalService {
    approval_repo: ApprovalRepository,
    waste_repo: WasteRepository,
    inventory_service: InventoryService,
    waste_service: WasteService,
    pool: PgPool,
    // Teto (em dinheiro) para auto-aplicação por atores de filial.
    cost_threshold: Decimal,
}

impl ApprovalService {
    pub fn new(
        approval_repo: ApprovalRepository,
        waste_repo: WasteRepository,
        inventory_service: InventoryService,
        waste_service: WasteService,
        pool: PgPool,
        cost_threshold: Decimal,
    ) -> Self {
        Self {
            approval_repo,
            waste_repo,
            inventory_service,
            waste_service,
            pool,
            cost_threshold,
        }
    }

    // --- SUBMISSÃO DE AJUSTE ---
    pub async fn submit_adjustment(
        &self,
        actor: &ActorContext,
        cmd: AdjustmentCommand,
    ) -> Result<AdjustmentOutcome, AppError> {
        let mut tx = self.pool.begin().await?;

        let impact = self
            .inventory_service
            .estimate_adjustment_impact(&mut *tx, actor.tenant_id, &cmd)
            .await?;

        let outcome = match classify(actor.role, impact, self.cost_threshold) {
            GateDecision::AutoApply => {
                self.inventory_service
                    .mutate_for_adjustment_in_tx(&mut *tx, actor.tenant_id, &cmd)
                    .await?;
                let adjustment = self
                    .inventory_service
                    .record_adjustment_in_tx(
                        &mut *tx,
                        actor.tenant_id,
                        &cmd,
                        RecordStatus::Approved,
                        None,
                        actor.user_id,
                    )
                    .await?;
                AdjustmentOutcome::AutoApplied { adjustment }
            }
            GateDecision::Queue(priority) => {
                let approval_request = self
                    .approval_repo
                    .insert_request(
                        &mut *tx,
                        actor.tenant_id,
                        ApprovalType::InventoryAdjustment,
                        serde_json::to_value(&cmd)
                            .map_err(|e| AppError::InternalServerError(e.into()))?,
                        priority,
                        actor.user_id,
                    )
                    .await?;
                // O registro nasce PENDING e o livro-razão fica intocado até
                // a decisão.
                let adjustment = self
                    .inventory_service
                    .record_adjustment_in_tx(
                        &mut *tx,
                        actor.tenant_id,
                        &cmd,
                        RecordStatus::Pending,
                        Some(approval_request.id),
                        actor.user_id,
                    )
                    .await?;
                AdjustmentOutcome::PendingApproval {
                    adjustment,
                    approval_request,
                }
            }
        };

        tx.commit().await?;
        Ok(outcome)
    }

    // --- SUBMISSÃO DE DESPERDÍCIO ---
    pub async fn submit_waste(
        &self,
        actor: &ActorContext,
        cmd: WasteCommand,
    ) -> Result<WasteOutcome, AppError> {
        let mut tx = self.pool.begin().await?;

        // Calculado UMA vez; é o custo registrado no WasteEntry e o impacto
        // que o portão classifica.
        let estimated_cost = self
            .waste_service
            .estimate_cost_in_tx(&mut *tx, actor.tenant_id, &cmd)
            .await?;

        let outcome = match classify(actor.role, estimated_cost, self.cost_threshold) {
            GateDecision::AutoApply => {
                self.waste_service
                    .execute_in_tx(&mut *tx, actor.tenant_id, actor.user_id, &cmd)
                    .await?;
                let waste_entry = self
                    .waste_service
                    .record_entry_in_tx(
                        &mut *tx,
                        actor.tenant_id,
                        &cmd,
                        estimated_cost,
                        RecordStatus::Approved,
                        None,
                        actor.user_id,
                    )
                    .await?;
                WasteOutcome::AutoApplied { waste_entry }
            }
            GateDecision::Queue(priority) => {
                let approval_request = self
                    .approval_repo
                    .insert_request(
                        &mut *tx,
                        actor.tenant_id,
                        ApprovalType::WasteEntry,
                        serde_json::to_value(&cmd)
                            .map_err(|e| AppError::InternalServerError(e.into()))?,
                        priority,
                        actor.user_id,
                    )
                    .await?;
                let waste_entry = self
                    .waste_service
                    .record_entry_in_tx(
                        &mut *tx,
                        actor.tenant_id,
                        &cmd,
                        estimated_cost,
                        RecordStatus::Pending,
                        Some(approval_request.id),
                        actor.user_id,
                    )
                    .await?;
                WasteOutcome::PendingApproval {
                    waste_entry,
                    approval_request,
                }
            }
        };

        tx.commit().await?;
        Ok(outcome)
    }

    // --- FILA ---
    pub async fn list_pending(
        &self,
        actor: &ActorContext,
    ) -> Result<Vec<ApprovalRequest>, AppError> {
        self.approval_repo
            .list_pending(&self.pool, actor.tenant_id)
            .await
    }

    // --- RESOLUÇÃO ---
    // Aprovar reexecuta o payload original pelo caminho normal de baixa, como
    // se tivesse acabado de ser submetido por um ator privilegiado; rejeitar
    // não toca o livro-razão nunca. Resolver duas vezes devolve
    // AlreadyResolved (e não muta estoque em nenhuma das chamadas).
    pub async fn resolve(
        &self,
        actor: &ActorContext,
        approval_id: Uuid,
        decision: ApprovalDecision,
    ) -> Result<ApprovalRequest, AppError> {
        let mut tx = self.pool.begin().await?;

        let request = self
            .approval_repo
            .lock_request(&mut *tx, actor.tenant_id, approval_id)
            .await?
            .ok_or(AppError::ApprovalNotFound)?;

        ensure_pending(request.status)?;

        let new_status = match decision {
            ApprovalDecision::Reject => ApprovalStatus::Rejected,
            ApprovalDecision::Approve => {
                match request.request_type {
                    ApprovalType::InventoryAdjustment => {
                        let cmd: AdjustmentCommand = serde_json::from_value(
                            request.payload.clone(),
                        )
                        .map_err(|e| AppError::InternalServerError(e.into()))?;
                        self.inventory_service
                            .mutate_for_adjustment_in_tx(&mut *tx, actor.tenant_id, &cmd)
                            .await?;
                        self.inventory_service
                            .approve_linked_adjustment_in_tx(&mut *tx, actor.tenant_id, request.id)
                            .await?;
                    }
                    ApprovalType::WasteEntry => {
                        let cmd: WasteCommand = serde_json::from_value(request.payload.clone())
                            .map_err(|e| AppError::InternalServerError(e.into()))?;
                        self.waste_service
                            .execute_in_tx(&mut *tx, actor.tenant_id, request.requested_by, &cmd)
                            .await?;
                        self.waste_repo
                            .approve_entry(&mut *tx, actor.tenant_id, request.id)
                            .await?;
                    }
                }
                ApprovalStatus::Approved
            }
        };

        let resolved = self
            .approval_repo
            .mark_resolved(&mut *tx, actor.tenant_id, approval_id, new_status, actor.user_id)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "⚖️ Pedido de aprovação {} resolvido como {:?}",
            approval_id,
            new_status
        );
        Ok(resolved)
    }
}

// ---
// Testes do portão (classificação pura)
// ---
#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn tenant_admin_always_auto_applies() {
        let decision = classify(MemberRole::TenantAdmin, dec("1000000"), dec("50"));
        assert_eq!(decision, GateDecision::AutoApply);
    }

    #[test]
    fn branch_actor_auto_applies_below_threshold() {
        let decision = classify(MemberRole::BranchManager, dec("49.99"), dec("50"));
        assert_eq!(decision, GateDecision::AutoApply);
    }

    #[test]
    fn impact_at_threshold_is_queued() {
        // O limite é estrito: impacto IGUAL ao teto já entra na fila.
        let decision = classify(MemberRole::BranchManager, dec("50"), dec("50"));
        assert_eq!(decision, GateDecision::Queue(ApprovalPriority::Medium));
    }

    #[test]
    fn seventy_five_with_fifty_threshold_is_medium() {
        // Cenário da especificação: desperdício de $75 com teto de $50.
        let decision = classify(MemberRole::BranchManager, dec("75"), dec("50"));
        assert_eq!(decision, GateDecision::Queue(ApprovalPriority::Medium));
    }

    #[test]
    fn second_resolution_sees_already_resolved() {
        // A primeira resolução passa; qualquer tentativa seguinte enxerga o
        // status já resolvido e é rejeitada sem tocar o estoque.
        assert!(ensure_pending(ApprovalStatus::Pending).is_ok());
        assert!(matches!(
            ensure_pending(ApprovalStatus::Approved),
            Err(AppError::AlreadyResolved)
        ));
        assert!(matches!(
            ensure_pending(ApprovalStatus::Rejected),
            Err(AppError::AlreadyResolved)
        ));
    }

    #[test]
    fn impact_above_twice_threshold_is_high() {
        let decision = classify(MemberRole::BranchManager, dec("100.01"), dec("50"));
        assert_eq!(decision, GateDecision::Queue(ApprovalPriority::High));

        // Exatamente 2x ainda é MEDIUM.
        let decision = classify(MemberRole::BranchManager, dec("100"), dec("50"));
        assert_eq!(decision, GateDecision::Queue(ApprovalPriority::Medium));
    }
}
