// src/services/adjustment_service.rs

use std::{collections::HashSet, sync::Arc};

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::ReceivablesStore,
    models::{
        auth::ActorContext,
        receivables::{
            check_money, AdjustmentCommand, AdjustmentLine, AdjustmentRecord, AdjustmentStatus,
            AdjustmentView, MovementKind, NewAdjustment, NewMovement, OrderBalance,
        },
    },
    services::receivables_service::require_id,
};

const MIN_OBSERVATION_CHARS: usize = 3;

#[derive(Clone)]
pub struct AdjustmentService {
    store: Arc<dyn ReceivablesStore>,
}

impl AdjustmentService {
    pub fn new(store: Arc<dyn ReceivablesStore>) -> Self {
        Self { store }
    }

    /// Aplica um ajuste manual sobre um ou mais pedidos do cliente.
    ///
    /// Os pedidos ficam travados entre a checagem de saldo e a gravação, então dois
    /// ajustes concorrentes sobre o mesmo pedido nunca consomem o mesmo saldo.
    /// Movimentos e registro entram juntos no `commit`; qualquer erro antes disso desfaz tudo.
    pub async fn apply_adjustment(
        &self,
        ctx: &ActorContext,
        command: AdjustmentCommand,
    ) -> Result<AdjustmentRecord, AppError> {
        validate_command(&command)?;

        let mut uow = self.store.begin(ctx).await?;

        let customer = uow
            .find_customer(command.customer_id)
            .await?
            .ok_or(AppError::not_found("customer", command.customer_id))?;

        let order_ids: Vec<Uuid> = command.lines.iter().map(|l| l.order_id).collect();
        let balances = uow.lock_orders(&order_ids).await?;
        check_allocation(customer.id, &command.lines, &balances)?;

        let adjustment_id = Uuid::new_v4();
        for line in &command.lines {
            uow.append_movement(line_movement(
                ctx,
                customer.id,
                adjustment_id,
                line,
                MovementKind::ManualAdjustment,
            ))
            .await?;
        }

        let record = uow
            .insert_adjustment(NewAdjustment {
                id: adjustment_id,
                tenant_id: ctx.tenant_id,
                customer_id: customer.id,
                observation: command.observation.trim().to_string(),
                is_reversal: false,
                reversal_of_id: None,
                created_by: ctx.actor_id,
                lines: command.lines,
            })
            .await?;
        uow.commit().await?;

        tracing::info!(
            tenant_id = %ctx.tenant_id,
            adjustment_id = %record.id,
            customer_id = %record.customer_id,
            total = %record.total_applied,
            lines = record.lines.len(),
            "Ajuste manual aplicado"
        );
        Ok(record)
    }

    /// Estorna um ajuste ativo, restaurando o saldo de cada pedido.
    pub async fn reverse(
        &self,
        ctx: &ActorContext,
        adjustment_id: Uuid,
    ) -> Result<AdjustmentRecord, AppError> {
        require_id("adjustmentId", adjustment_id)?;

        let mut uow = self.store.begin(ctx).await?;

        let original = uow
            .lock_adjustment(adjustment_id)
            .await?
            .ok_or(AppError::not_found("adjustment", adjustment_id))?;

        if original.is_reversal {
            return Err(AppError::Conflict("reversal_not_reversible"));
        }
        if uow.find_reversal_of(original.id).await?.is_some() {
            return Err(AppError::Conflict("adjustment_already_reversed"));
        }

        // Mesma ordem de travas do ajuste original
        let order_ids: Vec<Uuid> = original.lines.iter().map(|l| l.order_id).collect();
        uow.lock_orders(&order_ids).await?;

        let reversal = plan_reversal(&original, Uuid::new_v4(), ctx.actor_id);
        for line in &reversal.lines {
            uow.append_movement(line_movement(
                ctx,
                original.customer_id,
                reversal.id,
                line,
                MovementKind::AdjustmentReversal,
            ))
            .await?;
        }

        let record = uow.insert_adjustment(reversal).await?;
        uow.commit().await?;

        tracing::info!(
            tenant_id = %ctx.tenant_id,
            adjustment_id = %original.id,
            reversal_id = %record.id,
            total = %record.total_applied,
            "Ajuste estornado"
        );
        Ok(record)
    }

    pub async fn get_adjustment(
        &self,
        ctx: &ActorContext,
        adjustment_id: Uuid,
    ) -> Result<AdjustmentView, AppError> {
        let record = self
            .store
            .find_adjustment(ctx.tenant_id, adjustment_id)
            .await?
            .ok_or(AppError::not_found("adjustment", adjustment_id))?;

        let reversed_by_id = if record.is_reversal {
            None
        } else {
            self.store.find_reversal_of(ctx.tenant_id, record.id).await?
        };

        Ok(AdjustmentView {
            status: status_of(&record, reversed_by_id),
            reversed_by_id,
            record,
        })
    }

    /// Ajustes do cliente, mais recentes primeiro, com o status derivado.
    pub async fn list_adjustments(
        &self,
        ctx: &ActorContext,
        customer_id: Uuid,
    ) -> Result<Vec<AdjustmentView>, AppError> {
        require_id("customerId", customer_id)?;
        self.store
            .find_customer(ctx.tenant_id, customer_id)
            .await?
            .ok_or(AppError::not_found("customer", customer_id))?;

        let records = self.store.list_adjustments(ctx.tenant_id, customer_id).await?;

        // O estorno de um ajuste pertence ao mesmo cliente, então já está na lista
        let views = records
            .iter()
            .map(|record| {
                let reversed_by_id = records
                    .iter()
                    .find(|r| r.reversal_of_id == Some(record.id))
                    .map(|r| r.id);
                AdjustmentView {
                    status: status_of(record, reversed_by_id),
                    reversed_by_id,
                    record: record.clone(),
                }
            })
            .collect();
        Ok(views)
    }
}

// =============================================================================
//  REGRAS PURAS
// =============================================================================

pub fn validate_command(command: &AdjustmentCommand) -> Result<(), AppError> {
    require_id("customerId", command.customer_id)?;

    if command.observation.trim().chars().count() < MIN_OBSERVATION_CHARS {
        return Err(AppError::invalid("observation", "too_short")
            .with_param("min", MIN_OBSERVATION_CHARS));
    }
    if command.lines.is_empty() {
        return Err(AppError::invalid("lines", "lines_required"));
    }

    let mut seen = HashSet::new();
    for (i, line) in command.lines.iter().enumerate() {
        if line.order_id.is_nil() {
            return Err(AppError::invalid(format!("lines[{}].orderId", i), "missing_identifier"));
        }
        if line.amount_applied <= Decimal::ZERO {
            return Err(AppError::invalid(
                format!("lines[{}].amountApplied", i),
                "must_be_positive",
            ));
        }
        check_money(format!("lines[{}].amountApplied", i), line.amount_applied)?;
        if !seen.insert(line.order_id) {
            return Err(AppError::invalid(format!("lines[{}].orderId", i), "duplicate_order")
                .with_param("order", line.order_id));
        }
    }

    let total: Decimal = command.lines.iter().map(|l| l.amount_applied).sum();
    check_money("lines", total)?;
    Ok(())
}

/// Confere cada linha contra o saldo travado do pedido. Erros apontam a linha e o pedido.
pub fn check_allocation(
    customer_id: Uuid,
    lines: &[AdjustmentLine],
    balances: &[OrderBalance],
) -> Result<(), AppError> {
    for (i, line) in lines.iter().enumerate() {
        let balance = balances
            .iter()
            .find(|b| b.order_id == line.order_id)
            .ok_or(AppError::not_found("order", line.order_id))?;

        if balance.customer_id != customer_id {
            return Err(AppError::invalid(format!("lines[{}].orderId", i), "order_not_owned")
                .with_param("order", balance.display_id));
        }
        if balance.outstanding <= Decimal::ZERO {
            return Err(
                AppError::invalid(format!("lines[{}].orderId", i), "order_without_balance")
                    .with_param("order", balance.display_id),
            );
        }
        if line.amount_applied > balance.outstanding {
            return Err(AppError::invalid(
                format!("lines[{}].amountApplied", i),
                "amount_exceeds_outstanding",
            )
            .with_param("order", balance.display_id)
            .with_param("outstanding", balance.outstanding)
            .with_param("requested", line.amount_applied));
        }
    }
    Ok(())
}

/// Registro de estorno: mesmas linhas, valores positivos (o quanto foi restaurado).
pub fn plan_reversal(original: &AdjustmentRecord, reversal_id: Uuid, actor_id: Uuid) -> NewAdjustment {
    NewAdjustment {
        id: reversal_id,
        tenant_id: original.tenant_id,
        customer_id: original.customer_id,
        observation: format!("REVERSAL {}: {}", original.id, original.observation),
        is_reversal: true,
        reversal_of_id: Some(original.id),
        created_by: actor_id,
        lines: original.lines.clone(),
    }
}

pub fn status_of(record: &AdjustmentRecord, reversed_by_id: Option<Uuid>) -> AdjustmentStatus {
    if record.is_reversal {
        AdjustmentStatus::Reversal
    } else if reversed_by_id.is_some() {
        AdjustmentStatus::Reversed
    } else {
        AdjustmentStatus::Active
    }
}

// Ajuste reduz a dívida, estorno restaura
fn line_movement(
    ctx: &ActorContext,
    customer_id: Uuid,
    adjustment_id: Uuid,
    line: &AdjustmentLine,
    kind: MovementKind,
) -> NewMovement {
    let amount = match kind {
        MovementKind::ManualAdjustment => -line.amount_applied,
        _ => line.amount_applied,
    };
    NewMovement {
        tenant_id: ctx.tenant_id,
        customer_id,
        order_id: Some(line.order_id),
        adjustment_id: Some(adjustment_id),
        receipt_id: None,
        amount,
        kind,
        note: None,
        created_by: ctx.actor_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::MockReceivablesStore,
        models::{auth::MemberRole, operations::Order, receivables::CustomerBalance},
        services::receivables_service::ReceivablesService,
    };

    fn dec(value: i64) -> Decimal {
        Decimal::from(value)
    }

    struct Fixture {
        store: MockReceivablesStore,
        adjustments: AdjustmentService,
        receivables: ReceivablesService,
        ctx: ActorContext,
    }

    fn fixture() -> Fixture {
        let store = MockReceivablesStore::new();
        let shared: Arc<dyn ReceivablesStore> = Arc::new(store.clone());
        Fixture {
            adjustments: AdjustmentService::new(shared.clone()),
            receivables: ReceivablesService::new(shared),
            store,
            ctx: ActorContext {
                tenant_id: Uuid::new_v4(),
                actor_id: Uuid::new_v4(),
                role: MemberRole::Accountant,
            },
        }
    }

    impl Fixture {
        async fn customer_with_orders(&self, charges: &[i64]) -> (Uuid, Vec<Order>) {
            let customer = self.store.add_customer(self.ctx.tenant_id, "Ferretería").await;
            let mut orders = Vec::new();
            for amount in charges {
                let order = self
                    .store
                    .add_order(self.ctx.tenant_id, customer.id, dec(*amount))
                    .await;
                self.store.seed_charge(&order, dec(*amount)).await;
                orders.push(order);
            }
            (customer.id, orders)
        }

        async fn outstanding(&self, order: &Order) -> Decimal {
            self.receivables
                .order_balance(&self.ctx, order.id)
                .await
                .unwrap()
                .outstanding
        }
    }

    fn command(customer_id: Uuid, lines: &[(Uuid, i64)]) -> AdjustmentCommand {
        AdjustmentCommand {
            customer_id,
            observation: "goodwill".into(),
            lines: lines
                .iter()
                .map(|(order_id, amount)| AdjustmentLine {
                    order_id: *order_id,
                    amount_applied: dec(*amount),
                })
                .collect(),
        }
    }

    // --- Regras puras ---

    #[test]
    fn short_observation_is_rejected() {
        let mut cmd = command(Uuid::new_v4(), &[(Uuid::new_v4(), 10)]);
        cmd.observation = "  ok ".into();
        assert!(matches!(
            validate_command(&cmd),
            Err(AppError::InvalidInput { code: "too_short", .. })
        ));
    }

    #[test]
    fn empty_lines_are_rejected() {
        let cmd = command(Uuid::new_v4(), &[]);
        assert!(matches!(
            validate_command(&cmd),
            Err(AppError::InvalidInput { code: "lines_required", .. })
        ));
    }

    #[test]
    fn sub_cent_line_amounts_are_rejected() {
        let mut cmd = command(Uuid::new_v4(), &[(Uuid::new_v4(), 0), (Uuid::new_v4(), 0)]);
        cmd.lines[0].amount_applied = Decimal::new(5, 3);
        cmd.lines[1].amount_applied = Decimal::new(5, 3);

        match validate_command(&cmd) {
            Err(AppError::InvalidInput { field, code, .. }) => {
                assert_eq!(field, "lines[0].amountApplied");
                assert_eq!(code, "too_many_decimals");
            }
            other => panic!("esperava too_many_decimals, veio {:?}", other),
        }
    }

    #[test]
    fn total_beyond_the_column_range_is_rejected() {
        let near_limit = 9_000_000_000_000_000;
        let cmd = command(
            Uuid::new_v4(),
            &[(Uuid::new_v4(), near_limit), (Uuid::new_v4(), near_limit)],
        );
        match validate_command(&cmd) {
            Err(AppError::InvalidInput { field, code, .. }) => {
                assert_eq!(field, "lines");
                assert_eq!(code, "amount_too_large");
            }
            other => panic!("esperava amount_too_large, veio {:?}", other),
        }
    }

    #[tokio::test]
    async fn sub_cent_adjustment_writes_nothing() {
        let fx = fixture();
        let (customer_id, orders) = fx.customer_with_orders(&[100]).await;

        let mut cmd = command(customer_id, &[(orders[0].id, 0)]);
        cmd.lines[0].amount_applied = Decimal::new(4, 3);

        assert!(matches!(
            fx.adjustments.apply_adjustment(&fx.ctx, cmd).await,
            Err(AppError::InvalidInput { code: "too_many_decimals", .. })
        ));
        assert!(fx.store.adjustments().await.is_empty());
        assert_eq!(fx.outstanding(&orders[0]).await, dec(100));
    }

    #[test]
    fn non_positive_amount_names_the_line() {
        let cmd = command(Uuid::new_v4(), &[(Uuid::new_v4(), 10), (Uuid::new_v4(), 0)]);
        match validate_command(&cmd) {
            Err(AppError::InvalidInput { field, code, .. }) => {
                assert_eq!(field, "lines[1].amountApplied");
                assert_eq!(code, "must_be_positive");
            }
            other => panic!("esperava erro de validação, veio {:?}", other),
        }
    }

    #[test]
    fn repeated_order_is_rejected() {
        let order = Uuid::new_v4();
        let cmd = command(Uuid::new_v4(), &[(order, 10), (order, 5)]);
        assert!(matches!(
            validate_command(&cmd),
            Err(AppError::InvalidInput { code: "duplicate_order", .. })
        ));
    }

    #[test]
    fn allocation_above_outstanding_carries_order_and_amounts() {
        let customer = Uuid::new_v4();
        let order = Uuid::new_v4();
        let balances = vec![OrderBalance {
            order_id: order,
            customer_id: customer,
            display_id: 1024,
            outstanding: dec(500),
        }];
        let lines = vec![AdjustmentLine {
            order_id: order,
            amount_applied: dec(501),
        }];

        match check_allocation(customer, &lines, &balances) {
            Err(AppError::InvalidInput { field, code, params }) => {
                assert_eq!(field, "lines[0].amountApplied");
                assert_eq!(code, "amount_exceeds_outstanding");
                assert!(params.contains(&("order", "1024".to_string())));
                assert!(params.contains(&("outstanding", "500".to_string())));
            }
            other => panic!("esperava erro de validação, veio {:?}", other),
        }
    }

    #[test]
    fn status_follows_the_reversal_links() {
        let record = AdjustmentRecord {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            observation: "goodwill".into(),
            is_reversal: false,
            reversal_of_id: None,
            created_by: Uuid::new_v4(),
            created_at: chrono::Utc::now(),
            lines: vec![],
            total_applied: dec(1),
        };
        assert_eq!(status_of(&record, None), AdjustmentStatus::Active);
        assert_eq!(status_of(&record, Some(Uuid::new_v4())), AdjustmentStatus::Reversed);

        let plan = plan_reversal(&record, Uuid::new_v4(), Uuid::new_v4());
        assert!(plan.is_reversal);
        assert_eq!(plan.reversal_of_id, Some(record.id));
    }

    // --- Cenários completos ---

    #[tokio::test]
    async fn full_write_off_leaves_no_debt_and_reversal_restores_it() {
        let f = fixture();
        let (customer, orders) = f.customer_with_orders(&[100_000]).await;
        let order = &orders[0];

        let record = f
            .adjustments
            .apply_adjustment(&f.ctx, command(customer, &[(order.id, 100_000)]))
            .await
            .unwrap();
        assert_eq!(record.total_applied, dec(100_000));
        assert!(!record.is_reversal);
        assert_eq!(f.outstanding(order).await, Decimal::ZERO);

        let balance = f.receivables.balance_for_customer(&f.ctx, customer).await.unwrap();
        assert!(matches!(balance, CustomerBalance::NoDebt { .. }));

        let reversal = f.adjustments.reverse(&f.ctx, record.id).await.unwrap();
        assert!(reversal.is_reversal);
        assert_eq!(reversal.reversal_of_id, Some(record.id));
        assert_eq!(reversal.lines[0].amount_applied, dec(100_000));
        assert_eq!(f.outstanding(order).await, dec(100_000));
    }

    #[tokio::test]
    async fn split_adjustment_clears_both_orders() {
        let f = fixture();
        let (customer, orders) = f.customer_with_orders(&[50_000, 30_000]).await;

        let record = f
            .adjustments
            .apply_adjustment(
                &f.ctx,
                command(customer, &[(orders[0].id, 50_000), (orders[1].id, 30_000)]),
            )
            .await
            .unwrap();

        assert_eq!(record.total_applied, dec(80_000));
        assert_eq!(f.outstanding(&orders[0]).await, Decimal::ZERO);
        assert_eq!(f.outstanding(&orders[1]).await, Decimal::ZERO);

        let movements = f.store.movements().await;
        let adjustment_movements: Vec<_> = movements
            .iter()
            .filter(|m| m.adjustment_id == Some(record.id))
            .collect();
        assert_eq!(adjustment_movements.len(), 2);
        assert!(adjustment_movements
            .iter()
            .all(|m| m.kind == MovementKind::ManualAdjustment && m.amount < Decimal::ZERO));
    }

    #[tokio::test]
    async fn over_allocation_writes_nothing() {
        let f = fixture();
        let (customer, orders) = f.customer_with_orders(&[50_000, 30_000]).await;
        let before = f.store.movements().await.len();

        let result = f
            .adjustments
            .apply_adjustment(
                &f.ctx,
                command(customer, &[(orders[0].id, 10_000), (orders[1].id, 30_001)]),
            )
            .await;

        assert!(matches!(
            result,
            Err(AppError::InvalidInput { code: "amount_exceeds_outstanding", .. })
        ));
        assert_eq!(f.store.movements().await.len(), before);
        assert!(f.store.adjustments().await.is_empty());
    }

    #[tokio::test]
    async fn failure_between_movements_rolls_everything_back() {
        let f = fixture();
        let (customer, orders) = f.customer_with_orders(&[50_000, 30_000]).await;
        let before = f.store.movements().await.len();
        f.store.fail_on_movement(2).await;

        let result = f
            .adjustments
            .apply_adjustment(
                &f.ctx,
                command(customer, &[(orders[0].id, 50_000), (orders[1].id, 30_000)]),
            )
            .await;

        assert!(matches!(result, Err(AppError::Transient(_))));
        assert!(result.unwrap_err().is_retryable());
        assert_eq!(f.store.movements().await.len(), before);
        assert!(f.store.adjustments().await.is_empty());
        assert_eq!(f.outstanding(&orders[0]).await, dec(50_000));
    }

    #[tokio::test]
    async fn failed_commit_is_transient_and_invisible() {
        let f = fixture();
        let (customer, orders) = f.customer_with_orders(&[1_000]).await;
        f.store.fail_on_commit(true).await;

        let result = f
            .adjustments
            .apply_adjustment(&f.ctx, command(customer, &[(orders[0].id, 1_000)]))
            .await;

        assert!(matches!(result, Err(AppError::Transient(_))));
        assert_eq!(f.outstanding(&orders[0]).await, dec(1_000));
    }

    #[tokio::test]
    async fn reversal_cannot_be_reversed_nor_repeated() {
        let f = fixture();
        let (customer, orders) = f.customer_with_orders(&[5_000]).await;

        let record = f
            .adjustments
            .apply_adjustment(&f.ctx, command(customer, &[(orders[0].id, 2_000)]))
            .await
            .unwrap();
        let reversal = f.adjustments.reverse(&f.ctx, record.id).await.unwrap();

        assert!(matches!(
            f.adjustments.reverse(&f.ctx, reversal.id).await,
            Err(AppError::Conflict("reversal_not_reversible"))
        ));
        assert!(matches!(
            f.adjustments.reverse(&f.ctx, record.id).await,
            Err(AppError::Conflict("adjustment_already_reversed"))
        ));
        assert_eq!(f.outstanding(&orders[0]).await, dec(5_000));
    }

    #[tokio::test]
    async fn unknown_adjustment_cannot_be_reversed() {
        let f = fixture();
        assert!(matches!(
            f.adjustments.reverse(&f.ctx, Uuid::new_v4()).await,
            Err(AppError::ResourceNotFound { resource: "adjustment", .. })
        ));
    }

    #[tokio::test]
    async fn order_of_another_customer_is_rejected() {
        let f = fixture();
        let (customer, _) = f.customer_with_orders(&[100]).await;
        let (_, foreign_orders) = f.customer_with_orders(&[100]).await;

        let result = f
            .adjustments
            .apply_adjustment(&f.ctx, command(customer, &[(foreign_orders[0].id, 50)]))
            .await;

        assert!(matches!(
            result,
            Err(AppError::InvalidInput { code: "order_not_owned", .. })
        ));
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let f = fixture();
        let (customer, _) = f.customer_with_orders(&[100]).await;

        let result = f
            .adjustments
            .apply_adjustment(&f.ctx, command(customer, &[(Uuid::new_v4(), 50)]))
            .await;

        assert!(matches!(
            result,
            Err(AppError::ResourceNotFound { resource: "order", .. })
        ));
    }

    #[tokio::test]
    async fn settled_order_cannot_receive_an_adjustment() {
        let f = fixture();
        let (customer, orders) = f.customer_with_orders(&[100]).await;
        f.adjustments
            .apply_adjustment(&f.ctx, command(customer, &[(orders[0].id, 100)]))
            .await
            .unwrap();

        let result = f
            .adjustments
            .apply_adjustment(&f.ctx, command(customer, &[(orders[0].id, 1)]))
            .await;

        assert!(matches!(
            result,
            Err(AppError::InvalidInput { code: "order_without_balance", .. })
        ));
    }

    #[tokio::test]
    async fn concurrent_adjustments_cannot_over_allocate() {
        let f = fixture();
        let (customer, orders) = f.customer_with_orders(&[100]).await;

        let first = f.adjustments.clone();
        let second = f.adjustments.clone();
        let (a, b) = tokio::join!(
            first.apply_adjustment(&f.ctx, command(customer, &[(orders[0].id, 70)])),
            second.apply_adjustment(&f.ctx, command(customer, &[(orders[0].id, 70)])),
        );

        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
        assert_eq!(f.outstanding(&orders[0]).await, dec(30));
    }

    #[tokio::test]
    async fn adjustment_history_shows_derived_status() {
        let f = fixture();
        let (customer, orders) = f.customer_with_orders(&[1_000, 2_000]).await;

        let kept = f
            .adjustments
            .apply_adjustment(&f.ctx, command(customer, &[(orders[0].id, 100)]))
            .await
            .unwrap();
        let undone = f
            .adjustments
            .apply_adjustment(&f.ctx, command(customer, &[(orders[1].id, 200)]))
            .await
            .unwrap();
        let reversal = f.adjustments.reverse(&f.ctx, undone.id).await.unwrap();

        let history = f.adjustments.list_adjustments(&f.ctx, customer).await.unwrap();
        assert_eq!(history.len(), 3);
        let status = |id: Uuid| history.iter().find(|v| v.record.id == id).unwrap().status;
        assert_eq!(status(kept.id), AdjustmentStatus::Active);
        assert_eq!(status(undone.id), AdjustmentStatus::Reversed);
        assert_eq!(status(reversal.id), AdjustmentStatus::Reversal);

        let view = f.adjustments.get_adjustment(&f.ctx, undone.id).await.unwrap();
        assert_eq!(view.reversed_by_id, Some(reversal.id));
    }
}
