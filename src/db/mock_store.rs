// src/db/mock_store.rs

//! Cartera em memória para testes.
//!
//! Um único `Mutex` protege todo o estado: a unidade de trabalho segura o guard
//! do `begin` ao `commit`, o que serializa escritores como o `FOR UPDATE` do Postgres.
//! As escritas ficam em área de preparo e só entram no estado no `commit`.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        operations_repo::FIRST_DISPLAY_ID,
        receivables_store::{check_movement_scope, LedgerUnitOfWork, ReceivablesStore},
    },
    models::{
        auth::ActorContext,
        crm::Customer,
        operations::Order,
        receivables::{
            AdjustmentRecord, CustomerDebt, KindTotal, LedgerMovement, MovementDetail,
            MovementFilter, MovementKind, NewAdjustment, NewMovement, NewReceipt, OrderBalance,
            PaymentReceipt,
        },
    },
};

#[derive(Default)]
struct MockState {
    customers: HashMap<Uuid, Customer>,
    orders: HashMap<Uuid, Order>,
    movements: Vec<LedgerMovement>,
    adjustments: Vec<AdjustmentRecord>,
    receipts: Vec<PaymentReceipt>,
    // Falha no N-ésimo lançamento (1 = primeiro) de cada unidade de trabalho
    fail_on_movement: Option<usize>,
    fail_on_commit: bool,
}

impl MockState {
    fn order_outstanding<'a>(
        &'a self,
        order_id: Uuid,
        staged: impl Iterator<Item = &'a LedgerMovement>,
    ) -> Decimal {
        self.movements
            .iter()
            .chain(staged)
            .filter(|m| m.order_id == Some(order_id))
            .map(|m| m.amount)
            .sum()
    }
}

#[derive(Clone, Default)]
pub struct MockReceivablesStore {
    state: Arc<Mutex<MockState>>,
}

impl MockReceivablesStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_customer(&self, tenant_id: Uuid, full_name: &str) -> Customer {
        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4(),
            tenant_id,
            full_name: full_name.to_string(),
            legal_name: None,
            document_number: None,
            city: None,
            email: None,
            phone: None,
            created_at: now,
            updated_at: now,
        };
        self.state
            .lock()
            .await
            .customers
            .insert(customer.id, customer.clone());
        customer
    }

    pub async fn add_order(&self, tenant_id: Uuid, customer_id: Uuid, total: Decimal) -> Order {
        let mut state = self.state.lock().await;
        // Numeração por loja, como no Postgres
        let last = state
            .orders
            .values()
            .filter(|o| o.tenant_id == tenant_id)
            .map(|o| o.display_id)
            .max()
            .unwrap_or(FIRST_DISPLAY_ID - 1);
        let order = Order {
            id: Uuid::new_v4(),
            tenant_id,
            customer_id,
            display_id: last + 1,
            total_amount: total,
            notes: None,
            created_by: Uuid::nil(),
            created_at: Utc::now(),
        };
        state.orders.insert(order.id, order.clone());
        order
    }

    /// Lança uma venda a prazo direto no estado, sem passar pelo serviço.
    pub async fn seed_charge(&self, order: &Order, amount: Decimal) {
        let movement = LedgerMovement {
            id: Uuid::new_v4(),
            tenant_id: order.tenant_id,
            customer_id: order.customer_id,
            order_id: Some(order.id),
            adjustment_id: None,
            receipt_id: None,
            amount,
            kind: MovementKind::SaleCharge,
            note: None,
            created_by: Uuid::nil(),
            created_at: Utc::now(),
        };
        self.state.lock().await.movements.push(movement);
    }

    pub async fn fail_on_movement(&self, nth: usize) {
        self.state.lock().await.fail_on_movement = Some(nth);
    }

    pub async fn fail_on_commit(&self, fail: bool) {
        self.state.lock().await.fail_on_commit = fail;
    }

    pub async fn movements(&self) -> Vec<LedgerMovement> {
        self.state.lock().await.movements.clone()
    }

    pub async fn adjustments(&self) -> Vec<AdjustmentRecord> {
        self.state.lock().await.adjustments.clone()
    }

    pub async fn receipts(&self) -> Vec<PaymentReceipt> {
        self.state.lock().await.receipts.clone()
    }
}

#[async_trait]
impl ReceivablesStore for MockReceivablesStore {
    async fn begin(&self, ctx: &ActorContext) -> Result<Box<dyn LedgerUnitOfWork>, AppError> {
        let guard = self.state.clone().lock_owned().await;
        Ok(Box::new(MockUnitOfWork {
            state: guard,
            tenant_id: ctx.tenant_id,
            movements: Vec::new(),
            adjustments: Vec::new(),
            receipts: Vec::new(),
            appended: 0,
        }))
    }

    async fn find_customer(
        &self,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Option<Customer>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .customers
            .get(&customer_id)
            .filter(|c| c.tenant_id == tenant_id)
            .cloned())
    }

    async fn sum_by_customer(&self, tenant_id: Uuid, customer_id: Uuid) -> Result<Decimal, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .movements
            .iter()
            .filter(|m| m.tenant_id == tenant_id && m.customer_id == customer_id)
            .map(|m| m.amount)
            .sum())
    }

    async fn order_balance(
        &self,
        tenant_id: Uuid,
        order_id: Uuid,
    ) -> Result<Option<OrderBalance>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .orders
            .get(&order_id)
            .filter(|o| o.tenant_id == tenant_id)
            .map(|o| OrderBalance {
                order_id: o.id,
                customer_id: o.customer_id,
                display_id: o.display_id,
                outstanding: state.order_outstanding(o.id, std::iter::empty()),
            }))
    }

    async fn customer_totals(&self, tenant_id: Uuid) -> Result<Vec<CustomerDebt>, AppError> {
        let state = self.state.lock().await;

        let mut sums: HashMap<Uuid, Decimal> = HashMap::new();
        for m in state.movements.iter().filter(|m| m.tenant_id == tenant_id) {
            *sums.entry(m.customer_id).or_default() += m.amount;
        }

        Ok(sums
            .into_iter()
            .filter(|(_, total)| *total > Decimal::ZERO)
            .filter_map(|(customer_id, outstanding)| {
                state.customers.get(&customer_id).map(|c| CustomerDebt {
                    customer_id,
                    display_name: c.full_name.clone(),
                    legal_name: c.legal_name.clone(),
                    tax_id: c.document_number.clone(),
                    city: c.city.clone(),
                    outstanding,
                })
            })
            .collect())
    }

    async fn open_orders(
        &self,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Vec<OrderBalance>, AppError> {
        let state = self.state.lock().await;

        let mut open: Vec<OrderBalance> = state
            .orders
            .values()
            .filter(|o| o.tenant_id == tenant_id && o.customer_id == customer_id)
            .map(|o| OrderBalance {
                order_id: o.id,
                customer_id: o.customer_id,
                display_id: o.display_id,
                outstanding: state.order_outstanding(o.id, std::iter::empty()),
            })
            .filter(|b| b.outstanding > Decimal::ZERO)
            .collect();
        open.sort_by_key(|b| b.display_id);
        Ok(open)
    }

    async fn list_movements(
        &self,
        tenant_id: Uuid,
        customer_id: Uuid,
        filter: &MovementFilter,
    ) -> Result<Vec<MovementDetail>, AppError> {
        let state = self.state.lock().await;

        Ok(state
            .movements
            .iter()
            .filter(|m| m.tenant_id == tenant_id && m.customer_id == customer_id)
            .filter(|m| filter.matches(m))
            .map(|m| {
                let receipt = m
                    .receipt_id
                    .and_then(|id| state.receipts.iter().find(|r| r.id == id));
                MovementDetail {
                    movement: m.clone(),
                    order_display_id: m
                        .order_id
                        .and_then(|id| state.orders.get(&id))
                        .map(|o| o.display_id),
                    receipt_number: receipt.map(|r| r.receipt_number),
                    payment_method: receipt.map(|r| r.payment_method),
                    adjustment_observation: m
                        .adjustment_id
                        .and_then(|id| state.adjustments.iter().find(|a| a.id == id))
                        .map(|a| a.observation.clone()),
                }
            })
            .collect())
    }

    async fn find_adjustment(
        &self,
        tenant_id: Uuid,
        adjustment_id: Uuid,
    ) -> Result<Option<AdjustmentRecord>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .adjustments
            .iter()
            .find(|a| a.tenant_id == tenant_id && a.id == adjustment_id)
            .cloned())
    }

    async fn find_reversal_of(
        &self,
        tenant_id: Uuid,
        original_id: Uuid,
    ) -> Result<Option<Uuid>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .adjustments
            .iter()
            .find(|a| a.tenant_id == tenant_id && a.reversal_of_id == Some(original_id))
            .map(|a| a.id))
    }

    async fn list_adjustments(
        &self,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Vec<AdjustmentRecord>, AppError> {
        let state = self.state.lock().await;
        // Mais recentes primeiro
        Ok(state
            .adjustments
            .iter()
            .rev()
            .filter(|a| a.tenant_id == tenant_id && a.customer_id == customer_id)
            .cloned()
            .collect())
    }

    async fn kind_totals_since(
        &self,
        tenant_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<KindTotal>, AppError> {
        let state = self.state.lock().await;

        let mut totals: HashMap<MovementKind, Decimal> = HashMap::new();
        for m in state
            .movements
            .iter()
            .filter(|m| m.tenant_id == tenant_id && m.created_at >= since)
        {
            *totals.entry(m.kind).or_default() += m.amount;
        }

        Ok(totals
            .into_iter()
            .map(|(kind, total)| KindTotal { kind, total })
            .collect())
    }
}

pub struct MockUnitOfWork {
    state: OwnedMutexGuard<MockState>,
    tenant_id: Uuid,
    movements: Vec<LedgerMovement>,
    adjustments: Vec<AdjustmentRecord>,
    receipts: Vec<PaymentReceipt>,
    appended: usize,
}

#[async_trait]
impl LedgerUnitOfWork for MockUnitOfWork {
    async fn find_customer(&mut self, customer_id: Uuid) -> Result<Option<Customer>, AppError> {
        Ok(self
            .state
            .customers
            .get(&customer_id)
            .filter(|c| c.tenant_id == self.tenant_id)
            .cloned())
    }

    async fn find_order(&mut self, order_id: Uuid) -> Result<Option<Order>, AppError> {
        Ok(self
            .state
            .orders
            .get(&order_id)
            .filter(|o| o.tenant_id == self.tenant_id)
            .cloned())
    }

    async fn lock_orders(&mut self, order_ids: &[Uuid]) -> Result<Vec<OrderBalance>, AppError> {
        let mut locked: Vec<OrderBalance> = order_ids
            .iter()
            .filter_map(|id| self.state.orders.get(id))
            .filter(|o| o.tenant_id == self.tenant_id)
            .map(|o| OrderBalance {
                order_id: o.id,
                customer_id: o.customer_id,
                display_id: o.display_id,
                outstanding: self.state.order_outstanding(o.id, self.movements.iter()),
            })
            .collect();
        locked.sort_by_key(|b| b.order_id);
        locked.dedup_by_key(|b| b.order_id);
        Ok(locked)
    }

    async fn lock_adjustment(
        &mut self,
        adjustment_id: Uuid,
    ) -> Result<Option<AdjustmentRecord>, AppError> {
        Ok(self
            .state
            .adjustments
            .iter()
            .chain(self.adjustments.iter())
            .find(|a| a.tenant_id == self.tenant_id && a.id == adjustment_id)
            .cloned())
    }

    async fn find_reversal_of(&mut self, original_id: Uuid) -> Result<Option<Uuid>, AppError> {
        Ok(self
            .state
            .adjustments
            .iter()
            .chain(self.adjustments.iter())
            .find(|a| a.tenant_id == self.tenant_id && a.reversal_of_id == Some(original_id))
            .map(|a| a.id))
    }

    async fn append_movement(&mut self, movement: NewMovement) -> Result<LedgerMovement, AppError> {
        self.appended += 1;
        if self.state.fail_on_movement == Some(self.appended) {
            return Err(AppError::Transient("falha injetada no lançamento".into()));
        }
        check_movement_scope(self.tenant_id, &movement)?;

        let created = LedgerMovement {
            id: Uuid::new_v4(),
            tenant_id: movement.tenant_id,
            customer_id: movement.customer_id,
            order_id: movement.order_id,
            adjustment_id: movement.adjustment_id,
            receipt_id: movement.receipt_id,
            amount: movement.amount,
            kind: movement.kind,
            note: movement.note,
            created_by: movement.created_by,
            created_at: Utc::now(),
        };
        self.movements.push(created.clone());
        Ok(created)
    }

    async fn insert_adjustment(
        &mut self,
        adjustment: NewAdjustment,
    ) -> Result<AdjustmentRecord, AppError> {
        if adjustment.tenant_id != self.tenant_id {
            return Err(AppError::invalid("tenantId", "tenant_mismatch"));
        }
        // Mesmo efeito do índice único parcial em reversal_of_id
        if let Some(original) = adjustment.reversal_of_id {
            let taken = self
                .state
                .adjustments
                .iter()
                .chain(self.adjustments.iter())
                .any(|a| a.reversal_of_id == Some(original));
            if taken {
                return Err(AppError::Conflict("duplicate_record"));
            }
        }

        let record = AdjustmentRecord {
            total_applied: adjustment.total_applied(),
            id: adjustment.id,
            tenant_id: adjustment.tenant_id,
            customer_id: adjustment.customer_id,
            observation: adjustment.observation,
            is_reversal: adjustment.is_reversal,
            reversal_of_id: adjustment.reversal_of_id,
            created_by: adjustment.created_by,
            created_at: Utc::now(),
            lines: adjustment.lines,
        };
        self.adjustments.push(record.clone());
        Ok(record)
    }

    async fn insert_receipt(&mut self, receipt: NewReceipt) -> Result<PaymentReceipt, AppError> {
        if receipt.tenant_id != self.tenant_id {
            return Err(AppError::invalid("tenantId", "tenant_mismatch"));
        }
        let last = self
            .state
            .receipts
            .iter()
            .chain(self.receipts.iter())
            .filter(|r| r.tenant_id == receipt.tenant_id)
            .map(|r| r.receipt_number)
            .max()
            .unwrap_or(0);

        let created = PaymentReceipt {
            id: Uuid::new_v4(),
            tenant_id: receipt.tenant_id,
            customer_id: receipt.customer_id,
            order_id: receipt.order_id,
            receipt_number: last + 1,
            amount: receipt.amount,
            payment_method: receipt.payment_method,
            reference: receipt.reference,
            note: receipt.note,
            created_by: receipt.created_by,
            created_at: Utc::now(),
        };
        self.receipts.push(created.clone());
        Ok(created)
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let MockUnitOfWork {
            mut state,
            movements,
            adjustments,
            receipts,
            ..
        } = *self;

        if state.fail_on_commit {
            return Err(AppError::Transient("falha injetada no commit".into()));
        }
        state.movements.extend(movements);
        state.adjustments.extend(adjustments);
        state.receipts.extend(receipts);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn order_numbers_restart_for_each_tenant() {
        let store = MockReceivablesStore::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let ca = store.add_customer(a, "A").await;
        let cb = store.add_customer(b, "B").await;

        let first_a = store.add_order(a, ca.id, Decimal::ONE).await;
        let second_a = store.add_order(a, ca.id, Decimal::ONE).await;
        let first_b = store.add_order(b, cb.id, Decimal::ONE).await;

        assert_eq!(first_a.display_id, FIRST_DISPLAY_ID);
        assert_eq!(second_a.display_id, FIRST_DISPLAY_ID + 1);
        assert_eq!(first_b.display_id, FIRST_DISPLAY_ID);
    }
}
