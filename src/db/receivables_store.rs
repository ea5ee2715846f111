// src/db/receivables_store.rs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    common::{db_utils::begin_tenant_tx, error::AppError},
    db::{AdjustmentRepository, CrmRepository, LedgerRepository, OperationsRepository},
    models::{
        auth::ActorContext,
        crm::Customer,
        operations::Order,
        receivables::{
            AdjustmentRecord, CustomerDebt, KindTotal, LedgerMovement, MovementDetail,
            MovementFilter, NewAdjustment, NewMovement, NewReceipt, OrderBalance, PaymentReceipt,
        },
    },
};

/// Acesso à cartera de uma loja.
///
/// As leituras são independentes e sempre recalculadas a partir dos movimentos.
/// Escritas passam por um [`LedgerUnitOfWork`] aberto com [`ReceivablesStore::begin`]:
/// ou tudo é confirmado no `commit`, ou nada fica visível.
///
/// Implementações:
/// - `PgReceivablesStore`: PostgreSQL (produção)
/// - `MockReceivablesStore`: memória, com injeção de falhas (testes)
#[async_trait]
pub trait ReceivablesStore: Send + Sync {
    /// Abre uma unidade de trabalho escopada à loja do ator.
    async fn begin(&self, ctx: &ActorContext) -> Result<Box<dyn LedgerUnitOfWork>, AppError>;

    async fn find_customer(
        &self,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Option<Customer>, AppError>;

    /// Soma assinada de todos os movimentos do cliente (0 se não houver nenhum).
    async fn sum_by_customer(&self, tenant_id: Uuid, customer_id: Uuid) -> Result<Decimal, AppError>;

    /// Saldo de um pedido; `None` se o pedido não existe na loja.
    async fn order_balance(
        &self,
        tenant_id: Uuid,
        order_id: Uuid,
    ) -> Result<Option<OrderBalance>, AppError>;

    /// Saldos agrupados por cliente, sem ordem definida.
    async fn customer_totals(&self, tenant_id: Uuid) -> Result<Vec<CustomerDebt>, AppError>;

    async fn open_orders(
        &self,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Vec<OrderBalance>, AppError>;

    /// Histórico em ordem cronológica.
    async fn list_movements(
        &self,
        tenant_id: Uuid,
        customer_id: Uuid,
        filter: &MovementFilter,
    ) -> Result<Vec<MovementDetail>, AppError>;

    async fn find_adjustment(
        &self,
        tenant_id: Uuid,
        adjustment_id: Uuid,
    ) -> Result<Option<AdjustmentRecord>, AppError>;

    async fn find_reversal_of(
        &self,
        tenant_id: Uuid,
        original_id: Uuid,
    ) -> Result<Option<Uuid>, AppError>;

    async fn list_adjustments(
        &self,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Vec<AdjustmentRecord>, AppError>;

    async fn kind_totals_since(
        &self,
        tenant_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<KindTotal>, AppError>;
}

/// Transação de escrita da cartera. Descartar sem `commit` desfaz tudo.
#[async_trait]
pub trait LedgerUnitOfWork: Send {
    async fn find_customer(&mut self, customer_id: Uuid) -> Result<Option<Customer>, AppError>;

    async fn find_order(&mut self, order_id: Uuid) -> Result<Option<Order>, AppError>;

    /// Trava os pedidos até o fim da transação e devolve o saldo atual de cada um.
    /// Pedidos inexistentes na loja simplesmente não aparecem.
    async fn lock_orders(&mut self, order_ids: &[Uuid]) -> Result<Vec<OrderBalance>, AppError>;

    async fn lock_adjustment(
        &mut self,
        adjustment_id: Uuid,
    ) -> Result<Option<AdjustmentRecord>, AppError>;

    async fn find_reversal_of(&mut self, original_id: Uuid) -> Result<Option<Uuid>, AppError>;

    async fn append_movement(&mut self, movement: NewMovement) -> Result<LedgerMovement, AppError>;

    async fn insert_adjustment(
        &mut self,
        adjustment: NewAdjustment,
    ) -> Result<AdjustmentRecord, AppError>;

    async fn insert_receipt(&mut self, receipt: NewReceipt) -> Result<PaymentReceipt, AppError>;

    async fn commit(self: Box<Self>) -> Result<(), AppError>;
}

// Regras de escopo comuns às implementações
pub(crate) fn check_movement_scope(tenant_id: Uuid, movement: &NewMovement) -> Result<(), AppError> {
    if movement.tenant_id != tenant_id {
        return Err(AppError::invalid("tenantId", "tenant_mismatch"));
    }
    movement.check()
}

// =============================================================================
//  POSTGRES
// =============================================================================

#[derive(Clone)]
pub struct PgReceivablesStore {
    pool: PgPool,
    tx_timeout_ms: u64,
    ledger: LedgerRepository,
    adjustments: AdjustmentRepository,
    crm: CrmRepository,
    operations: OperationsRepository,
}

impl PgReceivablesStore {
    pub fn new(pool: PgPool, tx_timeout_ms: u64) -> Self {
        Self {
            pool,
            tx_timeout_ms,
            ledger: LedgerRepository::new(),
            adjustments: AdjustmentRepository::new(),
            crm: CrmRepository::new(),
            operations: OperationsRepository::new(),
        }
    }

    async fn read_tx(&self, tenant_id: Uuid) -> Result<Transaction<'static, Postgres>, AppError> {
        begin_tenant_tx(&self.pool, tenant_id, None, self.tx_timeout_ms).await
    }
}

#[async_trait]
impl ReceivablesStore for PgReceivablesStore {
    async fn begin(&self, ctx: &ActorContext) -> Result<Box<dyn LedgerUnitOfWork>, AppError> {
        let tx = begin_tenant_tx(&self.pool, ctx.tenant_id, Some(ctx.actor_id), self.tx_timeout_ms)
            .await?;

        Ok(Box::new(PgUnitOfWork {
            tx,
            tenant_id: ctx.tenant_id,
            ledger: self.ledger.clone(),
            adjustments: self.adjustments.clone(),
            crm: self.crm.clone(),
            operations: self.operations.clone(),
        }))
    }

    async fn find_customer(
        &self,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Option<Customer>, AppError> {
        let mut tx = self.read_tx(tenant_id).await?;
        let customer = self.crm.find_customer(&mut *tx, tenant_id, customer_id).await?;
        tx.commit().await?;
        Ok(customer)
    }

    async fn sum_by_customer(&self, tenant_id: Uuid, customer_id: Uuid) -> Result<Decimal, AppError> {
        let mut tx = self.read_tx(tenant_id).await?;
        let total = self.ledger.sum_by_customer(&mut *tx, tenant_id, customer_id).await?;
        tx.commit().await?;
        Ok(total)
    }

    async fn order_balance(
        &self,
        tenant_id: Uuid,
        order_id: Uuid,
    ) -> Result<Option<OrderBalance>, AppError> {
        let mut tx = self.read_tx(tenant_id).await?;

        let Some(order) = self.operations.find_order(&mut *tx, tenant_id, order_id).await? else {
            return Ok(None);
        };
        let sums = self.ledger.order_sums(&mut *tx, tenant_id, &[order_id]).await?;
        tx.commit().await?;

        let outstanding = sums.first().map(|(_, s)| *s).unwrap_or(Decimal::ZERO);
        Ok(Some(OrderBalance {
            order_id: order.id,
            customer_id: order.customer_id,
            display_id: order.display_id,
            outstanding,
        }))
    }

    async fn customer_totals(&self, tenant_id: Uuid) -> Result<Vec<CustomerDebt>, AppError> {
        let mut tx = self.read_tx(tenant_id).await?;
        let totals = self.ledger.customer_totals(&mut *tx, tenant_id).await?;
        tx.commit().await?;
        Ok(totals)
    }

    async fn open_orders(
        &self,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Vec<OrderBalance>, AppError> {
        let mut tx = self.read_tx(tenant_id).await?;
        let orders = self.ledger.open_orders(&mut *tx, tenant_id, customer_id).await?;
        tx.commit().await?;
        Ok(orders)
    }

    async fn list_movements(
        &self,
        tenant_id: Uuid,
        customer_id: Uuid,
        filter: &MovementFilter,
    ) -> Result<Vec<MovementDetail>, AppError> {
        let mut tx = self.read_tx(tenant_id).await?;
        let movements = self
            .ledger
            .list_movements(&mut *tx, tenant_id, customer_id, filter)
            .await?;
        tx.commit().await?;
        Ok(movements)
    }

    async fn find_adjustment(
        &self,
        tenant_id: Uuid,
        adjustment_id: Uuid,
    ) -> Result<Option<AdjustmentRecord>, AppError> {
        let mut tx = self.read_tx(tenant_id).await?;
        let record = self
            .adjustments
            .find_adjustment(&mut tx, tenant_id, adjustment_id, false)
            .await?;
        tx.commit().await?;
        Ok(record)
    }

    async fn find_reversal_of(
        &self,
        tenant_id: Uuid,
        original_id: Uuid,
    ) -> Result<Option<Uuid>, AppError> {
        let mut tx = self.read_tx(tenant_id).await?;
        let reversal = self
            .adjustments
            .find_reversal_of(&mut *tx, tenant_id, original_id)
            .await?;
        tx.commit().await?;
        Ok(reversal)
    }

    async fn list_adjustments(
        &self,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Vec<AdjustmentRecord>, AppError> {
        let mut tx = self.read_tx(tenant_id).await?;
        let records = self
            .adjustments
            .list_by_customer(&mut tx, tenant_id, customer_id)
            .await?;
        tx.commit().await?;
        Ok(records)
    }

    async fn kind_totals_since(
        &self,
        tenant_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<KindTotal>, AppError> {
        let mut tx = self.read_tx(tenant_id).await?;
        let totals = self.ledger.kind_totals_since(&mut *tx, tenant_id, since).await?;
        tx.commit().await?;
        Ok(totals)
    }
}

pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
    tenant_id: Uuid,
    ledger: LedgerRepository,
    adjustments: AdjustmentRepository,
    crm: CrmRepository,
    operations: OperationsRepository,
}

#[async_trait]
impl LedgerUnitOfWork for PgUnitOfWork {
    async fn find_customer(&mut self, customer_id: Uuid) -> Result<Option<Customer>, AppError> {
        self.crm
            .find_customer(&mut *self.tx, self.tenant_id, customer_id)
            .await
    }

    async fn find_order(&mut self, order_id: Uuid) -> Result<Option<Order>, AppError> {
        self.operations
            .find_order(&mut *self.tx, self.tenant_id, order_id)
            .await
    }

    async fn lock_orders(&mut self, order_ids: &[Uuid]) -> Result<Vec<OrderBalance>, AppError> {
        let orders = self
            .operations
            .lock_orders(&mut *self.tx, self.tenant_id, order_ids)
            .await?;

        // Soma depois do lock: nenhum outro escritor altera esses pedidos até o commit
        let locked_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let sums: HashMap<Uuid, Decimal> = self
            .ledger
            .order_sums(&mut *self.tx, self.tenant_id, &locked_ids)
            .await?
            .into_iter()
            .collect();

        Ok(orders
            .into_iter()
            .map(|o| OrderBalance {
                outstanding: sums.get(&o.id).copied().unwrap_or(Decimal::ZERO),
                order_id: o.id,
                customer_id: o.customer_id,
                display_id: o.display_id,
            })
            .collect())
    }

    async fn lock_adjustment(
        &mut self,
        adjustment_id: Uuid,
    ) -> Result<Option<AdjustmentRecord>, AppError> {
        self.adjustments
            .find_adjustment(&mut self.tx, self.tenant_id, adjustment_id, true)
            .await
    }

    async fn find_reversal_of(&mut self, original_id: Uuid) -> Result<Option<Uuid>, AppError> {
        self.adjustments
            .find_reversal_of(&mut *self.tx, self.tenant_id, original_id)
            .await
    }

    async fn append_movement(&mut self, movement: NewMovement) -> Result<LedgerMovement, AppError> {
        check_movement_scope(self.tenant_id, &movement)?;
        self.ledger.append_movement(&mut *self.tx, &movement).await
    }

    async fn insert_adjustment(
        &mut self,
        adjustment: NewAdjustment,
    ) -> Result<AdjustmentRecord, AppError> {
        if adjustment.tenant_id != self.tenant_id {
            return Err(AppError::invalid("tenantId", "tenant_mismatch"));
        }
        self.adjustments.insert_adjustment(&mut self.tx, &adjustment).await
    }

    async fn insert_receipt(&mut self, receipt: NewReceipt) -> Result<PaymentReceipt, AppError> {
        if receipt.tenant_id != self.tenant_id {
            return Err(AppError::invalid("tenantId", "tenant_mismatch"));
        }
        self.ledger.insert_receipt(&mut self.tx, &receipt).await
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        self.tx.commit().await?;
        Ok(())
    }
}
