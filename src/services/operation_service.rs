// src/services/operation_service.rs

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{db_utils::begin_tenant_tx, error::AppError},
    db::OperationsRepository,
    models::{auth::ActorContext, operations::Order, receivables::check_money},
};

#[derive(Clone)]
pub struct OperationsService {
    repo: OperationsRepository,
    pool: PgPool,
    tx_timeout_ms: u64,
}

impl OperationsService {
    pub fn new(repo: OperationsRepository, pool: PgPool, tx_timeout_ms: u64) -> Self {
        Self {
            repo,
            pool,
            tx_timeout_ms,
        }
    }

    // --- PEDIDOS ---

    /// Cria o pedido. A dívida só nasce quando a venda a prazo é lançada na cartera.
    pub async fn create_order(
        &self,
        ctx: &ActorContext,
        customer_id: Uuid,
        total_amount: Decimal,
        notes: Option<&str>,
    ) -> Result<Order, AppError> {
        check_total(total_amount)?;

        let mut tx =
            begin_tenant_tx(&self.pool, ctx.tenant_id, Some(ctx.actor_id), self.tx_timeout_ms)
                .await?;
        let order = self
            .repo
            .create_order(
                &mut *tx,
                ctx.tenant_id,
                customer_id,
                total_amount,
                notes.map(str::trim).filter(|n| !n.is_empty()),
                ctx.actor_id,
            )
            .await?;
        tx.commit().await?;

        tracing::info!(
            tenant_id = %ctx.tenant_id,
            order_id = %order.id,
            display_id = order.display_id,
            "Pedido criado"
        );
        Ok(order)
    }

    pub async fn get_order(&self, ctx: &ActorContext, order_id: Uuid) -> Result<Order, AppError> {
        let mut tx = begin_tenant_tx(&self.pool, ctx.tenant_id, None, self.tx_timeout_ms).await?;
        let order = self.repo.find_order(&mut *tx, ctx.tenant_id, order_id).await?;
        tx.commit().await?;

        order.ok_or(AppError::not_found("order", order_id))
    }
}

fn check_total(total_amount: Decimal) -> Result<(), AppError> {
    if total_amount < Decimal::ZERO {
        return Err(AppError::invalid("totalAmount", "must_not_be_negative"));
    }
    check_money("totalAmount", total_amount)
}
