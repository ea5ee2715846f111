// src/services/receivables_service.rs

use std::{cmp::Ordering, sync::Arc};

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::ReceivablesStore,
    models::{
        auth::ActorContext,
        crm::Customer,
        receivables::{
            check_money, CustomerBalance, CustomerDebt, LedgerMovement, MovementDetail,
            MovementFilter, MovementKind, NewMovement, NewReceipt, OrderBalance, PaymentCommand,
            PaymentRecorded,
        },
    },
};

#[derive(Clone)]
pub struct ReceivablesService {
    store: Arc<dyn ReceivablesStore>,
}

impl ReceivablesService {
    pub fn new(store: Arc<dyn ReceivablesStore>) -> Self {
        Self { store }
    }

    // =========================================================================
    //  CONSULTAS (sempre recalculadas a partir dos movimentos)
    // =========================================================================

    /// Clientes com saldo estritamente positivo, ordenados pelo nome.
    pub async fn customers_with_debt(&self, ctx: &ActorContext) -> Result<Vec<CustomerDebt>, AppError> {
        let debts = self.store.customer_totals(ctx.tenant_id).await?;
        Ok(sort_debtors(
            debts
                .into_iter()
                .filter(|d| d.outstanding > Decimal::ZERO)
                .collect(),
        ))
    }

    pub async fn balance_for_customer(
        &self,
        ctx: &ActorContext,
        customer_id: Uuid,
    ) -> Result<CustomerBalance, AppError> {
        let customer = self.require_customer(ctx, customer_id).await?;
        let outstanding = self.store.sum_by_customer(ctx.tenant_id, customer.id).await?;
        Ok(CustomerBalance::from_outstanding(customer, outstanding))
    }

    pub async fn movements_for_customer(
        &self,
        ctx: &ActorContext,
        customer_id: Uuid,
        filter: &MovementFilter,
    ) -> Result<Vec<MovementDetail>, AppError> {
        filter.check()?;
        let customer = self.require_customer(ctx, customer_id).await?;
        self.store
            .list_movements(ctx.tenant_id, customer.id, filter)
            .await
    }

    /// Pedidos do cliente que ainda podem receber um ajuste.
    pub async fn open_orders(
        &self,
        ctx: &ActorContext,
        customer_id: Uuid,
    ) -> Result<Vec<OrderBalance>, AppError> {
        let customer = self.require_customer(ctx, customer_id).await?;
        self.store.open_orders(ctx.tenant_id, customer.id).await
    }

    pub async fn order_balance(
        &self,
        ctx: &ActorContext,
        order_id: Uuid,
    ) -> Result<OrderBalance, AppError> {
        require_id("orderId", order_id)?;
        self.store
            .order_balance(ctx.tenant_id, order_id)
            .await?
            .ok_or(AppError::not_found("order", order_id))
    }

    // =========================================================================
    //  LANÇAMENTOS
    // =========================================================================

    /// Venda a prazo. Sem valor explícito, lança o total do pedido.
    pub async fn record_charge(
        &self,
        ctx: &ActorContext,
        order_id: Uuid,
        amount: Option<Decimal>,
        note: Option<String>,
    ) -> Result<LedgerMovement, AppError> {
        require_id("orderId", order_id)?;

        let mut uow = self.store.begin(ctx).await?;

        let order = uow
            .find_order(order_id)
            .await?
            .ok_or(AppError::not_found("order", order_id))?;

        let amount = amount.unwrap_or(order.total_amount);
        if amount <= Decimal::ZERO {
            return Err(AppError::invalid("amount", "must_be_positive"));
        }
        check_money("amount", amount)?;

        let movement = uow
            .append_movement(NewMovement {
                tenant_id: ctx.tenant_id,
                customer_id: order.customer_id,
                order_id: Some(order.id),
                adjustment_id: None,
                receipt_id: None,
                amount,
                kind: MovementKind::SaleCharge,
                note,
                created_by: ctx.actor_id,
            })
            .await?;
        uow.commit().await?;

        tracing::info!(
            tenant_id = %ctx.tenant_id,
            order_id = %order.id,
            amount = %amount,
            "Venda a prazo lançada"
        );
        Ok(movement)
    }

    /// Recibo de caixa + movimento PAYMENT na mesma transação.
    pub async fn record_payment(
        &self,
        ctx: &ActorContext,
        command: PaymentCommand,
    ) -> Result<PaymentRecorded, AppError> {
        require_id("customerId", command.customer_id)?;
        if command.amount <= Decimal::ZERO {
            return Err(AppError::invalid("amount", "must_be_positive"));
        }
        check_money("amount", command.amount)?;

        let mut uow = self.store.begin(ctx).await?;

        let customer = uow
            .find_customer(command.customer_id)
            .await?
            .ok_or(AppError::not_found("customer", command.customer_id))?;

        if let Some(order_id) = command.order_id {
            let order = uow
                .find_order(order_id)
                .await?
                .ok_or(AppError::not_found("order", order_id))?;
            if order.customer_id != customer.id {
                return Err(AppError::invalid("orderId", "order_not_owned")
                    .with_param("order", order.display_id));
            }
        }

        let receipt = uow
            .insert_receipt(NewReceipt {
                tenant_id: ctx.tenant_id,
                customer_id: customer.id,
                order_id: command.order_id,
                amount: command.amount,
                payment_method: command.payment_method,
                reference: command.reference,
                note: command.note.clone(),
                created_by: ctx.actor_id,
            })
            .await?;

        let movement = uow
            .append_movement(NewMovement {
                tenant_id: ctx.tenant_id,
                customer_id: customer.id,
                order_id: command.order_id,
                adjustment_id: None,
                receipt_id: Some(receipt.id),
                amount: -command.amount,
                kind: MovementKind::Payment,
                note: command.note,
                created_by: ctx.actor_id,
            })
            .await?;
        uow.commit().await?;

        tracing::info!(
            tenant_id = %ctx.tenant_id,
            customer_id = %customer.id,
            receipt_number = receipt.receipt_number,
            "Pagamento registrado"
        );
        Ok(PaymentRecorded { receipt, movement })
    }

    async fn require_customer(
        &self,
        ctx: &ActorContext,
        customer_id: Uuid,
    ) -> Result<Customer, AppError> {
        require_id("tenantId", ctx.tenant_id)?;
        require_id("customerId", customer_id)?;
        self.store
            .find_customer(ctx.tenant_id, customer_id)
            .await?
            .ok_or(AppError::not_found("customer", customer_id))
    }
}

pub(crate) fn require_id(field: &'static str, id: Uuid) -> Result<(), AppError> {
    if id.is_nil() {
        return Err(AppError::invalid(field, "missing_identifier"));
    }
    Ok(())
}

// =============================================================================
//  ORDENAÇÃO DA LISTA DE DEVEDORES
// =============================================================================

/// Ordena por nome (sem diferenciar maiúsculas nem acentos); empate pelo id do cliente.
pub fn sort_debtors(mut debts: Vec<CustomerDebt>) -> Vec<CustomerDebt> {
    debts.sort_by(compare_debtors);
    debts
}

fn compare_debtors(a: &CustomerDebt, b: &CustomerDebt) -> Ordering {
    collation_key(&a.display_name)
        .cmp(&collation_key(&b.display_name))
        .then_with(|| a.customer_id.cmp(&b.customer_id))
}

/// Chave de comparação: minúsculas e letras latinas sem diacríticos.
pub fn collation_key(name: &str) -> String {
    name.trim()
        .chars()
        .flat_map(char::to_lowercase)
        .map(fold_accent)
        .collect()
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}
