// src/models/receivables.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{common::error::AppError, models::crm::Customer};

// --- Enums (Mapeando o Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "ledger_movement_kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementKind {
    SaleCharge,         // Venda a prazo (aumenta a dívida)
    Payment,            // Recibo de caixa (diminui)
    ManualAdjustment,   // Ajuste manual (diminui)
    AdjustmentReversal, // Estorno de ajuste (restaura)
}

impl MovementKind {
    /// Tipos que sempre apontam para um pedido.
    pub fn requires_order(self) -> bool {
        !matches!(self, MovementKind::Payment)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_method", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Transfer,
    Card,
    Check,
    Other,
}

// --- Valores monetários ---

/// Casas decimais de toda coluna de valor (`NUMERIC(18, 2)`).
pub const MONEY_SCALE: u32 = 2;

/// Código de erro se o valor não cabe em `NUMERIC(18, 2)` sem arredondar.
pub fn money_violation(amount: Decimal) -> Option<&'static str> {
    if amount.normalize().scale() > MONEY_SCALE {
        return Some("too_many_decimals");
    }
    // 16 dígitos inteiros
    if amount.abs() >= Decimal::from(10_000_000_000_000_000_i64) {
        return Some("amount_too_large");
    }
    None
}

pub fn check_money(field: impl Into<String>, amount: Decimal) -> Result<(), AppError> {
    match money_violation(amount) {
        Some(code) => Err(AppError::invalid(field, code).with_param("max", MONEY_SCALE)),
        None => Ok(()),
    }
}

// --- Movimentos (append-only) ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LedgerMovement {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub customer_id: Uuid,
    pub order_id: Option<Uuid>,
    pub adjustment_id: Option<Uuid>,
    pub receipt_id: Option<Uuid>,

    #[schema(example = "-50000.00")]
    pub amount: Decimal, // Positivo = cliente deve mais, Negativo = deve menos
    pub kind: MovementKind,
    pub note: Option<String>,

    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMovement {
    pub tenant_id: Uuid,
    pub customer_id: Uuid,
    pub order_id: Option<Uuid>,
    pub adjustment_id: Option<Uuid>,
    pub receipt_id: Option<Uuid>,
    pub amount: Decimal,
    pub kind: MovementKind,
    pub note: Option<String>,
    pub created_by: Uuid,
}

impl NewMovement {
    /// Regras mínimas de qualquer lançamento, checadas antes de gravar.
    pub fn check(&self) -> Result<(), AppError> {
        if self.tenant_id.is_nil() {
            return Err(AppError::invalid("tenantId", "missing_identifier"));
        }
        if self.customer_id.is_nil() {
            return Err(AppError::invalid("customerId", "missing_identifier"));
        }
        if self.amount.is_zero() {
            return Err(AppError::invalid("amount", "must_not_be_zero"));
        }
        check_money("amount", self.amount)?;
        if self.kind.requires_order() && self.order_id.is_none_or(|id| id.is_nil()) {
            return Err(AppError::invalid("orderId", "order_required"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct MovementFilter {
    pub kind: Option<MovementKind>,
    pub from: Option<NaiveDate>, // inclusivo
    pub to: Option<NaiveDate>,   // inclusivo
}

impl MovementFilter {
    pub fn check(&self) -> Result<(), AppError> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(AppError::invalid("from", "invalid_date_range"));
            }
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn matches(&self, movement: &LedgerMovement) -> bool {
        let day = movement.created_at.date_naive();
        self.kind.is_none_or(|k| k == movement.kind)
            && self.from.is_none_or(|from| day >= from)
            && self.to.is_none_or(|to| day <= to)
    }
}

/// Movimento com o contexto de pedido, recibo e ajuste para auditoria.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MovementDetail {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub movement: LedgerMovement,
    pub order_display_id: Option<i32>,
    pub receipt_number: Option<i32>,
    pub payment_method: Option<PaymentMethod>,
    pub adjustment_observation: Option<String>,
}

// --- Saldos (derivados, nunca gravados) ---

#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDebt {
    pub customer_id: Uuid,
    #[schema(example = "Ferretería El Martillo")]
    pub display_name: String,
    pub legal_name: Option<String>,
    pub tax_id: Option<String>,
    pub city: Option<String>,
    #[schema(example = "80000.00")]
    pub outstanding: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderBalance {
    pub order_id: Uuid,
    pub customer_id: Uuid,
    #[schema(example = 1024)]
    pub display_id: i32,
    #[schema(example = "50000.00")]
    pub outstanding: Decimal,
}

/// Resultado de `balance_for_customer`: com dívida ou sem dívida, nunca os dois formatos misturados.
#[derive(Debug, Clone, PartialEq)]
pub enum CustomerBalance {
    Debt { customer: Customer, outstanding: Decimal },
    NoDebt { customer: Customer, outstanding: Decimal },
}

impl CustomerBalance {
    pub fn from_outstanding(customer: Customer, outstanding: Decimal) -> Self {
        if outstanding > Decimal::ZERO {
            CustomerBalance::Debt { customer, outstanding }
        } else {
            CustomerBalance::NoDebt { customer, outstanding }
        }
    }

    #[cfg(test)]
    pub fn outstanding(&self) -> Decimal {
        match self {
            CustomerBalance::Debt { outstanding, .. } | CustomerBalance::NoDebt { outstanding, .. } => {
                *outstanding
            }
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomerBalanceResponse {
    Debt {
        customer: Customer,
        outstanding: Decimal,
    },
    NoDebt {
        customer: Customer,
        outstanding: Decimal,
        #[schema(example = "El cliente Ferretería El Martillo no tiene deudas pendientes.")]
        message: String,
    },
}

// --- Ajustes ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentLine {
    pub order_id: Uuid,
    #[schema(example = "50000.00")]
    pub amount_applied: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentRecord {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub customer_id: Uuid,
    #[schema(example = "Descuento por pronto pago")]
    pub observation: String,
    pub is_reversal: bool,
    pub reversal_of_id: Option<Uuid>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<AdjustmentLine>,
    #[schema(example = "80000.00")]
    pub total_applied: Decimal,
}

#[derive(Debug, Clone)]
pub struct NewAdjustment {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub customer_id: Uuid,
    pub observation: String,
    pub is_reversal: bool,
    pub reversal_of_id: Option<Uuid>,
    pub created_by: Uuid,
    pub lines: Vec<AdjustmentLine>,
}

impl NewAdjustment {
    pub fn total_applied(&self) -> Decimal {
        self.lines.iter().map(|l| l.amount_applied).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjustmentStatus {
    Active,
    Reversed,
    Reversal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentView {
    #[serde(flatten)]
    pub record: AdjustmentRecord,
    pub status: AdjustmentStatus,
    pub reversed_by_id: Option<Uuid>,
}

/// Pedido de ajuste já convertido do payload (tipado, ainda não checado contra saldos).
#[derive(Debug, Clone)]
pub struct AdjustmentCommand {
    pub customer_id: Uuid,
    pub observation: String,
    pub lines: Vec<AdjustmentLine>,
}

// --- Recibos de caixa ---

#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub customer_id: Uuid,
    pub order_id: Option<Uuid>,
    #[schema(example = 57)]
    pub receipt_number: i32,
    #[schema(example = "30000.00")]
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub reference: Option<String>,
    pub note: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReceipt {
    pub tenant_id: Uuid,
    pub customer_id: Uuid,
    pub order_id: Option<Uuid>,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub reference: Option<String>,
    pub note: Option<String>,
    pub created_by: Uuid,
}

#[derive(Debug, Clone)]
pub struct PaymentCommand {
    pub customer_id: Uuid,
    pub order_id: Option<Uuid>,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    pub reference: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecorded {
    pub receipt: PaymentReceipt,
    pub movement: LedgerMovement,
}

// Soma por tipo num período (dashboard)
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct KindTotal {
    pub kind: MovementKind,
    pub total: Decimal,
}
