// src/models/dashboard.rs

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

// Cards do topo da tela de cartera
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceivablesSummary {
    pub total_outstanding: Decimal,      // Soma dos saldos positivos (só devedores)
    pub debtor_count: usize,             // Clientes com saldo > 0
    pub charges_last_30_days: Decimal,   // Vendas a prazo lançadas
    pub payments_last_30_days: Decimal,  // Recebido (valor positivo)
    pub adjustments_last_30_days: Decimal, // Ajustes manuais (valor positivo)
    pub reversals_last_30_days: Decimal, // Estornos de ajuste
}
