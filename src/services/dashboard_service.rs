// src/services/dashboard_service.rs

use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use crate::{
    common::error::AppError,
    db::ReceivablesStore,
    models::{
        auth::ActorContext,
        dashboard::ReceivablesSummary,
        receivables::{CustomerDebt, KindTotal, MovementKind},
    },
};

const WINDOW_DAYS: i64 = 30;

#[derive(Clone)]
pub struct DashboardService {
    store: Arc<dyn ReceivablesStore>,
}

impl DashboardService {
    pub fn new(store: Arc<dyn ReceivablesStore>) -> Self {
        Self { store }
    }

    pub async fn get_summary(&self, ctx: &ActorContext) -> Result<ReceivablesSummary, AppError> {
        let debts = self.store.customer_totals(ctx.tenant_id).await?;
        let since = Utc::now() - Duration::days(WINDOW_DAYS);
        let totals = self.store.kind_totals_since(ctx.tenant_id, since).await?;

        Ok(summarize(&debts, &totals))
    }
}

fn summarize(debts: &[CustomerDebt], totals: &[KindTotal]) -> ReceivablesSummary {
    let debtors: Vec<&CustomerDebt> = debts.iter().filter(|d| d.outstanding > Decimal::ZERO).collect();

    // Pagamentos e ajustes são gravados negativos; os cards mostram o valor absoluto
    let total_of = |kind: MovementKind| {
        totals
            .iter()
            .filter(|t| t.kind == kind)
            .map(|t| t.total)
            .sum::<Decimal>()
            .abs()
    };

    ReceivablesSummary {
        total_outstanding: debtors.iter().map(|d| d.outstanding).sum(),
        debtor_count: debtors.len(),
        charges_last_30_days: total_of(MovementKind::SaleCharge),
        payments_last_30_days: total_of(MovementKind::Payment),
        adjustments_last_30_days: total_of(MovementKind::ManualAdjustment),
        reversals_last_30_days: total_of(MovementKind::AdjustmentReversal),
    }
}
