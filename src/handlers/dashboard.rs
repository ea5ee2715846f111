// src/handlers/dashboard.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{PermDashboardRead, RequirePermission},
        tenancy::TenantContext,
    },
    models::dashboard::ReceivablesSummary,
};

// GET /api/dashboard/receivables
#[utoipa::path(
    get,
    path = "/api/dashboard/receivables",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Total em aberto, devedores e movimentação dos últimos 30 dias", body = ReceivablesSummary),
        (status = 401, description = "Não autorizado"),
        (status = 403, description = "Sem permissão")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_receivables_summary(
    State(app_state): State<AppState>,
    locale: Locale,
    TenantContext(ctx): TenantContext,
    _perm: RequirePermission<PermDashboardRead>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = app_state
        .dashboard_service
        .get_summary(&ctx)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(summary)))
}
