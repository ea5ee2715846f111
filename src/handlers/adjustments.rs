// src/handlers/adjustments.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    handlers::receivables::positive_amount,
    middleware::{
        i18n::Locale,
        rbac::{PermAdjustmentsWrite, PermReceivablesRead, RequirePermission},
        tenancy::TenantContext,
    },
    models::receivables::{AdjustmentCommand, AdjustmentLine, AdjustmentRecord, AdjustmentView},
};

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentLinePayload {
    pub order_id: Uuid,

    #[validate(custom(function = "positive_amount"))]
    #[schema(example = "50000.00")]
    pub amount_applied: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplyAdjustmentPayload {
    pub customer_id: Uuid,

    #[validate(length(min = 3, code = "too_short"))]
    #[schema(example = "Descuento comercial autorizado por gerencia")]
    pub observation: String,

    #[validate(length(min = 1, code = "lines_required"), nested)]
    pub lines: Vec<AdjustmentLinePayload>,
}

impl From<ApplyAdjustmentPayload> for AdjustmentCommand {
    fn from(payload: ApplyAdjustmentPayload) -> Self {
        AdjustmentCommand {
            customer_id: payload.customer_id,
            observation: payload.observation,
            lines: payload
                .lines
                .into_iter()
                .map(|l| AdjustmentLine {
                    order_id: l.order_id,
                    amount_applied: l.amount_applied,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReverseAdjustmentPayload {
    pub adjustment_id: Uuid,
}

// POST /api/receivables/adjustments
#[utoipa::path(
    post,
    path = "/api/receivables/adjustments",
    tag = "Ajustes",
    request_body = ApplyAdjustmentPayload,
    responses(
        (status = 201, description = "Ajuste aplicado em todos os pedidos", body = AdjustmentRecord),
        (status = 400, description = "Linha inválida ou acima do saldo do pedido"),
        (status = 403, description = "Papel sem permissão de ajuste"),
        (status = 404, description = "Cliente ou pedido não encontrado"),
        (status = 409, description = "Conflito de concorrência"),
        (status = 503, description = "Falha transitória; nada foi gravado")
    ),
    security(("api_jwt" = []))
)]
pub async fn apply_adjustment(
    State(app_state): State<AppState>,
    locale: Locale,
    TenantContext(ctx): TenantContext,
    _perm: RequirePermission<PermAdjustmentsWrite>,
    Json(payload): Json<ApplyAdjustmentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let record = app_state
        .adjustment_service
        .apply_adjustment(&ctx, payload.into())
        .await
        .map_err(|e| {
            tracing::warn!(
                tenant_id = %ctx.tenant_id,
                retryable = e.is_retryable(),
                "Ajuste recusado: {}", e
            );
            e.to_api_error(&locale, &app_state.i18n_store)
        })?;

    Ok((StatusCode::CREATED, Json(record)))
}

// POST /api/receivables/adjustments/reverse
#[utoipa::path(
    post,
    path = "/api/receivables/adjustments/reverse",
    tag = "Ajustes",
    request_body = ReverseAdjustmentPayload,
    responses(
        (status = 201, description = "Estorno criado", body = AdjustmentRecord),
        (status = 404, description = "Ajuste não encontrado"),
        (status = 409, description = "Ajuste já estornado ou é um estorno")
    ),
    security(("api_jwt" = []))
)]
pub async fn reverse_adjustment(
    State(app_state): State<AppState>,
    locale: Locale,
    TenantContext(ctx): TenantContext,
    _perm: RequirePermission<PermAdjustmentsWrite>,
    Json(payload): Json<ReverseAdjustmentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let record = app_state
        .adjustment_service
        .reverse(&ctx, payload.adjustment_id)
        .await
        .map_err(|e| {
            tracing::warn!(
                tenant_id = %ctx.tenant_id,
                adjustment_id = %payload.adjustment_id,
                retryable = e.is_retryable(),
                "Estorno recusado: {}", e
            );
            e.to_api_error(&locale, &app_state.i18n_store)
        })?;

    Ok((StatusCode::CREATED, Json(record)))
}

// GET /api/receivables/adjustments/{id}
#[utoipa::path(
    get,
    path = "/api/receivables/adjustments/{id}",
    tag = "Ajustes",
    params(("id" = Uuid, Path, description = "ID do ajuste")),
    responses(
        (status = 200, description = "Ajuste com status ACTIVE, REVERSED ou REVERSAL", body = AdjustmentView),
        (status = 404, description = "Ajuste não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_adjustment(
    State(app_state): State<AppState>,
    locale: Locale,
    TenantContext(ctx): TenantContext,
    _perm: RequirePermission<PermReceivablesRead>,
    Path(adjustment_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let view = app_state
        .adjustment_service
        .get_adjustment(&ctx, adjustment_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(view)))
}

// GET /api/receivables/customers/{id}/adjustments
#[utoipa::path(
    get,
    path = "/api/receivables/customers/{id}/adjustments",
    tag = "Ajustes",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Ajustes do cliente, mais recentes primeiro", body = Vec<AdjustmentView>),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_customer_adjustments(
    State(app_state): State<AppState>,
    locale: Locale,
    TenantContext(ctx): TenantContext,
    _perm: RequirePermission<PermReceivablesRead>,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let views = app_state
        .adjustment_service
        .list_adjustments(&ctx, customer_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(views)))
}
