// src/handlers/operations.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    handlers::receivables::non_negative_amount,
    middleware::{
        i18n::Locale,
        rbac::{PermCrmRead, PermOrdersWrite, RequirePermission},
        tenancy::TenantContext,
    },
    models::operations::Order,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderPayload {
    pub customer_id: Uuid,

    #[validate(custom(function = "non_negative_amount"))]
    #[schema(example = "150000.00")]
    pub total_amount: Decimal,

    #[validate(length(max = 500, code = "length"))]
    #[schema(example = "Entrega parcial")]
    pub notes: Option<String>,
}

// POST /api/operations/orders
#[utoipa::path(
    post,
    path = "/api/operations/orders",
    tag = "Operações",
    request_body = CreateOrderPayload,
    responses(
        (status = 201, description = "Pedido criado (sem lançamento na cartera)", body = Order),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_order(
    State(app_state): State<AppState>,
    locale: Locale,
    TenantContext(ctx): TenantContext,
    _perm: RequirePermission<PermOrdersWrite>,
    Json(payload): Json<CreateOrderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let order = app_state
        .operations_service
        .create_order(
            &ctx,
            payload.customer_id,
            payload.total_amount,
            payload.notes.as_deref(),
        )
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(order)))
}

// GET /api/operations/orders/{id}
#[utoipa::path(
    get,
    path = "/api/operations/orders/{id}",
    tag = "Operações",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Pedido", body = Order),
        (status = 404, description = "Pedido não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_order(
    State(app_state): State<AppState>,
    locale: Locale,
    TenantContext(ctx): TenantContext,
    _perm: RequirePermission<PermCrmRead>,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let order = app_state
        .operations_service
        .get_order(&ctx, order_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(order)))
}
