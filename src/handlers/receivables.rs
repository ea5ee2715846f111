// src/handlers/receivables.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{PermReceivablesRead, PermReceivablesWrite, RequirePermission},
        tenancy::TenantContext,
    },
    models::receivables::{
        money_violation, CustomerBalance, CustomerBalanceResponse, CustomerDebt, LedgerMovement,
        MovementDetail, MovementFilter, OrderBalance, PaymentCommand, PaymentMethod,
        PaymentRecorded, MONEY_SCALE,
    },
};

// =============================================================================
//  VALIDADORES DE VALOR
// =============================================================================

pub(crate) fn positive_amount(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        return Err(ValidationError::new("must_be_positive"));
    }
    money_amount(value)
}

pub(crate) fn non_negative_amount(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        return Err(ValidationError::new("must_not_be_negative"));
    }
    money_amount(value)
}

// Mesmo limite das colunas NUMERIC(18, 2)
fn money_amount(value: &Decimal) -> Result<(), ValidationError> {
    match money_violation(*value) {
        Some(code) => {
            let mut err = ValidationError::new(code);
            err.add_param("max".into(), &MONEY_SCALE);
            Err(err)
        }
        None => Ok(()),
    }
}

// =============================================================================
//  PAYLOADS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordChargePayload {
    // Sem valor: lança o total do pedido
    #[validate(custom(function = "positive_amount"))]
    #[schema(example = "150000.00")]
    pub amount: Option<Decimal>,

    #[validate(length(max = 500, code = "length"))]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentPayload {
    pub customer_id: Uuid,
    pub order_id: Option<Uuid>,

    #[validate(custom(function = "positive_amount"))]
    #[schema(example = "30000.00")]
    pub amount: Decimal,

    pub payment_method: PaymentMethod,

    #[validate(length(max = 120, code = "length"))]
    #[schema(example = "TRX-88231")]
    pub reference: Option<String>,

    #[validate(length(max = 500, code = "length"))]
    pub note: Option<String>,
}

// =============================================================================
//  CONSULTAS
// =============================================================================

// GET /api/receivables/debtors
#[utoipa::path(
    get,
    path = "/api/receivables/debtors",
    tag = "Cartera",
    responses(
        (status = 200, description = "Clientes com saldo pendente, ordenados pelo nome", body = Vec<CustomerDebt>),
        (status = 401, description = "Não autorizado"),
        (status = 403, description = "Sem permissão")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_debtors(
    State(app_state): State<AppState>,
    locale: Locale,
    TenantContext(ctx): TenantContext,
    _perm: RequirePermission<PermReceivablesRead>,
) -> Result<impl IntoResponse, ApiError> {
    let debtors = app_state
        .receivables_service
        .customers_with_debt(&ctx)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(debtors)))
}

// GET /api/receivables/customers/{id}/balance
#[utoipa::path(
    get,
    path = "/api/receivables/customers/{id}/balance",
    tag = "Cartera",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Saldo com dívida (DEBT) ou mensagem de quitado (NO_DEBT)", body = CustomerBalanceResponse),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_customer_balance(
    State(app_state): State<AppState>,
    locale: Locale,
    TenantContext(ctx): TenantContext,
    _perm: RequirePermission<PermReceivablesRead>,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let balance = app_state
        .receivables_service
        .balance_for_customer(&ctx, customer_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let response = match balance {
        CustomerBalance::Debt { customer, outstanding } => {
            CustomerBalanceResponse::Debt { customer, outstanding }
        }
        CustomerBalance::NoDebt { customer, outstanding } => {
            let message = app_state.i18n_store.translate(
                &locale.0,
                "receivables.no_debt",
                &[("name", customer.full_name.clone())],
            );
            CustomerBalanceResponse::NoDebt { customer, outstanding, message }
        }
    };

    Ok((StatusCode::OK, Json(response)))
}

// GET /api/receivables/customers/{id}/movements
#[utoipa::path(
    get,
    path = "/api/receivables/customers/{id}/movements",
    tag = "Cartera",
    params(("id" = Uuid, Path, description = "ID do cliente"), MovementFilter),
    responses(
        (status = 200, description = "Histórico cronológico com pedido, recibo e ajuste", body = Vec<MovementDetail>),
        (status = 400, description = "Filtro inválido"),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_customer_movements(
    State(app_state): State<AppState>,
    locale: Locale,
    TenantContext(ctx): TenantContext,
    _perm: RequirePermission<PermReceivablesRead>,
    Path(customer_id): Path<Uuid>,
    Query(filter): Query<MovementFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let movements = app_state
        .receivables_service
        .movements_for_customer(&ctx, customer_id, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(movements)))
}

// GET /api/receivables/customers/{id}/open-orders
#[utoipa::path(
    get,
    path = "/api/receivables/customers/{id}/open-orders",
    tag = "Cartera",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Pedidos com saldo pendente (candidatos a ajuste)", body = Vec<OrderBalance>),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_open_orders(
    State(app_state): State<AppState>,
    locale: Locale,
    TenantContext(ctx): TenantContext,
    _perm: RequirePermission<PermReceivablesRead>,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let orders = app_state
        .receivables_service
        .open_orders(&ctx, customer_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(orders)))
}

// GET /api/receivables/orders/{id}/balance
#[utoipa::path(
    get,
    path = "/api/receivables/orders/{id}/balance",
    tag = "Cartera",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Saldo do pedido", body = OrderBalance),
        (status = 404, description = "Pedido não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_order_balance(
    State(app_state): State<AppState>,
    locale: Locale,
    TenantContext(ctx): TenantContext,
    _perm: RequirePermission<PermReceivablesRead>,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let balance = app_state
        .receivables_service
        .order_balance(&ctx, order_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(balance)))
}

// =============================================================================
//  LANÇAMENTOS
// =============================================================================

// POST /api/receivables/orders/{id}/charges
#[utoipa::path(
    post,
    path = "/api/receivables/orders/{id}/charges",
    tag = "Cartera",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    request_body = RecordChargePayload,
    responses(
        (status = 201, description = "Venda a prazo lançada", body = LedgerMovement),
        (status = 400, description = "Valor inválido"),
        (status = 404, description = "Pedido não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn record_charge(
    State(app_state): State<AppState>,
    locale: Locale,
    TenantContext(ctx): TenantContext,
    _perm: RequirePermission<PermReceivablesWrite>,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<RecordChargePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let movement = app_state
        .receivables_service
        .record_charge(&ctx, order_id, payload.amount, payload.note)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(movement)))
}

// POST /api/receivables/payments
#[utoipa::path(
    post,
    path = "/api/receivables/payments",
    tag = "Cartera",
    request_body = RecordPaymentPayload,
    responses(
        (status = 201, description = "Recibo de caixa e movimento criados", body = PaymentRecorded),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Cliente ou pedido não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn record_payment(
    State(app_state): State<AppState>,
    locale: Locale,
    TenantContext(ctx): TenantContext,
    _perm: RequirePermission<PermReceivablesWrite>,
    Json(payload): Json<RecordPaymentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let command = PaymentCommand {
        customer_id: payload.customer_id,
        order_id: payload.order_id,
        amount: payload.amount,
        payment_method: payload.payment_method,
        reference: payload.reference,
        note: payload.note,
    };

    let recorded = app_state
        .receivables_service
        .record_payment(&ctx, command)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(recorded)))
}
