// src/handlers/crm.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{PermCrmRead, PermCrmWrite, RequirePermission},
        tenancy::TenantContext,
    },
    models::crm::{Customer, NewCustomer},
};

// =============================================================================
//  CLIENTES
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerPayload {
    #[validate(length(min = 2, code = "too_short"))]
    #[schema(example = "Ferretería El Martillo")]
    pub full_name: String,

    #[schema(example = "Ferretería El Martillo S.A.S.")]
    pub legal_name: Option<String>,

    #[validate(length(max = 30, code = "length"))]
    #[schema(example = "900123456-7")]
    pub document_number: Option<String>,

    #[schema(example = "Medellín")]
    pub city: Option<String>,

    #[validate(email(code = "email"))]
    #[schema(example = "compras@martillo.co")]
    pub email: Option<String>,

    #[schema(example = "+57 604 555 0101")]
    pub phone: Option<String>,
}

// POST /api/crm/customers
#[utoipa::path(
    post,
    path = "/api/crm/customers",
    tag = "CRM",
    request_body = CreateCustomerPayload,
    responses(
        (status = 201, description = "Cliente criado", body = Customer),
        (status = 400, description = "Dados inválidos ou documento repetido")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    TenantContext(ctx): TenantContext,
    _perm: RequirePermission<PermCrmWrite>,
    Json(payload): Json<CreateCustomerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let input = NewCustomer {
        full_name: payload.full_name,
        legal_name: payload.legal_name,
        document_number: payload.document_number,
        city: payload.city,
        email: payload.email,
        phone: payload.phone,
    };

    let customer = app_state
        .crm_service
        .create_customer(&ctx, input)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(customer)))
}

// GET /api/crm/customers
#[utoipa::path(
    get,
    path = "/api/crm/customers",
    tag = "CRM",
    responses(
        (status = 200, description = "Clientes da loja em ordem alfabética", body = Vec<Customer>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
    locale: Locale,
    TenantContext(ctx): TenantContext,
    _perm: RequirePermission<PermCrmRead>,
) -> Result<impl IntoResponse, ApiError> {
    let customers = app_state
        .crm_service
        .list_customers(&ctx)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(customers)))
}

// GET /api/crm/customers/{id}
#[utoipa::path(
    get,
    path = "/api/crm/customers/{id}",
    tag = "CRM",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente", body = Customer),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    TenantContext(ctx): TenantContext,
    _perm: RequirePermission<PermCrmRead>,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = app_state
        .crm_service
        .get_customer(&ctx, customer_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(customer)))
}
