// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Users ---
        handlers::auth::get_me,

        // --- CRM ---
        handlers::crm::create_customer,
        handlers::crm::list_customers,
        handlers::crm::get_customer,

        // --- OPERATIONS ---
        handlers::operations::create_order,
        handlers::operations::get_order,

        // --- CARTERA ---
        handlers::receivables::list_debtors,
        handlers::receivables::get_customer_balance,
        handlers::receivables::list_customer_movements,
        handlers::receivables::list_open_orders,
        handlers::receivables::get_order_balance,
        handlers::receivables::record_charge,
        handlers::receivables::record_payment,

        // --- AJUSTES ---
        handlers::adjustments::apply_adjustment,
        handlers::adjustments::reverse_adjustment,
        handlers::adjustments::get_adjustment,
        handlers::adjustments::list_customer_adjustments,

        // --- Dashboard ---
        handlers::dashboard::get_receivables_summary,
    ),
    components(
        schemas(
            models::auth::MemberRole,
            models::receivables::MovementKind,
            models::receivables::PaymentMethod,
            models::receivables::AdjustmentStatus,
            handlers::adjustments::AdjustmentLinePayload,
        )
    ),
    tags(
        (name = "Usuários", description = "Ator resolvido a partir do token"),
        (name = "CRM", description = "Clientes da loja"),
        (name = "Operações", description = "Pedidos"),
        (name = "Cartera", description = "Saldos, devedores, vendas a prazo e recibos de caixa"),
        (name = "Ajustes", description = "Ajustes manuais de saldo e estornos"),
        (name = "Dashboard", description = "Indicadores da cartera")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
