// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

pub fn build_router(app_state: AppState) -> Router {
    // Define as rotas de usuário (protegidas pelo middleware)
    let user_routes = Router::new().route("/me", get(handlers::auth::get_me));

    let crm_routes = Router::new()
        .route(
            "/customers",
            post(handlers::crm::create_customer).get(handlers::crm::list_customers),
        )
        .route("/customers/{id}", get(handlers::crm::get_customer));

    let operations_routes = Router::new()
        .route("/orders", post(handlers::operations::create_order))
        .route("/orders/{id}", get(handlers::operations::get_order));

    let receivables_routes = Router::new()
        .route("/debtors", get(handlers::receivables::list_debtors))
        .route(
            "/customers/{id}/balance",
            get(handlers::receivables::get_customer_balance),
        )
        .route(
            "/customers/{id}/movements",
            get(handlers::receivables::list_customer_movements),
        )
        .route(
            "/customers/{id}/open-orders",
            get(handlers::receivables::list_open_orders),
        )
        .route(
            "/customers/{id}/adjustments",
            get(handlers::adjustments::list_customer_adjustments),
        )
        .route("/orders/{id}/balance", get(handlers::receivables::get_order_balance))
        .route("/orders/{id}/charges", post(handlers::receivables::record_charge))
        .route("/payments", post(handlers::receivables::record_payment))
        .route("/adjustments", post(handlers::adjustments::apply_adjustment))
        .route(
            "/adjustments/reverse",
            post(handlers::adjustments::reverse_adjustment),
        )
        .route("/adjustments/{id}", get(handlers::adjustments::get_adjustment));

    let dashboard_routes = Router::new().route(
        "/receivables",
        get(handlers::dashboard::get_receivables_summary),
    );

    // Tudo abaixo exige token válido
    let protected = Router::new()
        .nest("/api/users", user_routes)
        .nest("/api/crm", crm_routes)
        .nest("/api/operations", operations_routes)
        .nest("/api/receivables", receivables_routes)
        .nest("/api/dashboard", dashboard_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(protected)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
