pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod openapi;
pub mod services;
pub mod validation;

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: config::Config,
    pub settings: Arc<services::SettingsCache>,
    pub notifier: services::Notifier,
}

pub fn create_app(state: AppState) -> Router {
    // The catalog is embedded in customer-facing pages on other origins.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let public = Router::new()
        .route("/health", get(handlers::health))
        .route("/register", post(handlers::stores::register))
        .route("/catalog/:slug", get(handlers::catalog::store_profile))
        .route(
            "/catalog/:slug/products",
            get(handlers::catalog::list_products),
        )
        .route("/catalog/:slug/orders", post(handlers::catalog::place_order))
        .layer(cors);

    let mut checkout_routes =
        Router::new().route("/api/checkout", post(handlers::checkout::checkout));
    if let Some(redis_url) = &state.config.redis_url {
        match middleware::idempotency::IdempotencyService::new(redis_url) {
            Ok(service) => {
                checkout_routes = checkout_routes.route_layer(axum_middleware::from_fn_with_state(
                    service,
                    middleware::idempotency::idempotency_middleware,
                ));
            }
            Err(e) => tracing::warn!("idempotency disabled, Redis client unavailable: {}", e),
        }
    }

    let store_api = Router::new()
        .route("/api/store", get(handlers::stores::current_store))
        .route(
            "/api/products",
            get(handlers::products::list_products).post(handlers::products::create_product),
        )
        .route(
            "/api/products/:id",
            get(handlers::products::get_product)
                .put(handlers::products::update_product)
                .delete(handlers::products::delete_product),
        )
        .route(
            "/api/customers",
            get(handlers::customers::list_customers).post(handlers::customers::create_customer),
        )
        .route(
            "/api/customers/:id",
            get(handlers::customers::get_customer)
                .put(handlers::customers::update_customer)
                .delete(handlers::customers::delete_customer),
        )
        .route("/api/customers/:id/redeem", post(handlers::loyalty::redeem))
        .route(
            "/api/redemption-options",
            get(handlers::loyalty::list_redemption_options)
                .post(handlers::loyalty::create_redemption_option),
        )
        .route(
            "/api/redemption-options/:id",
            delete(handlers::loyalty::delete_redemption_option),
        )
        .route(
            "/api/transactions",
            get(handlers::transactions::list_transactions),
        )
        .route(
            "/api/transactions/export",
            get(handlers::transactions::export_transactions),
        )
        .route(
            "/api/transactions/:id",
            get(handlers::transactions::get_transaction),
        )
        .route(
            "/api/transactions/:id/refund",
            post(handlers::transactions::refund_transaction),
        )
        .route(
            "/api/reports/summary",
            get(handlers::transactions::sales_summary),
        )
        .route(
            "/api/topups",
            get(handlers::topups::list_store_top_ups).post(handlers::topups::create_top_up),
        )
        .route(
            "/api/table-sessions",
            get(handlers::catalog::list_pending_orders),
        )
        .merge(checkout_routes)
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::store_auth,
        ));

    let admin_api = Router::new()
        .route(
            "/admin/settings/fees",
            get(handlers::settings::get_fee_settings).put(handlers::settings::put_fee_settings),
        )
        .route(
            "/admin/settings/points",
            get(handlers::settings::get_point_settings)
                .put(handlers::settings::put_point_settings),
        )
        .route("/admin/topups", get(handlers::topups::list_top_ups))
        .route(
            "/admin/topups/:id/approve",
            post(handlers::topups::approve_top_up),
        )
        .route(
            "/admin/topups/:id/reject",
            post(handlers::topups::reject_top_up),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.config.clone(),
            middleware::auth::admin_auth,
        ));

    let callback = Router::new()
        .route("/callbacks/topup", post(handlers::topups::gateway_callback))
        .route_layer(middleware::ip_filter::IpFilterLayer::new(
            state.config.callback_allowed_ips.clone(),
        ));

    Router::new()
        .merge(public)
        .merge(store_api)
        .merge(admin_api)
        .merge(callback)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
        .with_state(state)
}
