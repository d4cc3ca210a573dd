//! HTTP API server for the inventory tracking system.
//!
//! Exposes the product catalogue and order placement over REST, with
//! structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use catalog::ProductCatalog;
use fulfillment::OrderFulfillment;
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/products", post(routes::products::create))
        .route("/products", get(routes::products::list))
        .route("/products/{id}", get(routes::products::get))
        .route("/orders", post(routes::orders::place))
        .route("/orders", get(routes::orders::list))
        .route("/orders/{id}", get(routes::orders::get))
        .route("/orders/{id}/items", get(routes::orders::items))
        .route("/orders/{id}/status", post(routes::orders::update_status))
        .route("/order-items", get(routes::orders::list_items))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over one connection pool.
///
/// The catalogue and fulfillment service share the pool so order
/// placement runs both sides of the transaction on one connection.
pub fn create_state(pool: PgPool) -> Arc<AppState> {
    let catalog = ProductCatalog::new(pool.clone());
    let fulfillment = OrderFulfillment::new(pool, catalog.clone());
    Arc::new(AppState {
        catalog,
        fulfillment,
    })
}
