//! HTTP API server for the storefront cart and checkout backend.
//!
//! Exposes the cart, checkout and order services over REST, with
//! structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use domain::{CartService, CheckoutService, OrderService};
use metrics_exporter_prometheus::PrometheusHandle;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/cart",
            get(routes::cart::list::<S>)
                .post(routes::cart::add::<S>)
                .delete(routes::cart::clear::<S>),
        )
        .route(
            "/cart/{id}",
            patch(routes::cart::set_quantity::<S>)
                .delete(routes::cart::remove::<S>),
        )
        .route("/checkout/draft", post(routes::checkout::create_draft::<S>))
        .route(
            "/checkout/draft/{id}",
            get(routes::checkout::get_draft::<S>).delete(routes::checkout::abandon_draft::<S>),
        )
        .route("/checkout/drafts", get(routes::checkout::list_drafts::<S>))
        .route(
            "/checkout/confirm/{id}",
            post(routes::checkout::confirm::<S>),
        )
        .route("/orders", get(routes::orders::list::<S>))
        .route(
            "/orders/{id}",
            get(routes::orders::get::<S>)
                .put(routes::orders::update::<S>)
                .delete(routes::orders::delete::<S>),
        )
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

/// Creates the application state, with every service sharing one store.
pub fn create_state<S: Store + Clone + 'static>(store: S) -> Arc<AppState<S>> {
    Arc::new(AppState {
        cart: CartService::new(store.clone()),
        checkout: CheckoutService::new(store.clone()),
        orders: OrderService::new(store),
    })
}
