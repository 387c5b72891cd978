//! HTTP API router
//!
//! Route paths mirror the frontend's existing client, including its
//! historical spellings (`get_shiiping_data`, `shedule_pickup`), so the
//! server can be swapped in without a frontend release.

use axum::http::HeaderName;
use axum::routing::{delete, get, post};
use axum::{middleware, Router};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::auth::auth_middleware;
use crate::state::AppState;

mod orders;
mod payments;

const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

async fn health() -> &'static str {
    "OK"
}

fn orders_router() -> Router<AppState> {
    Router::new()
        .route("/orders/createorder", post(orders::create_order))
        .route(
            "/orders/create-checkout-session",
            post(orders::create_checkout_session),
        )
        .route("/orders/get_orders", get(orders::list_orders))
        .route("/orders/get_order_details", get(orders::get_order_details))
        .route("/orders/get_shiiping_data", post(orders::get_shipping_data))
        .route("/orders/cancel_orders", delete(orders::cancel_orders))
        .route("/orders/generate_shipping", post(orders::generate_shipping))
        .route("/orders/shedule_pickup", post(orders::schedule_pickup))
        .route("/orders/get_all_carriers", get(orders::get_all_carriers))
        .route("/orders/generate_invoice", get(orders::generate_invoice))
}

fn payments_router() -> Router<AppState> {
    Router::new()
        .route("/payments/setup-customer", post(payments::setup_customer))
        .route("/payments/onboarding-link", post(payments::onboarding_link))
        .route("/payments/charges-enabled", get(payments::charges_enabled))
}

/// Build the application router: public health check plus the
/// bearer-authenticated order and payment APIs.
pub fn create_router(state: AppState) -> Router {
    let protected = orders_router()
        .merge(payments_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(protected)
        .layer(PropagateRequestIdLayer::new(REQUEST_ID_HEADER))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(SetRequestIdLayer::new(REQUEST_ID_HEADER, MakeRequestUuid))
        .with_state(state)
}
