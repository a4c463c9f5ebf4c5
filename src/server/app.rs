use std::net::SocketAddr;

use axum::routing::{delete, get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::server::routes;
use crate::server::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::alive))
        .route("/health", get(routes::health))
        .route("/api/v1/alerts", get(routes::list_alerts))
        .route("/api/v1/alerts", post(routes::add_alert))
        .route("/api/v1/alerts", delete(routes::remove_alert))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(RequestBodyLimitLayer::new(64 * 1024))
                .layer(TraceLayer::new_for_http()),
        )
}

pub fn bind_address(bind: &str) -> SocketAddr {
    bind.parse()
        .unwrap_or_else(|_| "0.0.0.0:8080".parse().expect("valid fallback bind"))
}
