use std::time::Duration;

use axum::extract::{MatchedPath, Request};
use axum::http::StatusCode;
use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info_span;

use crate::handlers::{
    create_url_handler, delete_url_handler, health_handler, metrics_handler, redirect_handler,
};
use crate::metrics::track_metrics;
use crate::state::AppState;

pub struct App {}

impl App {
    /// Builds the router with request ids, tracing, metrics and a per-request timeout.
    ///
    /// Layers wrap outside-in in the order listed, so every response, including
    /// timeouts, carries an `x-request-id` and is counted.
    pub fn router(state: AppState, request_timeout: Duration) -> Router {
        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(middleware::from_fn_with_state(
                state.metrics().clone(),
                track_metrics,
            ))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
                let matched_path = request
                    .extensions()
                    .get::<MatchedPath>()
                    .map(MatchedPath::as_str);
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok());

                info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    matched_path,
                    request_id,
                )
            }))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                request_timeout,
            ));

        Router::new()
            .route("/health", get(health_handler))
            .route("/metrics", get(metrics_handler))
            .route("/url", post(create_url_handler))
            .route("/url/{alias}", delete(delete_url_handler))
            .route("/{alias}", get(redirect_handler))
            .layer(middleware)
            .with_state(state)
    }
}
