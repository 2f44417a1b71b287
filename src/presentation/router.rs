use axum::middleware;
use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::infrastructure::observability::request_id_middleware;
use crate::presentation::handlers::{
    analytics_handler, analyze_handler, health_handler, ingest_message_handler,
    list_conversations_handler, set_handled_handler, set_status_handler,
};
use crate::presentation::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/v1/messages", post(ingest_message_handler))
        .route("/api/v1/analytics", get(analytics_handler))
        .route("/api/v1/conversations", get(list_conversations_handler))
        .route(
            "/api/v1/conversations/{id}/status",
            patch(set_status_handler),
        )
        .route(
            "/api/v1/conversations/{id}/handled",
            patch(set_handled_handler),
        )
        .route("/api/v1/analyze", post(analyze_handler))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}
