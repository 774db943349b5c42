use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handler::{self, AppState};

/// Build the axum router with all Quill endpoints.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/submissions", post(handler::submit_handler))
        .route("/submit-resume", post(handler::submit_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
