pub mod anonymize;
pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/anonymize", post(anonymize::handle_anonymize_batch))
        .route(
            "/api/v1/anonymize/single",
            post(anonymize::handle_anonymize_single),
        )
        .route(
            "/api/v1/download/:filename",
            get(anonymize::handle_download),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
