pub mod extract;
pub mod handlers;
pub mod usage;

use axum::{extract::DefaultBodyLimit, routing::post, Router};

use crate::state::AppState;

/// Routes under `/api/ai`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generate-subpoints", post(handlers::generate_subpoints))
        .route("/rephrase-title", post(handlers::rephrase_title))
        .route("/rephrase-subpoints", post(handlers::rephrase_subpoints))
        .route(
            "/extract-resume",
            post(extract::extract_resume)
                .layer(DefaultBodyLimit::max(extract::MAX_UPLOAD_BYTES + 64 * 1024)),
        )
        .route("/save-extracted", post(extract::save_extracted))
}
