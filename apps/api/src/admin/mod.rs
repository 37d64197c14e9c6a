pub mod handlers;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::state::AppState;

/// Routes under `/api/admin`. Every handler requires an admin token.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(handlers::list_users))
        .route("/stats", get(handlers::stats))
        .route("/user/:id", get(handlers::user_detail))
        .route("/ai-usage", get(handlers::ai_usage))
        .route("/pdf-stats", get(handlers::pdf_stats))
        .route("/create-admin", post(handlers::promote))
        .route("/users/:id", delete(handlers::delete_user))
        .route("/users/:id/revoke", post(handlers::revoke))
        .route("/users/:id/unrevoke", post(handlers::unrevoke))
        .route("/users/:id/credits", put(handlers::update_credits))
}
