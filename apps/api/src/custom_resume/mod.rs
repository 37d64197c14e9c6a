pub mod compile;
pub mod handlers;
pub mod render;
pub mod store;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

const BASE: &str = "/api/custom-resume";

pub fn router() -> Router<AppState> {
    let collection = || get(handlers::list).post(handlers::create);
    Router::new()
        .route(BASE, collection())
        .route(&format!("{BASE}/"), collection())
        .route(&format!("{BASE}/user-elements"), get(handlers::user_elements))
        .route(
            &format!("{BASE}/select-elements"),
            post(handlers::select_elements),
        )
        .route(
            &format!("{BASE}/:id"),
            get(handlers::get)
                .put(handlers::update)
                .delete(handlers::delete),
        )
        .route(&format!("{BASE}/:id/generate"), post(handlers::generate))
        .route(&format!("{BASE}/:id/download"), post(handlers::download))
}
