pub mod gateway;
pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub use gateway::{PaymentGateway, RazorpayGateway};

/// Routes under `/api/payment`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/plans", get(handlers::plans))
        .route("/create-order", post(handlers::create_order))
        .route("/verify-payment", post(handlers::verify_payment))
        .route("/buy-resume-slot", post(handlers::buy_resume_slot))
        .route("/buy-coffee/create-order", post(handlers::create_coffee_order))
        .route("/buy-coffee/verify", post(handlers::verify_coffee))
        .route("/history", get(handlers::history))
}
