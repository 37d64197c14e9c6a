pub mod cookies;
pub mod email_change;
pub mod extract;
pub mod handlers;
pub mod jwt;
pub mod otp;
pub mod password;
pub mod session;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub use extract::{AdminUser, AuthUser};

/// Routes under `/api/auth`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/refresh", post(handlers::refresh))
        .route("/logout", post(handlers::logout))
        .route("/me", get(handlers::me).put(handlers::update_me))
        .route("/verify-otp", post(handlers::verify_otp))
        .route("/resend-verification", post(handlers::resend_verification))
        .route("/forgot-password", post(handlers::forgot_password))
        .route(
            "/verify-password-reset-otp",
            post(handlers::verify_password_reset_otp),
        )
        .route("/reset-password", post(handlers::reset_password))
        .route("/email-change/request", post(email_change::request))
        .route(
            "/email-change/verify-current",
            post(email_change::verify_current),
        )
        .route("/email-change/new-email", post(email_change::new_email))
        .route("/email-change/confirm", post(email_change::confirm))
}
