use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use resume_domain::account::{
    normalize_email, EmailRequest, LoginRequest, MessageResponse, OtpVerification,
    RegisterRequest, ResetPasswordRequest, TokenResponse, UpdateProfileRequest, UserProfile,
};
use resume_domain::billing::{INITIAL_CREDITS, INITIAL_MAX_RESUMES};
use tracing::{info, warn};

use crate::auth::cookies::{clear_refresh_cookie, read_refresh_token};
use crate::auth::extract::AuthUser;
use crate::auth::jwt::TokenType;
use crate::auth::password::{hash_secret, verify_secret};
use crate::auth::{otp, session};
use crate::errors::{AppError, AppJson};
use crate::mailer::{otp_mail, OtpPurpose};
use crate::models::user::{self, UserRow};
use crate::state::AppState;

/// Sends a fresh code. Delivery failures are logged, not returned: the
/// account change already happened and the user can ask for another code.
pub(crate) async fn send_otp(
    state: &AppState,
    to: &str,
    first_name: &str,
    purpose: OtpPurpose,
    subject: &str,
) -> Result<(), AppError> {
    let code = otp::issue(&state.redis, purpose, subject).await?;
    if let Err(e) = state.mailer.send(otp_mail(to, first_name, &code, purpose)).await {
        warn!(purpose = purpose.as_str(), "failed to deliver otp: {e}");
    }
    Ok(())
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserProfile>), AppError> {
    req.validate()?;
    let email = normalize_email(&req.email);
    if user::find_by_email(&state.db, &email).await?.is_some() {
        return Err(AppError::BadRequest("Email already registered".into()));
    }

    let password_hash = hash_secret(&req.password).await?;
    let user: UserRow = sqlx::query_as(
        r#"
        INSERT INTO users (email, password_hash, first_name, last_name, credits, max_resume)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(&email)
    .bind(password_hash)
    .bind(req.first_name.trim())
    .bind(req.last_name.trim())
    .bind(INITIAL_CREDITS)
    .bind(INITIAL_MAX_RESUMES)
    .fetch_one(&state.db)
    .await?;

    info!(user_id = %user.id, "user registered");
    send_otp(&state, &user.email, &user.first_name, OtpPurpose::Verification, &user.email).await?;
    Ok((StatusCode::CREATED, Json(user.profile())))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let invalid = || AppError::Unauthorized("Invalid email or password".into());
    let user = user::find_by_email(&state.db, &normalize_email(&req.email))
        .await?
        .ok_or_else(invalid)?;
    if !verify_secret(&req.password, &user.password_hash).await? {
        return Err(invalid());
    }
    if user.is_revoked {
        return Err(AppError::Forbidden("Your account has been revoked".into()));
    }
    if !user.is_verified {
        return Err(AppError::Forbidden(
            "Email not verified. Please verify your email before logging in".into(),
        ));
    }

    let (cookie, body) = session::start(&state, &user).await?;
    info!(user_id = %user.id, "user logged in");
    Ok(([(header::SET_COOKIE, cookie)], Json(body)))
}

/// POST /api/auth/refresh
///
/// Rotates the refresh token: the presented one is deleted and a new pair issued.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let token = read_refresh_token(&headers)
        .ok_or_else(|| AppError::Unauthorized("Refresh token not found".into()))?;
    let user_id = state
        .jwt
        .verify(&token, TokenType::Refresh)
        .and_then(|claims| claims.user_id())
        .ok_or_else(|| AppError::Unauthorized("Invalid refresh token".into()))?;

    let stored: Option<(chrono::DateTime<chrono::Utc>,)> = sqlx::query_as(
        "SELECT expires_at FROM refresh_tokens WHERE token_hash = $1 AND user_id = $2",
    )
    .bind(session::hash_token(&token))
    .bind(user_id)
    .fetch_optional(&state.db)
    .await?;
    let Some((expires_at,)) = stored else {
        return Err(AppError::Unauthorized("Refresh token not found".into()));
    };
    session::revoke_one(&state.db, &token).await?;
    if expires_at < chrono::Utc::now() {
        return Err(AppError::Unauthorized("Refresh token expired".into()));
    }

    let user = user::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;
    if user.is_revoked {
        return Err(AppError::Forbidden("Your account has been revoked".into()));
    }

    let (cookie, body): (_, TokenResponse) = session::start(&state, &user).await?;
    Ok(([(header::SET_COOKIE, cookie)], Json(body)))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let message = match read_refresh_token(&headers) {
        Some(token) => {
            session::revoke_one(&state.db, &token).await?;
            "Logged out successfully"
        }
        None => "Already logged out",
    };
    Ok((
        [(header::SET_COOKIE, clear_refresh_cookie(&state.config))],
        Json(MessageResponse::new(message)),
    ))
}

/// GET /api/auth/me
pub async fn me(AuthUser(user): AuthUser) -> Json<UserProfile> {
    Json(user.profile())
}

/// PUT /api/auth/me
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppJson(req): AppJson<UpdateProfileRequest>,
) -> Result<Json<UserProfile>, AppError> {
    req.validate()?;
    let updated: UserRow = sqlx::query_as(
        r#"
        UPDATE users
        SET first_name = COALESCE($2, first_name),
            last_name  = COALESCE($3, last_name),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(user.id)
    .bind(req.first_name.as_deref().map(str::trim))
    .bind(req.last_name.as_deref().map(str::trim))
    .fetch_one(&state.db)
    .await?;
    Ok(Json(updated.profile()))
}

/// POST /api/auth/verify-otp
pub async fn verify_otp(
    State(state): State<AppState>,
    AppJson(req): AppJson<OtpVerification>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = normalize_email(&req.email);
    let user = user::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    if user.is_verified {
        return Ok(Json(MessageResponse::new("Email already verified")));
    }
    otp::verify(&state.redis, OtpPurpose::Verification, &email, &req.otp).await?;
    sqlx::query("UPDATE users SET is_verified = TRUE, updated_at = NOW() WHERE id = $1")
        .bind(user.id)
        .execute(&state.db)
        .await?;
    info!(user_id = %user.id, "email verified");
    Ok(Json(MessageResponse::new("Email verified successfully")))
}

/// POST /api/auth/resend-verification
pub async fn resend_verification(
    State(state): State<AppState>,
    AppJson(req): AppJson<EmailRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = normalize_email(&req.email);
    let user = user::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    if user.is_verified {
        return Err(AppError::BadRequest("Email already verified".into()));
    }
    send_otp(&state, &user.email, &user.first_name, OtpPurpose::Verification, &email).await?;
    Ok(Json(MessageResponse::new("Verification email sent")))
}

const RESET_SENT: &str = "If an account exists for this email, a reset code has been sent";

/// POST /api/auth/forgot-password
///
/// Answers the same way whether or not the email is registered.
pub async fn forgot_password(
    State(state): State<AppState>,
    AppJson(req): AppJson<EmailRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = normalize_email(&req.email);
    if let Some(user) = user::find_by_email(&state.db, &email).await? {
        send_otp(&state, &user.email, &user.first_name, OtpPurpose::PasswordReset, &email).await?;
    }
    Ok(Json(MessageResponse::new(RESET_SENT)))
}

/// POST /api/auth/verify-password-reset-otp
pub async fn verify_password_reset_otp(
    State(state): State<AppState>,
    AppJson(req): AppJson<OtpVerification>,
) -> Result<Json<MessageResponse>, AppError> {
    let email = normalize_email(&req.email);
    otp::verify(&state.redis, OtpPurpose::PasswordReset, &email, &req.otp).await?;
    otp::grant(&state.redis, OtpPurpose::PasswordReset, &email).await?;
    Ok(Json(MessageResponse::new(
        "OTP verified. You can now reset your password",
    )))
}

/// POST /api/auth/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    AppJson(req): AppJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    req.validate()?;
    let email = normalize_email(&req.email);
    if !otp::take_grant(&state.redis, OtpPurpose::PasswordReset, &email).await? {
        return Err(AppError::BadRequest(
            "Password reset not verified or expired. Please verify the OTP again".into(),
        ));
    }
    let user = user::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let password_hash = hash_secret(&req.new_password).await?;
    sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
        .bind(user.id)
        .bind(password_hash)
        .execute(&state.db)
        .await?;
    let revoked = session::revoke_all(&state.db, user.id).await?;
    info!(user_id = %user.id, sessions_revoked = revoked, "password reset");
    Ok(Json(MessageResponse::new("Password reset successfully")))
}
