//! Four-step email change:
//!
//! 1. `request`: confirm the password, code goes to the current address.
//! 2. `verify-current`: code from step 1.
//! 3. `new-email`: submit the new address, code goes there.
//! 4. `confirm`: code from step 3; the address is switched.
//!
//! Progress is kept per user in Redis for ten minutes. Each step only
//! accepts the stage the previous step left behind.

use axum::{extract::State, Json};
use redis::AsyncCommands;
use resume_domain::account::{
    check_email, normalize_email, EmailChangeStart, MessageResponse, NewEmailRequest, OtpCode,
    UserProfile,
};
use resume_domain::ValidationErrors;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::extract::AuthUser;
use crate::auth::handlers::send_otp;
use crate::auth::otp::{self, OTP_TTL_SECS};
use crate::auth::password::verify_secret;
use crate::errors::{AppError, AppJson};
use crate::mailer::OtpPurpose;
use crate::models::user::{self, UserRow};
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
enum Stage {
    CurrentCodeSent,
    CurrentVerified,
    NewCodeSent { new_email: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    CurrentCodeSent,
    CurrentVerified,
    NewCodeSent,
}

fn state_key(user_id: Uuid) -> String {
    format!("email-change:{user_id}")
}

fn require(stage: Option<Stage>, expect: Expect) -> Result<Stage, AppError> {
    let ok = matches!(
        (&stage, expect),
        (Some(Stage::CurrentCodeSent), Expect::CurrentCodeSent)
            | (Some(Stage::CurrentVerified), Expect::CurrentVerified)
            | (Some(Stage::NewCodeSent { .. }), Expect::NewCodeSent)
    );
    match stage {
        Some(stage) if ok => Ok(stage),
        _ => Err(out_of_order()),
    }
}

fn out_of_order() -> AppError {
    AppError::BadRequest("Email change session expired or out of order. Please start again".into())
}

async fn load(state: &AppState, user_id: Uuid) -> Result<Option<Stage>, AppError> {
    let mut conn = state.redis.get_multiplexed_async_connection().await?;
    let raw: Option<String> = conn.get(state_key(user_id)).await?;
    Ok(raw.and_then(|raw| serde_json::from_str(&raw).ok()))
}

async fn save(state: &AppState, user_id: Uuid, stage: &Stage) -> Result<(), AppError> {
    let payload = serde_json::to_string(stage).map_err(anyhow::Error::from)?;
    let mut conn = state.redis.get_multiplexed_async_connection().await?;
    let _: () = conn.set_ex(state_key(user_id), payload, OTP_TTL_SECS).await?;
    Ok(())
}

async fn clear(state: &AppState, user_id: Uuid) -> Result<(), AppError> {
    let mut conn = state.redis.get_multiplexed_async_connection().await?;
    let _: () = conn.del(state_key(user_id)).await?;
    Ok(())
}

/// POST /api/auth/email-change/request
pub async fn request(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppJson(req): AppJson<EmailChangeStart>,
) -> Result<Json<MessageResponse>, AppError> {
    if !verify_secret(&req.password, &user.password_hash).await? {
        return Err(AppError::Unauthorized("Incorrect password".into()));
    }
    let subject = user.id.to_string();
    send_otp(
        &state,
        &user.email,
        &user.first_name,
        OtpPurpose::EmailChangeCurrent,
        &subject,
    )
    .await?;
    save(&state, user.id, &Stage::CurrentCodeSent).await?;
    Ok(Json(MessageResponse::new(
        "A verification code has been sent to your current email",
    )))
}

/// POST /api/auth/email-change/verify-current
pub async fn verify_current(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppJson(req): AppJson<OtpCode>,
) -> Result<Json<MessageResponse>, AppError> {
    require(load(&state, user.id).await?, Expect::CurrentCodeSent)?;
    let subject = user.id.to_string();
    otp::verify(&state.redis, OtpPurpose::EmailChangeCurrent, &subject, &req.otp).await?;
    save(&state, user.id, &Stage::CurrentVerified).await?;
    Ok(Json(MessageResponse::new(
        "Current email verified. Enter your new email address",
    )))
}

/// POST /api/auth/email-change/new-email
pub async fn new_email(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppJson(req): AppJson<NewEmailRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    require(load(&state, user.id).await?, Expect::CurrentVerified)?;

    let mut errors = ValidationErrors::new();
    check_email(&mut errors, "new_email", &req.new_email);
    errors.into_result()?;
    let new_email = normalize_email(&req.new_email);
    if new_email == user.email {
        return Err(AppError::BadRequest(
            "New email must differ from the current one".into(),
        ));
    }
    if user::find_by_email(&state.db, &new_email).await?.is_some() {
        return Err(AppError::BadRequest("Email already registered".into()));
    }

    send_otp(
        &state,
        &new_email,
        &user.first_name,
        OtpPurpose::EmailChangeNew,
        &user.id.to_string(),
    )
    .await?;
    save(&state, user.id, &Stage::NewCodeSent { new_email }).await?;
    Ok(Json(MessageResponse::new(
        "A verification code has been sent to your new email",
    )))
}

/// POST /api/auth/email-change/confirm
pub async fn confirm(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppJson(req): AppJson<OtpCode>,
) -> Result<Json<UserProfile>, AppError> {
    let new_email = match require(load(&state, user.id).await?, Expect::NewCodeSent)? {
        Stage::NewCodeSent { new_email } => new_email,
        _ => return Err(out_of_order()),
    };
    let subject = user.id.to_string();
    otp::verify(&state.redis, OtpPurpose::EmailChangeNew, &subject, &req.otp).await?;

    // The address may have been taken while the code was in flight.
    let updated: UserRow = sqlx::query_as(
        "UPDATE users SET email = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(user.id)
    .bind(&new_email)
    .fetch_one(&state.db)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::BadRequest("Email already registered".into())
        }
        _ => AppError::Database(e),
    })?;
    clear(&state, user.id).await?;

    info!(user_id = %user.id, "email changed");
    Ok(Json(updated.profile()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_accepts_only_the_expected_stage() {
        assert!(require(Some(Stage::CurrentCodeSent), Expect::CurrentCodeSent).is_ok());
        assert!(require(Some(Stage::CurrentCodeSent), Expect::CurrentVerified).is_err());
        assert!(require(None, Expect::CurrentCodeSent).is_err());

        let sent = Stage::NewCodeSent {
            new_email: "new@b.co".into(),
        };
        assert_eq!(require(Some(sent.clone()), Expect::NewCodeSent).unwrap(), sent);
        assert!(require(Some(Stage::CurrentVerified), Expect::NewCodeSent).is_err());
    }

    #[test]
    fn test_stage_round_trips_through_redis_payload() {
        let stage = Stage::NewCodeSent {
            new_email: "new@b.co".into(),
        };
        let json = serde_json::to_string(&stage).unwrap();
        assert!(json.contains("\"stage\":\"new_code_sent\""));
        assert_eq!(serde_json::from_str::<Stage>(&json).unwrap(), stage);
    }
}
