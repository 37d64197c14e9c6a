//! One-time codes kept in Redis.
//!
//! A code lives at `otp:<purpose>:<subject>` as a bcrypt hash and expires
//! after ten minutes. Guesses are counted with `INCR` on a sibling
//! `otp-attempts:` key before any comparison, so concurrent guesses each get
//! their own attempt number and at most five are ever compared. A correct
//! guess deletes the code; only the request whose `DEL` removed it succeeds.

use rand::Rng;
use redis::AsyncCommands;
use tracing::debug;

use crate::auth::password::{hash_secret, verify_secret};
use crate::errors::AppError;
use crate::mailer::OtpPurpose;

pub const OTP_TTL_SECS: u64 = 600;
pub const MAX_ATTEMPTS: u32 = 5;

fn otp_key(purpose: OtpPurpose, subject: &str) -> String {
    format!("otp:{}:{}", purpose.as_str(), subject)
}

fn attempts_key(purpose: OtpPurpose, subject: &str) -> String {
    format!("otp-attempts:{}:{}", purpose.as_str(), subject)
}

fn grant_key(purpose: OtpPurpose, subject: &str) -> String {
    format!("otp-ok:{}:{}", purpose.as_str(), subject)
}

pub fn generate_code() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{n:06}")
}

/// Outcome of one guess.
#[derive(Debug, PartialEq, Eq)]
enum Check {
    Accepted,
    Rejected { remaining: u32 },
    Exhausted,
}

/// Whether a guess holding the 1-based `attempt` number may be compared at all.
fn admits(attempt: u32) -> bool {
    attempt <= MAX_ATTEMPTS
}

/// `attempt` is the value `INCR` returned for this guess. Past the cap the
/// guess is refused even when it would have matched.
fn judge(attempt: u32, matches: bool) -> Check {
    if !admits(attempt) {
        return Check::Exhausted;
    }
    if matches {
        return Check::Accepted;
    }
    if attempt == MAX_ATTEMPTS {
        Check::Exhausted
    } else {
        Check::Rejected {
            remaining: MAX_ATTEMPTS - attempt,
        }
    }
}

fn expired() -> AppError {
    AppError::BadRequest("OTP has expired or was never requested. Please request a new one".into())
}

async fn connection(
    client: &redis::Client,
) -> Result<redis::aio::MultiplexedConnection, AppError> {
    Ok(client.get_multiplexed_async_connection().await?)
}

/// Creates a fresh code for `subject`, replacing any outstanding one and
/// resetting its attempt count, and returns it in clear for mailing.
pub async fn issue(
    client: &redis::Client,
    purpose: OtpPurpose,
    subject: &str,
) -> Result<String, AppError> {
    let code = generate_code();
    let hash = hash_secret(&code).await?;
    let mut conn = connection(client).await?;
    let _: () = redis::pipe()
        .atomic()
        .set_ex(otp_key(purpose, subject), hash, OTP_TTL_SECS)
        .ignore()
        .del(attempts_key(purpose, subject))
        .ignore()
        .query_async(&mut conn)
        .await?;
    debug!(purpose = purpose.as_str(), "otp issued");
    Ok(code)
}

/// Deletes the code and its counter. `true` only for the caller that
/// actually removed the code.
async fn consume(
    conn: &mut redis::aio::MultiplexedConnection,
    key: &str,
    attempts: &str,
) -> Result<bool, AppError> {
    let (removed, _): (i64, i64) = redis::pipe()
        .atomic()
        .del(key)
        .del(attempts)
        .query_async(conn)
        .await?;
    Ok(removed == 1)
}

/// Checks `code` and consumes it on success.
pub async fn verify(
    client: &redis::Client,
    purpose: OtpPurpose,
    subject: &str,
    code: &str,
) -> Result<(), AppError> {
    let key = otp_key(purpose, subject);
    let attempts = attempts_key(purpose, subject);
    let mut conn = connection(client).await?;
    let hash: Option<String> = conn.get(&key).await?;
    let Some(hash) = hash else {
        return Err(expired());
    };

    let (attempt, _): (u32, bool) = redis::pipe()
        .atomic()
        .incr(&attempts, 1)
        .expire(&attempts, OTP_TTL_SECS as i64)
        .query_async(&mut conn)
        .await?;

    let matches = admits(attempt)
        && resume_domain::account::is_valid_otp(code)
        && verify_secret(code, &hash).await?;
    match judge(attempt, matches) {
        Check::Accepted => {
            if consume(&mut conn, &key, &attempts).await? {
                Ok(())
            } else {
                Err(expired())
            }
        }
        Check::Exhausted => {
            consume(&mut conn, &key, &attempts).await?;
            debug!(purpose = purpose.as_str(), attempt, "otp exhausted");
            Err(AppError::BadRequest(
                "Too many incorrect attempts. Please request a new OTP".into(),
            ))
        }
        Check::Rejected { remaining } => Err(AppError::BadRequest(format!(
            "Invalid OTP. {remaining} attempt(s) remaining"
        ))),
    }
}

/// Records that `subject` passed the OTP step of `purpose`, for the next step to claim.
pub async fn grant(
    client: &redis::Client,
    purpose: OtpPurpose,
    subject: &str,
) -> Result<(), AppError> {
    let mut conn = connection(client).await?;
    let _: () = conn
        .set_ex(grant_key(purpose, subject), "1", OTP_TTL_SECS)
        .await?;
    Ok(())
}

/// Consumes a grant left by [`grant`]. `false` if there is none.
pub async fn take_grant(
    client: &redis::Client,
    purpose: OtpPurpose,
    subject: &str,
) -> Result<bool, AppError> {
    let mut conn = connection(client).await?;
    let removed: i64 = conn.del(grant_key(purpose, subject)).await?;
    Ok(removed > 0)
}
