//! Accounts, sessions and one-time-code flows.

use chrono::{DateTime, Utc};
use email_address::EmailAddress;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validation::{FieldRule, Pattern, ValidationErrors};

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;
pub const OTP_LEN: usize = 6;

const PERSON_NAME: FieldRule = FieldRule::required(50, Pattern::Name);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_email(&mut errors, "email", &self.email);
        check_password(&mut errors, "password", &self.password);
        PERSON_NAME.check(&mut errors, "first_name", &self.first_name);
        PERSON_NAME.check(&mut errors, "last_name", &self.last_name);
        errors.into_result()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Returned by login and refresh. The refresh token itself travels only in
/// the `refresh_token` HttpOnly cookie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub credits: i64,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserAnalytics {
    pub ai_calls_count: i64,
    pub tokens_used: i64,
    pub pdfs_generated_count: i64,
    pub pdfs_downloaded_count: i64,
    pub last_ai_call_at: Option<DateTime<Utc>>,
    pub last_pdf_generated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_admin: bool,
    pub is_verified: bool,
    pub credits: i64,
    pub max_resume: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl UpdateProfileRequest {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(first) = &self.first_name {
            PERSON_NAME.check(&mut errors, "first_name", first);
        }
        if let Some(last) = &self.last_name {
            PERSON_NAME.check(&mut errors, "last_name", last);
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpVerification {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub new_password: String,
}

impl ResetPasswordRequest {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_email(&mut errors, "email", &self.email);
        check_password(&mut errors, "new_password", &self.new_password);
        errors.into_result()
    }
}

/// Step 1 of an email change: prove the password.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailChangeStart {
    pub password: String,
}

/// Steps 2 and 4: a code sent to the current or the new address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpCode {
    pub otp: String,
}

/// Step 3: the address to move to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEmailRequest {
    pub new_email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Lower-cased, trimmed form used for storage and lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_valid_otp(otp: &str) -> bool {
    otp.len() == OTP_LEN && otp.bytes().all(|b| b.is_ascii_digit())
}

pub fn check_email(errors: &mut ValidationErrors, field: &str, email: &str) {
    if !EmailAddress::is_valid(email.trim()) {
        errors.push(field, "must be a valid email address");
    }
}

pub fn check_password(errors: &mut ValidationErrors, field: &str, password: &str) {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        errors.push(
            field,
            format!("must be at least {MIN_PASSWORD_LEN} characters"),
        );
    } else if len > MAX_PASSWORD_LEN {
        errors.push(field, format!("must be at most {MAX_PASSWORD_LEN} characters"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            first_name: "Asha".to_string(),
            last_name: "Rao".to_string(),
        }
    }

    #[test]
    fn test_register_validation() {
        assert!(register("asha@example.com", "hunter2hunter2").validate().is_ok());

        let errors = register("asha@", "short").validate().unwrap_err();
        assert!(errors.has_field("email"));
        assert!(errors.has_field("password"));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Asha@Example.COM "), "asha@example.com");
    }

    #[test]
    fn test_otp_shape() {
        assert!(is_valid_otp("042917"));
        assert!(!is_valid_otp("42917"));
        assert!(!is_valid_otp("04291a"));
    }
}
