//! Four-step email change: password, code to the current address, new
//! address, code to the new address. The server holds the authoritative
//! state; this only tracks which form to show.

use resume_domain::account::{check_email, is_valid_otp, UserProfile, OTP_LEN};
use resume_domain::ValidationErrors;

use crate::error::ClientError;
use crate::http::ApiClient;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailChangeStep {
    Password,
    CurrentEmailOtp,
    NewEmail,
    NewEmailOtp { new_email: String },
    Done { email: String },
}

#[derive(Debug, Clone)]
pub struct EmailChangeWizard {
    step: EmailChangeStep,
}

impl Default for EmailChangeWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl EmailChangeWizard {
    pub fn new() -> Self {
        Self {
            step: EmailChangeStep::Password,
        }
    }

    pub fn step(&self) -> &EmailChangeStep {
        &self.step
    }

    /// 1-based position for the progress indicator.
    pub fn position(&self) -> usize {
        match self.step {
            EmailChangeStep::Password => 1,
            EmailChangeStep::CurrentEmailOtp => 2,
            EmailChangeStep::NewEmail => 3,
            EmailChangeStep::NewEmailOtp { .. } | EmailChangeStep::Done { .. } => 4,
        }
    }

    /// Back to the first step, e.g. after the server-side state expired.
    pub fn restart(&mut self) {
        self.step = EmailChangeStep::Password;
    }

    pub async fn submit_password(&mut self, client: &ApiClient, password: &str) -> Result<(), ClientError> {
        self.require_step(&EmailChangeStep::Password)?;
        if password.is_empty() {
            return Err(invalid("password", "is required"));
        }
        client.email_change_request(password).await?;
        self.step = EmailChangeStep::CurrentEmailOtp;
        Ok(())
    }

    pub async fn submit_current_otp(&mut self, client: &ApiClient, otp: &str) -> Result<(), ClientError> {
        self.require_step(&EmailChangeStep::CurrentEmailOtp)?;
        check_otp(otp)?;
        client.email_change_verify_current(otp).await?;
        self.step = EmailChangeStep::NewEmail;
        Ok(())
    }

    pub async fn submit_new_email(&mut self, client: &ApiClient, new_email: &str) -> Result<(), ClientError> {
        self.require_step(&EmailChangeStep::NewEmail)?;
        let mut errors = ValidationErrors::new();
        check_email(&mut errors, "new_email", new_email);
        errors.into_result()?;
        client.email_change_new_email(new_email).await?;
        self.step = EmailChangeStep::NewEmailOtp {
            new_email: new_email.trim().to_string(),
        };
        Ok(())
    }

    /// Completes the change. The session profile is updated by the call.
    pub async fn submit_new_otp(&mut self, client: &ApiClient, otp: &str) -> Result<UserProfile, ClientError> {
        if !matches!(self.step, EmailChangeStep::NewEmailOtp { .. }) {
            return Err(invalid("step", "this step is not active"));
        }
        check_otp(otp)?;
        let profile = client.email_change_confirm(otp).await?;
        self.step = EmailChangeStep::Done {
            email: profile.email.clone(),
        };
        Ok(profile)
    }

    fn require_step(&self, step: &EmailChangeStep) -> Result<(), ClientError> {
        if &self.step == step {
            Ok(())
        } else {
            Err(invalid("step", "this step is not active"))
        }
    }
}

fn check_otp(otp: &str) -> Result<(), ClientError> {
    if is_valid_otp(otp) {
        Ok(())
    } else {
        Err(invalid("otp", &format!("must be {OTP_LEN} digits")))
    }
}

fn invalid(field: &str, message: &str) -> ClientError {
    let mut errors = ValidationErrors::new();
    errors.push(field, message);
    ClientError::Validation(errors)
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use serde_json::json;

    use super::*;
    use crate::http::testing::{client, ScriptedTransport};

    fn profile_body(email: &str) -> serde_json::Value {
        json!({
            "id": "1b2d3c4e-0000-4000-8000-000000000001",
            "email": email,
            "first_name": "Ada",
            "last_name": "Lovelace",
            "is_admin": false,
            "is_verified": true,
            "credits": 10,
            "max_resume": 2,
            "created_at": "2024-05-01T10:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_full_flow() {
        let transport = ScriptedTransport::new(|req, _| match req.path.as_str() {
            "/api/auth/email-change/confirm" => (StatusCode::OK, profile_body("new@example.com")),
            _ => (StatusCode::OK, json!({"message": "ok"})),
        });
        let client = client(transport.clone());
        let mut wizard = EmailChangeWizard::new();

        wizard.submit_password(&client, "hunter22").await.unwrap();
        assert_eq!(wizard.position(), 2);
        wizard.submit_current_otp(&client, "123456").await.unwrap();
        wizard.submit_new_email(&client, "new@example.com").await.unwrap();
        assert_eq!(
            wizard.step(),
            &EmailChangeStep::NewEmailOtp {
                new_email: "new@example.com".into()
            }
        );
        let profile = wizard.submit_new_otp(&client, "654321").await.unwrap();
        assert_eq!(profile.email, "new@example.com");
        assert_eq!(transport.paths().len(), 4);
    }

    #[tokio::test]
    async fn test_server_rejection_keeps_step() {
        let transport = ScriptedTransport::new(|_, _| {
            (StatusCode::BAD_REQUEST, json!({"detail": "Invalid or expired OTP"}))
        });
        let client = client(transport);
        let mut wizard = EmailChangeWizard {
            step: EmailChangeStep::CurrentEmailOtp,
        };
        let err = wizard.submit_current_otp(&client, "000000").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid or expired OTP");
        assert_eq!(wizard.step(), &EmailChangeStep::CurrentEmailOtp);
    }

    #[tokio::test]
    async fn test_out_of_order_and_malformed_input_never_sent() {
        let transport = ScriptedTransport::new(|_, _| panic!("no request expected"));
        let client = client(transport);
        let mut wizard = EmailChangeWizard::new();
        assert!(wizard.submit_new_email(&client, "a@b.co").await.is_err());
        wizard.step = EmailChangeStep::CurrentEmailOtp;
        assert!(wizard.submit_current_otp(&client, "12ab").await.is_err());
    }
}
