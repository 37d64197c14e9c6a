//! Outgoing email. Resend in production; log-only when no API key is set.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{info, warn};

use crate::errors::AppError;

const RESEND_API_URL: &str = "https://api.resend.com/emails";

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<(), AppError>;
}

pub struct ResendMailer {
    client: Client,
    api_key: String,
    from: String,
}

impl ResendMailer {
    pub fn new(api_key: String, from: String) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(15)).build()?,
            api_key,
            from,
        })
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), AppError> {
        let response = self
            .client
            .post(RESEND_API_URL)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": self.from,
                "to": [mail.to],
                "subject": mail.subject,
                "html": mail.html,
            }))
            .send()
            .await
            .map_err(|e| AppError::Mail(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Mail(format!("resend returned {status}: {body}")));
        }
        info!(to = %mail.to, subject = %mail.subject, "email sent");
        Ok(())
    }
}

/// Development mailer: writes the message to the log instead of sending it.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), AppError> {
        warn!(to = %mail.to, subject = %mail.subject, body = %mail.html, "email not sent (log-only mailer)");
        Ok(())
    }
}

/// What a one-time code is for; drives the email wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpPurpose {
    Verification,
    PasswordReset,
    EmailChangeCurrent,
    EmailChangeNew,
}

impl OtpPurpose {
    pub fn as_str(self) -> &'static str {
        match self {
            OtpPurpose::Verification => "verify",
            OtpPurpose::PasswordReset => "reset",
            OtpPurpose::EmailChangeCurrent => "email-current",
            OtpPurpose::EmailChangeNew => "email-new",
        }
    }
}

pub fn otp_mail(to: &str, first_name: &str, code: &str, purpose: OtpPurpose) -> OutgoingMail {
    let (subject, action) = match purpose {
        OtpPurpose::Verification => ("Verify your email", "verify your email address"),
        OtpPurpose::PasswordReset => ("Reset your password", "reset your password"),
        OtpPurpose::EmailChangeCurrent => (
            "Confirm your email change",
            "confirm that you want to change your email address",
        ),
        OtpPurpose::EmailChangeNew => ("Confirm your new email", "confirm your new email address"),
    };
    let html = format!(
        "<p>Hi {first_name},</p>\
         <p>Use this code to {action}:</p>\
         <p style=\"font-size:24px;font-weight:bold;letter-spacing:4px\">{code}</p>\
         <p>The code expires in 10 minutes. If you did not request it, ignore this email.</p>"
    );
    OutgoingMail {
        to: to.to_string(),
        subject: subject.to_string(),
        html,
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Keeps every message so tests can read the codes that were sent.
    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<OutgoingMail>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, mail: OutgoingMail) -> Result<(), AppError> {
            self.sent.lock().unwrap().push(mail);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_otp_mail_contains_code() {
        let mail = otp_mail("a@b.co", "Asha", "123456", OtpPurpose::PasswordReset);
        assert_eq!(mail.subject, "Reset your password");
        assert!(mail.html.contains("123456"));
        assert!(mail.html.contains("Hi Asha"));
    }
}
