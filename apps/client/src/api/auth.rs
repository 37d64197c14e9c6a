use resume_domain::account::{
    EmailChangeStart, EmailRequest, LoginRequest, MessageResponse, NewEmailRequest, OtpCode,
    OtpVerification, RegisterRequest, ResetPasswordRequest, TokenResponse, UpdateProfileRequest,
    UserProfile,
};

use crate::error::ClientError;
use crate::http::ApiClient;

impl ApiClient {
    pub async fn register(&self, req: &RegisterRequest) -> Result<UserProfile, ClientError> {
        req.validate()?;
        self.post("/api/auth/register", req).await
    }

    pub async fn login(&self, req: &LoginRequest) -> Result<TokenResponse, ClientError> {
        let token: TokenResponse = self.post("/api/auth/login", req).await?;
        self.session().establish(&token);
        Ok(token)
    }

    /// The local session is cleared even when the server call fails.
    pub async fn logout(&self) -> Result<MessageResponse, ClientError> {
        let result = self.post_empty("/api/auth/logout").await;
        self.session().clear();
        result
    }

    pub async fn me(&self) -> Result<UserProfile, ClientError> {
        let profile: UserProfile = self.get("/api/auth/me").await?;
        self.session().apply_profile(&profile);
        Ok(profile)
    }

    pub async fn update_profile(&self, req: &UpdateProfileRequest) -> Result<UserProfile, ClientError> {
        req.validate()?;
        let profile: UserProfile = self.put("/api/auth/me", req).await?;
        self.session().apply_profile(&profile);
        Ok(profile)
    }

    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<MessageResponse, ClientError> {
        let body = OtpVerification {
            email: email.to_string(),
            otp: otp.to_string(),
        };
        self.post("/api/auth/verify-otp", &body).await
    }

    pub async fn resend_verification(&self, email: &str) -> Result<MessageResponse, ClientError> {
        let body = EmailRequest {
            email: email.to_string(),
        };
        self.post("/api/auth/resend-verification", &body).await
    }

    pub async fn forgot_password(&self, email: &str) -> Result<MessageResponse, ClientError> {
        let body = EmailRequest {
            email: email.to_string(),
        };
        self.post("/api/auth/forgot-password", &body).await
    }

    pub async fn verify_password_reset_otp(
        &self,
        email: &str,
        otp: &str,
    ) -> Result<MessageResponse, ClientError> {
        let body = OtpVerification {
            email: email.to_string(),
            otp: otp.to_string(),
        };
        self.post("/api/auth/verify-password-reset-otp", &body).await
    }

    pub async fn reset_password(&self, req: &ResetPasswordRequest) -> Result<MessageResponse, ClientError> {
        req.validate()?;
        self.post("/api/auth/reset-password", req).await
    }

    pub async fn email_change_request(&self, password: &str) -> Result<MessageResponse, ClientError> {
        let body = EmailChangeStart {
            password: password.to_string(),
        };
        self.post("/api/auth/email-change/request", &body).await
    }

    pub async fn email_change_verify_current(&self, otp: &str) -> Result<MessageResponse, ClientError> {
        let body = OtpCode { otp: otp.to_string() };
        self.post("/api/auth/email-change/verify-current", &body).await
    }

    pub async fn email_change_new_email(&self, new_email: &str) -> Result<MessageResponse, ClientError> {
        let body = NewEmailRequest {
            new_email: new_email.to_string(),
        };
        self.post("/api/auth/email-change/new-email", &body).await
    }

    pub async fn email_change_confirm(&self, otp: &str) -> Result<UserProfile, ClientError> {
        let body = OtpCode { otp: otp.to_string() };
        let profile: UserProfile = self.post("/api/auth/email-change/confirm", &body).await?;
        self.session().apply_profile(&profile);
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use serde_json::json;

    use super::*;
    use crate::http::testing::{client, token_body, ScriptedTransport};

    #[tokio::test]
    async fn test_login_establishes_session() {
        let transport = ScriptedTransport::new(|req, _| {
            assert_eq!(req.path, "/api/auth/login");
            (StatusCode::OK, token_body("t1", 10))
        });
        let client = client(transport);
        let req = LoginRequest {
            email: "ada@example.com".into(),
            password: "correct horse".into(),
        };
        client.login(&req).await.unwrap();
        assert_eq!(client.session().token().as_deref(), Some("t1"));
        assert_eq!(client.session().credits(), Some(10));
    }

    #[tokio::test]
    async fn test_logout_clears_even_on_failure() {
        let transport = ScriptedTransport::new(|_, _| {
            (StatusCode::INTERNAL_SERVER_ERROR, json!({"detail": "A database error occurred"}))
        });
        let client = client(transport);
        client
            .session()
            .establish(&serde_json::from_value(token_body("t1", 1)).unwrap());
        assert!(client.logout().await.is_err());
        assert!(!client.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_invalid_registration_never_sent() {
        let transport = ScriptedTransport::new(|_, _| panic!("no request expected"));
        let client = client(transport);
        let req = RegisterRequest {
            email: "not-an-email".into(),
            password: "short".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
        };
        let err = client.register(&req).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }
}
