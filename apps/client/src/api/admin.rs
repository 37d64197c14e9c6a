use resume_domain::admin::{
    AdminActionResponse, AdminAiUsageResponse, AdminPdfStatsResponse, AdminStatsResponse,
    AdminUserDetail, AdminUsersResponse, CreditsMode, PromoteAdminRequest, UpdateCreditsRequest,
};
use uuid::Uuid;

use crate::error::ClientError;
use crate::http::ApiClient;

impl ApiClient {
    pub async fn admin_users(&self, skip: i64, limit: i64) -> Result<AdminUsersResponse, ClientError> {
        self.get(&format!("/api/admin/users?skip={skip}&limit={limit}")).await
    }

    pub async fn admin_stats(&self) -> Result<AdminStatsResponse, ClientError> {
        self.get("/api/admin/stats").await
    }

    pub async fn admin_user_detail(&self, user_id: Uuid) -> Result<AdminUserDetail, ClientError> {
        self.get(&format!("/api/admin/user/{user_id}")).await
    }

    pub async fn admin_ai_usage(&self) -> Result<AdminAiUsageResponse, ClientError> {
        self.get("/api/admin/ai-usage").await
    }

    pub async fn admin_pdf_stats(&self) -> Result<AdminPdfStatsResponse, ClientError> {
        self.get("/api/admin/pdf-stats").await
    }

    pub async fn promote_admin(&self, email: &str) -> Result<AdminActionResponse, ClientError> {
        let body = PromoteAdminRequest {
            email: email.to_string(),
        };
        self.post("/api/admin/create-admin", &body).await
    }

    pub async fn delete_user(&self, user_id: Uuid) -> Result<AdminActionResponse, ClientError> {
        self.delete_json(&format!("/api/admin/users/{user_id}")).await
    }

    pub async fn revoke_user(&self, user_id: Uuid) -> Result<AdminActionResponse, ClientError> {
        self.post_empty(&format!("/api/admin/users/{user_id}/revoke")).await
    }

    pub async fn unrevoke_user(&self, user_id: Uuid) -> Result<AdminActionResponse, ClientError> {
        self.post_empty(&format!("/api/admin/users/{user_id}/unrevoke")).await
    }

    pub async fn set_user_credits(
        &self,
        user_id: Uuid,
        credits: i64,
        mode: CreditsMode,
    ) -> Result<AdminActionResponse, ClientError> {
        let body = UpdateCreditsRequest { credits, mode };
        self.put(&format!("/api/admin/users/{user_id}/credits"), &body).await
    }
}

#[cfg(test)]
mod tests {
    use reqwest::{Method, StatusCode};
    use serde_json::json;

    use super::*;
    use crate::http::testing::{client, ScriptedTransport};
    use crate::transport::RequestBody;

    #[tokio::test]
    async fn test_adjust_credits_request_shape() {
        let user_id = Uuid::new_v4();
        let transport = ScriptedTransport::new(move |req, _| {
            assert_eq!(req.method, Method::PUT);
            match &req.body {
                RequestBody::Json(body) => {
                    assert_eq!(body["credits"], -5);
                    assert_eq!(body["mode"], "adjust");
                }
                other => panic!("unexpected body {other:?}"),
            }
            (
                StatusCode::OK,
                json!({"message": "Credits updated", "user_id": user_id, "credits": 15}),
            )
        });
        let response = client(transport.clone())
            .set_user_credits(user_id, -5, CreditsMode::Adjust)
            .await
            .unwrap();
        assert_eq!(response.user_id, user_id);
        assert_eq!(transport.paths(), vec![format!("/api/admin/users/{user_id}/credits")]);
    }

    #[tokio::test]
    async fn test_forbidden_is_surfaced() {
        let transport = ScriptedTransport::new(|_, _| {
            (StatusCode::FORBIDDEN, json!({"detail": "Admin access required"}))
        });
        let err = client(transport).admin_stats().await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
        assert_eq!(err.to_string(), "Admin access required");
    }
}
