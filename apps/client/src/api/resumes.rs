use resume_domain::ai::{SelectElementsRequest, SelectElementsResponse};
use resume_domain::{
    CustomResume, CustomResumeCreate, CustomResumeUpdate, DownloadRecorded, GeneratedResume,
    ResumeSections,
};
use uuid::Uuid;

use crate::error::ClientError;
use crate::http::ApiClient;

const BASE: &str = "/api/custom-resume";

impl ApiClient {
    pub async fn list_resumes(&self) -> Result<Vec<CustomResume>, ClientError> {
        super::empty_on_404(self.get(&format!("{BASE}/")).await)
    }

    pub async fn get_resume(&self, id: Uuid) -> Result<CustomResume, ClientError> {
        self.get(&format!("{BASE}/{id}")).await
    }

    pub async fn create_resume(&self, req: &CustomResumeCreate) -> Result<CustomResume, ClientError> {
        req.validate()?;
        self.post(&format!("{BASE}/"), req).await
    }

    pub async fn update_resume(
        &self,
        id: Uuid,
        req: &CustomResumeUpdate,
    ) -> Result<CustomResume, ClientError> {
        self.put(&format!("{BASE}/{id}"), req).await
    }

    pub async fn delete_resume(&self, id: Uuid) -> Result<(), ClientError> {
        self.delete(&format!("{BASE}/{id}")).await
    }

    /// Every element the user owns, grouped by kind, for the resume builder.
    pub async fn user_elements(&self) -> Result<ResumeSections, ClientError> {
        self.get(&format!("{BASE}/user-elements")).await
    }

    pub async fn select_elements(
        &self,
        job_description: &str,
    ) -> Result<SelectElementsResponse, ClientError> {
        let body = SelectElementsRequest {
            job_description: job_description.to_string(),
        };
        let response: SelectElementsResponse =
            self.post(&format!("{BASE}/select-elements"), &body).await?;
        self.session().set_credits(response.credits_remaining);
        Ok(response)
    }

    pub async fn generate_resume(&self, id: Uuid) -> Result<GeneratedResume, ClientError> {
        self.post_empty(&format!("{BASE}/{id}/generate")).await
    }

    pub async fn record_download(&self, id: Uuid) -> Result<DownloadRecorded, ClientError> {
        self.post_empty(&format!("{BASE}/{id}/download")).await
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use serde_json::json;

    use super::*;
    use crate::http::testing::{client, token_body, ScriptedTransport};

    #[tokio::test]
    async fn test_select_elements_updates_credits() {
        let transport = ScriptedTransport::new(|req, _| {
            assert_eq!(req.path, "/api/custom-resume/select-elements");
            (
                StatusCode::OK,
                json!({
                    "selection": {"project_ids": []},
                    "reasoning": "Backend roles",
                    "tokens_used": 321,
                    "credits_remaining": 4
                }),
            )
        });
        let client = client(transport);
        client
            .session()
            .establish(&serde_json::from_value(token_body("t", 9)).unwrap());
        let response = client.select_elements("Rust developer").await.unwrap();
        assert_eq!(response.tokens_used, 321);
        assert_eq!(client.session().credits(), Some(4));
    }

    #[tokio::test]
    async fn test_resume_list_404_is_empty() {
        let transport = ScriptedTransport::new(|_, _| {
            (StatusCode::NOT_FOUND, json!({"detail": "Custom resume not found"}))
        });
        assert!(client(transport).list_resumes().await.unwrap().is_empty());
    }
}
