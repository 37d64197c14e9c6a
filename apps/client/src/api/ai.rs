use bytes::Bytes;
use reqwest::Method;
use resume_domain::ai::{
    ExtractResumeResponse, GenerateSubpointsRequest, GenerateSubpointsResponse,
    RephraseSubpointsRequest, RephraseSubpointsResponse, RephraseTitleRequest,
    RephraseTitleResponse, SaveExtractedRequest, SaveExtractedResponse,
};

use crate::error::ClientError;
use crate::http::ApiClient;
use crate::transport::{HttpRequest, RequestBody};

impl ApiClient {
    pub async fn generate_subpoints(
        &self,
        req: &GenerateSubpointsRequest,
    ) -> Result<GenerateSubpointsResponse, ClientError> {
        let response: GenerateSubpointsResponse = self.post("/api/ai/generate-subpoints", req).await?;
        self.session().set_credits(response.credits_remaining);
        Ok(response)
    }

    pub async fn rephrase_title(
        &self,
        req: &RephraseTitleRequest,
    ) -> Result<RephraseTitleResponse, ClientError> {
        let response: RephraseTitleResponse = self.post("/api/ai/rephrase-title", req).await?;
        self.session().set_credits(response.credits_remaining);
        Ok(response)
    }

    pub async fn rephrase_subpoints(
        &self,
        req: &RephraseSubpointsRequest,
    ) -> Result<RephraseSubpointsResponse, ClientError> {
        let response: RephraseSubpointsResponse = self.post("/api/ai/rephrase-subpoints", req).await?;
        self.session().set_credits(response.credits_remaining);
        Ok(response)
    }

    /// Uploads a PDF resume for extraction. The result is meant to be
    /// reviewed with [`crate::review::ReviewSession`] before saving.
    pub async fn extract_resume(
        &self,
        filename: &str,
        pdf: Bytes,
    ) -> Result<ExtractResumeResponse, ClientError> {
        let mut request = HttpRequest::new(Method::POST, "/api/ai/extract-resume");
        request.body = RequestBody::Multipart {
            field: "file".to_string(),
            filename: filename.to_string(),
            content_type: "application/pdf".to_string(),
            bytes: pdf,
        };
        let response = self.send(request).await?;
        let extracted: ExtractResumeResponse = serde_json::from_slice(&response.body)?;
        self.session().set_credits(extracted.credits_remaining);
        Ok(extracted)
    }

    pub async fn save_extracted(
        &self,
        req: &SaveExtractedRequest,
    ) -> Result<SaveExtractedResponse, ClientError> {
        self.post("/api/ai/save-extracted", req).await
    }
}
