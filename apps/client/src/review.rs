//! Review of an AI extraction before it is saved.
//!
//! The report is recomputed from the data after every edit, so it can never
//! disagree with what would be sent.

use resume_domain::ai::{ExtractResumeResponse, SaveExtractedRequest, SaveExtractedResponse};
use resume_domain::{escape_reserved, review, ExtractedResumeData, ReviewReport, ReviewTab, ValidationErrors};
use uuid::Uuid;

use crate::error::ClientError;
use crate::http::ApiClient;

#[derive(Debug, Clone)]
pub struct ReviewSession {
    extraction_id: Option<Uuid>,
    data: ExtractedResumeData,
    report: ReviewReport,
    active_tab: ReviewTab,
    saved: bool,
}

impl ReviewSession {
    pub fn new(data: ExtractedResumeData, extraction_id: Option<Uuid>) -> Self {
        let report = review(&data);
        let active_tab = report.invalid_tabs().next().unwrap_or(ReviewTab::Heading);
        Self {
            extraction_id,
            data,
            report,
            active_tab,
            saved: false,
        }
    }

    pub fn from_extraction(extraction: ExtractResumeResponse) -> Self {
        Self::new(extraction.extracted_data, Some(extraction.extraction_id))
    }

    pub fn data(&self) -> &ExtractedResumeData {
        &self.data
    }

    pub fn report(&self) -> &ReviewReport {
        &self.report
    }

    pub fn active_tab(&self) -> ReviewTab {
        self.active_tab
    }

    pub fn select_tab(&mut self, tab: ReviewTab) {
        self.active_tab = tab;
    }

    /// Applies one edit and re-derives the report.
    pub fn edit(&mut self, f: impl FnOnce(&mut ExtractedResumeData)) {
        f(&mut self.data);
        self.report = review(&self.data);
    }

    pub fn can_save(&self) -> bool {
        !self.saved && !self.data.is_empty() && self.report.is_valid()
    }

    /// Escapes reserved characters and saves everything in one request.
    pub async fn save(&mut self, client: &ApiClient) -> Result<SaveExtractedResponse, ClientError> {
        if self.saved {
            return Err(single_error("", "This extraction has already been saved"));
        }
        if self.data.is_empty() {
            return Err(single_error("", "There is nothing to save"));
        }
        if !self.report.is_valid() {
            if let Some(tab) = self.report.invalid_tabs().next() {
                self.active_tab = tab;
            }
            return Err(ClientError::Validation(self.report.errors()));
        }

        let request = SaveExtractedRequest {
            extracted_data: escape_reserved(&self.data),
            extraction_id: self.extraction_id,
        };
        let response = client.save_extracted(&request).await?;
        self.saved = true;
        Ok(response)
    }
}

fn single_error(field: &str, message: &str) -> ClientError {
    let mut errors = ValidationErrors::new();
    errors.push(field, message);
    ClientError::Validation(errors)
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use resume_domain::{Award, Experience, ExperienceProject};
    use serde_json::json;

    use super::*;
    use crate::http::testing::{client, ScriptedTransport};
    use crate::transport::RequestBody;

    fn experience(company: &str) -> Experience {
        Experience {
            company: company.to_string(),
            location: "Pune".to_string(),
            position: "Engineer".to_string(),
            start_date: "Jan 2022".to_string(),
            end_date: "Present".to_string(),
            projects: vec![ExperienceProject {
                title: "Billing".to_string(),
                description: "Cut costs by 30% & latency".to_string(),
            }],
        }
    }

    fn invalid_session() -> ReviewSession {
        let data = ExtractedResumeData {
            experiences: vec![experience("")],
            awards: vec![Award {
                title: "Hackathon winner".to_string(),
                date: "Jan 2025".to_string(),
            }],
            ..Default::default()
        };
        ReviewSession::new(data, Some(Uuid::new_v4()))
    }

    #[test]
    fn test_opens_on_first_invalid_tab() {
        let session = invalid_session();
        assert_eq!(session.active_tab(), ReviewTab::Experience);
        assert!(!session.can_save());
    }

    #[test]
    fn test_edit_rederives_report() {
        let mut session = invalid_session();
        session.edit(|data| data.experiences[0].company = "Acme".to_string());
        assert!(session.report().is_valid());
        assert!(session.can_save());
    }

    #[tokio::test]
    async fn test_invalid_data_is_not_sent() {
        let transport = ScriptedTransport::new(|_, _| panic!("no request expected"));
        let client = client(transport);
        let mut session = invalid_session();
        session.select_tab(ReviewTab::Awards);
        let err = session.save(&client).await.unwrap_err();
        match err {
            ClientError::Validation(errors) => {
                assert!(errors.has_field("experiences[0].company"))
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(session.active_tab(), ReviewTab::Experience);
    }

    #[tokio::test]
    async fn test_save_escapes_and_posts_once() {
        let transport = ScriptedTransport::new(|req, _| {
            assert_eq!(req.path, "/api/ai/save-extracted");
            match &req.body {
                RequestBody::Json(body) => {
                    let description =
                        &body["extracted_data"]["experiences"][0]["projects"][0]["description"];
                    assert_eq!(description, "Cut costs by 30\\% \\& latency");
                }
                other => panic!("unexpected body {other:?}"),
            }
            (
                StatusCode::OK,
                json!({"experience_ids": [], "project_ids": [], "education_ids": [],
                       "skill_ids": [], "certification_ids": [], "award_ids": [],
                       "volunteer_ids": [], "heading_id": null, "message": "Saved"}),
            )
        });
        let client = client(transport.clone());
        let mut session = invalid_session();
        session.edit(|data| data.experiences[0].company = "Acme".to_string());

        session.save(&client).await.unwrap();
        assert!(session.save(&client).await.is_err());
        assert_eq!(transport.count("/api/ai/save-extracted"), 1);
        assert!(!session.can_save());
    }
}
