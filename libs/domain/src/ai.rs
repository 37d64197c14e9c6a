//! AI-assisted writing, extraction and element selection.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::resume::ElementSelection;
use crate::review::ExtractedResumeData;

/// Recorded on every AI call and shown in the activity feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiAction {
    RephraseTitle,
    RephraseSubpoints,
    GenerateSubpoints,
    SelectElements,
    ExtractResume,
}

impl AiAction {
    pub fn as_str(self) -> &'static str {
        match self {
            AiAction::RephraseTitle => "rephrase_title",
            AiAction::RephraseSubpoints => "rephrase_subpoints",
            AiAction::GenerateSubpoints => "generate_subpoints",
            AiAction::SelectElements => "select_elements",
            AiAction::ExtractResume => "extract_resume",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        [
            AiAction::RephraseTitle,
            AiAction::RephraseSubpoints,
            AiAction::GenerateSubpoints,
            AiAction::SelectElements,
            AiAction::ExtractResume,
        ]
        .into_iter()
        .find(|a| a.as_str() == s)
    }
}

impl fmt::Display for AiAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sections the writing helpers accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritingSection {
    Experience,
    Project,
}

impl WritingSection {
    pub fn as_str(self) -> &'static str {
        match self {
            WritingSection::Experience => "experience",
            WritingSection::Project => "project",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateSubpointsRequest {
    pub section: WritingSection,
    #[serde(default)]
    pub item_id: Option<Uuid>,
    #[serde(default)]
    pub tech_stack: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RephraseTitleRequest {
    pub section: WritingSection,
    #[serde(default)]
    pub item_id: Option<Uuid>,
    pub current_title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RephraseSubpointsRequest {
    pub section: WritingSection,
    #[serde(default)]
    pub item_id: Option<Uuid>,
    pub subpoints: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateSubpointsResponse {
    pub subpoints: Vec<String>,
    pub tokens_used: i64,
    pub credits_remaining: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RephraseTitleResponse {
    pub rephrased_title: String,
    pub tokens_used: i64,
    pub credits_remaining: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RephraseSubpointsResponse {
    pub rephrased_subpoints: Vec<String>,
    pub tokens_used: i64,
    pub credits_remaining: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractResumeResponse {
    pub extracted_data: ExtractedResumeData,
    pub extraction_id: Uuid,
    pub resume_url: String,
    pub tokens_used: i64,
    pub credits_remaining: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveExtractedRequest {
    pub extracted_data: ExtractedResumeData,
    #[serde(default)]
    pub extraction_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveExtractedResponse {
    pub heading_id: Option<Uuid>,
    pub experience_ids: Vec<Uuid>,
    pub project_ids: Vec<Uuid>,
    pub education_ids: Vec<Uuid>,
    pub skill_ids: Vec<Uuid>,
    pub certification_ids: Vec<Uuid>,
    pub award_ids: Vec<Uuid>,
    pub volunteer_ids: Vec<Uuid>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectElementsRequest {
    pub job_description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectElementsResponse {
    pub selection: ElementSelection,
    #[serde(default)]
    pub reasoning: Option<String>,
    pub tokens_used: i64,
    pub credits_remaining: i64,
}

/// One row of the usage log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiUsageEntry {
    pub action_type: String,
    pub section: String,
    pub item_id: Option<Uuid>,
    pub tokens_used: i64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_round_trips_through_str() {
        for action in [AiAction::RephraseTitle, AiAction::ExtractResume] {
            assert_eq!(AiAction::parse(action.as_str()), Some(action));
        }
        assert_eq!(AiAction::parse("summarise"), None);
    }
}
