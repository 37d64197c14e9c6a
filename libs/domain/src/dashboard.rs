//! Dashboard read model and the activity feed merge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ai::AiAction;
use crate::kind::ElementKind;

pub const RECENT_LIMIT: usize = 10;
pub const ACTIVITY_LIMIT: usize = 20;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub credits: i64,
    pub max_resume: i64,
    pub resume_count: i64,
    pub pdfs_generated: i64,
    pub ai_calls_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentResume {
    pub id: Uuid,
    pub name: String,
    pub thumbnail_url: Option<String>,
    pub pdf_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentPdf {
    pub id: Uuid,
    pub resume_id: Uuid,
    pub resume_name: String,
    pub pdf_url: String,
    pub thumbnail_url: Option<String>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementCounts {
    pub headings: i64,
    pub educations: i64,
    pub experiences: i64,
    pub projects: i64,
    pub skills: i64,
    pub certifications: i64,
    pub awards: i64,
    pub volunteers: i64,
}

impl ElementCounts {
    pub fn set(&mut self, kind: ElementKind, count: i64) {
        let slot = match kind {
            ElementKind::Heading => &mut self.headings,
            ElementKind::Education => &mut self.educations,
            ElementKind::Experience => &mut self.experiences,
            ElementKind::Project => &mut self.projects,
            ElementKind::Skill => &mut self.skills,
            ElementKind::Certification => &mut self.certifications,
            ElementKind::Award => &mut self.awards,
            ElementKind::Volunteer => &mut self.volunteers,
        };
        *slot = count;
    }

    pub fn total(&self) -> i64 {
        self.headings
            + self.educations
            + self.experiences
            + self.projects
            + self.skills
            + self.certifications
            + self.awards
            + self.volunteers
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    ResumeCreated,
    PdfGenerated,
    AiUsed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub resume_id: Option<Uuid>,
    pub resume_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub stats: DashboardStats,
    pub recent_resumes: Vec<RecentResume>,
    pub recent_pdfs: Vec<RecentPdf>,
    pub element_counts: ElementCounts,
    pub recent_activity: Vec<Activity>,
}

/// Raw AI log row as read for the feed.
#[derive(Debug, Clone)]
pub struct AiLogEvent {
    pub action_type: String,
    pub section: String,
    pub created_at: DateTime<Utc>,
}

pub fn ai_activity_description(action_type: &str, section: &str) -> String {
    match AiAction::parse(action_type) {
        Some(AiAction::RephraseTitle | AiAction::RephraseSubpoints) => {
            format!("Used AI to rephrase {section}")
        }
        Some(AiAction::GenerateSubpoints) => format!("Used AI to generate subpoints for {section}"),
        Some(AiAction::SelectElements) => "Used AI to select resume elements".to_string(),
        Some(AiAction::ExtractResume) => "Used AI to extract resume data".to_string(),
        None => format!("Used AI for {action_type} on {section}"),
    }
}

/// Builds the feed: one entry per resume created, one per PDF generated and
/// one per AI call, newest first, capped at [`ACTIVITY_LIMIT`].
pub fn merge_activity(
    resumes: &[RecentResume],
    pdfs: &[RecentPdf],
    ai_logs: &[AiLogEvent],
) -> Vec<Activity> {
    let created = resumes.iter().map(|r| Activity {
        kind: ActivityKind::ResumeCreated,
        description: format!("Created resume: {}", r.name),
        timestamp: r.created_at,
        resume_id: Some(r.id),
        resume_name: Some(r.name.clone()),
    });
    let generated = pdfs.iter().map(|p| Activity {
        kind: ActivityKind::PdfGenerated,
        description: format!("Generated PDF for: {}", p.resume_name),
        timestamp: p.generated_at,
        resume_id: Some(p.resume_id),
        resume_name: Some(p.resume_name.clone()),
    });
    let ai = ai_logs.iter().map(|log| Activity {
        kind: ActivityKind::AiUsed,
        description: ai_activity_description(&log.action_type, &log.section),
        timestamp: log.created_at,
        resume_id: None,
        resume_name: None,
    });

    let mut feed: Vec<Activity> = created.chain(generated).chain(ai).collect();
    // stable: ties keep resume, pdf, ai order
    feed.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    feed.truncate(ACTIVITY_LIMIT);
    feed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn resume(name: &str, created_at: DateTime<Utc>) -> RecentResume {
        RecentResume {
            id: Uuid::new_v4(),
            name: name.to_string(),
            thumbnail_url: None,
            pdf_url: None,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn test_feed_sorted_newest_first() {
        let now = Utc::now();
        let r = resume("Backend", now - Duration::hours(3));
        let pdf = RecentPdf {
            id: Uuid::new_v4(),
            resume_id: r.id,
            resume_name: r.name.clone(),
            pdf_url: "https://cdn/x.pdf".to_string(),
            thumbnail_url: None,
            generated_at: now - Duration::hours(1),
        };
        let log = AiLogEvent {
            action_type: "generate_subpoints".to_string(),
            section: "project".to_string(),
            created_at: now - Duration::hours(2),
        };

        let feed = merge_activity(&[r], &[pdf], &[log]);
        let kinds: Vec<_> = feed.iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ActivityKind::PdfGenerated,
                ActivityKind::AiUsed,
                ActivityKind::ResumeCreated
            ]
        );
        assert_eq!(feed[1].description, "Used AI to generate subpoints for project");
    }

    #[test]
    fn test_feed_capped() {
        let now = Utc::now();
        let resumes: Vec<_> = (0..15)
            .map(|i| resume(&format!("r{i}"), now - Duration::minutes(i)))
            .collect();
        let logs: Vec<_> = (0..15)
            .map(|i| AiLogEvent {
                action_type: "extract_resume".to_string(),
                section: "resume".to_string(),
                created_at: now - Duration::minutes(i),
            })
            .collect();
        let feed = merge_activity(&resumes, &[], &logs);
        assert_eq!(feed.len(), ACTIVITY_LIMIT);
        assert!(feed.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    }

    #[test]
    fn test_unknown_action_description() {
        assert_eq!(
            ai_activity_description("summarise", "skill"),
            "Used AI for summarise on skill"
        );
        assert_eq!(
            ai_activity_description("rephrase_title", "experience"),
            "Used AI to rephrase experience"
        );
    }

    #[test]
    fn test_activity_kind_serialized_as_type() {
        let a = Activity {
            kind: ActivityKind::AiUsed,
            description: String::new(),
            timestamp: Utc::now(),
            resume_id: None,
            resume_name: None,
        };
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["type"], "ai_used");
    }
}
