//! Custom resumes: a named selection of the user's elements plus the assets
//! produced the last time it was compiled.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::element::Record;
use crate::elements::{
    Award, Certification, Education, Experience, Heading, Project, Skill, Volunteer,
};
use crate::kind::ElementKind;
use crate::validation::{rules, ValidationErrors};

pub const MAX_HEADINGS_PER_RESUME: usize = 1;

/// Element ids chosen for a resume, one list per kind, in display order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementSelection {
    #[serde(default)]
    pub heading_ids: Vec<Uuid>,
    #[serde(default)]
    pub education_ids: Vec<Uuid>,
    #[serde(default)]
    pub experience_ids: Vec<Uuid>,
    #[serde(default)]
    pub project_ids: Vec<Uuid>,
    #[serde(default)]
    pub skill_ids: Vec<Uuid>,
    #[serde(default)]
    pub certification_ids: Vec<Uuid>,
    #[serde(default)]
    pub award_ids: Vec<Uuid>,
    #[serde(default)]
    pub volunteer_ids: Vec<Uuid>,
}

impl ElementSelection {
    pub fn ids(&self, kind: ElementKind) -> &[Uuid] {
        match kind {
            ElementKind::Heading => &self.heading_ids,
            ElementKind::Education => &self.education_ids,
            ElementKind::Experience => &self.experience_ids,
            ElementKind::Project => &self.project_ids,
            ElementKind::Skill => &self.skill_ids,
            ElementKind::Certification => &self.certification_ids,
            ElementKind::Award => &self.award_ids,
            ElementKind::Volunteer => &self.volunteer_ids,
        }
    }

    pub fn ids_mut(&mut self, kind: ElementKind) -> &mut Vec<Uuid> {
        match kind {
            ElementKind::Heading => &mut self.heading_ids,
            ElementKind::Education => &mut self.education_ids,
            ElementKind::Experience => &mut self.experience_ids,
            ElementKind::Project => &mut self.project_ids,
            ElementKind::Skill => &mut self.skill_ids,
            ElementKind::Certification => &mut self.certification_ids,
            ElementKind::Award => &mut self.award_ids,
            ElementKind::Volunteer => &mut self.volunteer_ids,
        }
    }

    /// Every selected id tagged with its kind.
    pub fn iter(&self) -> impl Iterator<Item = (ElementKind, Uuid)> + '_ {
        ElementKind::ALL
            .into_iter()
            .flat_map(move |kind| self.ids(kind).iter().map(move |id| (kind, *id)))
    }

    pub fn total(&self) -> usize {
        ElementKind::ALL.iter().map(|k| self.ids(*k).len()).sum()
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.heading_ids.len() > MAX_HEADINGS_PER_RESUME {
            errors.push(
                "heading_ids",
                format!("a resume can have at most {MAX_HEADINGS_PER_RESUME} heading"),
            );
        }
        for kind in ElementKind::ALL {
            let mut seen = HashSet::new();
            if self.ids(kind).iter().any(|id| !seen.insert(id)) {
                errors.push(format!("{}_ids", kind.as_str()), "contains duplicate ids");
            }
        }
        errors.into_result()
    }

    /// Drops ids that are not in `known`. Used on AI suggestions, which may
    /// reference elements that do not exist.
    pub fn retain_known(&mut self, known: &HashSet<Uuid>) {
        for kind in ElementKind::ALL {
            self.ids_mut(kind).retain(|id| known.contains(id));
        }
        self.heading_ids.truncate(MAX_HEADINGS_PER_RESUME);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomResumeCreate {
    pub name: String,
    #[serde(flatten)]
    pub selection: ElementSelection,
}

impl CustomResumeCreate {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        rules::RESUME_NAME.check(&mut errors, "name", &self.name);
        if let Err(e) = self.selection.validate() {
            errors.extend(e);
        }
        errors.into_result()
    }
}

/// Partial update. A present list replaces the stored one wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomResumeUpdate {
    pub name: Option<String>,
    pub heading_ids: Option<Vec<Uuid>>,
    pub education_ids: Option<Vec<Uuid>>,
    pub experience_ids: Option<Vec<Uuid>>,
    pub project_ids: Option<Vec<Uuid>>,
    pub skill_ids: Option<Vec<Uuid>>,
    pub certification_ids: Option<Vec<Uuid>>,
    pub award_ids: Option<Vec<Uuid>>,
    pub volunteer_ids: Option<Vec<Uuid>>,
}

impl CustomResumeUpdate {
    pub fn apply(self, name: &mut String, selection: &mut ElementSelection) {
        if let Some(n) = self.name {
            *name = n;
        }
        let lists = [
            (ElementKind::Heading, self.heading_ids),
            (ElementKind::Education, self.education_ids),
            (ElementKind::Experience, self.experience_ids),
            (ElementKind::Project, self.project_ids),
            (ElementKind::Skill, self.skill_ids),
            (ElementKind::Certification, self.certification_ids),
            (ElementKind::Award, self.award_ids),
            (ElementKind::Volunteer, self.volunteer_ids),
        ];
        for (kind, ids) in lists {
            if let Some(ids) = ids {
                *selection.ids_mut(kind) = ids;
            }
        }
    }
}

/// Full records grouped by kind. Returned by `user-elements` and embedded in
/// every custom resume response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeSections {
    #[serde(default)]
    pub headings: Vec<Record<Heading>>,
    #[serde(default)]
    pub educations: Vec<Record<Education>>,
    #[serde(default)]
    pub experiences: Vec<Record<Experience>>,
    #[serde(default)]
    pub projects: Vec<Record<Project>>,
    #[serde(default)]
    pub skills: Vec<Record<Skill>>,
    #[serde(default)]
    pub certifications: Vec<Record<Certification>>,
    #[serde(default)]
    pub awards: Vec<Record<Award>>,
    #[serde(default)]
    pub volunteers: Vec<Record<Volunteer>>,
}

impl ResumeSections {
    pub fn count(&self, kind: ElementKind) -> usize {
        match kind {
            ElementKind::Heading => self.headings.len(),
            ElementKind::Education => self.educations.len(),
            ElementKind::Experience => self.experiences.len(),
            ElementKind::Project => self.projects.len(),
            ElementKind::Skill => self.skills.len(),
            ElementKind::Certification => self.certifications.len(),
            ElementKind::Award => self.awards.len(),
            ElementKind::Volunteer => self.volunteers.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        ElementKind::ALL.iter().all(|k| self.count(*k) == 0)
    }
}

/// A custom resume with its referenced elements populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomResume {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    #[serde(flatten)]
    pub sections: ResumeSections,
    pub thumbnail_url: Option<String>,
    pub pdf_url: Option<String>,
    pub latex_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Assets produced by compiling a custom resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedResume {
    pub resume_id: Uuid,
    pub pdf_url: String,
    pub latex_url: String,
    pub thumbnail_url: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadRecorded {
    pub pdf_url: String,
    pub downloaded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_more_than_one_heading_rejected() {
        let selection = ElementSelection {
            heading_ids: vec![Uuid::new_v4(), Uuid::new_v4()],
            ..Default::default()
        };
        let errors = selection.validate().unwrap_err();
        assert!(errors.has_field("heading_ids"));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let id = Uuid::new_v4();
        let selection = ElementSelection {
            skill_ids: vec![id, id],
            ..Default::default()
        };
        assert!(selection.validate().unwrap_err().has_field("skill_ids"));
    }

    #[test]
    fn test_update_replaces_only_present_lists() {
        let keep = Uuid::new_v4();
        let replacement = Uuid::new_v4();
        let mut name = "Backend".to_string();
        let mut selection = ElementSelection {
            skill_ids: vec![keep],
            project_ids: vec![Uuid::new_v4()],
            ..Default::default()
        };
        CustomResumeUpdate {
            project_ids: Some(vec![replacement]),
            ..Default::default()
        }
        .apply(&mut name, &mut selection);

        assert_eq!(name, "Backend");
        assert_eq!(selection.skill_ids, vec![keep]);
        assert_eq!(selection.project_ids, vec![replacement]);
    }

    #[test]
    fn test_create_accepts_flat_json() {
        let id = Uuid::new_v4();
        let body = serde_json::json!({ "name": "SRE", "award_ids": [id] });
        let create: CustomResumeCreate = serde_json::from_value(body).unwrap();
        assert_eq!(create.selection.award_ids, vec![id]);
        assert!(create.selection.heading_ids.is_empty());
        assert!(create.validate().is_ok());
    }

    #[test]
    fn test_retain_known_drops_unknown_ids() {
        let known_id = Uuid::new_v4();
        let known: HashSet<Uuid> = [known_id].into_iter().collect();
        let mut selection = ElementSelection {
            project_ids: vec![known_id, Uuid::new_v4()],
            ..Default::default()
        };
        selection.retain_known(&known);
        assert_eq!(selection.project_ids, vec![known_id]);
        assert_eq!(selection.total(), 1);
    }
}
