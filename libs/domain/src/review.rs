//! Review of AI-extracted resume data before it is saved in one batch.
//!
//! Validity is always derived from the data itself; nothing here stores
//! validation state. Callers re-run [`review`] after every edit.

use serde::{Deserialize, Serialize};

use crate::element::Element;
use crate::elements::{
    Award, Certification, Education, Experience, Heading, Project, Skill, Volunteer,
};
use crate::validation::ValidationErrors;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedResumeData {
    #[serde(default)]
    pub heading: Option<Heading>,
    #[serde(default)]
    pub experiences: Vec<Experience>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub skills: Vec<Skill>,
    #[serde(default)]
    pub certifications: Vec<Certification>,
    #[serde(default)]
    pub awards: Vec<Award>,
    #[serde(default)]
    pub volunteer_experiences: Vec<Volunteer>,
}

impl ExtractedResumeData {
    pub fn item_count(&self, tab: ReviewTab) -> usize {
        match tab {
            ReviewTab::Heading => usize::from(self.heading.is_some()),
            ReviewTab::Experience => self.experiences.len(),
            ReviewTab::Projects => self.projects.len(),
            ReviewTab::Education => self.education.len(),
            ReviewTab::Skills => self.skills.len(),
            ReviewTab::Certifications => self.certifications.len(),
            ReviewTab::Awards => self.awards.len(),
            ReviewTab::Volunteer => self.volunteer_experiences.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        ReviewTab::ALL.iter().all(|t| self.item_count(*t) == 0)
    }

    fn for_each_text_mut(&mut self, f: &mut dyn FnMut(&mut String)) {
        if let Some(h) = self.heading.as_mut() {
            h.for_each_text_mut(f);
        }
        self.experiences.iter_mut().for_each(|e| e.for_each_text_mut(f));
        self.projects.iter_mut().for_each(|e| e.for_each_text_mut(f));
        self.education.iter_mut().for_each(|e| e.for_each_text_mut(f));
        self.skills.iter_mut().for_each(|e| e.for_each_text_mut(f));
        self.certifications.iter_mut().for_each(|e| e.for_each_text_mut(f));
        self.awards.iter_mut().for_each(|e| e.for_each_text_mut(f));
        self.volunteer_experiences
            .iter_mut()
            .for_each(|e| e.for_each_text_mut(f));
    }
}

/// One tab of the review dialog per resume section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewTab {
    Heading,
    Experience,
    Projects,
    Education,
    Skills,
    Certifications,
    Awards,
    Volunteer,
}

impl ReviewTab {
    pub const ALL: [ReviewTab; 8] = [
        ReviewTab::Heading,
        ReviewTab::Experience,
        ReviewTab::Projects,
        ReviewTab::Education,
        ReviewTab::Skills,
        ReviewTab::Certifications,
        ReviewTab::Awards,
        ReviewTab::Volunteer,
    ];

    /// JSON key of the section inside [`ExtractedResumeData`].
    pub fn field(self) -> &'static str {
        match self {
            ReviewTab::Heading => "heading",
            ReviewTab::Experience => "experiences",
            ReviewTab::Projects => "projects",
            ReviewTab::Education => "education",
            ReviewTab::Skills => "skills",
            ReviewTab::Certifications => "certifications",
            ReviewTab::Awards => "awards",
            ReviewTab::Volunteer => "volunteer_experiences",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReviewTab::Heading => "Heading",
            ReviewTab::Experience => "Experience",
            ReviewTab::Projects => "Projects",
            ReviewTab::Education => "Education",
            ReviewTab::Skills => "Skills",
            ReviewTab::Certifications => "Certifications",
            ReviewTab::Awards => "Awards",
            ReviewTab::Volunteer => "Volunteer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabReport {
    pub tab: ReviewTab,
    pub item_count: usize,
    /// Paths are relative to the tab, e.g. `[1].company` or `.mobile`.
    pub errors: ValidationErrors,
}

impl TabReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewReport {
    pub tabs: Vec<TabReport>,
}

impl ReviewReport {
    pub fn is_valid(&self) -> bool {
        self.tabs.iter().all(TabReport::is_valid)
    }

    pub fn tab(&self, tab: ReviewTab) -> Option<&TabReport> {
        self.tabs.iter().find(|t| t.tab == tab)
    }

    pub fn invalid_tabs(&self) -> impl Iterator<Item = ReviewTab> + '_ {
        self.tabs.iter().filter(|t| !t.is_valid()).map(|t| t.tab)
    }

    /// All errors with paths rooted at the request body
    /// (`experiences[1].company`).
    pub fn errors(&self) -> ValidationErrors {
        let mut all = ValidationErrors::new();
        for report in &self.tabs {
            let mut nested = ValidationErrors::new();
            for err in report.errors.iter() {
                nested.push(
                    format!("{}{}", report.tab.field(), err.field),
                    err.message.clone(),
                );
            }
            all.extend(nested);
        }
        all
    }
}

fn review_list<T: Element>(items: &[T]) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    for (i, item) in items.iter().enumerate() {
        if let Err(e) = item.validate() {
            errors.nest(&format!("[{i}]"), e);
        }
    }
    errors
}

fn review_tab(data: &ExtractedResumeData, tab: ReviewTab) -> ValidationErrors {
    match tab {
        ReviewTab::Heading => {
            let mut errors = ValidationErrors::new();
            if let Some(Err(e)) = data.heading.as_ref().map(Heading::validate) {
                errors.nest("", e);
            }
            errors
        }
        ReviewTab::Experience => review_list(&data.experiences),
        ReviewTab::Projects => review_list(&data.projects),
        ReviewTab::Education => review_list(&data.education),
        ReviewTab::Skills => review_list(&data.skills),
        ReviewTab::Certifications => review_list(&data.certifications),
        ReviewTab::Awards => review_list(&data.awards),
        ReviewTab::Volunteer => review_list(&data.volunteer_experiences),
    }
}

/// Validates every section of `data`.
pub fn review(data: &ExtractedResumeData) -> ReviewReport {
    let tabs = ReviewTab::ALL
        .into_iter()
        .map(|tab| TabReport {
            tab,
            item_count: data.item_count(tab),
            errors: review_tab(data, tab),
        })
        .collect();
    ReviewReport { tabs }
}

/// Escapes `%` and `&` with a backslash unless already escaped.
pub fn escape_reserved_str(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut prev = None;
    for c in value.chars() {
        if matches!(c, '%' | '&') && prev != Some('\\') {
            out.push('\\');
        }
        out.push(c);
        prev = Some(c);
    }
    out
}

/// Copy of `data` with `%` and `&` escaped in every typeset text field.
/// URLs are left as they are.
pub fn escape_reserved(data: &ExtractedResumeData) -> ExtractedResumeData {
    let mut escaped = data.clone();
    escaped.for_each_text_mut(&mut |s| {
        if s.contains(['%', '&']) {
            *s = escape_reserved_str(s);
        }
    });
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{CustomLink, ExperienceProject};

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

    #[test]
    fn test_review_reports_per_tab() {
        let data = ExtractedResumeData {
            experiences: vec![experience("Acme"), experience("")],
            awards: vec![Award {
                title: "Hackathon winner".to_string(),
                date: "Jan 2025".to_string(),
            }],
            ..Default::default()
        };
        let report = review(&data);

        assert!(!report.is_valid());
        let exp = report.tab(ReviewTab::Experience).unwrap();
        assert_eq!(exp.item_count, 2);
        assert!(exp.errors.has_field("[1].company"));
        assert!(report.tab(ReviewTab::Awards).unwrap().is_valid());
        assert_eq!(
            report.invalid_tabs().collect::<Vec<_>>(),
            vec![ReviewTab::Experience]
        );
        assert!(report.errors().has_field("experiences[1].company"));
    }

    #[test]
    fn test_empty_data_is_valid() {
        let report = review(&ExtractedResumeData::default());
        assert!(report.is_valid());
        assert_eq!(report.tabs.len(), 8);
    }

    #[test]
    fn test_escape_reserved_str_skips_escaped() {
        assert_eq!(escape_reserved_str("50% & more"), "50\\% \\& more");
        assert_eq!(escape_reserved_str("R\\&D"), "R\\&D");
        assert_eq!(escape_reserved_str("plain"), "plain");
    }

    #[test]
    fn test_escape_reserved_leaves_urls_alone() {
        let data = ExtractedResumeData {
            heading: Some(Heading {
                mobile: None,
                custom_links: vec![CustomLink {
                    label: "R&D".to_string(),
                    url: "https://x.dev/?a=1&b=2".to_string(),
                }],
            }),
            experiences: vec![experience("Smith & Co")],
            ..Default::default()
        };
        let escaped = escape_reserved(&data);
        let link = &escaped.heading.as_ref().unwrap().custom_links[0];
        assert_eq!(link.label, "R\\&D");
        assert_eq!(link.url, "https://x.dev/?a=1&b=2");
        assert_eq!(escaped.experiences[0].company, "Smith \\& Co");
        assert_eq!(
            escaped.experiences[0].projects[0].description,
            "Cut costs by 30\\% \\& latency"
        );
        assert!(review(&escaped).is_valid());
    }

    #[test]
    fn test_escape_is_idempotent() {
        let data = ExtractedResumeData {
            experiences: vec![experience("Smith & Co")],
            ..Default::default()
        };
        let once = escape_reserved(&data);
        assert_eq!(escape_reserved(&once), once);
    }
}
