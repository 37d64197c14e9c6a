use serde::{Deserialize, Serialize};

use crate::element::{set, Element};
use crate::kind::ElementKind;
use crate::validation::{check_count, rules, ValidationErrors};

/// A titled piece of work nested under one position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceProject {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub company: String,
    pub location: String,
    pub position: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub projects: Vec<ExperienceProject>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceUpdate {
    pub company: Option<String>,
    pub location: Option<String>,
    pub position: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub projects: Option<Vec<ExperienceProject>>,
}

impl Element for Experience {
    const KIND: ElementKind = ElementKind::Experience;
    type Update = ExperienceUpdate;

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        rules::COMPANY.check(&mut errors, "company", &self.company);
        rules::LOCATION.check(&mut errors, "location", &self.location);
        rules::POSITION.check(&mut errors, "position", &self.position);
        rules::START_DATE.check(&mut errors, "start_date", &self.start_date);
        rules::END_DATE.check(&mut errors, "end_date", &self.end_date);
        check_count(
            &mut errors,
            "projects",
            self.projects.len(),
            0,
            rules::MAX_SUB_PROJECTS,
        );
        for (i, project) in self.projects.iter().enumerate() {
            rules::SUB_PROJECT_TITLE.check(&mut errors, &format!("projects[{i}].title"), &project.title);
            rules::SUB_PROJECT_DESCRIPTION.check(
                &mut errors,
                &format!("projects[{i}].description"),
                &project.description,
            );
        }
        errors.into_result()
    }

    fn apply_update(&mut self, update: ExperienceUpdate) {
        set(&mut self.company, update.company);
        set(&mut self.location, update.location);
        set(&mut self.position, update.position);
        set(&mut self.start_date, update.start_date);
        set(&mut self.end_date, update.end_date);
        set(&mut self.projects, update.projects);
    }

    fn for_each_text_mut(&mut self, f: &mut dyn FnMut(&mut String)) {
        f(&mut self.company);
        f(&mut self.location);
        f(&mut self.position);
        f(&mut self.start_date);
        f(&mut self.end_date);
        for project in &mut self.projects {
            f(&mut project.title);
            f(&mut project.description);
        }
    }

    fn summary(&self) -> String {
        format!("{} at {}", self.position, self.company)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_project_errors_are_indexed() {
        let exp = Experience {
            company: "Acme".to_string(),
            location: "Remote".to_string(),
            position: "Engineer".to_string(),
            start_date: "Jan 2022".to_string(),
            end_date: "Present".to_string(),
            projects: vec![
                ExperienceProject {
                    title: "Billing".to_string(),
                    description: "Cut invoice latency by 40%".to_string(),
                },
                ExperienceProject {
                    title: String::new(),
                    description: "x".repeat(501),
                },
            ],
        };
        let errors = exp.validate().unwrap_err();
        assert!(errors.has_field("projects[1].title"));
        assert!(errors.has_field("projects[1].description"));
        assert!(!errors.has_field("projects[0].title"));
    }
}
