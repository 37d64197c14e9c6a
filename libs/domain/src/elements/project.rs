use serde::{Deserialize, Serialize};

use crate::element::{set, set_nullable, visit_opt, Element};
use crate::kind::ElementKind;
use crate::validation::{check_count, rules, ValidationErrors};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    pub tech_stack: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub link_label: Option<String>,
    #[serde(default)]
    pub subpoints: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub tech_stack: Option<String>,
    pub link: Option<String>,
    #[serde(default)]
    pub clear_link: bool,
    pub link_label: Option<String>,
    #[serde(default)]
    pub clear_link_label: bool,
    pub subpoints: Option<Vec<String>>,
}

impl Project {
    fn has_link(&self) -> bool {
        self.link.as_deref().is_some_and(|l| !l.trim().is_empty())
    }
}

impl Element for Project {
    const KIND: ElementKind = ElementKind::Project;
    type Update = ProjectUpdate;

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        rules::PROJECT_NAME.check(&mut errors, "name", &self.name);
        rules::START_DATE.check(&mut errors, "start_date", &self.start_date);
        rules::END_DATE.check(&mut errors, "end_date", &self.end_date);
        rules::TECH_STACK.check(&mut errors, "tech_stack", &self.tech_stack);
        rules::PROJECT_LINK.check_opt(&mut errors, "link", self.link.as_deref());
        rules::PROJECT_LINK_LABEL.check_opt(&mut errors, "link_label", self.link_label.as_deref());
        let has_label = self
            .link_label
            .as_deref()
            .is_some_and(|l| !l.trim().is_empty());
        if self.has_link() && !has_label {
            errors.push("link_label", "is required when a link is provided");
        }
        check_count(
            &mut errors,
            "subpoints",
            self.subpoints.len(),
            0,
            rules::MAX_SUBPOINTS,
        );
        for (i, point) in self.subpoints.iter().enumerate() {
            rules::SUBPOINT.check(&mut errors, &format!("subpoints[{i}]"), point);
        }
        errors.into_result()
    }

    fn apply_update(&mut self, update: ProjectUpdate) {
        set(&mut self.name, update.name);
        set(&mut self.start_date, update.start_date);
        set(&mut self.end_date, update.end_date);
        set(&mut self.tech_stack, update.tech_stack);
        set_nullable(&mut self.link, update.link, update.clear_link);
        set_nullable(&mut self.link_label, update.link_label, update.clear_link_label);
        set(&mut self.subpoints, update.subpoints);
    }

    fn for_each_text_mut(&mut self, f: &mut dyn FnMut(&mut String)) {
        f(&mut self.name);
        f(&mut self.start_date);
        f(&mut self.end_date);
        f(&mut self.tech_stack);
        visit_opt(&mut self.link_label, f);
        self.subpoints.iter_mut().for_each(|p| f(p));
    }

    fn summary(&self) -> String {
        format!("{} ({})", self.name, self.tech_stack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> Project {
        Project {
            name: "Resume Forge".to_string(),
            start_date: "Mar 2024".to_string(),
            end_date: "Present".to_string(),
            tech_stack: "Rust, Axum, PostgreSQL".to_string(),
            link: None,
            link_label: None,
            subpoints: vec!["Served 2k users".to_string()],
        }
    }

    #[test]
    fn test_link_requires_label() {
        let mut p = project();
        p.link = Some("https://github.com/x/forge".to_string());
        let errors = p.validate().unwrap_err();
        assert!(errors.has_field("link_label"));

        p.link_label = Some("Source".to_string());
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_blank_link_does_not_require_label() {
        let mut p = project();
        p.link = Some("  ".to_string());
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_clear_link_keeps_label_rule_satisfied() {
        let mut p = project();
        p.link = Some("https://github.com/x/forge".to_string());
        p.link_label = Some("Source".to_string());
        p.apply_update(ProjectUpdate {
            clear_link: true,
            clear_link_label: true,
            ..Default::default()
        });
        assert_eq!(p.link, None);
        assert_eq!(p.link_label, None);
        assert!(p.validate().is_ok());
    }
}
