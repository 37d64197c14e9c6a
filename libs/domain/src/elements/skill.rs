use serde::{Deserialize, Serialize};

use crate::element::{set, set_nullable, Element};
use crate::kind::ElementKind;
use crate::validation::{check_count, rules, ValidationErrors};

/// A category of skills. `notes` are private to the owner and never typeset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub category: String,
    pub items: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillUpdate {
    pub category: Option<String>,
    pub items: Option<Vec<String>>,
    pub notes: Option<String>,
    #[serde(default)]
    pub clear_notes: bool,
}

impl Element for Skill {
    const KIND: ElementKind = ElementKind::Skill;
    type Update = SkillUpdate;

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        rules::SKILL_CATEGORY.check(&mut errors, "category", &self.category);
        check_count(&mut errors, "items", self.items.len(), 1, rules::MAX_SKILL_ITEMS);
        for (i, item) in self.items.iter().enumerate() {
            rules::SKILL_ITEM.check(&mut errors, &format!("items[{i}]"), item);
        }
        rules::SKILL_NOTES.check_opt(&mut errors, "notes", self.notes.as_deref());
        errors.into_result()
    }

    fn apply_update(&mut self, update: SkillUpdate) {
        set(&mut self.category, update.category);
        set(&mut self.items, update.items);
        set_nullable(&mut self.notes, update.notes, update.clear_notes);
    }

    fn for_each_text_mut(&mut self, f: &mut dyn FnMut(&mut String)) {
        f(&mut self.category);
        self.items.iter_mut().for_each(|i| f(i));
    }

    fn summary(&self) -> String {
        format!("{}: {}", self.category, self.items.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_needs_at_least_one_item() {
        let skill = Skill {
            category: "Languages".to_string(),
            items: vec![],
            notes: None,
        };
        assert!(skill.validate().unwrap_err().has_field("items"));
    }

    #[test]
    fn test_symbols_common_in_skill_names_allowed() {
        let skill = Skill {
            category: "Languages".to_string(),
            items: vec!["C++".into(), "C#".into(), "Node.js".into(), "Objective-C".into()],
            notes: Some("mention C++ for systems roles".to_string()),
        };
        assert!(skill.validate().is_ok());
    }

    #[test]
    fn test_notes_are_not_typeset() {
        let mut skill = Skill {
            category: "Tools".to_string(),
            items: vec!["git".into()],
            notes: Some("100% private".to_string()),
        };
        let mut visited = Vec::new();
        skill.for_each_text_mut(&mut |s| visited.push(s.clone()));
        assert_eq!(visited, vec!["Tools".to_string(), "git".to_string()]);
    }
}
