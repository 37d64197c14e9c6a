use serde::{Deserialize, Serialize};

use crate::element::{set, Element};
use crate::kind::ElementKind;
use crate::validation::{rules, ValidationErrors};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Award {
    pub title: String,
    /// Month and year, e.g. `Jan 2025`.
    pub date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AwardUpdate {
    pub title: Option<String>,
    pub date: Option<String>,
}

impl Element for Award {
    const KIND: ElementKind = ElementKind::Award;
    type Update = AwardUpdate;

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        rules::AWARD_TITLE.check(&mut errors, "title", &self.title);
        rules::AWARD_DATE.check(&mut errors, "date", &self.date);
        errors.into_result()
    }

    fn apply_update(&mut self, update: AwardUpdate) {
        set(&mut self.title, update.title);
        set(&mut self.date, update.date);
    }

    fn for_each_text_mut(&mut self, f: &mut dyn FnMut(&mut String)) {
        f(&mut self.title);
        f(&mut self.date);
    }

    fn summary(&self) -> String {
        format!("{} ({})", self.title, self.date)
    }
}
