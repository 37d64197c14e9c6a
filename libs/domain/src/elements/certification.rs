use serde::{Deserialize, Serialize};

use crate::element::{set, set_nullable, visit_opt, Element};
use crate::kind::ElementKind;
use crate::validation::{rules, ValidationErrors};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Certification {
    pub title: String,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub instructor: Option<String>,
    pub platform: String,
    #[serde(default)]
    pub certification_link: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CertificationUpdate {
    pub title: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub instructor: Option<String>,
    #[serde(default)]
    pub clear_instructor: bool,
    pub platform: Option<String>,
    pub certification_link: Option<String>,
    #[serde(default)]
    pub clear_certification_link: bool,
}

impl Element for Certification {
    const KIND: ElementKind = ElementKind::Certification;
    type Update = CertificationUpdate;

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        rules::CERTIFICATION_TITLE.check(&mut errors, "title", &self.title);
        rules::START_DATE.check(&mut errors, "start_date", &self.start_date);
        rules::END_DATE.check(&mut errors, "end_date", &self.end_date);
        rules::INSTRUCTOR.check_opt(&mut errors, "instructor", self.instructor.as_deref());
        rules::PLATFORM.check(&mut errors, "platform", &self.platform);
        rules::CERTIFICATION_LINK.check_opt(
            &mut errors,
            "certification_link",
            self.certification_link.as_deref(),
        );
        errors.into_result()
    }

    fn apply_update(&mut self, update: CertificationUpdate) {
        set(&mut self.title, update.title);
        set(&mut self.start_date, update.start_date);
        set(&mut self.end_date, update.end_date);
        set_nullable(&mut self.instructor, update.instructor, update.clear_instructor);
        set(&mut self.platform, update.platform);
        set_nullable(
            &mut self.certification_link,
            update.certification_link,
            update.clear_certification_link,
        );
    }

    fn for_each_text_mut(&mut self, f: &mut dyn FnMut(&mut String)) {
        f(&mut self.title);
        f(&mut self.start_date);
        f(&mut self.end_date);
        visit_opt(&mut self.instructor, f);
        f(&mut self.platform);
    }

    fn summary(&self) -> String {
        format!("{} ({})", self.title, self.platform)
    }
}
