use serde::{Deserialize, Serialize};

use crate::element::{set, set_nullable, visit_opt, Element};
use crate::kind::ElementKind;
use crate::validation::{check_count, rules, ValidationErrors};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomLink {
    pub label: String,
    pub url: String,
}

/// Contact line of a resume: phone number plus labelled links.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Heading {
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub custom_links: Vec<CustomLink>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadingUpdate {
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub clear_mobile: bool,
    #[serde(default)]
    pub custom_links: Option<Vec<CustomLink>>,
}

impl Element for Heading {
    const KIND: ElementKind = ElementKind::Heading;
    type Update = HeadingUpdate;

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        rules::MOBILE.check_opt(&mut errors, "mobile", self.mobile.as_deref());
        check_count(
            &mut errors,
            "custom_links",
            self.custom_links.len(),
            0,
            rules::MAX_CUSTOM_LINKS,
        );
        for (i, link) in self.custom_links.iter().enumerate() {
            rules::LINK_LABEL.check(&mut errors, &format!("custom_links[{i}].label"), &link.label);
            rules::LINK_URL.check(&mut errors, &format!("custom_links[{i}].url"), &link.url);
        }
        errors.into_result()
    }

    fn apply_update(&mut self, update: HeadingUpdate) {
        set_nullable(&mut self.mobile, update.mobile, update.clear_mobile);
        set(&mut self.custom_links, update.custom_links);
    }

    fn for_each_text_mut(&mut self, f: &mut dyn FnMut(&mut String)) {
        visit_opt(&mut self.mobile, f);
        for link in &mut self.custom_links {
            f(&mut link.label);
        }
    }

    fn summary(&self) -> String {
        match &self.mobile {
            Some(mobile) => format!("{mobile} ({} links)", self.custom_links.len()),
            None => format!("{} links", self.custom_links.len()),
        }
    }
}
