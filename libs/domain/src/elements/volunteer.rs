use serde::{Deserialize, Serialize};

use crate::element::{set, Element};
use crate::kind::ElementKind;
use crate::validation::{rules, ValidationErrors};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Volunteer {
    pub position: String,
    pub organization: String,
    pub location: String,
    pub description: String,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolunteerUpdate {
    pub position: Option<String>,
    pub organization: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl Element for Volunteer {
    const KIND: ElementKind = ElementKind::Volunteer;
    type Update = VolunteerUpdate;

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        rules::VOLUNTEER_POSITION.check(&mut errors, "position", &self.position);
        rules::ORGANIZATION.check(&mut errors, "organization", &self.organization);
        rules::LOCATION.check(&mut errors, "location", &self.location);
        rules::VOLUNTEER_DESCRIPTION.check(&mut errors, "description", &self.description);
        rules::START_DATE.check(&mut errors, "start_date", &self.start_date);
        rules::END_DATE.check(&mut errors, "end_date", &self.end_date);
        errors.into_result()
    }

    fn apply_update(&mut self, update: VolunteerUpdate) {
        set(&mut self.position, update.position);
        set(&mut self.organization, update.organization);
        set(&mut self.location, update.location);
        set(&mut self.description, update.description);
        set(&mut self.start_date, update.start_date);
        set(&mut self.end_date, update.end_date);
    }

    fn for_each_text_mut(&mut self, f: &mut dyn FnMut(&mut String)) {
        f(&mut self.position);
        f(&mut self.organization);
        f(&mut self.location);
        f(&mut self.description);
        f(&mut self.start_date);
        f(&mut self.end_date);
    }

    fn summary(&self) -> String {
        format!("{} at {}", self.position, self.organization)
    }
}
