use serde::{Deserialize, Serialize};

use crate::element::{set, set_nullable, Element};
use crate::kind::ElementKind;
use crate::validation::{check_count, rules, ValidationErrors};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Education {
    pub institution: String,
    pub location: String,
    pub degree: String,
    #[serde(default)]
    pub gpa: Option<f64>,
    #[serde(default)]
    pub max_gpa: Option<f64>,
    pub start_date: String,
    /// A date or `Present`.
    pub end_date: String,
    #[serde(default, deserialize_with = "crate::element::null_as_empty")]
    pub courses: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationUpdate {
    pub institution: Option<String>,
    pub location: Option<String>,
    pub degree: Option<String>,
    pub gpa: Option<f64>,
    #[serde(default)]
    pub clear_gpa: bool,
    pub max_gpa: Option<f64>,
    #[serde(default)]
    pub clear_max_gpa: bool,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub courses: Option<Vec<String>>,
}

impl Education {
    /// GPA and its scale form a bounded pair: a GPA needs a scale, both are
    /// positive, the scale is at most 10 and the GPA never exceeds it.
    fn check_gpa(&self, errors: &mut ValidationErrors) {
        if let Some(max) = self.max_gpa {
            if !max.is_finite() || max <= 0.0 || max > rules::MAX_GPA_CEILING {
                errors.push(
                    "max_gpa",
                    format!("must be greater than 0 and at most {}", rules::MAX_GPA_CEILING),
                );
            }
        }
        let Some(gpa) = self.gpa else { return };
        if !gpa.is_finite() || gpa <= 0.0 {
            errors.push("gpa", "must be greater than 0");
        }
        match self.max_gpa {
            None => errors.push("max_gpa", "is required when gpa is set"),
            Some(max) if gpa > max => errors.push("gpa", "must not exceed max_gpa"),
            Some(_) => {}
        }
    }
}

impl Element for Education {
    const KIND: ElementKind = ElementKind::Education;
    type Update = EducationUpdate;

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        rules::INSTITUTION.check(&mut errors, "institution", &self.institution);
        rules::LOCATION.check(&mut errors, "location", &self.location);
        rules::DEGREE.check(&mut errors, "degree", &self.degree);
        rules::START_DATE.check(&mut errors, "start_date", &self.start_date);
        rules::END_DATE.check(&mut errors, "end_date", &self.end_date);
        self.check_gpa(&mut errors);
        check_count(&mut errors, "courses", self.courses.len(), 0, rules::MAX_COURSES);
        for (i, course) in self.courses.iter().enumerate() {
            rules::COURSE.check(&mut errors, &format!("courses[{i}]"), course);
        }
        errors.into_result()
    }

    fn apply_update(&mut self, update: EducationUpdate) {
        set(&mut self.institution, update.institution);
        set(&mut self.location, update.location);
        set(&mut self.degree, update.degree);
        set_nullable(&mut self.gpa, update.gpa, update.clear_gpa);
        set_nullable(&mut self.max_gpa, update.max_gpa, update.clear_max_gpa);
        set(&mut self.start_date, update.start_date);
        set(&mut self.end_date, update.end_date);
        set(&mut self.courses, update.courses);
    }

    fn for_each_text_mut(&mut self, f: &mut dyn FnMut(&mut String)) {
        f(&mut self.institution);
        f(&mut self.location);
        f(&mut self.degree);
        f(&mut self.start_date);
        f(&mut self.end_date);
        self.courses.iter_mut().for_each(|c| f(c));
    }

    fn summary(&self) -> String {
        format!("{} at {}", self.degree, self.institution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn education(gpa: Option<f64>, max_gpa: Option<f64>) -> Education {
        Education {
            institution: "IIT Bombay".to_string(),
            location: "Mumbai".to_string(),
            degree: "B.Tech Computer Science".to_string(),
            gpa,
            max_gpa,
            start_date: "Jul 2019".to_string(),
            end_date: "Present".to_string(),
            courses: vec!["Operating Systems".to_string()],
        }
    }

    #[test]
    fn test_gpa_within_scale_passes() {
        assert!(education(Some(8.7), Some(10.0)).validate().is_ok());
        assert!(education(None, None).validate().is_ok());
        assert!(education(None, Some(4.0)).validate().is_ok());
    }

    #[test]
    fn test_gpa_above_max_rejected() {
        let errors = education(Some(4.2), Some(4.0)).validate().unwrap_err();
        assert!(errors.has_field("gpa"));
    }

    #[test]
    fn test_gpa_without_max_rejected() {
        let errors = education(Some(3.5), None).validate().unwrap_err();
        assert!(errors.has_field("max_gpa"));
    }

    #[test]
    fn test_max_gpa_above_ceiling_rejected() {
        let errors = education(Some(50.0), Some(100.0)).validate().unwrap_err();
        assert!(errors.has_field("max_gpa"));
    }

    #[test]
    fn test_clear_gpa_then_revalidate() {
        let mut edu = education(Some(3.9), Some(4.0));
        edu.apply_update(EducationUpdate {
            clear_max_gpa: true,
            ..Default::default()
        });
        assert_eq!(edu.max_gpa, None);
        assert!(edu.validate().unwrap_err().has_field("max_gpa"));
    }
}
