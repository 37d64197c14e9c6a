//! Field-level validation: rules, allowed-character patterns and the error
//! collection shared by the server (re-enforcement) and the client (forms).

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// A single failed check, addressed by a dotted/indexed field path
/// such as `custom_links[0].label`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Every failure found while validating one value. Validation never stops at
/// the first error so forms can highlight all offending fields at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Re-homes `other` under `prefix` (`experiences[2]` + `company` → `experiences[2].company`).
    pub fn nest(&mut self, prefix: &str, other: ValidationErrors) {
        for err in other.errors {
            let field = if err.field.is_empty() {
                prefix.to_string()
            } else {
                format!("{prefix}.{}", err.field)
            };
            self.errors.push(FieldError {
                field,
                message: err.message,
            });
        }
    }

    pub fn extend(&mut self, other: ValidationErrors) {
        self.errors.extend(other.errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// `field: message; field: message`, the shape shown in notifications.
    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

impl std::error::Error for ValidationErrors {}

impl IntoIterator for ValidationErrors {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

/// Allowed-character classes. A backslash is only accepted directly before
/// `%` or `&`, which is how the review step pre-escapes those characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// Free text: anything except control characters and angle brackets.
    Text,
    /// Names of people, organisations, places, degrees, skills.
    Name,
    /// Short labels shown as link text.
    LinkLabel,
    /// Phone numbers.
    Mobile,
    /// Absolute http(s) URLs.
    Url,
    /// Month/year style dates or `Present`.
    Date,
}

impl Pattern {
    fn regex(self) -> &'static Regex {
        static TEXT: OnceLock<Regex> = OnceLock::new();
        static NAME: OnceLock<Regex> = OnceLock::new();
        static LINK_LABEL: OnceLock<Regex> = OnceLock::new();
        static MOBILE: OnceLock<Regex> = OnceLock::new();
        static URL: OnceLock<Regex> = OnceLock::new();
        static DATE: OnceLock<Regex> = OnceLock::new();

        let (cell, source) = match self {
            Pattern::Text => (&TEXT, r"^(?:[^<>\\\p{Cc}]|\\[%&]|\n)*$"),
            Pattern::Name => (
                &NAME,
                r"^(?:[\p{L}\p{M}\p{N} .,&%'()/+#:_\-]|\\[%&])*$",
            ),
            Pattern::LinkLabel => (&LINK_LABEL, r"^(?:[\p{L}\p{N} ._/+&\-]|\\&)*$"),
            Pattern::Mobile => (&MOBILE, r"^\+?[0-9(][0-9 ()\-]{5,18}[0-9]$"),
            Pattern::Url => (&URL, r#"^https?://[^\s<>"]+$"#),
            Pattern::Date => (&DATE, r"^(?:Present|[A-Za-z0-9 /,.\-]+)$"),
        };
        cell.get_or_init(|| Regex::new(source).expect("static pattern compiles"))
    }

    fn describe(self) -> &'static str {
        match self {
            Pattern::Text => "contains characters that are not allowed",
            Pattern::Name => "may only contain letters, numbers, spaces and . , & ' ( ) / + # : _ -",
            Pattern::LinkLabel => "may only contain letters, numbers, spaces and . _ / + & -",
            Pattern::Mobile => "must be a phone number of digits, spaces, hyphens or parentheses",
            Pattern::Url => "must be a valid http(s) URL",
            Pattern::Date => "must be a date like 'Jan 2024', '01/2024' or 'Present'",
        }
    }

    pub fn matches(self, value: &str) -> bool {
        self.regex().is_match(value)
    }
}

/// Length ceiling + allowed characters + presence for one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub max_len: usize,
    pub pattern: Pattern,
    pub required: bool,
}

impl FieldRule {
    pub const fn required(max_len: usize, pattern: Pattern) -> Self {
        Self {
            max_len,
            pattern,
            required: true,
        }
    }

    pub const fn optional(max_len: usize, pattern: Pattern) -> Self {
        Self {
            max_len,
            pattern,
            required: false,
        }
    }

    /// Checks `value` and records every failure under `field`.
    /// Lengths are counted in characters, not bytes, and a pre-escaped
    /// `\%` or `\&` counts as the single character it stands for.
    pub fn check(&self, errors: &mut ValidationErrors, field: &str, value: &str) {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            if self.required {
                errors.push(field, "is required");
            }
            return;
        }
        let len = display_len(value);
        if len > self.max_len {
            errors.push(
                field,
                format!("must be at most {} characters (got {len})", self.max_len),
            );
        }
        if !self.pattern.matches(value) {
            errors.push(field, self.pattern.describe());
        }
    }

    /// Optional values: `None` is fine unless the rule says the field is required.
    pub fn check_opt(&self, errors: &mut ValidationErrors, field: &str, value: Option<&str>) {
        match value {
            Some(v) => self.check(errors, field, v),
            None if self.required => errors.push(field, "is required"),
            None => {}
        }
    }
}

fn display_len(value: &str) -> usize {
    let mut len = 0;
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' && matches!(chars.peek(), Some('%') | Some('&')) {
            chars.next();
        }
        len += 1;
    }
    len
}

/// Caps the number of entries in a list field.
pub fn check_count(
    errors: &mut ValidationErrors,
    field: &str,
    count: usize,
    min: usize,
    max: usize,
) {
    if count < min {
        errors.push(field, format!("must contain at least {min} item(s)"));
    } else if count > max {
        errors.push(field, format!("must contain at most {max} item(s)"));
    }
}

/// Field ceilings and patterns for every resume element.
pub mod rules {
    use super::{FieldRule, Pattern};

    pub const MOBILE: FieldRule = FieldRule::optional(20, Pattern::Mobile);
    pub const LINK_LABEL: FieldRule = FieldRule::required(20, Pattern::LinkLabel);
    pub const LINK_URL: FieldRule = FieldRule::required(200, Pattern::Url);
    pub const MAX_CUSTOM_LINKS: usize = 5;

    pub const INSTITUTION: FieldRule = FieldRule::required(100, Pattern::Name);
    pub const LOCATION: FieldRule = FieldRule::required(50, Pattern::Name);
    pub const DEGREE: FieldRule = FieldRule::required(100, Pattern::Name);
    pub const COURSE: FieldRule = FieldRule::required(50, Pattern::Name);
    pub const MAX_COURSES: usize = 20;
    pub const MAX_GPA_CEILING: f64 = 10.0;

    pub const START_DATE: FieldRule = FieldRule::required(20, Pattern::Date);
    pub const END_DATE: FieldRule = FieldRule::required(20, Pattern::Date);
    pub const AWARD_DATE: FieldRule = FieldRule::required(20, Pattern::Date);

    pub const COMPANY: FieldRule = FieldRule::required(100, Pattern::Name);
    pub const POSITION: FieldRule = FieldRule::required(100, Pattern::Name);
    pub const SUB_PROJECT_TITLE: FieldRule = FieldRule::required(100, Pattern::Text);
    pub const SUB_PROJECT_DESCRIPTION: FieldRule = FieldRule::required(500, Pattern::Text);
    pub const MAX_SUB_PROJECTS: usize = 10;

    pub const PROJECT_NAME: FieldRule = FieldRule::required(100, Pattern::Name);
    pub const TECH_STACK: FieldRule = FieldRule::required(200, Pattern::Name);
    pub const PROJECT_LINK: FieldRule = FieldRule::optional(200, Pattern::Url);
    pub const PROJECT_LINK_LABEL: FieldRule = FieldRule::optional(30, Pattern::LinkLabel);
    pub const SUBPOINT: FieldRule = FieldRule::required(300, Pattern::Text);
    pub const MAX_SUBPOINTS: usize = 10;

    pub const SKILL_CATEGORY: FieldRule = FieldRule::required(50, Pattern::Name);
    pub const SKILL_ITEM: FieldRule = FieldRule::required(50, Pattern::Name);
    pub const SKILL_NOTES: FieldRule = FieldRule::optional(500, Pattern::Text);
    pub const MAX_SKILL_ITEMS: usize = 30;

    pub const CERTIFICATION_TITLE: FieldRule = FieldRule::required(150, Pattern::Name);
    pub const INSTRUCTOR: FieldRule = FieldRule::optional(100, Pattern::Name);
    pub const PLATFORM: FieldRule = FieldRule::required(100, Pattern::Name);
    pub const CERTIFICATION_LINK: FieldRule = FieldRule::optional(200, Pattern::Url);

    pub const AWARD_TITLE: FieldRule = FieldRule::required(200, Pattern::Text);

    pub const ORGANIZATION: FieldRule = FieldRule::required(100, Pattern::Name);
    pub const VOLUNTEER_POSITION: FieldRule = FieldRule::required(100, Pattern::Name);
    pub const VOLUNTEER_DESCRIPTION: FieldRule = FieldRule::required(500, Pattern::Text);

    pub const RESUME_NAME: FieldRule = FieldRule::required(100, Pattern::Name);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_label_length_boundary() {
        let mut errors = ValidationErrors::new();
        rules::LINK_LABEL.check(&mut errors, "label", &"a".repeat(20));
        assert!(errors.is_empty());

        rules::LINK_LABEL.check(&mut errors, "label", &"a".repeat(21));
        assert_eq!(errors.len(), 1);
        assert!(errors.has_field("label"));
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let mut errors = ValidationErrors::new();
        rules::LINK_LABEL.check(&mut errors, "label", &"é".repeat(20));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_required_blank_rejected() {
        let mut errors = ValidationErrors::new();
        rules::COMPANY.check(&mut errors, "company", "   ");
        assert_eq!(errors.summary(), "company: is required");
    }

    #[test]
    fn test_optional_absent_accepted() {
        let mut errors = ValidationErrors::new();
        rules::MOBILE.check_opt(&mut errors, "mobile", None);
        rules::MOBILE.check_opt(&mut errors, "mobile", Some(""));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_mobile_pattern() {
        assert!(Pattern::Mobile.matches("+91-827-4925-985"));
        assert!(Pattern::Mobile.matches("(555) 123-4567"));
        assert!(!Pattern::Mobile.matches("call me"));
        assert!(!Pattern::Mobile.matches("12"));
    }

    #[test]
    fn test_url_pattern() {
        assert!(Pattern::Url.matches("https://github.com/x"));
        assert!(!Pattern::Url.matches("github.com/x"));
        assert!(!Pattern::Url.matches("https://exa mple.com"));
    }

    #[test]
    fn test_name_accepts_pre_escaped_reserved_chars_only() {
        assert!(Pattern::Name.matches("R\\&D Labs"));
        assert!(Pattern::Name.matches("C++ & C#"));
        assert!(!Pattern::Name.matches("C:\\Windows"));
    }

    #[test]
    fn test_date_pattern() {
        assert!(Pattern::Date.matches("Jan 2024"));
        assert!(Pattern::Date.matches("Present"));
        assert!(Pattern::Date.matches("01/2024"));
        assert!(!Pattern::Date.matches("soon!"));
    }

    #[test]
    fn test_nest_prefixes_fields() {
        let mut inner = ValidationErrors::new();
        inner.push("label", "is required");
        let mut outer = ValidationErrors::new();
        outer.nest("custom_links[1]", inner);
        assert!(outer.has_field("custom_links[1].label"));
    }

    #[test]
    fn test_count_bounds() {
        let mut errors = ValidationErrors::new();
        check_count(&mut errors, "items", 0, 1, 30);
        check_count(&mut errors, "items", 31, 1, 30);
        check_count(&mut errors, "items", 5, 1, 30);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_pre_escaped_sequence_counts_once() {
        let mut errors = ValidationErrors::new();
        rules::LINK_LABEL.check(&mut errors, "label", "Research \\& Develop");
        assert!(errors.is_empty());
        assert_eq!(display_len("R\\&D"), 3);
    }
}
