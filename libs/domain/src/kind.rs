use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The eight user-owned resume element types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Heading,
    Education,
    Experience,
    Project,
    Skill,
    Certification,
    Award,
    Volunteer,
}

impl ElementKind {
    /// Rendering order of sections on a compiled resume.
    pub const ALL: [ElementKind; 8] = [
        ElementKind::Heading,
        ElementKind::Education,
        ElementKind::Experience,
        ElementKind::Project,
        ElementKind::Skill,
        ElementKind::Certification,
        ElementKind::Award,
        ElementKind::Volunteer,
    ];

    /// Storage tag and REST path segment (`/api/<segment>`).
    pub fn as_str(self) -> &'static str {
        match self {
            ElementKind::Heading => "heading",
            ElementKind::Education => "education",
            ElementKind::Experience => "experience",
            ElementKind::Project => "project",
            ElementKind::Skill => "skill",
            ElementKind::Certification => "certification",
            ElementKind::Award => "award",
            ElementKind::Volunteer => "volunteer",
        }
    }

    /// Key used when elements are grouped by kind in a response.
    pub fn plural(self) -> &'static str {
        match self {
            ElementKind::Heading => "headings",
            ElementKind::Education => "educations",
            ElementKind::Experience => "experiences",
            ElementKind::Project => "projects",
            ElementKind::Skill => "skills",
            ElementKind::Certification => "certifications",
            ElementKind::Award => "awards",
            ElementKind::Volunteer => "volunteers",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ElementKind::Heading => "Heading",
            ElementKind::Education => "Education",
            ElementKind::Experience => "Experience",
            ElementKind::Project => "Project",
            ElementKind::Skill => "Skill",
            ElementKind::Certification => "Certification",
            ElementKind::Award => "Award",
            ElementKind::Volunteer => "Volunteer",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown element kind '{0}'")]
pub struct UnknownKind(pub String);

impl FromStr for ElementKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ElementKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s || k.plural() == s)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_singular_and_plural() {
        assert_eq!("skill".parse::<ElementKind>(), Ok(ElementKind::Skill));
        assert_eq!("volunteers".parse::<ElementKind>(), Ok(ElementKind::Volunteer));
        assert!("hobby".parse::<ElementKind>().is_err());
    }

    #[test]
    fn test_serde_uses_snake_case_tag() {
        let json = serde_json::to_string(&ElementKind::Certification).unwrap();
        assert_eq!(json, "\"certification\"");
    }
}
