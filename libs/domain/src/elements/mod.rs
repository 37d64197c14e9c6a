mod award;
mod certification;
mod education;
mod experience;
mod heading;
mod project;
mod skill;
mod volunteer;

pub use award::{Award, AwardUpdate};
pub use certification::{Certification, CertificationUpdate};
pub use education::{Education, EducationUpdate};
pub use experience::{Experience, ExperienceProject, ExperienceUpdate};
pub use heading::{CustomLink, Heading, HeadingUpdate};
pub use project::{Project, ProjectUpdate};
pub use skill::{Skill, SkillUpdate};
pub use volunteer::{Volunteer, VolunteerUpdate};
