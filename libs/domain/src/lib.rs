//! Types and rules shared by the resume API server and its client.

pub mod account;
pub mod admin;
pub mod ai;
pub mod billing;
pub mod dashboard;
pub mod element;
pub mod elements;
pub mod kind;
pub mod latex;
pub mod resume;
pub mod review;
pub mod validation;

pub use element::{Element, Record};
pub use elements::*;
pub use kind::{ElementKind, UnknownKind};
pub use resume::{
    CustomResume, CustomResumeCreate, CustomResumeUpdate, DownloadRecorded, ElementSelection,
    GeneratedResume, ResumeSections,
};
pub use review::{escape_reserved, review, ExtractedResumeData, ReviewReport, ReviewTab};
pub use validation::{FieldError, ValidationErrors};
