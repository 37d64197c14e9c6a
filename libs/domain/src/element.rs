//! The `Element` trait ties a payload type to its kind, its partial-update
//! type and its validation rules, so CRUD plumbing can be written once.

use std::fmt::Debug;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use crate::kind::ElementKind;
use crate::validation::ValidationErrors;

pub trait Element:
    Serialize + DeserializeOwned + Clone + Debug + PartialEq + Send + Sync + 'static
{
    const KIND: ElementKind;

    /// Partial update body for `PUT /api/<kind>/:id`.
    type Update: Serialize + DeserializeOwned + Clone + Debug + Default + Send + Sync + 'static;

    fn validate(&self) -> Result<(), ValidationErrors>;

    /// Applies a partial update in place. Absent fields stay as they are;
    /// `clear_*` flags null the matching optional field.
    fn apply_update(&mut self, update: Self::Update);

    /// Visits every free-text field that ends up typeset on the resume.
    /// URL fields are skipped.
    fn for_each_text_mut(&mut self, f: &mut dyn FnMut(&mut String));

    /// One-line description used in listings and activity feeds.
    fn summary(&self) -> String;
}

/// A stored element: the payload flattened next to its ownership and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<T> {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(flatten)]
    pub data: T,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub(crate) fn set<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

pub(crate) fn set_nullable<T>(target: &mut Option<T>, value: Option<T>, clear: bool) {
    if clear {
        *target = None;
    } else if value.is_some() {
        *target = value;
    }
}

pub(crate) fn visit_opt(value: &mut Option<String>, f: &mut dyn FnMut(&mut String)) {
    if let Some(v) = value.as_mut() {
        f(v);
    }
}

/// Accepts `null` where a list is expected; extraction output uses both.
pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
