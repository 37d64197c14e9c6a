//! Endpoint wrappers, one module per area of the API. Each adds methods to
//! [`crate::ApiClient`] so callers share one session and refresh pipeline.

pub mod admin;
pub mod ai;
pub mod auth;
pub mod dashboard;
pub mod payments;
pub mod resources;
pub mod resumes;

pub use resources::ResourceApi;

use crate::error::ClientError;

/// List endpoints answer 404 when the user has nothing yet.
pub(crate) fn empty_on_404<T>(result: Result<Vec<T>, ClientError>) -> Result<Vec<T>, ClientError> {
    match result {
        Err(e) if e.is_not_found() => Ok(Vec::new()),
        other => other,
    }
}
