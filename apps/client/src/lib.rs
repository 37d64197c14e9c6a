//! Typed client for the resume API.
//!
//! [`ApiClient`] wraps an [`HttpTransport`], attaches the session's bearer
//! token and transparently refreshes it once on a 401. Per-area calls live
//! in [`api`]; [`store`], [`review`] and [`email_change`] hold the state the
//! web client keeps between calls.

pub mod api;
pub mod config;
pub mod email_change;
pub mod error;
pub mod http;
pub mod review;
pub mod session;
pub mod store;
pub mod transport;

pub use config::ClientConfig;
pub use error::ClientError;
pub use http::ApiClient;
pub use session::{SessionEvent, SessionStore};
pub use transport::{HttpTransport, ReqwestTransport};
