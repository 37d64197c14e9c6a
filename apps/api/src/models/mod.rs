pub mod ai;
pub mod element;
pub mod payment;
pub mod resume;
pub mod user;
