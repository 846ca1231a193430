//! Support request workflow.

pub mod models;
pub mod requests;
pub mod responses;
pub mod routes;
pub mod services;

pub use models::{RequestStatus, SupportRequest};
pub use routes::router;
