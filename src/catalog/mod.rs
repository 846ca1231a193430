//! Product catalog across the four product collections.

pub mod models;
pub mod requests;
pub mod responses;
pub mod routes;
pub mod services;

pub use models::{Product, ProductKind, ProductRef};
pub use routes::router;
