//! Per-user delivery address book.

pub mod models;
pub mod requests;
pub mod responses;
pub mod routes;
pub mod services;

pub use models::Address;
pub use routes::router;
