//! Saved-for-later product references.

pub mod models;
pub mod requests;
pub mod responses;
pub mod routes;
pub mod services;

pub use models::WishlistEntry;
pub use routes::router;
