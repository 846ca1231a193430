//! Cart line aggregation and pricing.

pub mod calculators;
pub mod models;
pub mod requests;
pub mod responses;
pub mod routes;
pub mod services;

pub use calculators::{final_price, round_money};
pub use models::{CartLine, CartStatus, Owner};
pub use routes::router;
