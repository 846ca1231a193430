//! Promotional campaigns, coupon validation and the expired offer-product sweep.

pub mod models;
pub mod requests;
pub mod responses;
pub mod routes;
pub mod services;
pub mod sweeper;

pub use models::{normalize_code, Offer, OfferKind};
pub use routes::router;
pub use sweeper::start_offer_sweeper;
