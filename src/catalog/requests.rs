//! Request DTOs for catalog endpoints.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Create or replace a product
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub category: String,
    pub price: Decimal,
    #[serde(default)]
    pub discount_eligible: bool,
    #[serde(default)]
    pub images: Vec<String>,
    /// Offer-products only
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    /// Offer-products only
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}
