//! Request DTOs for offer and coupon endpoints.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

/// Create or replace an offer.
///
/// Everything is optional at the JSON level so that a missing field is
/// reported as a validation error naming the field.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub discount_type: Option<String>,
    pub discount_value: Option<Decimal>,
    pub coupon_code: Option<String>,
    pub products: Option<Vec<Uuid>>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub active: Option<bool>,
    pub coupon_apply_to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ValidateCouponRequest {
    #[serde(default)]
    pub code: String,
}
