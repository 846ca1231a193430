//! Request DTOs for cart endpoints.

use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use super::models::CartStatus;

/// Add a product to a user's or guest's cart
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub user_id: Option<Uuid>,
    pub guest_id: Option<String>,
    pub product_id: Option<Uuid>,
    pub featured_product_id: Option<Uuid>,
    pub online_product_id: Option<Uuid>,
    pub offer_product_id: Option<Uuid>,
    /// Defaults to 1
    pub quantity: Option<i32>,
    pub coupon_code: Option<String>,
    /// Percentage in 0..=100
    pub discount: Option<Decimal>,
}

/// Partial update of a cart line
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartLineRequest {
    pub quantity: Option<i32>,
    pub status: Option<CartStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeCartRequest {
    pub guest_id: String,
}

/// Query string used by guests to prove ownership
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestQuery {
    pub guest_id: Option<String>,
}
