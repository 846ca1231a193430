//! Response DTOs for cart endpoints.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::catalog::models::{Product, ProductRef};

use super::models::{CartStatus, Owner};

/// Current catalog data for the product a line points at
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartProductSummary {
    pub title: String,
    pub brand: String,
    pub category: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    pub discount_eligible: bool,
    pub image: Option<String>,
}

impl From<&Product> for CartProductSummary {
    fn from(product: &Product) -> Self {
        Self {
            title: product.title.clone(),
            brand: product.brand.clone(),
            category: product.category.clone(),
            price: product.price,
            discount_eligible: product.discount_eligible,
            image: product.images.first().cloned(),
        }
    }
}

/// A cart line as returned to clients
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineResponse {
    pub id: Uuid,
    pub owner: Owner,
    pub product_ref: ProductRef,
    /// `None` once the product has been removed from the catalog
    pub product: Option<CartProductSummary>,
    pub quantity: i32,
    pub status: CartStatus,
    pub coupon_code: Option<String>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub discount: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str")]
    pub final_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub line_total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub lines: Vec<CartLineResponse>,
    #[serde(with = "rust_decimal::serde::str")]
    pub total: Decimal,
}
