//! Response DTOs for offer and coupon endpoints.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::models::{CouponApplyTo, DiscountKind, Offer, OfferKind};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferResponse {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: OfferKind,
    pub discount_type: DiscountKind,
    #[serde(with = "rust_decimal::serde::str")]
    pub discount_value: Decimal,
    pub coupon_code: String,
    pub products: Vec<Uuid>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub active: bool,
    pub coupon_apply_to: CouponApplyTo,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Offer> for OfferResponse {
    fn from(offer: &Offer) -> Self {
        Self {
            id: offer.id,
            name: offer.name.clone(),
            kind: offer.kind,
            discount_type: offer.discount_kind,
            discount_value: offer.discount_value,
            coupon_code: offer.coupon_code.clone(),
            products: offer.products.clone(),
            start_date: offer.starts_at,
            end_date: offer.ends_at,
            active: offer.active,
            coupon_apply_to: offer.apply_to,
            created_at: offer.created_at,
            updated_at: offer.updated_at,
        }
    }
}

/// What a client needs to apply a validated coupon
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponSnapshot {
    pub offer_id: Uuid,
    pub code: String,
    pub name: String,
    pub discount_type: DiscountKind,
    #[serde(with = "rust_decimal::serde::str")]
    pub discount_value: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub products: Vec<Uuid>,
    pub coupon_apply_to: CouponApplyTo,
}

impl From<Offer> for CouponSnapshot {
    fn from(offer: Offer) -> Self {
        Self {
            offer_id: offer.id,
            code: offer.coupon_code,
            name: offer.name,
            discount_type: offer.discount_kind,
            discount_value: offer.discount_value,
            start_date: offer.starts_at,
            end_date: offer.ends_at,
            products: offer.products,
            coupon_apply_to: offer.apply_to,
        }
    }
}

/// Outcome of one expired offer-product sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub offer_products_removed: u64,
    pub cart_lines_removed: u64,
    pub wishlist_entries_removed: u64,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.offer_products_removed == 0
    }
}
