//! Catalog entities.
//!
//! The four product kinds share one shape; only offer-products carry an
//! activation window.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::AppError;

/// The catalog collection a product belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    Standard,
    Featured,
    Online,
    Offer,
}

impl ProductKind {
    pub const ALL: [ProductKind; 4] = [
        ProductKind::Standard,
        ProductKind::Featured,
        ProductKind::Online,
        ProductKind::Offer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductKind::Standard => "standard",
            ProductKind::Featured => "featured",
            ProductKind::Online => "online",
            ProductKind::Offer => "offer",
        }
    }
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProductKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| AppError::validation(format!("Unknown product kind '{}'", s)))
    }
}

/// Reference to exactly one product of one kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ProductRef {
    Standard(Uuid),
    Featured(Uuid),
    Online(Uuid),
    Offer(Uuid),
}

impl ProductRef {
    pub fn new(kind: ProductKind, id: Uuid) -> Self {
        match kind {
            ProductKind::Standard => ProductRef::Standard(id),
            ProductKind::Featured => ProductRef::Featured(id),
            ProductKind::Online => ProductRef::Online(id),
            ProductKind::Offer => ProductRef::Offer(id),
        }
    }

    pub fn kind(&self) -> ProductKind {
        match self {
            ProductRef::Standard(_) => ProductKind::Standard,
            ProductRef::Featured(_) => ProductKind::Featured,
            ProductRef::Online(_) => ProductKind::Online,
            ProductRef::Offer(_) => ProductKind::Offer,
        }
    }

    pub fn id(&self) -> Uuid {
        match *self {
            ProductRef::Standard(id)
            | ProductRef::Featured(id)
            | ProductRef::Online(id)
            | ProductRef::Offer(id) => id,
        }
    }

    /// Build a reference from the four optional id fields clients send.
    ///
    /// Exactly one of them must be present.
    pub fn from_fields(
        product_id: Option<Uuid>,
        featured_product_id: Option<Uuid>,
        online_product_id: Option<Uuid>,
        offer_product_id: Option<Uuid>,
    ) -> Result<Self, AppError> {
        let candidates = [
            product_id.map(ProductRef::Standard),
            featured_product_id.map(ProductRef::Featured),
            online_product_id.map(ProductRef::Online),
            offer_product_id.map(ProductRef::Offer),
        ];

        let mut present = candidates.into_iter().flatten();
        match (present.next(), present.next()) {
            (Some(reference), None) => Ok(reference),
            (None, _) => Err(AppError::validation(
                "One of productId, featuredProductId, onlineProductId or offerProductId is required",
            )),
            (Some(_), Some(_)) => Err(AppError::validation(
                "Only one of productId, featuredProductId, onlineProductId or offerProductId may be set",
            )),
        }
    }
}

impl fmt::Display for ProductRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

/// A product in any of the four catalog collections
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: Uuid,
    pub kind: ProductKind,
    pub title: String,
    pub description: String,
    pub brand: String,
    pub category: String,
    pub price: Decimal,
    pub discount_eligible: bool,
    pub images: Vec<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn reference(&self) -> ProductRef {
        ProductRef::new(self.kind, self.id)
    }

    /// Offer-products expire once their end instant has been reached
    pub fn is_expired_at(&self, check_time: DateTime<Utc>) -> bool {
        self.kind == ProductKind::Offer && self.ends_at.is_some_and(|end| end <= check_time)
    }
}
