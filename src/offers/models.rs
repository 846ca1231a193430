//! Promotional campaign entities.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::AppError;

/// Whether the campaign needs a code or applies automatically
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferKind {
    Coupon,
    Discount,
}

/// How `discount_value` is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    Percentage,
    Value,
}

/// Which eligible cart item a coupon targets when several match.
/// Only meaningful for coupons; applied by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponApplyTo {
    #[default]
    First,
    LowestPrice,
    HighestPrice,
}

macro_rules! str_enum {
    ($ty:ty { $($variant:ident => $s:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s,)+
                }
            }
        }

        impl FromStr for $ty {
            type Err = AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant),)+
                    other => Err(AppError::validation(format!(
                        "Unknown {} '{}'",
                        stringify!($ty),
                        other
                    ))),
                }
            }
        }
    };
}

str_enum!(OfferKind { Coupon => "coupon", Discount => "discount" });
str_enum!(DiscountKind { Percentage => "percentage", Value => "value" });
str_enum!(CouponApplyTo {
    First => "first",
    LowestPrice => "lowest_price",
    HighestPrice => "highest_price",
});

/// A promotional campaign scoped to a list of standard products
#[derive(Debug, Clone, PartialEq)]
pub struct Offer {
    pub id: Uuid,
    pub name: String,
    pub kind: OfferKind,
    pub discount_kind: DiscountKind,
    pub discount_value: Decimal,
    /// Uppercased and trimmed; empty when the offer has no code
    pub coupon_code: String,
    pub products: Vec<Uuid>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub active: bool,
    pub apply_to: CouponApplyTo,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Offer {
    /// Active flag set and `check_time` inside `[starts_at, ends_at)`
    pub fn is_active_at(&self, check_time: DateTime<Utc>) -> bool {
        self.active && self.starts_at <= check_time && check_time < self.ends_at
    }
}

/// Canonical stored form of a coupon code
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}
