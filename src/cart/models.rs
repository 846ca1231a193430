//! Cart line entities.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::catalog::models::ProductRef;
use crate::error::AppError;

/// Who a cart or wishlist line belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Owner {
    User(Uuid),
    Guest(String),
}

impl Owner {
    /// Build an owner from the `userId` / `guestId` pair clients send.
    ///
    /// Exactly one of them must be present; a blank guest id counts as absent.
    pub fn from_fields(user_id: Option<Uuid>, guest_id: Option<String>) -> Result<Self, AppError> {
        let guest_id = guest_id
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty());

        match (user_id, guest_id) {
            (Some(user), None) => Ok(Owner::User(user)),
            (None, Some(guest)) => Ok(Owner::Guest(guest)),
            (None, None) => Err(AppError::validation("Either userId or guestId is required")),
            (Some(_), Some(_)) => Err(AppError::validation(
                "Only one of userId or guestId may be set",
            )),
        }
    }

    pub fn kind_str(&self) -> &'static str {
        match self {
            Owner::User(_) => "user",
            Owner::Guest(_) => "guest",
        }
    }

    /// Storage form of the owner id
    pub fn key(&self) -> String {
        match self {
            Owner::User(id) => id.to_string(),
            Owner::Guest(id) => id.clone(),
        }
    }

    pub fn from_parts(kind: &str, key: &str) -> Result<Self, AppError> {
        match kind {
            "user" => Uuid::parse_str(key)
                .map(Owner::User)
                .map_err(|_| AppError::Internal(format!("Stored user owner '{}' is not a UUID", key))),
            "guest" => Ok(Owner::Guest(key.to_string())),
            other => Err(AppError::Internal(format!("Unknown owner kind '{}'", other))),
        }
    }
}

/// Lifecycle status of a cart line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CartStatus {
    Pending,
    Complete,
    Failed,
}

impl CartStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CartStatus::Pending => "pending",
            CartStatus::Complete => "complete",
            CartStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for CartStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CartStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(CartStatus::Pending),
            "complete" => Ok(CartStatus::Complete),
            "failed" => Ok(CartStatus::Failed),
            other => Err(AppError::validation(format!("Unknown cart status '{}'", other))),
        }
    }
}

/// One stored cart entry. Product details are resolved at read time.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub id: Uuid,
    pub owner: Owner,
    pub product: ProductRef,
    pub quantity: i32,
    pub status: CartStatus,
    pub coupon_code: Option<String>,
    /// Percentage in 0..=100
    pub discount: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_requires_exactly_one() {
        let user = Uuid::new_v4();
        assert_eq!(Owner::from_fields(Some(user), None).unwrap(), Owner::User(user));
        assert_eq!(
            Owner::from_fields(None, Some(" guest-7 ".into())).unwrap(),
            Owner::Guest("guest-7".into())
        );
        assert!(Owner::from_fields(None, None).is_err());
        assert!(Owner::from_fields(None, Some("   ".into())).is_err());
        assert!(Owner::from_fields(Some(user), Some("guest-7".into())).is_err());
    }

    #[test]
    fn test_owner_storage_parts() {
        let owner = Owner::User(Uuid::new_v4());
        let restored = Owner::from_parts(owner.kind_str(), &owner.key()).unwrap();
        assert_eq!(restored, owner);
        assert!(Owner::from_parts("robot", "x").is_err());
    }
}
