//! Wishlist entities.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::cart::models::Owner;
use crate::catalog::models::ProductRef;

/// A saved product reference
#[derive(Debug, Clone, PartialEq)]
pub struct WishlistEntry {
    pub id: Uuid,
    pub owner: Owner,
    pub product: ProductRef,
    pub created_at: DateTime<Utc>,
}
