//! Delivery address entities.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Delivery address; at most one per owner has `is_default` set
#[derive(Debug, Clone, PartialEq)]
pub struct Address {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub phone: String,
    pub city: String,
    pub governorate: String,
    pub street: String,
    pub building_number: Option<String>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
