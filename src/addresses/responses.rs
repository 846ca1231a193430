use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::models::Address;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressResponse {
    pub id: Uuid,
    pub user_id: Uuid,
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

impl From<Address> for AddressResponse {
    fn from(address: Address) -> Self {
        Self {
            id: address.id,
            user_id: address.owner_id,
            name: address.name,
            phone: address.phone,
            city: address.city,
            governorate: address.governorate,
            street: address.street,
            building_number: address.building_number,
            is_default: address.is_default,
            created_at: address.created_at,
            updated_at: address.updated_at,
        }
    }
}
