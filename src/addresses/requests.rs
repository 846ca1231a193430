use serde::Deserialize;

/// Create or replace an address
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub governorate: Option<String>,
    pub street: Option<String>,
    pub building_number: Option<String>,
    /// `None` keeps the current flag on update, `false` on create
    pub is_default: Option<bool>,
}
