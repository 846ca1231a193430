use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::cart::models::Owner;
use crate::catalog::models::ProductRef;
use crate::catalog::responses::ProductResponse;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistEntryResponse {
    pub id: Uuid,
    pub owner: Owner,
    pub product_ref: ProductRef,
    /// `None` once the product has been removed from the catalog
    pub product: Option<ProductResponse>,
    pub created_at: DateTime<Utc>,
}
