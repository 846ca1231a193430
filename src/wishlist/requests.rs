use serde::Deserialize;
use uuid::Uuid;

/// Same owner and product fields as a cart add
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToWishlistRequest {
    pub user_id: Option<Uuid>,
    pub guest_id: Option<String>,
    pub product_id: Option<Uuid>,
    pub featured_product_id: Option<Uuid>,
    pub online_product_id: Option<Uuid>,
    pub offer_product_id: Option<Uuid>,
}
