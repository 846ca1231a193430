//! Persistence layer.
//!
//! Services talk to a [`Store`], never to a driver directly. `PgStore` is the
//! production backend; `MemoryStore` backs tests and local development.
//!
//! Cross-document invariants are not guarded by compare-and-swap: last write wins,
//! except where a method documents that it is atomic.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::addresses::models::Address;
use crate::cart::models::{CartLine, Owner};
use crate::catalog::models::{Product, ProductKind, ProductRef};
use crate::error::Result;
use crate::notifications::models::Notification;
use crate::offers::models::Offer;
use crate::requests::models::{RequestStatus, SupportRequest};
use crate::wishlist::models::WishlistEntry;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn insert_product(&self, product: &Product) -> Result<()>;
    async fn update_product(&self, product: &Product) -> Result<bool>;
    async fn get_product(&self, reference: ProductRef) -> Result<Option<Product>>;
    async fn list_products(&self, kind: ProductKind) -> Result<Vec<Product>>;
    async fn delete_product(&self, reference: ProductRef) -> Result<bool>;
    /// Subset of `ids` that exist in the `kind` collection
    async fn existing_product_ids(&self, kind: ProductKind, ids: &[Uuid]) -> Result<Vec<Uuid>>;
    /// Offer-products whose end instant is at or before `check_time`
    async fn expired_offer_products(&self, check_time: DateTime<Utc>) -> Result<Vec<Uuid>>;
}

#[async_trait]
pub trait CartStore: Send + Sync {
    async fn find_cart_line(&self, owner: &Owner, product: ProductRef) -> Result<Option<CartLine>>;
    /// Fails with `Conflict` if a line for the same owner and product exists
    async fn insert_cart_line(&self, line: &CartLine) -> Result<()>;
    async fn update_cart_line(&self, line: &CartLine) -> Result<bool>;
    async fn get_cart_line(&self, id: Uuid) -> Result<Option<CartLine>>;
    /// Lines in insertion order
    async fn list_cart_lines(&self, owner: &Owner) -> Result<Vec<CartLine>>;
    async fn delete_cart_line(&self, id: Uuid) -> Result<bool>;
    async fn delete_cart_lines_for_product(&self, product: ProductRef) -> Result<u64>;
}

#[async_trait]
pub trait WishlistStore: Send + Sync {
    async fn find_wishlist_entry(
        &self,
        owner: &Owner,
        product: ProductRef,
    ) -> Result<Option<WishlistEntry>>;
    async fn insert_wishlist_entry(&self, entry: &WishlistEntry) -> Result<()>;
    async fn get_wishlist_entry(&self, id: Uuid) -> Result<Option<WishlistEntry>>;
    async fn list_wishlist_entries(&self, owner: &Owner) -> Result<Vec<WishlistEntry>>;
    async fn delete_wishlist_entry(&self, id: Uuid) -> Result<bool>;
    async fn delete_wishlist_entries_for_product(&self, product: ProductRef) -> Result<u64>;
}

#[async_trait]
pub trait OfferStore: Send + Sync {
    async fn insert_offer(&self, offer: &Offer) -> Result<()>;
    async fn update_offer(&self, offer: &Offer) -> Result<bool>;
    async fn get_offer(&self, id: Uuid) -> Result<Option<Offer>>;
    /// Newest first
    async fn list_offers(&self) -> Result<Vec<Offer>>;
    async fn delete_offer(&self, id: Uuid) -> Result<bool>;
    /// Offers active at `check_time`, newest first
    async fn active_offers(&self, check_time: DateTime<Utc>) -> Result<Vec<Offer>>;
    /// Oldest active coupon whose stored code equals `normalized_code`
    async fn find_active_coupon(
        &self,
        normalized_code: &str,
        check_time: DateTime<Utc>,
    ) -> Result<Option<Offer>>;
}

#[async_trait]
pub trait AddressStore: Send + Sync {
    /// Atomic: when `address.is_default` is set, the owner's other defaults are
    /// cleared in the same write.
    async fn insert_address(&self, address: &Address) -> Result<()>;
    /// Same atomicity as [`AddressStore::insert_address`]
    async fn update_address(&self, address: &Address) -> Result<bool>;
    async fn get_address(&self, id: Uuid) -> Result<Option<Address>>;
    async fn list_addresses(&self, owner_id: Uuid) -> Result<Vec<Address>>;
    async fn delete_address(&self, id: Uuid) -> Result<bool>;
    /// Atomically clear every default of `owner_id` and mark `address_id` default.
    /// Returns `None` when the address does not belong to the owner.
    async fn set_default_address(&self, owner_id: Uuid, address_id: Uuid) -> Result<Option<Address>>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert_notification(&self, notification: &Notification) -> Result<()>;
    /// Newest first
    async fn list_notifications(&self, recipient_id: Uuid) -> Result<Vec<Notification>>;
    async fn mark_notification_read(
        &self,
        recipient_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Notification>>;
    async fn mark_all_notifications_read(&self, recipient_id: Uuid) -> Result<u64>;
    async fn unread_notification_count(&self, recipient_id: Uuid) -> Result<u64>;
    async fn delete_notification(&self, recipient_id: Uuid, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait RequestStore: Send + Sync {
    async fn insert_request(&self, request: &SupportRequest) -> Result<()>;
    async fn update_request(&self, request: &SupportRequest) -> Result<bool>;
    async fn get_request(&self, id: Uuid) -> Result<Option<SupportRequest>>;
    /// Newest first, optionally narrowed to one requester and/or status
    async fn list_requests(
        &self,
        requester_id: Option<Uuid>,
        status: Option<RequestStatus>,
    ) -> Result<Vec<SupportRequest>>;
    async fn delete_request(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn admin_ids(&self) -> Result<Vec<Uuid>>;
}

/// Everything the API persists
pub trait Store:
    CatalogStore
    + CartStore
    + WishlistStore
    + OfferStore
    + AddressStore
    + NotificationStore
    + RequestStore
    + UserStore
{
}

impl<T> Store for T where
    T: CatalogStore
        + CartStore
        + WishlistStore
        + OfferStore
        + AddressStore
        + NotificationStore
        + RequestStore
        + UserStore
{
}
