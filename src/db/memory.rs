//! In-memory store for tests and local development.
//!
//! Collections are kept in insertion order so listings behave like the
//! natural order of the Postgres tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use super::{
    AddressStore, CartStore, CatalogStore, NotificationStore, OfferStore, RequestStore, UserStore,
    WishlistStore,
};
use crate::addresses::models::Address;
use crate::auth::Role;
use crate::cart::models::{CartLine, Owner};
use crate::catalog::models::{Product, ProductKind, ProductRef};
use crate::error::{AppError, Result};
use crate::notifications::models::Notification;
use crate::offers::models::{Offer, OfferKind};
use crate::requests::models::{RequestStatus, SupportRequest};
use crate::wishlist::models::WishlistEntry;

#[derive(Default)]
struct State {
    products: Vec<Product>,
    cart_lines: Vec<CartLine>,
    wishlist: Vec<WishlistEntry>,
    offers: Vec<Offer>,
    addresses: Vec<Address>,
    notifications: Vec<Notification>,
    requests: Vec<SupportRequest>,
    users: Vec<(Uuid, Role)>,
}

/// Thread-safe in-memory store
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account so role lookups (admin fan-out) can see it
    pub fn register_user(&self, id: Uuid, role: Role) {
        let mut state = self.state.write();
        state.users.retain(|(existing, _)| *existing != id);
        state.users.push((id, role));
    }
}

fn replace<T, F>(items: &mut [T], matches: F, item: &T) -> bool
where
    T: Clone,
    F: Fn(&T) -> bool,
{
    match items.iter_mut().find(|existing| matches(existing)) {
        Some(slot) => {
            *slot = item.clone();
            true
        }
        None => false,
    }
}

fn remove_where<T, F>(items: &mut Vec<T>, matches: F) -> u64
where
    F: Fn(&T) -> bool,
{
    let before = items.len();
    items.retain(|item| !matches(item));
    (before - items.len()) as u64
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn insert_product(&self, product: &Product) -> Result<()> {
        self.state.write().products.push(product.clone());
        Ok(())
    }

    async fn update_product(&self, product: &Product) -> Result<bool> {
        let reference = product.reference();
        Ok(replace(
            &mut self.state.write().products,
            |p| p.reference() == reference,
            product,
        ))
    }

    async fn get_product(&self, reference: ProductRef) -> Result<Option<Product>> {
        Ok(self
            .state
            .read()
            .products
            .iter()
            .find(|p| p.reference() == reference)
            .cloned())
    }

    async fn list_products(&self, kind: ProductKind) -> Result<Vec<Product>> {
        Ok(self
            .state
            .read()
            .products
            .iter()
            .filter(|p| p.kind == kind)
            .cloned()
            .collect())
    }

    async fn delete_product(&self, reference: ProductRef) -> Result<bool> {
        let removed = remove_where(&mut self.state.write().products, |p| p.reference() == reference);
        Ok(removed > 0)
    }

    async fn existing_product_ids(&self, kind: ProductKind, ids: &[Uuid]) -> Result<Vec<Uuid>> {
        let wanted: HashSet<&Uuid> = ids.iter().collect();
        Ok(self
            .state
            .read()
            .products
            .iter()
            .filter(|p| p.kind == kind && wanted.contains(&p.id))
            .map(|p| p.id)
            .collect())
    }

    async fn expired_offer_products(&self, check_time: DateTime<Utc>) -> Result<Vec<Uuid>> {
        Ok(self
            .state
            .read()
            .products
            .iter()
            .filter(|p| p.is_expired_at(check_time))
            .map(|p| p.id)
            .collect())
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn find_cart_line(&self, owner: &Owner, product: ProductRef) -> Result<Option<CartLine>> {
        Ok(self
            .state
            .read()
            .cart_lines
            .iter()
            .find(|l| &l.owner == owner && l.product == product)
            .cloned())
    }

    async fn insert_cart_line(&self, line: &CartLine) -> Result<()> {
        let mut state = self.state.write();
        if state
            .cart_lines
            .iter()
            .any(|l| l.owner == line.owner && l.product == line.product)
        {
            return Err(AppError::Conflict(format!(
                "cart line for {} already exists",
                line.product
            )));
        }
        state.cart_lines.push(line.clone());
        Ok(())
    }

    async fn update_cart_line(&self, line: &CartLine) -> Result<bool> {
        Ok(replace(&mut self.state.write().cart_lines, |l| l.id == line.id, line))
    }

    async fn get_cart_line(&self, id: Uuid) -> Result<Option<CartLine>> {
        Ok(self.state.read().cart_lines.iter().find(|l| l.id == id).cloned())
    }

    async fn list_cart_lines(&self, owner: &Owner) -> Result<Vec<CartLine>> {
        Ok(self
            .state
            .read()
            .cart_lines
            .iter()
            .filter(|l| &l.owner == owner)
            .cloned()
            .collect())
    }

    async fn delete_cart_line(&self, id: Uuid) -> Result<bool> {
        Ok(remove_where(&mut self.state.write().cart_lines, |l| l.id == id) > 0)
    }

    async fn delete_cart_lines_for_product(&self, product: ProductRef) -> Result<u64> {
        Ok(remove_where(&mut self.state.write().cart_lines, |l| l.product == product))
    }
}

#[async_trait]
impl WishlistStore for MemoryStore {
    async fn find_wishlist_entry(
        &self,
        owner: &Owner,
        product: ProductRef,
    ) -> Result<Option<WishlistEntry>> {
        Ok(self
            .state
            .read()
            .wishlist
            .iter()
            .find(|e| &e.owner == owner && e.product == product)
            .cloned())
    }

    async fn insert_wishlist_entry(&self, entry: &WishlistEntry) -> Result<()> {
        self.state.write().wishlist.push(entry.clone());
        Ok(())
    }

    async fn get_wishlist_entry(&self, id: Uuid) -> Result<Option<WishlistEntry>> {
        Ok(self.state.read().wishlist.iter().find(|e| e.id == id).cloned())
    }

    async fn list_wishlist_entries(&self, owner: &Owner) -> Result<Vec<WishlistEntry>> {
        Ok(self
            .state
            .read()
            .wishlist
            .iter()
            .filter(|e| &e.owner == owner)
            .cloned()
            .collect())
    }

    async fn delete_wishlist_entry(&self, id: Uuid) -> Result<bool> {
        Ok(remove_where(&mut self.state.write().wishlist, |e| e.id == id) > 0)
    }

    async fn delete_wishlist_entries_for_product(&self, product: ProductRef) -> Result<u64> {
        Ok(remove_where(&mut self.state.write().wishlist, |e| e.product == product))
    }
}

#[async_trait]
impl OfferStore for MemoryStore {
    async fn insert_offer(&self, offer: &Offer) -> Result<()> {
        self.state.write().offers.push(offer.clone());
        Ok(())
    }

    async fn update_offer(&self, offer: &Offer) -> Result<bool> {
        Ok(replace(&mut self.state.write().offers, |o| o.id == offer.id, offer))
    }

    async fn get_offer(&self, id: Uuid) -> Result<Option<Offer>> {
        Ok(self.state.read().offers.iter().find(|o| o.id == id).cloned())
    }

    async fn list_offers(&self) -> Result<Vec<Offer>> {
        let mut offers = self.state.read().offers.clone();
        offers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(offers)
    }

    async fn delete_offer(&self, id: Uuid) -> Result<bool> {
        Ok(remove_where(&mut self.state.write().offers, |o| o.id == id) > 0)
    }

    async fn active_offers(&self, check_time: DateTime<Utc>) -> Result<Vec<Offer>> {
        let mut offers: Vec<Offer> = self
            .state
            .read()
            .offers
            .iter()
            .filter(|o| o.is_active_at(check_time))
            .cloned()
            .collect();
        offers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(offers)
    }

    async fn find_active_coupon(
        &self,
        normalized_code: &str,
        check_time: DateTime<Utc>,
    ) -> Result<Option<Offer>> {
        Ok(self
            .state
            .read()
            .offers
            .iter()
            .filter(|o| {
                o.kind == OfferKind::Coupon
                    && !o.coupon_code.is_empty()
                    && o.coupon_code.to_uppercase() == normalized_code
                    && o.is_active_at(check_time)
            })
            .min_by_key(|o| o.created_at)
            .cloned())
    }
}

fn clear_defaults(addresses: &mut [Address], owner_id: Uuid, except: Uuid) {
    for address in addresses
        .iter_mut()
        .filter(|a| a.owner_id == owner_id && a.id != except)
    {
        address.is_default = false;
    }
}

#[async_trait]
impl AddressStore for MemoryStore {
    async fn insert_address(&self, address: &Address) -> Result<()> {
        let mut state = self.state.write();
        if address.is_default {
            clear_defaults(&mut state.addresses, address.owner_id, address.id);
        }
        state.addresses.push(address.clone());
        Ok(())
    }

    async fn update_address(&self, address: &Address) -> Result<bool> {
        let mut state = self.state.write();
        if !state.addresses.iter().any(|a| a.id == address.id) {
            return Ok(false);
        }
        if address.is_default {
            clear_defaults(&mut state.addresses, address.owner_id, address.id);
        }
        Ok(replace(&mut state.addresses, |a| a.id == address.id, address))
    }

    async fn get_address(&self, id: Uuid) -> Result<Option<Address>> {
        Ok(self.state.read().addresses.iter().find(|a| a.id == id).cloned())
    }

    async fn list_addresses(&self, owner_id: Uuid) -> Result<Vec<Address>> {
        Ok(self
            .state
            .read()
            .addresses
            .iter()
            .filter(|a| a.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn delete_address(&self, id: Uuid) -> Result<bool> {
        Ok(remove_where(&mut self.state.write().addresses, |a| a.id == id) > 0)
    }

    async fn set_default_address(&self, owner_id: Uuid, address_id: Uuid) -> Result<Option<Address>> {
        let mut state = self.state.write();
        if !state
            .addresses
            .iter()
            .any(|a| a.id == address_id && a.owner_id == owner_id)
        {
            return Ok(None);
        }

        let now = Utc::now();
        let mut updated = None;
        for address in state.addresses.iter_mut().filter(|a| a.owner_id == owner_id) {
            if address.id == address_id {
                address.is_default = true;
                address.updated_at = now;
                updated = Some(address.clone());
            } else if address.is_default {
                address.is_default = false;
                address.updated_at = now;
            }
        }
        Ok(updated)
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn insert_notification(&self, notification: &Notification) -> Result<()> {
        self.state.write().notifications.push(notification.clone());
        Ok(())
    }

    async fn list_notifications(&self, recipient_id: Uuid) -> Result<Vec<Notification>> {
        let mut notifications: Vec<Notification> = self
            .state
            .read()
            .notifications
            .iter()
            .filter(|n| n.recipient_id == recipient_id)
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notifications)
    }

    async fn mark_notification_read(
        &self,
        recipient_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Notification>> {
        let mut state = self.state.write();
        Ok(state
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.recipient_id == recipient_id)
            .map(|n| {
                n.is_read = true;
                n.clone()
            }))
    }

    async fn mark_all_notifications_read(&self, recipient_id: Uuid) -> Result<u64> {
        let mut state = self.state.write();
        let mut changed = 0;
        for notification in state
            .notifications
            .iter_mut()
            .filter(|n| n.recipient_id == recipient_id && !n.is_read)
        {
            notification.is_read = true;
            changed += 1;
        }
        Ok(changed)
    }

    async fn unread_notification_count(&self, recipient_id: Uuid) -> Result<u64> {
        Ok(self
            .state
            .read()
            .notifications
            .iter()
            .filter(|n| n.recipient_id == recipient_id && !n.is_read)
            .count() as u64)
    }

    async fn delete_notification(&self, recipient_id: Uuid, id: Uuid) -> Result<bool> {
        let removed = remove_where(&mut self.state.write().notifications, |n| {
            n.id == id && n.recipient_id == recipient_id
        });
        Ok(removed > 0)
    }
}

#[async_trait]
impl RequestStore for MemoryStore {
    async fn insert_request(&self, request: &SupportRequest) -> Result<()> {
        self.state.write().requests.push(request.clone());
        Ok(())
    }

    async fn update_request(&self, request: &SupportRequest) -> Result<bool> {
        Ok(replace(&mut self.state.write().requests, |r| r.id == request.id, request))
    }

    async fn get_request(&self, id: Uuid) -> Result<Option<SupportRequest>> {
        Ok(self.state.read().requests.iter().find(|r| r.id == id).cloned())
    }

    async fn list_requests(
        &self,
        requester_id: Option<Uuid>,
        status: Option<RequestStatus>,
    ) -> Result<Vec<SupportRequest>> {
        let mut requests: Vec<SupportRequest> = self
            .state
            .read()
            .requests
            .iter()
            .filter(|r| requester_id.map_or(true, |id| r.requester_id == id))
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    async fn delete_request(&self, id: Uuid) -> Result<bool> {
        Ok(remove_where(&mut self.state.write().requests, |r| r.id == id) > 0)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn admin_ids(&self) -> Result<Vec<Uuid>> {
        Ok(self
            .state
            .read()
            .users
            .iter()
            .filter(|(_, role)| *role == Role::Admin)
            .map(|(id, _)| *id)
            .collect())
    }
}
