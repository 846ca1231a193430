//! Wishlist service functions with store access.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::auth::Requester;
use crate::cache::AppCache;
use crate::cart::models::Owner;
use crate::catalog::models::ProductRef;
use crate::catalog::responses::ProductResponse;
use crate::catalog::services::resolve_product;
use crate::db::Store;
use crate::error::{AppError, Result};

use super::models::WishlistEntry;
use super::requests::AddToWishlistRequest;
use super::responses::WishlistEntryResponse;

async fn project_entry(
    store: &dyn Store,
    cache: &AppCache,
    entry: WishlistEntry,
) -> Result<WishlistEntryResponse> {
    let product = resolve_product(store, cache, entry.product).await?;
    Ok(WishlistEntryResponse {
        id: entry.id,
        owner: entry.owner,
        product_ref: entry.product,
        product: product.as_deref().map(ProductResponse::from),
        created_at: entry.created_at,
    })
}

/// Save a product for an owner. Saving the same product again returns the
/// existing entry.
pub async fn add_entry(
    store: &dyn Store,
    cache: &AppCache,
    request: AddToWishlistRequest,
) -> Result<WishlistEntryResponse> {
    let owner = Owner::from_fields(request.user_id, request.guest_id)?;
    let product = ProductRef::from_fields(
        request.product_id,
        request.featured_product_id,
        request.online_product_id,
        request.offer_product_id,
    )?;

    if resolve_product(store, cache, product).await?.is_none() {
        return Err(AppError::not_found("Product"));
    }

    let entry = match store.find_wishlist_entry(&owner, product).await? {
        Some(existing) => existing,
        None => {
            let entry = WishlistEntry {
                id: Uuid::new_v4(),
                owner,
                product,
                created_at: Utc::now(),
            };
            store.insert_wishlist_entry(&entry).await?;
            info!("Saved {} to wishlist", product);
            entry
        }
    };

    project_entry(store, cache, entry).await
}

pub async fn list_for_owner(
    store: &dyn Store,
    cache: &AppCache,
    owner: &Owner,
) -> Result<Vec<WishlistEntryResponse>> {
    let mut entries = Vec::new();
    for entry in store.list_wishlist_entries(owner).await? {
        entries.push(project_entry(store, cache, entry).await?);
    }
    Ok(entries)
}

/// Remove an entry; only its owner or an admin may do so
pub async fn remove_entry(store: &dyn Store, id: Uuid, requester: &Requester) -> Result<()> {
    let entry = store
        .get_wishlist_entry(id)
        .await?
        .ok_or_else(|| AppError::not_found("Wishlist entry"))?;

    if !requester.may_access(&entry.owner) {
        return Err(AppError::forbidden("You can only remove your own wishlist entries"));
    }

    if !store.delete_wishlist_entry(id).await? {
        return Err(AppError::not_found("Wishlist entry"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Identity;
    use crate::catalog::models::ProductKind;
    use crate::catalog::requests::ProductRequest;
    use crate::catalog::services::{create_product, delete_product};
    use crate::db::MemoryStore;
    use rust_decimal_macros::dec;

    async fn seed(store: &dyn Store) -> Uuid {
        let request = ProductRequest {
            title: "Notebook".into(),
            description: String::new(),
            brand: String::new(),
            category: "stationery".into(),
            price: dec!(3.50),
            discount_eligible: false,
            images: vec![],
            start_date: None,
            end_date: None,
        };
        create_product(store, ProductKind::Standard, request).await.unwrap().id
    }

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let store = MemoryStore::new();
        let cache = AppCache::default();
        let product_id = seed(&store).await;
        let user = Uuid::new_v4();

        let request = || AddToWishlistRequest {
            user_id: Some(user),
            product_id: Some(product_id),
            ..Default::default()
        };
        let first = add_entry(&store, &cache, request()).await.unwrap();
        let second = add_entry(&store, &cache, request()).await.unwrap();
        assert_eq!(first.id, second.id);

        let entries = list_for_owner(&store, &cache, &Owner::User(user)).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].product.is_some());
    }

    #[tokio::test]
    async fn test_product_deletion_removes_entries() {
        let store = MemoryStore::new();
        let cache = AppCache::default();
        let product_id = seed(&store).await;
        let owner = Owner::Guest("guest-w".into());

        add_entry(
            &store,
            &cache,
            AddToWishlistRequest {
                guest_id: Some("guest-w".into()),
                product_id: Some(product_id),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let removal = delete_product(&store, &cache, ProductRef::Standard(product_id))
            .await
            .unwrap();
        assert_eq!(removal.wishlist_entries_removed, 1);
        assert!(list_for_owner(&store, &cache, &owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_checks_owner() {
        let store = MemoryStore::new();
        let cache = AppCache::default();
        let product_id = seed(&store).await;
        let user = Uuid::new_v4();

        let entry = add_entry(
            &store,
            &cache,
            AddToWishlistRequest {
                user_id: Some(user),
                product_id: Some(product_id),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let guest = Requester::Guest("someone".into());
        assert!(matches!(
            remove_entry(&store, entry.id, &guest).await,
            Err(AppError::Forbidden(_))
        ));
        remove_entry(&store, entry.id, &Requester::Account(Identity::user(user)))
            .await
            .unwrap();
    }
}
