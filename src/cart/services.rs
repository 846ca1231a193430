//! Cart service functions with store access.
//!
//! Stored lines only hold a product reference; every response re-resolves the
//! product through the cache and prices the line from its current data.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::Requester;
use crate::cache::AppCache;
use crate::catalog::models::ProductRef;
use crate::catalog::services::resolve_product;
use crate::db::Store;
use crate::error::{AppError, Result};
use crate::offers::models::normalize_code;

use super::calculators::{cart_total, final_price, line_total, validate_discount, validate_quantity};
use super::models::{CartLine, CartStatus, Owner};
use super::requests::{AddToCartRequest, UpdateCartLineRequest};
use super::responses::{CartLineResponse, CartProductSummary, CartResponse};

/// Price a stored line against the product's current catalog data
pub async fn project_line(
    store: &dyn Store,
    cache: &AppCache,
    line: CartLine,
) -> Result<CartLineResponse> {
    let product = resolve_product(store, cache, line.product).await?;

    let (summary, unit_price) = match product {
        Some(product) => (
            Some(CartProductSummary::from(product.as_ref())),
            final_price(product.price, line.discount),
        ),
        None => {
            debug!("Cart line {} points at missing product {}", line.id, line.product);
            (None, Decimal::ZERO)
        }
    };

    Ok(CartLineResponse {
        id: line.id,
        owner: line.owner,
        product_ref: line.product,
        product: summary,
        quantity: line.quantity,
        status: line.status,
        coupon_code: line.coupon_code,
        discount: line.discount,
        final_price: unit_price,
        line_total: line_total(unit_price, line.quantity)?,
        created_at: line.created_at,
        updated_at: line.updated_at,
    })
}

fn coupon_field(code: Option<String>) -> Option<String> {
    code.map(|c| normalize_code(&c)).filter(|c| !c.is_empty())
}

/// Add a product to a cart, accumulating into an existing line for the same
/// owner and product.
pub async fn add_line(
    store: &dyn Store,
    cache: &AppCache,
    request: AddToCartRequest,
) -> Result<CartLineResponse> {
    let owner = Owner::from_fields(request.user_id, request.guest_id)?;
    let product = ProductRef::from_fields(
        request.product_id,
        request.featured_product_id,
        request.online_product_id,
        request.offer_product_id,
    )?;

    let quantity = request.quantity.unwrap_or(1);
    validate_quantity(quantity)?;
    if let Some(discount) = request.discount {
        validate_discount(discount)?;
    }

    if resolve_product(store, cache, product).await?.is_none() {
        return Err(AppError::not_found("Product"));
    }

    let coupon_code = coupon_field(request.coupon_code);
    let now = Utc::now();

    let line = match store.find_cart_line(&owner, product).await? {
        Some(mut existing) => {
            existing.quantity = existing
                .quantity
                .checked_add(quantity)
                .ok_or_else(|| AppError::validation("quantity is too large"))?;
            if coupon_code.is_some() {
                existing.coupon_code = coupon_code;
            }
            if request.discount.is_some() {
                existing.discount = request.discount;
            }
            existing.updated_at = now;

            if !store.update_cart_line(&existing).await? {
                return Err(AppError::not_found("Cart line"));
            }
            existing
        }
        None => {
            let line = CartLine {
                id: Uuid::new_v4(),
                owner,
                product,
                quantity,
                status: CartStatus::Pending,
                coupon_code,
                discount: request.discount,
                created_at: now,
                updated_at: now,
            };
            store.insert_cart_line(&line).await?;
            info!("Created cart line {} for {}", line.id, line.product);
            line
        }
    };

    project_line(store, cache, line).await
}

/// All lines of one owner, in the order they were added, plus the rounded total
pub async fn list_for_owner(
    store: &dyn Store,
    cache: &AppCache,
    owner: &Owner,
) -> Result<CartResponse> {
    let lines = store.list_cart_lines(owner).await?;

    let mut projected = Vec::with_capacity(lines.len());
    for line in lines {
        projected.push(project_line(store, cache, line).await?);
    }

    let total = cart_total(projected.iter().map(|l| l.line_total))?;
    Ok(CartResponse {
        lines: projected,
        total,
    })
}

pub async fn list_for_user(store: &dyn Store, cache: &AppCache, user_id: Uuid) -> Result<CartResponse> {
    list_for_owner(store, cache, &Owner::User(user_id)).await
}

pub async fn list_for_guest(
    store: &dyn Store,
    cache: &AppCache,
    guest_id: &str,
) -> Result<CartResponse> {
    let owner = Owner::from_fields(None, Some(guest_id.to_string()))?;
    list_for_owner(store, cache, &owner).await
}

/// Partial update of quantity and/or status.
///
/// Anyone holding the line id may update it.
pub async fn update_line(
    store: &dyn Store,
    cache: &AppCache,
    id: Uuid,
    request: UpdateCartLineRequest,
) -> Result<CartLineResponse> {
    let mut line = store
        .get_cart_line(id)
        .await?
        .ok_or_else(|| AppError::not_found("Cart line"))?;

    if let Some(quantity) = request.quantity {
        validate_quantity(quantity)?;
        line.quantity = quantity;
    }
    if let Some(status) = request.status {
        line.status = status;
    }
    line.updated_at = Utc::now();

    if !store.update_cart_line(&line).await? {
        return Err(AppError::not_found("Cart line"));
    }

    project_line(store, cache, line).await
}

/// Delete a line; only its owner or an admin may do so
pub async fn delete_line(store: &dyn Store, id: Uuid, requester: &Requester) -> Result<()> {
    let line = store
        .get_cart_line(id)
        .await?
        .ok_or_else(|| AppError::not_found("Cart line"))?;

    if !requester.may_access(&line.owner) {
        return Err(AppError::forbidden("You can only delete your own cart lines"));
    }

    if !store.delete_cart_line(id).await? {
        return Err(AppError::not_found("Cart line"));
    }
    info!("Deleted cart line {}", id);
    Ok(())
}

/// Move every line of `guest_id` onto `user_id`.
///
/// A guest line for a product the user already has is folded into the user's
/// line the same way [`add_line`] accumulates.
pub async fn merge_guest_cart(
    store: &dyn Store,
    cache: &AppCache,
    guest_id: &str,
    user_id: Uuid,
) -> Result<CartResponse> {
    let guest = Owner::from_fields(None, Some(guest_id.to_string()))?;
    let user = Owner::User(user_id);
    let now = Utc::now();
    let mut moved = 0usize;

    for guest_line in store.list_cart_lines(&guest).await? {
        match store.find_cart_line(&user, guest_line.product).await? {
            Some(mut existing) => {
                existing.quantity = existing
                    .quantity
                    .checked_add(guest_line.quantity)
                    .ok_or_else(|| AppError::validation("quantity is too large"))?;
                if guest_line.coupon_code.is_some() {
                    existing.coupon_code = guest_line.coupon_code.clone();
                }
                if guest_line.discount.is_some() {
                    existing.discount = guest_line.discount;
                }
                existing.updated_at = now;
                if !store.update_cart_line(&existing).await? {
                    return Err(AppError::not_found("Cart line"));
                }
                store.delete_cart_line(guest_line.id).await?;
            }
            None => {
                let reassigned = CartLine {
                    owner: user.clone(),
                    updated_at: now,
                    ..guest_line
                };
                if !store.update_cart_line(&reassigned).await? {
                    return Err(AppError::not_found("Cart line"));
                }
            }
        }
        moved += 1;
    }

    if moved > 0 {
        info!("Merged {} guest cart lines into user {}", moved, user_id);
    }

    list_for_owner(store, cache, &user).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Identity;
    use crate::catalog::models::{Product, ProductKind};
    use crate::db::{CatalogStore, MemoryStore};
    use rust_decimal_macros::dec;

    async fn seed_product(store: &MemoryStore, kind: ProductKind, price: Decimal) -> Product {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            kind,
            title: "Desk lamp".into(),
            description: String::new(),
            brand: "Lumen".into(),
            category: "lighting".into(),
            price,
            discount_eligible: true,
            images: vec!["lamp.jpg".into()],
            starts_at: None,
            ends_at: None,
            created_at: now,
            updated_at: now,
        };
        store.insert_product(&product).await.unwrap();
        product
    }

    fn add_for_user(user: Uuid, product: Uuid, quantity: i32) -> AddToCartRequest {
        AddToCartRequest {
            user_id: Some(user),
            product_id: Some(product),
            quantity: Some(quantity),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_adding_twice_accumulates_quantity() {
        let store = MemoryStore::new();
        let cache = AppCache::default();
        let product = seed_product(&store, ProductKind::Standard, dec!(25)).await;
        let user = Uuid::new_v4();

        let first = add_line(&store, &cache, add_for_user(user, product.id, 1)).await.unwrap();
        let second = add_line(&store, &cache, add_for_user(user, product.id, 2)).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.quantity, 3);
        assert_eq!(second.status, CartStatus::Pending);

        let cart = list_for_user(&store, &cache, user).await.unwrap();
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.total, dec!(75));
    }

    #[tokio::test]
    async fn test_same_id_in_another_collection_is_a_separate_line() {
        let store = MemoryStore::new();
        let cache = AppCache::default();
        let product = seed_product(&store, ProductKind::Standard, dec!(10)).await;
        let user = Uuid::new_v4();

        add_line(&store, &cache, add_for_user(user, product.id, 1)).await.unwrap();
        let err = add_line(
            &store,
            &cache,
            AddToCartRequest {
                user_id: Some(user),
                featured_product_id: Some(product.id),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

        // nothing is stored under the featured collection with that id
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_second_add_overwrites_coupon_and_discount_only_when_supplied() {
        let store = MemoryStore::new();
        let cache = AppCache::default();
        let product = seed_product(&store, ProductKind::Standard, dec!(200)).await;
        let user = Uuid::new_v4();

        let mut first = add_for_user(user, product.id, 1);
        first.coupon_code = Some(" save10 ".into());
        first.discount = Some(dec!(10));
        let line = add_line(&store, &cache, first).await.unwrap();
        assert_eq!(line.coupon_code.as_deref(), Some("SAVE10"));
        assert_eq!(line.final_price, dec!(180));

        let line = add_line(&store, &cache, add_for_user(user, product.id, 1)).await.unwrap();
        assert_eq!(line.coupon_code.as_deref(), Some("SAVE10"));
        assert_eq!(line.discount, Some(dec!(10)));

        let mut third = add_for_user(user, product.id, 1);
        third.discount = Some(dec!(0));
        let line = add_line(&store, &cache, third).await.unwrap();
        assert_eq!(line.final_price, dec!(200));
        assert_eq!(line.line_total, dec!(600));
    }

    #[tokio::test]
    async fn test_add_validates_owner_product_and_bounds() {
        let store = MemoryStore::new();
        let cache = AppCache::default();
        let product = seed_product(&store, ProductKind::Standard, dec!(5)).await;

        let no_owner = AddToCartRequest {
            product_id: Some(product.id),
            ..Default::default()
        };
        assert!(matches!(
            add_line(&store, &cache, no_owner).await,
            Err(AppError::Validation(_))
        ));

        let two_products = AddToCartRequest {
            guest_id: Some("g".into()),
            product_id: Some(product.id),
            online_product_id: Some(product.id),
            ..Default::default()
        };
        assert!(matches!(
            add_line(&store, &cache, two_products).await,
            Err(AppError::Validation(_))
        ));

        let mut too_much = add_for_user(Uuid::new_v4(), product.id, 1);
        too_much.discount = Some(dec!(150));
        assert!(matches!(
            add_line(&store, &cache, too_much).await,
            Err(AppError::Validation(_))
        ));

        let mut fractional = add_for_user(Uuid::new_v4(), product.id, 1);
        fractional.discount = Some(dec!(12.345));
        assert!(matches!(
            add_line(&store, &cache, fractional).await,
            Err(AppError::Validation(ref m)) if m.contains("decimal places")
        ));

        assert!(matches!(
            add_line(&store, &cache, add_for_user(Uuid::new_v4(), product.id, 0)).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_product_projects_as_null() {
        let store = MemoryStore::new();
        let cache = AppCache::default();
        let product = seed_product(&store, ProductKind::Online, dec!(30)).await;

        add_line(
            &store,
            &cache,
            AddToCartRequest {
                guest_id: Some("guest-9".into()),
                online_product_id: Some(product.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        store.delete_product(product.reference()).await.unwrap();
        cache.invalidate_product(&product.reference()).await;

        let cart = list_for_guest(&store, &cache, "guest-9").await.unwrap();
        assert_eq!(cart.lines.len(), 1);
        assert!(cart.lines[0].product.is_none());
        assert_eq!(cart.lines[0].final_price, Decimal::ZERO);
        assert_eq!(cart.total, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_delete_requires_owner_or_admin() {
        let store = MemoryStore::new();
        let cache = AppCache::default();
        let product = seed_product(&store, ProductKind::Standard, dec!(12)).await;
        let owner = Uuid::new_v4();

        let line = add_line(&store, &cache, add_for_user(owner, product.id, 1)).await.unwrap();

        let stranger = Requester::Account(Identity::user(Uuid::new_v4()));
        assert!(matches!(
            delete_line(&store, line.id, &stranger).await,
            Err(AppError::Forbidden(_))
        ));

        let me = Requester::Account(Identity::user(owner));
        delete_line(&store, line.id, &me).await.unwrap();

        let line = add_line(&store, &cache, add_for_user(owner, product.id, 1)).await.unwrap();
        let admin = Requester::Account(Identity::admin(Uuid::new_v4()));
        delete_line(&store, line.id, &admin).await.unwrap();

        assert!(matches!(
            delete_line(&store, line.id, &admin).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_line_is_partial() {
        let store = MemoryStore::new();
        let cache = AppCache::default();
        let product = seed_product(&store, ProductKind::Standard, dec!(8)).await;
        let line = add_line(&store, &cache, add_for_user(Uuid::new_v4(), product.id, 2))
            .await
            .unwrap();

        let updated = update_line(
            &store,
            &cache,
            line.id,
            UpdateCartLineRequest {
                quantity: None,
                status: Some(CartStatus::Complete),
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.quantity, 2);
        assert_eq!(updated.status, CartStatus::Complete);

        let err = update_line(
            &store,
            &cache,
            line.id,
            UpdateCartLineRequest {
                quantity: Some(0),
                status: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_merge_guest_cart_folds_into_user_lines() {
        let store = MemoryStore::new();
        let cache = AppCache::default();
        let shared = seed_product(&store, ProductKind::Standard, dec!(10)).await;
        let guest_only = seed_product(&store, ProductKind::Featured, dec!(4)).await;
        let user = Uuid::new_v4();

        add_line(&store, &cache, add_for_user(user, shared.id, 1)).await.unwrap();
        add_line(
            &store,
            &cache,
            AddToCartRequest {
                guest_id: Some("g-merge".into()),
                product_id: Some(shared.id),
                quantity: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        add_line(
            &store,
            &cache,
            AddToCartRequest {
                guest_id: Some("g-merge".into()),
                featured_product_id: Some(guest_only.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let cart = merge_guest_cart(&store, &cache, "g-merge", user).await.unwrap();
        assert_eq!(cart.lines.len(), 2);
        assert_eq!(cart.lines[0].quantity, 3);
        assert_eq!(cart.total, dec!(34));

        let guest_cart = list_for_guest(&store, &cache, "g-merge").await.unwrap();
        assert!(guest_cart.lines.is_empty());
    }

    #[tokio::test]
    async fn test_oversized_totals_are_rejected_not_panicking() {
        let store = MemoryStore::new();
        let cache = AppCache::default();
        let product = seed_product(&store, ProductKind::Standard, Decimal::MAX).await;
        let user = Uuid::new_v4();

        let err = add_line(&store, &cache, add_for_user(user, product.id, 2))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(matches!(
            list_for_user(&store, &cache, user).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_merge_rejects_quantity_overflow() {
        let store = MemoryStore::new();
        let cache = AppCache::default();
        let product = seed_product(&store, ProductKind::Standard, dec!(1)).await;
        let user = Uuid::new_v4();

        add_line(&store, &cache, add_for_user(user, product.id, i32::MAX))
            .await
            .unwrap();
        add_line(
            &store,
            &cache,
            AddToCartRequest {
                guest_id: Some("g-full".into()),
                product_id: Some(product.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let err = merge_guest_cart(&store, &cache, "g-full", user).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let cart = list_for_user(&store, &cache, user).await.unwrap();
        assert_eq!(cart.lines[0].quantity, i32::MAX);
        assert_eq!(list_for_guest(&store, &cache, "g-full").await.unwrap().lines.len(), 1);
    }
}
