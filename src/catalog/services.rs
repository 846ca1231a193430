//! Catalog service functions with store access.
//!
//! Product reads go through the application cache; every write invalidates
//! the cached entry for the product it touched.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::cache::AppCache;
use crate::cart::calculators::{validate_amount, MAX_AMOUNT};
use crate::db::Store;
use crate::error::{AppError, Result};

use super::models::{Product, ProductKind, ProductRef};
use super::requests::ProductRequest;

/// What a product deletion removed along with it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRemoval {
    pub cart_lines_removed: u64,
    pub wishlist_entries_removed: u64,
}

fn validate_product(kind: ProductKind, request: &ProductRequest) -> Result<()> {
    if request.title.trim().is_empty() {
        return Err(AppError::validation("title is required"));
    }
    if request.price < Decimal::ZERO {
        return Err(AppError::validation("price must be greater than or equal to 0"));
    }
    validate_amount("price", request.price, MAX_AMOUNT)?;

    match (kind, request.start_date, request.end_date) {
        (ProductKind::Offer, Some(start), Some(end)) if start < end => Ok(()),
        (ProductKind::Offer, Some(_), Some(_)) => {
            Err(AppError::validation("startDate must be before endDate"))
        }
        (ProductKind::Offer, _, _) => Err(AppError::validation(
            "startDate and endDate are required for offer products",
        )),
        (_, None, None) => Ok(()),
        (_, _, _) => Err(AppError::validation(
            "startDate and endDate are only allowed on offer products",
        )),
    }
}

/// Create a product in the `kind` collection
pub async fn create_product(
    store: &dyn Store,
    kind: ProductKind,
    request: ProductRequest,
) -> Result<Product> {
    validate_product(kind, &request)?;

    let now = Utc::now();
    let product = Product {
        id: Uuid::new_v4(),
        kind,
        title: request.title.trim().to_string(),
        description: request.description,
        brand: request.brand,
        category: request.category,
        price: request.price,
        discount_eligible: request.discount_eligible,
        images: request.images,
        starts_at: request.start_date,
        ends_at: request.end_date,
        created_at: now,
        updated_at: now,
    };

    store.insert_product(&product).await?;
    info!("Created {} product {}", kind, product.id);

    Ok(product)
}

/// Replace the editable fields of an existing product
pub async fn update_product(
    store: &dyn Store,
    cache: &AppCache,
    reference: ProductRef,
    request: ProductRequest,
) -> Result<Product> {
    validate_product(reference.kind(), &request)?;

    let existing = store
        .get_product(reference)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    let product = Product {
        title: request.title.trim().to_string(),
        description: request.description,
        brand: request.brand,
        category: request.category,
        price: request.price,
        discount_eligible: request.discount_eligible,
        images: request.images,
        starts_at: request.start_date,
        ends_at: request.end_date,
        updated_at: Utc::now(),
        ..existing
    };

    if !store.update_product(&product).await? {
        return Err(AppError::not_found("Product"));
    }
    cache.invalidate_product(&reference).await;

    Ok(product)
}

/// Resolve a reference through the cache; `None` if the product is gone
pub async fn resolve_product(
    store: &dyn Store,
    cache: &AppCache,
    reference: ProductRef,
) -> Result<Option<Arc<Product>>> {
    if let Some(cached) = cache.products.get(&reference).await {
        tracing::debug!("Cache HIT for product: {}", reference);
        return Ok(Some(cached));
    }

    tracing::debug!("Cache MISS for product: {}", reference);
    match store.get_product(reference).await? {
        Some(product) => {
            let product = Arc::new(product);
            cache.products.insert(reference, product.clone()).await;
            Ok(Some(product))
        }
        None => Ok(None),
    }
}

pub async fn get_product(
    store: &dyn Store,
    cache: &AppCache,
    reference: ProductRef,
) -> Result<Arc<Product>> {
    resolve_product(store, cache, reference)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))
}

pub async fn list_products(store: &dyn Store, kind: ProductKind) -> Result<Vec<Product>> {
    store.list_products(kind).await
}

/// Delete a product along with cart lines and wishlist entries that point at it.
///
/// Dependents go first so an interrupted removal leaves the product behind
/// to be found again, never dangling references.
pub async fn remove_product(
    store: &dyn Store,
    cache: &AppCache,
    reference: ProductRef,
) -> Result<Option<ProductRemoval>> {
    let cart_lines_removed = store.delete_cart_lines_for_product(reference).await?;
    let wishlist_entries_removed = store.delete_wishlist_entries_for_product(reference).await?;
    let deleted = store.delete_product(reference).await?;
    cache.invalidate_product(&reference).await;

    if !deleted {
        return Ok(None);
    }

    info!(
        "Removed product {} ({} cart lines, {} wishlist entries)",
        reference, cart_lines_removed, wishlist_entries_removed
    );

    Ok(Some(ProductRemoval {
        cart_lines_removed,
        wishlist_entries_removed,
    }))
}

/// Admin delete: like [`remove_product`] but a missing product is an error
pub async fn delete_product(
    store: &dyn Store,
    cache: &AppCache,
    reference: ProductRef,
) -> Result<ProductRemoval> {
    remove_product(store, cache, reference)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))
}
