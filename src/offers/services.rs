//! Offer service functions with store access.
//!
//! Offer-window checks take an optional `as_of` instant; `None` means now.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::cache::AppCache;
use crate::cart::calculators::{validate_amount, MAX_AMOUNT};
use crate::catalog::models::{ProductKind, ProductRef};
use crate::catalog::services::remove_product;
use crate::db::Store;
use crate::error::{AppError, Result};

use super::models::{normalize_code, CouponApplyTo, DiscountKind, Offer, OfferKind};
use super::requests::OfferRequest;
use super::responses::{CouponSnapshot, SweepReport};

/// Offer fields that passed validation
struct ValidOffer {
    name: String,
    kind: OfferKind,
    discount_kind: DiscountKind,
    discount_value: Decimal,
    coupon_code: String,
    products: Vec<Uuid>,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    active: bool,
    apply_to: CouponApplyTo,
}

/// Check an offer request, reporting the first rule it breaks
async fn validate_offer(store: &dyn Store, request: OfferRequest) -> Result<ValidOffer> {
    let name = request
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::validation("name is required"))?;

    let kind: OfferKind = request
        .kind
        .ok_or_else(|| AppError::validation("type is required"))?
        .parse()?;

    let discount_kind: DiscountKind = request
        .discount_type
        .ok_or_else(|| AppError::validation("discountType is required"))?
        .parse()?;

    let discount_value = request
        .discount_value
        .ok_or_else(|| AppError::validation("discountValue is required"))?;
    if discount_value < Decimal::ZERO {
        return Err(AppError::validation("discountValue must be greater than or equal to 0"));
    }
    if discount_kind == DiscountKind::Percentage && discount_value > Decimal::ONE_HUNDRED {
        return Err(AppError::validation("percentage discountValue cannot exceed 100"));
    }
    validate_amount("discountValue", discount_value, MAX_AMOUNT)?;

    let mut products = request.products.unwrap_or_default();
    if products.is_empty() {
        return Err(AppError::validation("products must be a non-empty array"));
    }
    let mut seen = HashSet::new();
    products.retain(|id| seen.insert(*id));
    let existing = store
        .existing_product_ids(ProductKind::Standard, &products)
        .await?;
    if let Some(missing) = products.iter().find(|id| !existing.contains(id)) {
        return Err(AppError::validation(format!("product {} does not exist", missing)));
    }

    let starts_at = request
        .start_date
        .ok_or_else(|| AppError::validation("startDate is required"))?;
    let ends_at = request
        .end_date
        .ok_or_else(|| AppError::validation("endDate is required"))?;
    if starts_at >= ends_at {
        return Err(AppError::validation("startDate must be before endDate"));
    }

    let coupon_code = request
        .coupon_code
        .as_deref()
        .map(normalize_code)
        .unwrap_or_default();
    if kind == OfferKind::Coupon && coupon_code.is_empty() {
        return Err(AppError::validation("couponCode is required for coupon offers"));
    }

    let apply_to = match request.coupon_apply_to {
        Some(raw) => raw.parse()?,
        None => CouponApplyTo::default(),
    };

    Ok(ValidOffer {
        name,
        kind,
        discount_kind,
        discount_value,
        coupon_code,
        products,
        starts_at,
        ends_at,
        active: request.active.unwrap_or(true),
        apply_to,
    })
}

pub async fn create_offer(store: &dyn Store, cache: &AppCache, request: OfferRequest) -> Result<Offer> {
    let valid = validate_offer(store, request).await?;
    let now = Utc::now();

    let offer = Offer {
        id: Uuid::new_v4(),
        name: valid.name,
        kind: valid.kind,
        discount_kind: valid.discount_kind,
        discount_value: valid.discount_value,
        coupon_code: valid.coupon_code,
        products: valid.products,
        starts_at: valid.starts_at,
        ends_at: valid.ends_at,
        active: valid.active,
        apply_to: valid.apply_to,
        created_at: now,
        updated_at: now,
    };

    store.insert_offer(&offer).await?;
    cache.invalidate_offers().await;
    info!("Created {} offer {} ({})", offer.kind.as_str(), offer.id, offer.name);

    Ok(offer)
}

/// Replace an offer; validation is the same as for creation
pub async fn update_offer(
    store: &dyn Store,
    cache: &AppCache,
    id: Uuid,
    request: OfferRequest,
) -> Result<Offer> {
    let existing = store
        .get_offer(id)
        .await?
        .ok_or_else(|| AppError::not_found("Offer"))?;
    let valid = validate_offer(store, request).await?;

    let offer = Offer {
        name: valid.name,
        kind: valid.kind,
        discount_kind: valid.discount_kind,
        discount_value: valid.discount_value,
        coupon_code: valid.coupon_code,
        products: valid.products,
        starts_at: valid.starts_at,
        ends_at: valid.ends_at,
        active: valid.active,
        apply_to: valid.apply_to,
        updated_at: Utc::now(),
        ..existing
    };

    if !store.update_offer(&offer).await? {
        return Err(AppError::not_found("Offer"));
    }
    cache.invalidate_offers().await;

    Ok(offer)
}

pub async fn get_offer(store: &dyn Store, id: Uuid) -> Result<Offer> {
    store
        .get_offer(id)
        .await?
        .ok_or_else(|| AppError::not_found("Offer"))
}

pub async fn list_offers(store: &dyn Store) -> Result<Vec<Offer>> {
    store.list_offers().await
}

pub async fn delete_offer(store: &dyn Store, cache: &AppCache, id: Uuid) -> Result<()> {
    if !store.delete_offer(id).await? {
        return Err(AppError::not_found("Offer"));
    }
    cache.invalidate_offers().await;
    info!("Deleted offer {}", id);
    Ok(())
}

/// Offers active at `as_of`, newest first.
///
/// The listing for "now" is cached; cached entries are re-checked against the
/// clock so an offer never outlives its window.
pub async fn active_offers(
    store: &dyn Store,
    cache: &AppCache,
    as_of: Option<DateTime<Utc>>,
) -> Result<Vec<Offer>> {
    let Some(check_time) = as_of else {
        let now = Utc::now();
        if let Some(cached) = cache.cached_active_offers().await {
            debug!("Cache HIT for active offers");
            return Ok(cached.iter().filter(|o| o.is_active_at(now)).cloned().collect());
        }

        debug!("Cache MISS for active offers");
        let offers = store.active_offers(now).await?;
        cache.store_active_offers(Arc::new(offers.clone())).await;
        return Ok(offers);
    };

    store.active_offers(check_time).await
}

/// Look up an active coupon by code, ignoring case and surrounding whitespace
pub async fn validate_coupon(
    store: &dyn Store,
    code: &str,
    as_of: Option<DateTime<Utc>>,
) -> Result<CouponSnapshot> {
    let code = normalize_code(code);
    if code.is_empty() {
        return Err(AppError::validation("code is required"));
    }

    let check_time = as_of.unwrap_or_else(Utc::now);
    store
        .find_active_coupon(&code, check_time)
        .await?
        .map(CouponSnapshot::from)
        .ok_or_else(|| AppError::not_found("Coupon"))
}

/// Delete every offer-product whose window has ended, along with the cart
/// lines and wishlist entries pointing at it.
///
/// Running it again on the same state removes nothing.
pub async fn deactivation_sweep(
    store: &dyn Store,
    cache: &AppCache,
    as_of: Option<DateTime<Utc>>,
) -> Result<SweepReport> {
    let check_time = as_of.unwrap_or_else(Utc::now);
    let expired = store.expired_offer_products(check_time).await?;

    let mut report = SweepReport::default();
    for id in expired {
        // a concurrent sweep or admin delete may have got there first
        if let Some(removal) = remove_product(store, cache, ProductRef::Offer(id)).await? {
            report.offer_products_removed += 1;
            report.cart_lines_removed += removal.cart_lines_removed;
            report.wishlist_entries_removed += removal.wishlist_entries_removed;
        }
    }

    if !report.is_empty() {
        info!(
            "Sweep removed {} expired offer-products ({} cart lines, {} wishlist entries)",
            report.offer_products_removed, report.cart_lines_removed, report.wishlist_entries_removed
        );
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::requests::AddToCartRequest;
    use crate::cart::services::add_line;
    use crate::catalog::requests::ProductRequest;
    use crate::catalog::services::create_product;
    use crate::db::{CatalogStore, MemoryStore, OfferStore};
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn product_request(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> ProductRequest {
        ProductRequest {
            title: "Headphones".into(),
            description: String::new(),
            brand: "Sono".into(),
            category: "audio".into(),
            price: dec!(99),
            discount_eligible: true,
            images: vec![],
            start_date: start,
            end_date: end,
        }
    }

    async fn standard_product(store: &MemoryStore) -> Uuid {
        create_product(store, ProductKind::Standard, product_request(None, None))
            .await
            .unwrap()
            .id
    }

    fn coupon_request(products: Vec<Uuid>, start: DateTime<Utc>, end: DateTime<Utc>) -> OfferRequest {
        OfferRequest {
            name: Some("Ten off".into()),
            kind: Some("coupon".into()),
            discount_type: Some("percentage".into()),
            discount_value: Some(dec!(10)),
            coupon_code: Some(" save10".into()),
            products: Some(products),
            start_date: Some(start),
            end_date: Some(end),
            active: None,
            coupon_apply_to: Some("lowest_price".into()),
        }
    }

    #[tokio::test]
    async fn test_create_normalizes_code() {
        let store = MemoryStore::new();
        let cache = AppCache::default();
        let product = standard_product(&store).await;
        let now = Utc::now();

        let offer = create_offer(&store, &cache, coupon_request(vec![product], now, now + Duration::days(1)))
            .await
            .unwrap();
        assert_eq!(offer.coupon_code, "SAVE10");
        assert!(offer.active);
        assert_eq!(offer.apply_to, CouponApplyTo::LowestPrice);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_window_and_unknown_products() {
        let store = MemoryStore::new();
        let cache = AppCache::default();
        let product = standard_product(&store).await;
        let now = Utc::now();

        let same_instant = coupon_request(vec![product], now, now);
        assert!(matches!(
            create_offer(&store, &cache, same_instant).await,
            Err(AppError::Validation(_))
        ));

        let backwards = coupon_request(vec![product], now, now - Duration::hours(1));
        assert!(matches!(
            create_offer(&store, &cache, backwards).await,
            Err(AppError::Validation(_))
        ));

        let unknown = coupon_request(vec![product, Uuid::new_v4()], now, now + Duration::days(1));
        assert!(matches!(
            create_offer(&store, &cache, unknown).await,
            Err(AppError::Validation(_))
        ));

        let empty = coupon_request(vec![], now, now + Duration::days(1));
        assert!(matches!(
            create_offer(&store, &cache, empty).await,
            Err(AppError::Validation(_))
        ));

        // offers may only target standard products
        let featured = create_product(&store, ProductKind::Featured, product_request(None, None))
            .await
            .unwrap();
        let wrong_kind = coupon_request(vec![featured.id], now, now + Duration::days(1));
        assert!(create_offer(&store, &cache, wrong_kind).await.is_err());

        assert!(store.list_offers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_first_violated_rule_is_reported() {
        let store = MemoryStore::new();
        let cache = AppCache::default();

        let err = create_offer(&store, &cache, OfferRequest::default()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m == "name is required"));

        let err = create_offer(
            &store,
            &cache,
            OfferRequest {
                name: Some("Flash".into()),
                kind: Some("discount".into()),
                discount_type: Some("value".into()),
                discount_value: Some(dec!(-5)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("discountValue")));

        let product = standard_product(&store).await;
        let now = Utc::now();
        let mut fractional = coupon_request(vec![product], now, now + Duration::days(1));
        fractional.discount_value = Some(dec!(12.345));
        let err = create_offer(&store, &cache, fractional).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.contains("decimal places")));

        let mut huge = coupon_request(vec![product], now, now + Duration::days(1));
        huge.discount_type = Some("value".into());
        huge.discount_value = Some(dec!(10000000000));
        assert!(matches!(
            create_offer(&store, &cache, huge).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_validate_coupon_ignores_case() {
        let store = MemoryStore::new();
        let cache = AppCache::default();
        let product = standard_product(&store).await;
        let start = Utc::now() - Duration::hours(1);
        let end = start + Duration::days(2);
        create_offer(&store, &cache, coupon_request(vec![product], start, end))
            .await
            .unwrap();

        let upper = validate_coupon(&store, "SAVE10", None).await.unwrap();
        let lower = validate_coupon(&store, "save10", None).await.unwrap();
        let again = validate_coupon(&store, " Save10 ", None).await.unwrap();
        assert_eq!(upper, lower);
        assert_eq!(upper, again);
        assert_eq!(upper.products, vec![product]);
        assert_eq!(upper.discount_value, dec!(10));

        assert!(matches!(
            validate_coupon(&store, "SAVE1", None).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            validate_coupon(&store, "SAVE.*", None).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_validate_coupon_respects_window_and_flag() {
        let store = MemoryStore::new();
        let cache = AppCache::default();
        let product = standard_product(&store).await;
        let start = Utc::now() + Duration::days(1);
        let end = start + Duration::days(1);
        let offer = create_offer(&store, &cache, coupon_request(vec![product], start, end))
            .await
            .unwrap();

        let before = start - Duration::seconds(1);
        assert!(matches!(
            validate_coupon(&store, "save10", Some(before)).await,
            Err(AppError::NotFound(_))
        ));
        assert!(validate_coupon(&store, "save10", Some(start)).await.is_ok());
        assert!(matches!(
            validate_coupon(&store, "save10", Some(end)).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            validate_coupon(&store, "save10", Some(end + Duration::hours(1))).await,
            Err(AppError::NotFound(_))
        ));

        let mut inactive = coupon_request(vec![product], start, end);
        inactive.active = Some(false);
        update_offer(&store, &cache, offer.id, inactive).await.unwrap();
        assert!(matches!(
            validate_coupon(&store, "save10", Some(start)).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_discount_offers_are_not_coupons() {
        let store = MemoryStore::new();
        let cache = AppCache::default();
        let product = standard_product(&store).await;
        let now = Utc::now();

        let mut request = coupon_request(vec![product], now - Duration::hours(1), now + Duration::hours(1));
        request.kind = Some("discount".into());
        create_offer(&store, &cache, request).await.unwrap();

        assert!(validate_coupon(&store, "SAVE10", None).await.is_err());
        assert_eq!(active_offers(&store, &cache, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_active_offers_newest_first() {
        let store = MemoryStore::new();
        let cache = AppCache::default();
        let product = standard_product(&store).await;
        let now = Utc::now();

        let mut older = coupon_request(vec![product], now - Duration::hours(2), now + Duration::hours(2));
        older.name = Some("Older".into());
        create_offer(&store, &cache, older).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let mut newer = coupon_request(vec![product], now - Duration::hours(1), now + Duration::hours(2));
        newer.name = Some("Newer".into());
        newer.coupon_code = Some("NEWER".into());
        create_offer(&store, &cache, newer).await.unwrap();

        let mut future = coupon_request(vec![product], now + Duration::days(1), now + Duration::days(2));
        future.coupon_code = Some("LATER".into());
        create_offer(&store, &cache, future).await.unwrap();

        let active = active_offers(&store, &cache, Some(now)).await.unwrap();
        let names: Vec<_> = active.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, ["Newer", "Older"]);

        // cached listing matches the store
        let first = active_offers(&store, &cache, None).await.unwrap();
        let second = active_offers(&store, &cache, None).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[tokio::test]
    async fn test_sweep_is_idempotent() {
        let store = MemoryStore::new();
        let cache = AppCache::default();
        let now = Utc::now();

        let expired = create_product(
            &store,
            ProductKind::Offer,
            product_request(Some(now - Duration::days(3)), Some(now - Duration::days(1))),
        )
        .await
        .unwrap();
        let running = create_product(
            &store,
            ProductKind::Offer,
            product_request(Some(now - Duration::days(1)), Some(now + Duration::days(1))),
        )
        .await
        .unwrap();

        for guest in ["g-1", "g-2"] {
            add_line(
                &store,
                &cache,
                AddToCartRequest {
                    guest_id: Some(guest.into()),
                    offer_product_id: Some(expired.id),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        }
        add_line(
            &store,
            &cache,
            AddToCartRequest {
                guest_id: Some("g-1".into()),
                offer_product_id: Some(running.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let first = deactivation_sweep(&store, &cache, Some(now)).await.unwrap();
        assert_eq!(
            first,
            SweepReport {
                offer_products_removed: 1,
                cart_lines_removed: 2,
                wishlist_entries_removed: 0,
            }
        );

        let second = deactivation_sweep(&store, &cache, Some(now)).await.unwrap();
        assert_eq!(second, SweepReport::default());

        assert!(store.get_product(running.reference()).await.unwrap().is_some());
        assert!(store.get_product(expired.reference()).await.unwrap().is_none());
    }
}
