//! In-memory caching using moka
//!
//! Holds resolved catalog products for cart/wishlist projections and the
//! active-offer listing. Writes invalidate the affected entries.

use moka::future::Cache;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::catalog::models::{Product, ProductRef};
use crate::offers::models::Offer;

/// Key for the single active-offer listing entry
const ACTIVE_OFFERS_KEY: &str = "active";

/// Application cache holding products and offer listings
#[derive(Clone)]
pub struct AppCache {
    /// Products (reference -> Product)
    pub products: Cache<ProductRef, Arc<Product>>,
    /// Active offers, newest first (singleton)
    pub active_offers: Cache<String, Arc<Vec<Offer>>>,
}

impl AppCache {
    /// Create a new cache instance; `ttl` bounds product entries
    pub fn new(ttl: Duration) -> Self {
        Self {
            // Products: 10k entries, configured TTL, idle after half of it
            products: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(ttl)
                .time_to_idle(ttl / 2)
                .build(),

            // Active offers: 1 entry, 1 min TTL (the window predicate moves with time)
            active_offers: Cache::builder()
                .max_capacity(1)
                .time_to_live(Duration::from_secs(60))
                .build(),
        }
    }

    /// Get cache statistics for monitoring
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            products_size: self.products.entry_count(),
            active_offers_cached: self.active_offers.entry_count() > 0,
        }
    }

    /// Invalidate all caches
    pub fn invalidate_all(&self) {
        self.products.invalidate_all();
        self.active_offers.invalidate_all();
        info!("All caches invalidated");
    }

    /// Invalidate a single product
    pub async fn invalidate_product(&self, reference: &ProductRef) {
        self.products.invalidate(reference).await;
        info!("Cache invalidated for product: {}", reference);
    }

    pub async fn cached_active_offers(&self) -> Option<Arc<Vec<Offer>>> {
        self.active_offers.get(ACTIVE_OFFERS_KEY).await
    }

    pub async fn store_active_offers(&self, offers: Arc<Vec<Offer>>) {
        self.active_offers
            .insert(ACTIVE_OFFERS_KEY.to_string(), offers)
            .await;
    }

    /// Drop the active-offer listing after any offer write
    pub async fn invalidate_offers(&self) {
        self.active_offers.invalidate(ACTIVE_OFFERS_KEY).await;
    }
}

impl Default for AppCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(5 * 60))
    }
}

/// Cache statistics for monitoring endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub products_size: u64,
    pub active_offers_cached: bool,
}
