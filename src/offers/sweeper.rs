//! Background sweep of expired offer-products

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::cache::AppCache;
use crate::db::Store;

use super::services::deactivation_sweep;

/// Run the expired offer-product sweep every `period`, forever.
///
/// The first tick fires immediately so a restart catches up straight away.
pub async fn start_offer_sweeper(store: Arc<dyn Store>, cache: AppCache, period: Duration) {
    info!("Offer sweeper running every {:?}", period);

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        match deactivation_sweep(store.as_ref(), &cache, None).await {
            Ok(report) if report.is_empty() => {}
            Ok(report) => info!("Offer sweep complete: {:?}", report),
            Err(e) => warn!("Offer sweep failed: {}", e),
        }
    }
}
