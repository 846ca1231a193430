use anyhow::Context;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_api::cache::AppCache;
use storefront_api::config::{Config, StoreBackend};
use storefront_api::db::{MemoryStore, PgStore, Store};
use storefront_api::notifications::{run_worker, Notifier};
use storefront_api::offers::start_offer_sweeper;
use storefront_api::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn Store> = match config.backend {
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is required")?;
            info!("Connecting to Postgres");
            Arc::new(PgStore::connect(url, config.database_max_connections).await?)
        }
        StoreBackend::Memory => {
            info!("Using in-memory store; data is lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    let cache = AppCache::new(config.cache_ttl);

    let (notifier, queue) = Notifier::channel(config.notification_queue_capacity);
    tokio::spawn(run_worker(store.clone(), queue));

    if let Some(period) = config.sweep_interval {
        tokio::spawn(start_offer_sweeper(store.clone(), cache.clone(), period));
    }

    let state = AppState::new(store, cache, notifier);
    let router = app(state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!("Listening on {}", config.bind_addr);

    axum::serve(listener, router).await?;

    Ok(())
}
