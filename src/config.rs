//! Runtime configuration read from the environment
//!
//! `main` loads a `.env` file first (via dotenvy), so every setting can live there
//! during local development.

use anyhow::{bail, Context};
use std::net::SocketAddr;
use std::time::Duration;

/// Which store implementation backs the API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub backend: StoreBackend,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    /// Zero disables the background sweeper; the admin endpoint still works.
    pub sweep_interval: Option<Duration>,
    pub notification_queue_capacity: usize,
    pub cache_ttl: Duration,
}

impl Config {
    /// Build configuration from process environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8080".to_string())
            .parse::<SocketAddr>()
            .context("BIND_ADDR must be a socket address like 0.0.0.0:8080")?;

        let backend = match lookup("STORE_BACKEND").as_deref() {
            None | Some("postgres") => StoreBackend::Postgres,
            Some("memory") => StoreBackend::Memory,
            Some(other) => bail!("STORE_BACKEND must be 'postgres' or 'memory', got '{}'", other),
        };

        let database_url = lookup("DATABASE_URL");
        if backend == StoreBackend::Postgres && database_url.is_none() {
            bail!("DATABASE_URL is required when STORE_BACKEND=postgres");
        }

        let database_max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10u32)?;
        let sweep_secs = parse_or(&lookup, "SWEEP_INTERVAL_SECS", 0u64)?;
        let notification_queue_capacity = parse_or(&lookup, "NOTIFICATION_QUEUE_CAPACITY", 1024usize)?;
        let cache_ttl_secs = parse_or(&lookup, "CACHE_TTL_SECS", 300u64)?;

        if notification_queue_capacity == 0 {
            bail!("NOTIFICATION_QUEUE_CAPACITY must be at least 1");
        }

        Ok(Self {
            bind_addr,
            backend,
            database_url,
            database_max_connections,
            sweep_interval: (sweep_secs > 0).then(|| Duration::from_secs(sweep_secs)),
            notification_queue_capacity,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{} has an invalid value '{}'", key, raw)),
        None => Ok(default),
    }
}
