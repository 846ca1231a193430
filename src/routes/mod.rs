//! Service-level routes: health and cache administration

use axum::{extract::State, routing::{get, post}, Json, Router};
use serde_json::{json, Value};

use crate::auth::AdminIdentity;
use crate::cache::CacheStats;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/admin/cache/stats", get(cache_stats))
        .route("/api/admin/cache/invalidate", post(invalidate_cache))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn cache_stats(
    State(state): State<AppState>,
    AdminIdentity(_admin): AdminIdentity,
) -> Json<CacheStats> {
    Json(state.cache.stats())
}

async fn invalidate_cache(
    State(state): State<AppState>,
    AdminIdentity(_admin): AdminIdentity,
) -> Json<Value> {
    state.cache.invalidate_all();
    Json(json!({ "message": "All caches invalidated" }))
}
