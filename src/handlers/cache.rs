use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

use crate::cache::CacheStats;
use crate::state::AppState;

pub async fn cache_stats_handler(State(state): State<Arc<AppState>>) -> Json<CacheStats> {
    Json(state.cache.stats())
}

// Guideline updates invalidate every previous analysis
pub async fn cache_clear_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let dropped = state.cache.len();
    state.cache.clear();
    info!(dropped, "Analysis cache cleared on request");
    Json(json!({ "cleared": dropped }))
}

pub async fn cache_delete_handler(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Json<Value> {
    Json(json!({ "removed": state.cache.delete(&key) }))
}
