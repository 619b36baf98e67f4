//! Liveness endpoint

use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::store::Store;

/// GET /health
///
/// Reports how many pipelines the sandbox currently holds.
pub async fn health_check(State(store): State<Store>) -> Json<Value> {
    let pipelines = store.read().await.len();

    Json(json!({ "status": "ok", "pipelines": pipelines }))
}
