use crate::error::{AppError, Result};
use crate::services::cache::CacheStatus;
use crate::types::{KeyInfo, KeyInspection};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{delete, get},
    Json, Router,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub status: CacheStatus,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeysResponse {
    pub total_keys: usize,
    pub keys: Vec<KeyInfo>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct InspectResponse {
    #[serde(flatten)]
    pub inspection: KeyInspection,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: &'static str,
    pub timestamp: String,
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// GET /api/cache/status
async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: state.cache.status(),
        timestamp: now(),
    })
}

/// GET /api/cache/keys
async fn get_keys(State(state): State<AppState>) -> Result<Json<KeysResponse>> {
    let keys = state.cache.list_keys().await?;
    Ok(Json(KeysResponse {
        total_keys: keys.len(),
        keys,
        timestamp: now(),
    }))
}

/// GET /api/cache/inspect/:key
async fn inspect_key(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<InspectResponse>> {
    let inspection = state
        .cache
        .inspect(&key)
        .await?
        .ok_or_else(|| AppError::NotFound("Key not found".to_string()))?;
    Ok(Json(InspectResponse {
        inspection,
        timestamp: now(),
    }))
}

/// DELETE /api/cache/clear
async fn clear_cache(State(state): State<AppState>) -> Result<Json<ActionResponse>> {
    state.cache.flush().await?;
    Ok(Json(ActionResponse {
        success: true,
        message: "Cache cleared successfully",
        timestamp: now(),
    }))
}

/// DELETE /api/cache/key/:key
async fn delete_key(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ActionResponse>> {
    let removed = state.cache.remove_key(&key).await?;
    Ok(Json(ActionResponse {
        success: removed,
        message: if removed {
            "Key deleted successfully"
        } else {
            "Key not found"
        },
        timestamp: now(),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/status", get(get_status))
        .route("/keys", get(get_keys))
        .route("/inspect/:key", get(inspect_key))
        .route("/clear", delete(clear_cache))
        .route("/key/:key", delete(delete_key))
}
