use axum::extract::State;
use axum::response::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::server::AppState;

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    status: String,
    areas: Option<usize>,
    fetched_at: Option<DateTime<Utc>>,
    age_secs: Option<u64>,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let cache = state.service.cache_status();

    Json(HealthResponse {
        status: "healthy".to_string(),
        areas: cache.as_ref().map(|c| c.areas),
        fetched_at: cache.as_ref().map(|c| c.fetched_at),
        age_secs: cache.as_ref().map(|c| c.age_secs),
    })
}
