use axum::{Json, extract::State, response::IntoResponse};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub time: String,
    pub cache_status: &'static str,
    pub cache_backend: &'static str,
    pub cache_failures: u64,
}

// 健康检查不需要认证，也不走统一响应包装
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let read_model = &state.read_model;
    let cache_status = if read_model.is_caching_available() {
        "connected"
    } else {
        "disconnected"
    };

    Json(HealthResponse {
        status: "ok",
        service: "user-service",
        time: Utc::now().to_rfc3339(),
        cache_status,
        cache_backend: read_model.cache_backend_name(),
        cache_failures: read_model.cache_failure_count(),
    })
}
