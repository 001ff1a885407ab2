//! 健康检查 API
//!
//! GET /health，无需认证

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::config::constants::{SERVICE_NAME, VERSION};
use crate::domain::run::RunRecord;
use crate::state::AppState;

/// 健康检查响应
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    started_at: DateTime<Utc>,
    uptime_secs: i64,
    compositions: Vec<String>,
    running: Vec<RunRecord>,
}

/// 创建健康检查路由
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health_check))
}

/// 健康检查 - 返回状态、版本、运行时间、当前运行中的任务
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let compositions = state
        .config
        .composition_names()
        .into_iter()
        .map(str::to_string)
        .collect();

    Json(HealthResponse {
        status: "ok",
        service: SERVICE_NAME,
        version: VERSION,
        started_at: state.started_at,
        uptime_secs: state.uptime_secs(),
        compositions,
        running: state.history.running().await,
    })
}
