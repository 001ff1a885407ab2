//! API 模块
//!
//! HTTP handlers 和路由组装

pub mod health;
pub mod history;
pub mod restart;

use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// 构建完整的 API 路由
///
/// 静态路由 (/health, /history) 优先于 `/:composition` 匹配
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health
        .merge(health::router())
        // History
        .merge(history::router())
        // Restart
        .merge(restart::router())
        // Middleware
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
