//! 重启 API
//!
//! `/:composition`，任意 HTTP 方法，需要 Bearer token。同步执行，
//! 请求在 `docker compose up` 结束后才返回。

use axum::{
    extract::{Path, State},
    routing::any,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use crate::domain::run::Trigger;
use crate::error::Result;
use crate::middleware::RequireToken;
use crate::services::restart;
use crate::state::AppState;

/// 重启成功响应
#[derive(Debug, Serialize)]
pub struct RestartResponse {
    pub status: &'static str,
    pub composition: String,
    pub run_id: String,
    pub duration_ms: Option<i64>,
}

/// 创建重启路由
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/:composition", any(restart_composition))
}

/// 重启 composition
///
/// 认证在路径解析之前完成，未认证的请求无法探测 composition 是否存在。
/// 重启在独立任务中执行，客户端断开连接不会中断 `docker compose up`
async fn restart_composition(
    _auth: RequireToken,
    State(state): State<Arc<AppState>>,
    Path(composition): Path<String>,
) -> Result<Json<RestartResponse>> {
    let task = {
        let name = composition.clone();
        tokio::spawn(async move { restart::restart(&state, &name, Trigger::Webhook).await })
    };
    let record = task.await??;

    Ok(Json(RestartResponse {
        status: "success",
        composition,
        run_id: record.id,
        duration_ms: record.duration_ms,
    }))
}
