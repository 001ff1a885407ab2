//! 运行记录 API
//!
//! GET /history, GET /history/:id，需要 Bearer token

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::constants::DEFAULT_HISTORY_LIMIT;
use crate::domain::run::RunRecord;
use crate::error::{Error, Result};
use crate::middleware::RequireToken;
use crate::state::AppState;

/// 历史查询参数
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// 返回数量限制，默认 20
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// composition 过滤
    pub composition: Option<String>,
    /// 状态过滤 (running, success, failed)
    pub status: Option<String>,
}

fn default_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

/// 历史响应
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub runs: Vec<RunRecord>,
    pub total: usize,
}

/// 创建运行记录路由
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/history", get(list_runs))
        .route("/history/:id", get(get_run))
}

/// 查询参数无效时返回 JSON 错误体，而不是 axum 默认的纯文本
async fn list_runs(
    _auth: RequireToken,
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<HistoryResponse>> {
    let Query(query) = query.map_err(|e| Error::BadRequest(e.body_text()))?;
    let runs = state
        .history
        .recent(
            query.limit,
            query.composition.as_deref(),
            query.status.as_deref(),
        )
        .await;
    let total = runs.len();

    Ok(Json(HistoryResponse { runs, total }))
}

async fn get_run(
    _auth: RequireToken,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<RunRecord>> {
    match state.history.get(&id).await {
        Some(record) => Ok(Json(record)),
        None => Err(Error::RunNotFound(id)),
    }
}
