//! 定时任务
//!
//! 强制更新（定时重启全部 composition）与定时清理镜像。首次 tick 立即触发，
//! 错过的 tick 顺延，不会补发。

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::domain::run::Trigger;
use crate::state::AppState;

use super::restart;

/// 按配置启动后台任务
pub fn spawn_workers(state: Arc<AppState>, shutdown: CancellationToken) -> JoinSet<()> {
    let mut workers = JoinSet::new();

    if let Some(period) = state.config.force_update_interval() {
        tracing::info!(interval_secs = period.as_secs(), "Starting forced update worker");
        let state = state.clone();
        workers.spawn(every(period, shutdown.clone(), "force_update", move || {
            let state = state.clone();
            async move {
                restart::restart_all(&state, Trigger::Schedule).await;
            }
        }));
    }

    if let Some(period) = state.config.prune_interval() {
        tracing::info!(interval_secs = period.as_secs(), "Starting image prune worker");
        let state = state.clone();
        workers.spawn(every(period, shutdown.clone(), "prune", move || {
            let state = state.clone();
            async move {
                if let Err(e) = restart::prune(&state, Trigger::Schedule).await {
                    tracing::error!(error = %e, "Scheduled prune failed");
                }
            }
        }));
    }

    workers
}

/// 每隔 `period` 执行一次 `job`，直到 `shutdown` 被取消
///
/// 取消只在两次执行之间生效，正在执行的 job 会跑完
pub async fn every<F, Fut>(
    period: Duration,
    shutdown: CancellationToken,
    name: &'static str,
    mut job: F,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }
        tracing::debug!(worker = name, "Worker tick");
        job().await;
    }

    tracing::info!(worker = name, "Worker stopped");
}
