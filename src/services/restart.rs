//! composition 重启与镜像清理
//!
//! 每次执行都写入运行记录。同一 composition 的重启串行执行，
//! 清理要等所有重启结束后才开始。

use std::process::Output;
use std::sync::Arc;

use crate::domain::run::{RunRecord, RunStatus, Trigger};
use crate::error::{Error, Result};
use crate::infra::command::{CommandError, OutputExt};
use crate::state::AppState;

/// 用 `docker compose up -d --pull always` 重启单个 composition
pub async fn restart(state: &Arc<AppState>, name: &str, trigger: Trigger) -> Result<RunRecord> {
    let composition = state
        .config
        .composition(name)
        .ok_or_else(|| Error::NoComposition(name.to_string()))?;

    let _lock = state
        .lock_composition(name)
        .await
        .ok_or_else(|| Error::NoComposition(name.to_string()))?;
    let _restart = state.restart_guard().await;

    let run_id = state.history.start(RunRecord::restart(name, trigger)).await;
    tracing::info!(
        run_id = %run_id,
        composition = %name,
        trigger = ?trigger,
        work = %composition.work.display(),
        "Restarting composition"
    );

    let result = state.docker.compose_up(&composition.work).await;
    let outcome = check_output(result, |exit_code, stdout, stderr| Error::ComposeFailed {
        composition: name.to_string(),
        exit_code,
        stdout,
        stderr,
    });

    let record = finish(state, &run_id, outcome).await?;
    tracing::info!(
        run_id = %run_id,
        composition = %name,
        duration_ms = ?record.duration_ms,
        "Composition restarted"
    );
    Ok(record)
}

/// 按名称顺序重启全部 composition
///
/// 单个失败只记日志，不影响其余 composition
pub async fn restart_all(
    state: &Arc<AppState>,
    trigger: Trigger,
) -> Vec<(String, Result<RunRecord>)> {
    let names: Vec<String> = state
        .config
        .composition_names()
        .into_iter()
        .map(str::to_string)
        .collect();

    let mut results = Vec::with_capacity(names.len());
    for name in names {
        let result = restart(state, &name, trigger).await;
        if let Err(e) = &result {
            tracing::error!(composition = %name, error = %e, "Restart failed");
        }
        results.push((name, result));
    }
    results
}

/// 用 `docker image prune -a -f` 清理未使用的镜像
pub async fn prune(state: &Arc<AppState>, trigger: Trigger) -> Result<RunRecord> {
    let _prune = state.prune_guard().await;

    let run_id = state.history.start(RunRecord::prune(trigger)).await;
    tracing::info!(run_id = %run_id, trigger = ?trigger, "Pruning unused images");

    let result = state.docker.image_prune().await;
    let outcome = check_output(result, |exit_code, stdout, stderr| Error::PruneFailed {
        exit_code,
        stdout,
        stderr,
    });

    let reclaimed = outcome
        .as_ref()
        .ok()
        .and_then(|stdout| reclaimed_space(stdout))
        .map(str::to_string);
    let record = finish(state, &run_id, outcome).await?;
    tracing::info!(
        run_id = %run_id,
        reclaimed = reclaimed.as_deref().unwrap_or("unknown"),
        "Images pruned"
    );
    Ok(record)
}

/// 进程成功时返回 stdout，否则构造对应的错误
fn check_output(
    result: std::result::Result<Output, CommandError>,
    failed: impl FnOnce(Option<i32>, String, String) -> Error,
) -> Result<String> {
    let output = result?;
    let stdout = output.stdout_lossy();
    let stderr = output.stderr_lossy();

    if !stdout.is_empty() {
        tracing::debug!(%stdout, "docker stdout");
    }
    if !stderr.is_empty() {
        tracing::debug!(%stderr, "docker stderr");
    }

    if output.status.success() {
        Ok(stdout)
    } else {
        Err(failed(output.status.code(), stdout, stderr))
    }
}

/// 结束运行记录并返回执行结果
async fn finish(state: &AppState, run_id: &str, outcome: Result<String>) -> Result<RunRecord> {
    let (status, exit_code, message) = match &outcome {
        Ok(_) => (RunStatus::Success, Some(0), None),
        Err(e) => (RunStatus::Failed, e.exit_code(), Some(e.to_string())),
    };

    let record = state
        .history
        .finish(run_id, status, exit_code, message)
        .await
        .ok_or_else(|| Error::RunNotFound(run_id.to_string()));

    outcome?;
    record
}

/// 从清理输出中提取 `Total reclaimed space: 1.2GB`
fn reclaimed_space(stdout: &str) -> Option<&str> {
    stdout
        .lines()
        .rev()
        .find_map(|line| line.trim().strip_prefix("Total reclaimed space:"))
        .map(str::trim)
}
