//! 重启、清理和定时任务，使用伪造的 docker

#![cfg(unix)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::Fixture;
use conductor::domain::{RunKind, RunStatus, Trigger};
use conductor::services::{restart, scheduler};
use conductor::{AppState, Error};
use tokio_util::sync::CancellationToken;

/// 轮询直到伪造的 docker 被调用 `n` 次
async fn wait_for_calls(fixture: &Fixture, n: usize) -> Vec<String> {
    for _ in 0..100 {
        let calls = fixture.calls();
        if calls.len() >= n {
            return calls;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("expected {} docker calls, got {:?}", n, fixture.calls());
}

#[tokio::test]
async fn test_prune_records_run() {
    let fixture = Fixture::new("echo 'Total reclaimed space: 1.5GB'");
    let state = Arc::new(AppState::new(fixture.config(&[], "")));

    let record = restart::prune(&state, Trigger::Schedule).await.unwrap();
    assert_eq!(record.kind, RunKind::Prune);
    assert_eq!(record.status, RunStatus::Success);
    assert!(record.composition.is_none());

    let calls = fixture.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].ends_with(" image prune -a -f"), "{}", calls[0]);
}

#[tokio::test]
async fn test_prune_failure() {
    let fixture = Fixture::new("echo 'Cannot connect to the Docker daemon' >&2\nexit 1");
    let state = Arc::new(AppState::new(fixture.config(&[], "")));

    let err = restart::prune(&state, Trigger::Webhook).await.unwrap_err();
    assert!(matches!(err, Error::PruneFailed { exit_code: Some(1), .. }));

    let runs = state.history.recent(10, None, Some("failed")).await;
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].kind, RunKind::Prune);
}

#[tokio::test]
async fn test_restart_all_in_name_order_and_continues_after_failure() {
    // `beta` 失败，其余成功
    let fixture = Fixture::new("case \"$(pwd)\" in */beta) exit 2 ;; esac");
    let state = Arc::new(AppState::new(fixture.config(&["gamma", "alpha", "beta"], "")));

    let results = restart::restart_all(&state, Trigger::Schedule).await;
    let names: Vec<&str> = results.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "beta", "gamma"]);

    assert!(results[0].1.is_ok());
    assert!(matches!(
        results[1].1,
        Err(Error::ComposeFailed { exit_code: Some(2), .. })
    ));
    assert!(results[2].1.is_ok());

    let calls = fixture.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls[0].contains("/alpha "));
    assert!(calls[1].contains("/beta "));
    assert!(calls[2].contains("/gamma "));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_restarts_of_same_composition_do_not_overlap() {
    let fixture = Fixture::new(&format!(
        "echo start >> '{log}'\nsleep 0.2\necho end >> '{log}'",
        log = "markers.log"
    ));
    let state = Arc::new(AppState::new(fixture.config(&["web"], "")));

    let first = {
        let state = state.clone();
        tokio::spawn(async move { restart::restart(&state, "web", Trigger::Webhook).await })
    };
    let second = {
        let state = state.clone();
        tokio::spawn(async move { restart::restart(&state, "web", Trigger::Schedule).await })
    };
    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    // markers.log 位于 composition 工作目录下
    let markers = std::fs::read_to_string(fixture.work_dir("web").join("markers.log")).unwrap();
    let markers: Vec<&str> = markers.lines().collect();
    assert_eq!(markers, vec!["start", "end", "start", "end"]);
}

#[tokio::test]
async fn test_scheduler_runs_workers_at_startup_and_stops() {
    let fixture = Fixture::new("exit 0");
    let state = Arc::new(AppState::new(fixture.config(
        &["web"],
        "force_update_interval = 3600\nprune_interval = 3600",
    )));
    let shutdown = CancellationToken::new();

    let mut workers = scheduler::spawn_workers(state.clone(), shutdown.clone());
    assert_eq!(workers.len(), 2);

    let calls = wait_for_calls(&fixture, 2).await;
    assert!(calls.iter().any(|c| c.ends_with("compose up -d --pull always")));
    assert!(calls.iter().any(|c| c.ends_with("image prune -a -f")));

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(result) = workers.join_next().await {
            result.unwrap();
        }
    })
    .await
    .expect("workers stop after shutdown");

    let scheduled = state.history.recent(10, None, None).await;
    assert!(scheduled.iter().all(|r| r.trigger == Trigger::Schedule));
}
