//! conductor - docker compose 重启服务
//!
//! 通过 HTTP 触发 `docker compose up -d --pull always`，并可定时强制更新、定时清理镜像

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod infra;
pub mod middleware;
pub mod services;
pub mod state;

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

pub use config::Config;
pub use error::{Error, Result};
pub use state::AppState;

/// 启动 HTTP 服务和后台任务，直到 `shutdown` 被取消
///
/// 服务停止后等待后台任务结束，最多等待一个 `command_timeout`
pub async fn run(config: Config, shutdown: CancellationToken) -> anyhow::Result<()> {
    let addr = SocketAddr::new(config.bind, config.port);
    let grace = config.command_timeout();

    let state = Arc::new(AppState::new(config));
    let mut workers = services::scheduler::spawn_workers(state.clone(), shutdown.clone());
    let app = api::router(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!(%addr, "Starting server");

    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { server_shutdown.cancelled().await })
        .await
        .context("server error")?;

    tracing::info!("Server stopped accepting connections, waiting for workers");
    shutdown.cancel();
    drain_workers(&mut workers, grace).await;

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// 等待后台任务结束，超过 `grace` 则全部 abort
///
/// 返回 false 表示有任务被 abort
async fn drain_workers(workers: &mut JoinSet<()>, grace: Duration) -> bool {
    let drain = async {
        while let Some(result) = workers.join_next().await {
            if let Err(e) = result {
                tracing::error!(error = %e, "Worker panicked");
            }
        }
    };
    if tokio::time::timeout(grace, drain).await.is_err() {
        tracing::warn!(grace_secs = grace.as_secs(), "Workers did not stop in time, aborting");
        workers.abort_all();
        return false;
    }
    true
}

/// 等待 SIGINT / SIGTERM，然后取消 `shutdown`
pub async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown"),
        () = terminate => tracing::info!("Received SIGTERM, starting graceful shutdown"),
        () = shutdown.cancelled() => return,
    }

    shutdown.cancel();
}
