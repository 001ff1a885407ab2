//! 应用状态

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::Config;
use crate::infra::Docker;

use super::history::RunHistory;

/// 应用状态
pub struct AppState {
    /// 配置
    pub config: Config,
    /// docker CLI
    pub docker: Docker,
    /// 运行记录
    pub history: RunHistory,
    /// 服务启动时间
    pub started_at: DateTime<Utc>,
    /// 每个 composition 一把锁，同一 composition 的重启串行执行
    composition_locks: HashMap<String, Mutex<()>>,
    /// 重启持读锁，清理持写锁
    maintenance: RwLock<()>,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(config: Config) -> Self {
        tracing::info!(
            port = config.port,
            bind = %config.bind,
            docker = %config.docker,
            force_update_interval = ?config.force_update_interval,
            prune_interval = ?config.prune_interval,
            composition_count = config.compositions.len(),
            "Loaded configuration"
        );

        for name in config.composition_names() {
            if let Some(composition) = config.composition(name) {
                tracing::info!(
                    composition = %name,
                    work = %composition.work.display(),
                    "Registered composition"
                );
            }
        }

        let composition_locks = config
            .compositions
            .keys()
            .map(|name| (name.clone(), Mutex::new(())))
            .collect();

        Self {
            docker: Docker::new(config.docker.clone(), config.command_timeout()),
            history: RunHistory::new(),
            started_at: Utc::now(),
            composition_locks,
            maintenance: RwLock::new(()),
            config,
        }
    }

    /// 配置的 Bearer token
    pub fn token(&self) -> &str {
        &self.config.token
    }

    /// 获取 composition 的锁；未配置的名称返回 None
    pub async fn lock_composition(&self, name: &str) -> Option<MutexGuard<'_, ()>> {
        match self.composition_locks.get(name) {
            Some(lock) => Some(lock.lock().await),
            None => None,
        }
    }

    /// 重启期间持有，阻止清理
    pub async fn restart_guard(&self) -> RwLockReadGuard<'_, ()> {
        self.maintenance.read().await
    }

    /// 清理期间持有，等待所有重启结束
    pub async fn prune_guard(&self) -> RwLockWriteGuard<'_, ()> {
        self.maintenance.write().await
    }

    /// 运行时长（秒）
    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}
