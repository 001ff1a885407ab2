//! 运行记录领域模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 运行状态
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Success,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Success => "success",
            RunStatus::Failed => "failed",
        }
    }

    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Success | RunStatus::Failed)
    }
}

/// 运行类型
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunKind {
    /// `docker compose up -d --pull always`
    Restart,
    /// `docker image prune -a -f`
    Prune,
}

/// 触发来源
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// HTTP 请求
    Webhook,
    /// 定时任务
    Schedule,
}

/// 一次重启或清理的记录
#[derive(Clone, Debug, Serialize)]
pub struct RunRecord {
    pub id: String,
    pub kind: RunKind,
    /// 重启的 composition；清理时为空
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composition: Option<String>,
    pub trigger: Trigger,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunRecord {
    fn new(kind: RunKind, composition: Option<String>, trigger: Trigger) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            composition,
            trigger,
            status: RunStatus::Running,
            started_at: Utc::now(),
            finished_at: None,
            duration_ms: None,
            exit_code: None,
            error: None,
        }
    }

    /// 新的重启记录
    pub fn restart(composition: impl Into<String>, trigger: Trigger) -> Self {
        Self::new(RunKind::Restart, Some(composition.into()), trigger)
    }

    /// 新的清理记录
    pub fn prune(trigger: Trigger) -> Self {
        Self::new(RunKind::Prune, None, trigger)
    }

    /// 设置终态，计算耗时
    pub fn complete(&mut self, status: RunStatus, exit_code: Option<i32>, error: Option<String>) {
        let now = Utc::now();
        self.status = status;
        self.finished_at = Some(now);
        self.duration_ms = Some((now - self.started_at).num_milliseconds());
        self.exit_code = exit_code;
        self.error = error;
    }
}
