//! 运行记录存储
//!
//! 有界内存存储，最新记录在前。超出容量时先淘汰最旧的已完成记录，
//! 运行中的记录不会被淘汰。

use std::collections::VecDeque;
use tokio::sync::RwLock;

use crate::config::constants::MAX_RUN_HISTORY;
use crate::domain::run::{RunRecord, RunStatus};

/// 运行记录存储
pub struct RunHistory {
    records: RwLock<VecDeque<RunRecord>>,
    capacity: usize,
}

impl RunHistory {
    pub fn new() -> Self {
        Self::with_capacity(MAX_RUN_HISTORY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: RwLock::new(VecDeque::new()),
            capacity,
        }
    }

    /// 记录开始，返回记录 ID
    pub async fn start(&self, record: RunRecord) -> String {
        let id = record.id.clone();
        let mut records = self.records.write().await;
        records.push_front(record);

        while records.len() > self.capacity {
            // 从尾部（最旧）找第一个已完成的记录
            match records.iter().rposition(|r| r.status.is_terminal()) {
                Some(pos) => {
                    records.remove(pos);
                }
                None => break,
            }
        }

        id
    }

    /// 记录结束，返回更新后的记录
    pub async fn finish(
        &self,
        id: &str,
        status: RunStatus,
        exit_code: Option<i32>,
        error: Option<String>,
    ) -> Option<RunRecord> {
        let mut records = self.records.write().await;
        let record = records.iter_mut().find(|r| r.id == id)?;
        record.complete(status, exit_code, error);
        Some(record.clone())
    }

    pub async fn get(&self, id: &str) -> Option<RunRecord> {
        let records = self.records.read().await;
        records.iter().find(|r| r.id == id).cloned()
    }

    /// 最近的记录，可按 composition 和状态过滤
    pub async fn recent(
        &self,
        limit: usize,
        composition: Option<&str>,
        status: Option<&str>,
    ) -> Vec<RunRecord> {
        let records = self.records.read().await;

        records
            .iter()
            .filter(|r| {
                let composition_match =
                    composition.map_or(true, |c| r.composition.as_deref() == Some(c));
                let status_match = status.map_or(true, |s| r.status.as_str() == s);
                composition_match && status_match
            })
            .take(limit)
            .cloned()
            .collect()
    }

    /// 运行中的记录
    pub async fn running(&self) -> Vec<RunRecord> {
        let records = self.records.read().await;
        records
            .iter()
            .filter(|r| !r.status.is_terminal())
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl Default for RunHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::run::Trigger;

    #[tokio::test]
    async fn test_run_lifecycle() {
        let history = RunHistory::new();

        let id = history.start(RunRecord::restart("web", Trigger::Webhook)).await;
        assert_eq!(history.running().await.len(), 1);

        let record = history
            .finish(&id, RunStatus::Success, Some(0), None)
            .await
            .unwrap();
        assert_eq!(record.status, RunStatus::Success);
        assert!(history.running().await.is_empty());
        assert_eq!(history.get(&id).await.unwrap().exit_code, Some(0));
    }

    #[tokio::test]
    async fn test_finish_unknown_id() {
        let history = RunHistory::new();
        assert!(history
            .finish("missing", RunStatus::Failed, None, None)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_capacity_evicts_oldest_finished() {
        let history = RunHistory::with_capacity(3);

        // 最旧的一条一直在运行
        let running = history.start(RunRecord::restart("slow", Trigger::Schedule)).await;
        let mut finished = Vec::new();
        for i in 0..4 {
            let id = history
                .start(RunRecord::restart(format!("app-{}", i), Trigger::Webhook))
                .await;
            history.finish(&id, RunStatus::Success, Some(0), None).await;
            finished.push(id);
        }

        assert_eq!(history.len().await, 3);
        assert!(history.get(&running).await.is_some());
        assert!(history.get(&finished[0]).await.is_none());
        assert!(history.get(&finished[1]).await.is_none());
        assert!(history.get(&finished[3]).await.is_some());
    }

    #[tokio::test]
    async fn test_recent_filters() {
        let history = RunHistory::new();

        let a = history.start(RunRecord::restart("web", Trigger::Webhook)).await;
        history.finish(&a, RunStatus::Failed, Some(1), None).await;
        let b = history.start(RunRecord::restart("api", Trigger::Webhook)).await;
        history.finish(&b, RunStatus::Success, Some(0), None).await;
        history.start(RunRecord::prune(Trigger::Schedule)).await;

        let all = history.recent(10, None, None).await;
        assert_eq!(all.len(), 3);
        // 最新在前
        assert!(all[0].composition.is_none());

        let web = history.recent(10, Some("web"), None).await;
        assert_eq!(web.len(), 1);
        assert_eq!(web[0].id, a);

        let ok = history.recent(10, None, Some("success")).await;
        assert_eq!(ok.len(), 1);
        assert_eq!(ok[0].id, b);

        assert_eq!(history.recent(1, None, None).await.len(), 1);
    }
}
