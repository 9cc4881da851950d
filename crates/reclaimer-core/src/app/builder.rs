//! ReclaimerBuilder - 設定から SweepScheduler を組み立てる
//!
//! # 起動時検証（Fail-fast）
//! - 設定値の範囲チェック
//! - backup type の重複・retention の指す種別の存在チェック
//! - 保存済み pending 集合の読み込み（壊れていたら起動しない）
//!
//! 復元は build() の中で済ませるので、返ってきた scheduler を start した
//! 時点で持ち越し分は必ずキューに入っている。

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use super::reclaimer::Reclaimer;
use super::sweep_loop::SweepScheduler;
use crate::config::{ConfigError, ReclaimerConfig};
use crate::impls::{FileStateStore, JsonStateCodec, executor_for};
use crate::ports::{Clock, FilesystemExecutor, StateError, StateStore, SystemClock};

/// ReclaimerBuilder はエンジン一式を構築
///
/// # 使用例
/// ```ignore
/// let scheduler = ReclaimerBuilder::new(ReclaimerConfig::load(path)?)
///     .build()
///     .await?;
/// scheduler.start().await;
/// ```
pub struct ReclaimerBuilder {
    config: ReclaimerConfig,
    clock: Option<Arc<dyn Clock>>,
    executor: Option<Arc<dyn FilesystemExecutor>>,
    store: Option<Arc<dyn StateStore>>,
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to restore pending deletions: {0}")]
    Restore(#[from] StateError),
}

impl ReclaimerBuilder {
    pub fn new(config: ReclaimerConfig) -> Self {
        Self {
            config,
            clock: None,
            executor: None,
            store: None,
        }
    }

    /// 時計を差し替え（既定は SystemClock）
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// 削除の実行方法を差し替え（既定は設定の `executor`）
    pub fn executor(mut self, executor: Arc<dyn FilesystemExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// 永続化先を差し替え（既定は設定の `state_file`、無ければ永続化しない）
    pub fn state_store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub async fn build(self) -> Result<SweepScheduler, BuildError> {
        let config = self.config;
        config.validate()?;
        let registry = Arc::new(config.registry()?);

        let executor = self
            .executor
            .unwrap_or_else(|| executor_for(config.executor));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let store = self.store.or_else(|| {
            config.state_file.as_ref().map(|path| {
                Arc::new(FileStateStore::new(path, JsonStateCodec::pretty())) as Arc<dyn StateStore>
            })
        });

        let reclaimer = Reclaimer::new(registry, executor, clock, config.disk_pressure_threshold);
        if let Some(store) = &store
            && let Some(state) = store.load().await?
        {
            let counts = state.counts();
            reclaimer.restore(state);
            info!(
                tasks = counts.tasks,
                backups = counts.backups,
                "restored pending deletions"
            );
        }

        Ok(SweepScheduler::new(
            Arc::new(reclaimer),
            config.sweep_interval,
            store,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::{self, HOUR, TestExecutor};
    use crate::domain::{BackupDeletionRequest, PendingState, TaskDeletionRequest};
    use std::time::Duration;

    fn store_at(dir: &std::path::Path) -> Arc<FileStateStore<JsonStateCodec>> {
        Arc::new(FileStateStore::new(dir.join("pending.json"), JsonStateCodec::new()))
    }

    #[tokio::test]
    async fn builds_with_defaults() {
        let scheduler = ReclaimerBuilder::new(ReclaimerConfig::default())
            .build()
            .await
            .unwrap();

        assert_eq!(scheduler.interval(), Duration::from_secs(60));
        assert!(scheduler.reclaimer().pending().is_empty());
        assert!(!scheduler.is_running().await);
    }

    #[tokio::test]
    async fn invalid_config_fails_fast() {
        let config = ReclaimerConfig {
            disk_pressure_threshold: 2.0,
            ..ReclaimerConfig::default()
        };
        let err = ReclaimerBuilder::new(config).build().await.err().unwrap();
        assert!(matches!(err, BuildError::Config(ConfigError::Invalid(_))));
    }

    #[tokio::test]
    async fn retention_for_unknown_type_fails_fast() {
        let mut config = ReclaimerConfig::default();
        config
            .retention
            .insert("platinum".to_string(), HOUR.into());
        let err = ReclaimerBuilder::new(config).build().await.err().unwrap();
        assert!(matches!(err, BuildError::Config(ConfigError::Registry(_))));
    }

    #[tokio::test]
    async fn restores_saved_state_before_returning() {
        let state_dir = tempfile::tempdir().unwrap();
        let store = store_at(state_dir.path());
        let mut saved = PendingState::default();
        saved.tasks.insert(TaskDeletionRequest::new("/data/job1/task0"));
        saved
            .backups
            .insert(BackupDeletionRequest::new("/data/job1/task1/backup-gold-240101-0000", "gold"));
        store.save(&saved).await.unwrap();

        let scheduler = ReclaimerBuilder::new(ReclaimerConfig::default())
            .executor(TestExecutor::new())
            .clock(test_support::clock())
            .state_store(store)
            .build()
            .await
            .unwrap();

        assert_eq!(scheduler.reclaimer().pending(), saved);
    }

    #[tokio::test]
    async fn default_store_comes_from_state_file() {
        let state_dir = tempfile::tempdir().unwrap();
        let config = ReclaimerConfig {
            state_file: Some(state_dir.path().join("nested/pending.json")),
            ..ReclaimerConfig::default()
        };

        let scheduler = ReclaimerBuilder::new(config.clone())
            .executor(TestExecutor::new())
            .build()
            .await
            .unwrap();
        scheduler
            .reclaimer()
            .submit_task_deletion("/data/job1/task0");
        scheduler.checkpoint().await;

        // 次の起動で同じファイルから戻る
        let restarted = ReclaimerBuilder::new(config)
            .executor(TestExecutor::new())
            .build()
            .await
            .unwrap();
        assert_eq!(restarted.reclaimer().pending().tasks.len(), 1);
    }

    #[tokio::test]
    async fn corrupt_state_file_fails_fast() {
        let state_dir = tempfile::tempdir().unwrap();
        let path = state_dir.path().join("pending.json");
        std::fs::write(&path, b"{ not json").unwrap();
        let config = ReclaimerConfig {
            state_file: Some(path),
            ..ReclaimerConfig::default()
        };

        let err = ReclaimerBuilder::new(config).build().await.err().unwrap();
        assert!(matches!(err, BuildError::Restore(StateError::Decode(_))));
    }
}
