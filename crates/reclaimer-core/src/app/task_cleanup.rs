//! TaskCleanup - タスク作業ディレクトリの掃除
//!
//! # フロー
//! 1. ディレクトリ直下の子を列挙（無い・読めない → 何もせず解決扱い）
//! 2. backup prefix が無い子 → 即削除
//! 3. prefix があり、保護付き種別が名前を claim → backup キューへ回す
//! 4. prefix があるが保護付き種別が claim しない → 即削除
//! 5. 空になっていればタスクディレクトリ自体を prune
//!
//! タスクは 1 回通せば必ず完了扱い（再キューしない）。

use std::fs;
use std::sync::Arc;

use tracing::{debug, warn};

use super::status::TaskCleanupReport;
use crate::domain::{BackupType, BackupTypeRegistry, TaskDeletionRequest};
use crate::ports::FilesystemExecutor;
use crate::queue::DeletionQueue;

pub struct TaskCleanup {
    registry: Arc<BackupTypeRegistry>,
    executor: Arc<dyn FilesystemExecutor>,
}

impl TaskCleanup {
    pub fn new(registry: Arc<BackupTypeRegistry>, executor: Arc<dyn FilesystemExecutor>) -> Self {
        Self { registry, executor }
    }

    /// The protected type that should keep this child alive, if any.
    fn protecting_type(&self, name: &str) -> Option<&BackupType> {
        if !self.registry.has_backup_prefix(name) {
            return None;
        }
        self.registry.claim_protected(name)
    }

    pub fn clean(&self, request: &TaskDeletionRequest, queue: &DeletionQueue) -> TaskCleanupReport {
        let mut report = TaskCleanupReport::default();
        let dir = request.path();
        if dir.as_os_str().is_empty() {
            debug!("empty task path, nothing to clean");
            return report;
        }

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(task = %dir.display(), error = %e, "task directory missing or unlistable");
                return report;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(task = %dir.display(), error = %e, "failed to read directory entry");
                    report.failed += 1;
                    continue;
                }
            };
            let child = entry.path();
            let name = entry.file_name();
            let name = name.to_string_lossy();

            if let Some(backup_type) = self.protecting_type(&name) {
                debug!(backup = %child.display(), backup_type = backup_type.descriptor(), "deferring protected backup");
                queue.submit_backup(child, backup_type.descriptor());
                report.deferred += 1;
            } else if self.executor.remove(&child) {
                report.removed += 1;
            } else {
                report.failed += 1;
            }
        }

        report.pruned = self.executor.prune_if_empty(dir);
        debug!(
            task = %dir.display(),
            removed = report.removed,
            deferred = report.deferred,
            failed = report.failed,
            pruned = report.pruned,
            "task directory cleaned"
        );
        report
    }
}
