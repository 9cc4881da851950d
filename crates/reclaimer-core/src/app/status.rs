//! Status - sweep の結果集計
//!
//! producer には返さず、ログと CLI 表示だけに使います。

use serde::Serialize;
use tracing::info;

use crate::domain::{PendingReason, Resolution, SweepId};

/// What one task-directory pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskCleanupReport {
    /// Children removed outright.
    pub removed: usize,
    /// Children handed over to the backup queue.
    pub deferred: usize,
    /// Children whose removal failed (not retried; tasks are never re-queued).
    pub failed: usize,
    /// Whether the task directory itself was pruned.
    pub pruned: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub sweep_id: SweepId,
    pub tasks_processed: usize,
    pub task_children_removed: usize,
    pub backups_deferred: usize,
    pub backups_deleted: usize,
    pub backups_dropped: usize,
    pub backups_pending: usize,
    pub removal_failures: usize,
}

impl SweepReport {
    pub fn new(sweep_id: SweepId) -> Self {
        Self {
            sweep_id,
            tasks_processed: 0,
            task_children_removed: 0,
            backups_deferred: 0,
            backups_deleted: 0,
            backups_dropped: 0,
            backups_pending: 0,
            removal_failures: 0,
        }
    }

    pub fn record_task(&mut self, task: TaskCleanupReport) {
        self.tasks_processed += 1;
        self.task_children_removed += task.removed;
        self.backups_deferred += task.deferred;
        self.removal_failures += task.failed;
    }

    pub fn record_resolved(&mut self, resolution: Resolution) {
        match resolution {
            Resolution::Unprotected | Resolution::Expired | Resolution::DiskPressure => {
                self.backups_deleted += 1
            }
            _ => self.backups_dropped += 1,
        }
    }

    pub fn record_pending(&mut self, reason: PendingReason) {
        self.backups_pending += 1;
        if reason == PendingReason::RemoveFailed {
            self.removal_failures += 1;
        }
    }

    /// Nothing was queued when the sweep started.
    pub fn is_idle(&self) -> bool {
        self.tasks_processed == 0
            && self.backups_deleted == 0
            && self.backups_dropped == 0
            && self.backups_pending == 0
    }

    pub fn log(&self) {
        if self.is_idle() {
            return;
        }
        info!(
            sweep_id = %self.sweep_id,
            tasks = self.tasks_processed,
            removed = self.task_children_removed,
            deferred = self.backups_deferred,
            backups_deleted = self.backups_deleted,
            backups_dropped = self.backups_dropped,
            backups_pending = self.backups_pending,
            failures = self.removal_failures,
            "sweep finished"
        );
    }
}
