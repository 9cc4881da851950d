//! Deletion queue: two independent pending sets (tasks, backups).
//!
//! Each set has its own lock, so backup submissions never wait on task-queue
//! activity and vice versa. Submissions do no I/O.

mod pending_set;

pub use pending_set::PendingSet;

use std::path::PathBuf;

use crate::domain::{BackupDeletionRequest, PendingState, TaskDeletionRequest};

#[derive(Debug, Default)]
pub struct DeletionQueue {
    tasks: PendingSet<TaskDeletionRequest>,
    backups: PendingSet<BackupDeletionRequest>,
}

impl DeletionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the path was already pending.
    pub fn submit_task(&self, path: impl Into<PathBuf>) -> bool {
        self.tasks.insert(TaskDeletionRequest::new(path))
    }

    /// Returns `false` if the (path, type) pair was already pending.
    pub fn submit_backup(&self, path: impl Into<PathBuf>, backup_type: impl Into<String>) -> bool {
        self.backups
            .insert(BackupDeletionRequest::new(path, backup_type))
    }

    pub fn tasks(&self) -> &PendingSet<TaskDeletionRequest> {
        &self.tasks
    }

    pub fn backups(&self) -> &PendingSet<BackupDeletionRequest> {
        &self.backups
    }

    /// Copy of both sets. The two locks are taken one after the other, never
    /// together.
    pub fn pending(&self) -> PendingState {
        PendingState {
            tasks: self.tasks.snapshot().into_iter().collect(),
            backups: self.backups.snapshot().into_iter().collect(),
        }
    }

    /// Merge a persisted snapshot into the live sets (set union).
    pub fn restore(&self, state: PendingState) {
        self.tasks.extend(state.tasks);
        self.backups.extend(state.backups);
    }
}
