//! State - 永続化・照会用の pending 集合スナップショット
//!
//! 再起動をまたいで持ち越すのはこの 2 つの集合だけです。
//! 形式（JSON など）は `PendingStateCodec` 側の責務です。

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::request::{BackupDeletionRequest, TaskDeletionRequest};

/// Both pending sets at one point in time.
///
/// `BTreeSet` keeps encoded output and status listings in a stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingState {
    #[serde(default)]
    pub tasks: BTreeSet<TaskDeletionRequest>,
    #[serde(default)]
    pub backups: BTreeSet<BackupDeletionRequest>,
}

impl PendingState {
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty() && self.backups.is_empty()
    }

    pub fn counts(&self) -> PendingCounts {
        PendingCounts {
            tasks: self.tasks.len(),
            backups: self.backups.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCounts {
    pub tasks: usize,
    pub backups: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_follow_set_sizes() {
        let mut state = PendingState::default();
        state.tasks.insert(TaskDeletionRequest::new("/data/j/t0"));
        state.tasks.insert(TaskDeletionRequest::new("/data/j/t1"));
        state
            .backups
            .insert(BackupDeletionRequest::new("/data/j/t0/backup-gold-1", "gold"));

        assert_eq!(state.counts(), PendingCounts { tasks: 2, backups: 1 });
        assert!(!state.is_empty());
    }

    #[test]
    fn missing_fields_decode_as_empty() {
        let state: PendingState = serde_json::from_str("{}").unwrap();
        assert!(state.is_empty());
    }
}
