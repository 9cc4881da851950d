//! Deletion requests submitted by producers.
//!
//! Both request kinds are plain values with set semantics: the queue keys them
//! by their full contents, so resubmitting an identical request is a no-op.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A task working directory that should be cleaned up.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskDeletionRequest {
    path: PathBuf,
}

impl TaskDeletionRequest {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for TaskDeletionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// A rotated backup that should be retired once its type's retention allows it.
///
/// `backup_type` is the descriptor string used as the registry key, so a
/// request can outlive a configuration change that removes its type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BackupDeletionRequest {
    path: PathBuf,
    backup_type: String,
}

impl BackupDeletionRequest {
    pub fn new(path: impl Into<PathBuf>, backup_type: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            backup_type: backup_type.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_type(&self) -> &str {
        &self.backup_type
    }

    /// File or directory name of the backup, if the path has one.
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|name| name.to_str())
    }
}

impl fmt::Display for BackupDeletionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.path.display(), self.backup_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn backup_requests_are_unique_by_path_and_type() {
        let mut set = HashSet::new();
        assert!(set.insert(BackupDeletionRequest::new("/data/j/t/backup-gold-1", "gold")));
        assert!(!set.insert(BackupDeletionRequest::new("/data/j/t/backup-gold-1", "gold")));
        assert!(set.insert(BackupDeletionRequest::new("/data/j/t/backup-gold-1", "daily")));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn file_name_is_last_component() {
        let request = BackupDeletionRequest::new("/data/job1/task0/backup-gold-230101-0000", "gold");
        assert_eq!(request.file_name(), Some("backup-gold-230101-0000"));

        let empty = BackupDeletionRequest::new("", "gold");
        assert_eq!(empty.file_name(), None);
    }

    #[test]
    fn task_request_serializes_as_bare_path() {
        let request = TaskDeletionRequest::new("/data/job1/task0");
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, "\"/data/job1/task0\"");
    }
}
