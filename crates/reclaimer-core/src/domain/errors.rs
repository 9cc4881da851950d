//! Errors - エラー型と分類
//!
//! 削除リクエストの処理で起きる失敗は producer には返りません。
//! ここでの型は主にログとテストでの分類に使います。

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// ErrorKind は運用上の分類
///
/// - Malformed: 構造的に壊れたリクエスト（リトライ無意味、キューから外す）
/// - Transient: 一時的な失敗（次の sweep でリトライ）
/// - Configuration: 起動時設定の不整合
/// - Infrastructure: sweep 自体の失敗（panic など）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Malformed,
    Transient,
    Configuration,
    Infrastructure,
}

#[derive(Debug, Error)]
pub enum ReclaimError {
    #[error("unknown backup type `{0}`")]
    UnknownBackupType(String),

    #[error("backup name `{name}` does not belong to type `{backup_type}`")]
    InvalidBackupName { name: String, backup_type: String },

    #[error("cannot parse timestamp from backup name `{name}`: {source}")]
    Timestamp {
        name: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("cannot query disk usage for {path}: {source}")]
    DiskUsage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("duplicate backup type `{0}`")]
    DuplicateBackupType(String),

    #[error("retention configured for unknown backup type `{0}`")]
    UnknownRetention(String),

    #[error("sweep aborted: {0}")]
    SweepAborted(String),
}

impl ReclaimError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReclaimError::UnknownBackupType(_)
            | ReclaimError::InvalidBackupName { .. }
            | ReclaimError::Timestamp { .. } => ErrorKind::Malformed,
            ReclaimError::DiskUsage { .. } => ErrorKind::Transient,
            ReclaimError::DuplicateBackupType(_) | ReclaimError::UnknownRetention(_) => {
                ErrorKind::Configuration
            }
            ReclaimError::SweepAborted(_) => ErrorKind::Infrastructure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::unknown_type(ReclaimError::UnknownBackupType("x".into()), ErrorKind::Malformed)]
    #[case::bad_name(
        ReclaimError::InvalidBackupName { name: "n".into(), backup_type: "gold".into() },
        ErrorKind::Malformed
    )]
    #[case::disk(
        ReclaimError::DiskUsage { path: "/data".into(), source: io::Error::other("boom") },
        ErrorKind::Transient
    )]
    #[case::duplicate(ReclaimError::DuplicateBackupType("gold".into()), ErrorKind::Configuration)]
    #[case::aborted(ReclaimError::SweepAborted("panic".into()), ErrorKind::Infrastructure)]
    fn errors_are_classified(#[case] error: ReclaimError, #[case] expected: ErrorKind) {
        assert_eq!(error.kind(), expected);
    }

    #[test]
    fn display_names_the_offending_value() {
        let err = ReclaimError::UnknownRetention("platinum".into());
        assert!(err.to_string().contains("platinum"));
    }
}
