//! RetentionEvaluator - 1 件のバックアップを今消してよいかの判定
//!
//! # 判定順（最初に当たったものが勝つ）
//! 1. 種別が registry に無い / パスが空 → 警告して解決扱い
//! 2. パスが存在しない → すでに消えている（解決扱い）
//! 3. 名前が種別の命名規約に合わない → 警告して解決扱い
//! 4. 保護なし種別 → 削除
//! 5. 保護付き種別 → 期限切れ or ディスク逼迫なら削除し、親（task）と
//!    祖父（job）ディレクトリを空なら prune。そうでなければ pending
//!
//! 削除自体に失敗したものは pending のまま次の sweep でリトライ。
//! ディスク逼迫は判定ごとに毎回問い合わせる（キャッシュしない）。

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::{
    BackupDeletionRequest, BackupTypeRegistry, PendingReason, ReclaimError, Resolution, Verdict,
};
use crate::ports::{Clock, FilesystemExecutor};

pub struct RetentionEvaluator {
    registry: Arc<BackupTypeRegistry>,
    executor: Arc<dyn FilesystemExecutor>,
    clock: Arc<dyn Clock>,
    disk_pressure_threshold: f64,
}

impl RetentionEvaluator {
    pub fn new(
        registry: Arc<BackupTypeRegistry>,
        executor: Arc<dyn FilesystemExecutor>,
        clock: Arc<dyn Clock>,
        disk_pressure_threshold: f64,
    ) -> Self {
        Self {
            registry,
            executor,
            clock,
            disk_pressure_threshold,
        }
    }

    pub fn evaluate(&self, request: &BackupDeletionRequest) -> Verdict {
        let Some(backup_type) = self.registry.get(request.backup_type()) else {
            let err = ReclaimError::UnknownBackupType(request.backup_type().to_string());
            warn!(backup = %request, error = %err, kind = ?err.kind(), "dropping backup");
            return Verdict::Deleted(Resolution::UnknownType);
        };

        let path = request.path();
        if path.as_os_str().is_empty() {
            warn!(backup_type = request.backup_type(), "dropping backup with empty path");
            return Verdict::Deleted(Resolution::EmptyPath);
        }

        if fs::symlink_metadata(path).is_err() {
            debug!(backup = %request, "backup already gone");
            return Verdict::Deleted(Resolution::AlreadyAbsent);
        }

        let Some(name) = request.file_name().filter(|name| backup_type.is_valid_name(name)) else {
            warn!(backup = %request, "dropping backup whose name does not match its type");
            return Verdict::Deleted(Resolution::InvalidName);
        };

        let Some(protection) = backup_type.protection() else {
            return self.remove(request, Resolution::Unprotected);
        };

        let created = match backup_type.timestamp(name) {
            Ok(created) => created,
            Err(e) => {
                warn!(backup = %request, error = %e, kind = ?e.kind(), "dropping backup with unparsable timestamp");
                return Verdict::Deleted(Resolution::InvalidName);
            }
        };

        // 未来の timestamp は age < 0 → 期限切れにはならない
        let age = self
            .clock
            .now()
            .signed_duration_since(created)
            .to_std()
            .unwrap_or(Duration::ZERO);

        if age > protection {
            self.remove_and_prune(request, Resolution::Expired)
        } else if self.under_pressure(path) {
            self.remove_and_prune(request, Resolution::DiskPressure)
        } else {
            let remaining = protection - age;
            debug!(backup = %request, remaining = ?remaining, "backup still protected");
            Verdict::Pending(PendingReason::Protected { remaining })
        }
    }

    /// Whether the volume holding `path` is short of free space right now.
    ///
    /// A failed query counts as no pressure.
    pub fn under_pressure(&self, path: &Path) -> bool {
        match self.executor.disk_usage(path) {
            Ok(usage) => {
                let pressure = usage.under_pressure(self.disk_pressure_threshold);
                if pressure {
                    debug!(
                        path = %path.display(),
                        free = usage.free,
                        total = usage.total,
                        threshold = self.disk_pressure_threshold,
                        "disk pressure"
                    );
                }
                pressure
            }
            Err(source) => {
                let err = ReclaimError::DiskUsage {
                    path: path.to_path_buf(),
                    source,
                };
                warn!(error = %err, kind = ?err.kind(), "assuming no disk pressure");
                false
            }
        }
    }

    fn remove(&self, request: &BackupDeletionRequest, resolution: Resolution) -> Verdict {
        if self.executor.remove(request.path()) {
            debug!(backup = %request, %resolution, "backup deleted");
            Verdict::Deleted(resolution)
        } else {
            warn!(backup = %request, %resolution, "backup deletion failed, will retry next sweep");
            Verdict::Pending(PendingReason::RemoveFailed)
        }
    }

    fn remove_and_prune(&self, request: &BackupDeletionRequest, resolution: Resolution) -> Verdict {
        let verdict = self.remove(request, resolution);
        if verdict.is_deleted()
            && let Some(task_dir) = request.path().parent()
            && self.executor.prune_if_empty(task_dir)
            && let Some(job_dir) = task_dir.parent()
        {
            self.executor.prune_if_empty(job_dir);
        }
        verdict
    }
}
