//! FilesystemExecutor port - 削除とディスク使用量の抽象化
//!
//! # 契約
//! - `remove` は失敗を外に投げない（ログして `false` を返す）
//! - `prune_if_empty` は「存在する・ディレクトリ・中身ゼロ」のときだけ削除
//! - check-then-remove は外部 writer に対して atomic ではない
//!   （cleanup 時点でディレクトリの所有者は 1 人という前提）
//!
//! # 実装
//! - **NativeExecutor**: `std::fs` で再帰削除
//! - **CommandExecutor**: `rm -rf` を起動

use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;

/// Free and total bytes of the volume holding a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskUsage {
    pub free: u64,
    pub total: u64,
}

impl DiskUsage {
    /// `None` when the volume reports zero total size.
    pub fn free_fraction(&self) -> Option<f64> {
        (self.total > 0).then(|| self.free as f64 / self.total as f64)
    }

    /// Pressure is active when the free fraction drops below `1 - threshold`.
    pub fn under_pressure(&self, threshold: f64) -> bool {
        self.free_fraction()
            .is_some_and(|free| free < 1.0 - threshold)
    }
}

pub trait FilesystemExecutor: Send + Sync {
    /// Recursively remove `path`. Returns whether the removal succeeded.
    fn remove(&self, path: &Path) -> bool;

    /// Space on the volume containing `path`.
    fn disk_usage(&self, path: &Path) -> io::Result<DiskUsage>;

    /// Remove `path` only if it is an existing, empty directory.
    ///
    /// Returns whether a directory was removed.
    fn prune_if_empty(&self, path: &Path) -> bool {
        let is_dir = fs::symlink_metadata(path).is_ok_and(|meta| meta.is_dir());
        if !is_dir {
            return false;
        }
        match fs::read_dir(path) {
            Ok(mut entries) => {
                if entries.next().is_some() {
                    return false;
                }
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "cannot list directory, not pruning");
                return false;
            }
        }
        debug!(path = %path.display(), "pruning empty directory");
        self.remove(path)
    }
}
