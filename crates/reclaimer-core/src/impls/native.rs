//! NativeExecutor - `std::fs` による再帰削除

use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, warn};

use super::volume_usage;
use crate::ports::{DiskUsage, FilesystemExecutor};

/// Removes files with `remove_file` and directories with `remove_dir_all`.
///
/// Symlinks are removed as links; their targets are left alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeExecutor;

impl NativeExecutor {
    pub fn new() -> Self {
        Self
    }
}

fn remove_path(path: &Path) -> io::Result<()> {
    let meta = fs::symlink_metadata(path)?;
    if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

impl FilesystemExecutor for NativeExecutor {
    fn remove(&self, path: &Path) -> bool {
        match remove_path(path) {
            Ok(()) => {
                debug!(path = %path.display(), "removed");
                true
            }
            // rm -rf と同じく、すでに無いものは成功扱い
            Err(e) if e.kind() == io::ErrorKind::NotFound => true,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to remove path");
                false
            }
        }
    }

    fn disk_usage(&self, path: &Path) -> io::Result<DiskUsage> {
        volume_usage(path)
    }
}
