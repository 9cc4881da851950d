//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **NativeExecutor**: `std::fs` による削除
//! - **CommandExecutor**: `rm -rf` による削除
//! - **JsonStateCodec**: pending 集合の JSON 形式
//! - **FileStateStore**: pending 集合のファイル保存

pub mod command;
pub mod file_store;
pub mod json_codec;
pub mod native;

pub use self::command::CommandExecutor;
pub use self::file_store::FileStateStore;
pub use self::json_codec::JsonStateCodec;
pub use self::native::NativeExecutor;

use std::io;
use std::path::Path;
use std::sync::Arc;

use crate::config::ExecutorKind;
use crate::ports::{DiskUsage, FilesystemExecutor};

/// Free/total bytes of the volume containing `path` (statvfs on unix).
pub fn volume_usage(path: &Path) -> io::Result<DiskUsage> {
    Ok(DiskUsage {
        free: fs2::free_space(path)?,
        total: fs2::total_space(path)?,
    })
}

pub fn executor_for(kind: ExecutorKind) -> Arc<dyn FilesystemExecutor> {
    match kind {
        ExecutorKind::Native => Arc::new(NativeExecutor::new()),
        ExecutorKind::Command => Arc::new(CommandExecutor::rm_rf()),
    }
}
