//! FileStateStore - pending 集合をローカルファイルに保存
//!
//! 書き込みは `<file>.tmp` に書いてから rename（途中で落ちても壊れた
//! ファイルが残らない）。tmp のパスは固定なので、save 同士は store 内の
//! Mutex で直列化する。

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;

use crate::domain::PendingState;
use crate::ports::{PendingStateCodec, StateError, StateStore};

pub struct FileStateStore<C> {
    path: PathBuf,
    codec: C,
    write_lock: Mutex<()>,
}

impl<C: PendingStateCodec> FileStateStore<C> {
    pub fn new(path: impl Into<PathBuf>, codec: C) -> Self {
        Self {
            path: path.into(),
            codec,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("pending"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: io::Error) -> StateError {
        StateError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl<C: PendingStateCodec> StateStore for FileStateStore<C> {
    async fn load(&self) -> Result<Option<PendingState>, StateError> {
        match fs::read(&self.path).await {
            Ok(bytes) => self.codec.decode(&bytes).map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    async fn save(&self, state: &PendingState) -> Result<(), StateError> {
        let bytes = self.codec.encode(state)?;
        let _write = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let temp = self.temp_path();
        fs::write(&temp, &bytes).await.map_err(|e| self.io_error(e))?;
        fs::rename(&temp, &self.path)
            .await
            .map_err(|e| self.io_error(e))
    }
}
