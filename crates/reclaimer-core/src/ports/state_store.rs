//! StateStore port - pending 集合の永続化
//!
//! - `PendingStateCodec`: bytes <-> `PendingState`（形式は実装任せ）
//! - `StateStore`: どこに保存するか（ファイルなど）
//!
//! 起動時の復元は最初の sweep より前に行うこと（builder が保証）。

use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::PendingState;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to encode pending state: {0}")]
    Encode(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("failed to decode pending state: {0}")]
    Decode(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("state file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Opaque encode/decode contract for the pending sets.
pub trait PendingStateCodec: Send + Sync {
    fn encode(&self, state: &PendingState) -> Result<Vec<u8>, StateError>;

    fn decode(&self, bytes: &[u8]) -> Result<PendingState, StateError>;
}

#[async_trait]
pub trait StateStore: Send + Sync {
    /// `Ok(None)` when nothing has been saved yet.
    async fn load(&self) -> Result<Option<PendingState>, StateError>;

    async fn save(&self, state: &PendingState) -> Result<(), StateError>;
}
