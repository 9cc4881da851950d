//! JsonStateCodec - pending 集合の JSON 表現

use crate::domain::PendingState;
use crate::ports::{PendingStateCodec, StateError};

/// Encodes as `{"tasks": [...], "backups": [{"path": ..., "backup_type": ...}]}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonStateCodec {
    pretty: bool,
}

impl JsonStateCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl PendingStateCodec for JsonStateCodec {
    fn encode(&self, state: &PendingState) -> Result<Vec<u8>, StateError> {
        let encoded = if self.pretty {
            serde_json::to_vec_pretty(state)
        } else {
            serde_json::to_vec(state)
        };
        encoded.map_err(|e| StateError::Encode(Box::new(e)))
    }

    fn decode(&self, bytes: &[u8]) -> Result<PendingState, StateError> {
        serde_json::from_slice(bytes).map_err(|e| StateError::Decode(Box::new(e)))
    }
}
