//! Domain model (requests, backup types, verdicts, pending state, errors).

pub mod backup_type;
pub mod errors;
pub mod ids;
pub mod request;
pub mod state;
pub mod verdict;

pub use self::backup_type::{BackupType, BackupTypeRegistry, RetentionTable};
pub use self::errors::{ErrorKind, ReclaimError};
pub use self::ids::SweepId;
pub use self::request::{BackupDeletionRequest, TaskDeletionRequest};
pub use self::state::{PendingCounts, PendingState};
pub use self::verdict::{PendingReason, Resolution, Verdict};
