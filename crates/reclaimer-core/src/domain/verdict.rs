//! Verdict model: what the retention evaluator decided for one backup.

use std::fmt;
use std::time::Duration;

/// The result of evaluating a single backup deletion request.
///
/// `Deleted` means the request is resolved and leaves the queue, whether the
/// backup was physically removed or judged irrelevant. `Pending` keeps it
/// queued for a future sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Deleted(Resolution),
    Pending(PendingReason),
}

impl Verdict {
    pub fn is_deleted(&self) -> bool {
        matches!(self, Verdict::Deleted(_))
    }
}

/// Why a request left the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    UnknownType,
    EmptyPath,
    AlreadyAbsent,
    InvalidName,
    Unprotected,
    Expired,
    DiskPressure,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Resolution::UnknownType => "unknown_type",
            Resolution::EmptyPath => "empty_path",
            Resolution::AlreadyAbsent => "already_absent",
            Resolution::InvalidName => "invalid_name",
            Resolution::Unprotected => "unprotected",
            Resolution::Expired => "expired",
            Resolution::DiskPressure => "disk_pressure",
        };
        f.write_str(s)
    }
}

/// Why a request stays queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingReason {
    /// Still inside its protection window.
    Protected { remaining: Duration },
    /// Eligible, but the removal itself failed; retried next sweep.
    RemoveFailed,
}
