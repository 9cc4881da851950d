//! Ports - 抽象化レイヤー
//!
//! 各 trait は外部の仕組み（ファイルシステム、時計、永続化先）への
//! インターフェースです。実装は `impls` にあります。

pub mod clock;
pub mod executor;
pub mod id_generator;
pub mod state_store;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::executor::{DiskUsage, FilesystemExecutor};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::state_store::{PendingStateCodec, StateError, StateStore};
