//! App - アプリケーション層
//!
//! ports を組み合わせて削除エンジンを実装します。
//!
//! # 主要コンポーネント
//! - **ReclaimerBuilder**: 設定からの構築とワイヤリング（復元込み）
//! - **Reclaimer**: 削除キューと 1 回分の sweep
//! - **TaskCleanup**: タスク作業ディレクトリの掃除
//! - **RetentionEvaluator**: バックアップ 1 件の保持判定と削除
//! - **SweepScheduler**: 一定間隔の sweep ループ

pub mod builder;
pub mod reclaimer;
pub mod retention;
pub mod status;
pub mod sweep_loop;
pub mod task_cleanup;

#[cfg(test)]
mod test_support;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, ReclaimerBuilder};
pub use self::reclaimer::Reclaimer;
pub use self::retention::RetentionEvaluator;
pub use self::status::{SweepReport, TaskCleanupReport};
pub use self::sweep_loop::SweepScheduler;
pub use self::task_cleanup::TaskCleanup;
