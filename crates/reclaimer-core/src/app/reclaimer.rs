//! Reclaimer - 削除キューと 1 回分の sweep
//!
//! # フロー（snapshot-drain）
//! 1. タスク集合をコピー（ロックはコピーの間だけ）
//! 2. ロック無しで各タスクを TaskCleanup に通す
//! 3. コピーに含まれていたタスクだけを集合から外す
//! 4. バックアップ集合も同様。ただし外すのは「解決した」ものだけ
//!
//! 処理中に投入されたリクエストはコピーに含まれないので、3/4 で消えない。

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::info_span;

use super::retention::RetentionEvaluator;
use super::status::SweepReport;
use super::task_cleanup::TaskCleanup;
use crate::domain::{BackupTypeRegistry, PendingState, Verdict};
use crate::ports::{Clock, FilesystemExecutor, IdGenerator, UlidGenerator};
use crate::queue::DeletionQueue;

pub struct Reclaimer {
    queue: DeletionQueue,
    cleanup: TaskCleanup,
    evaluator: RetentionEvaluator,
    ids: Box<dyn IdGenerator>,
    // sweep 同士（タイマーと手動トリガー）を直列化する
    sweep_lock: Mutex<()>,
}

impl Reclaimer {
    pub fn new(
        registry: Arc<BackupTypeRegistry>,
        executor: Arc<dyn FilesystemExecutor>,
        clock: Arc<dyn Clock>,
        disk_pressure_threshold: f64,
    ) -> Self {
        Self {
            queue: DeletionQueue::new(),
            cleanup: TaskCleanup::new(Arc::clone(&registry), Arc::clone(&executor)),
            evaluator: RetentionEvaluator::new(
                registry,
                executor,
                Arc::clone(&clock),
                disk_pressure_threshold,
            ),
            ids: Box::new(UlidGenerator::new(clock)),
            sweep_lock: Mutex::new(()),
        }
    }

    /// Queue a task working directory for cleanup. Never blocks on I/O.
    pub fn submit_task_deletion(&self, path: impl Into<PathBuf>) {
        self.queue.submit_task(path);
    }

    /// Queue a backup for retirement under `backup_type`. Never blocks on I/O.
    pub fn submit_backup_deletion(&self, path: impl Into<PathBuf>, backup_type: impl Into<String>) {
        self.queue.submit_backup(path, backup_type);
    }

    /// Current contents of both pending sets.
    pub fn pending(&self) -> PendingState {
        self.queue.pending()
    }

    /// Merge persisted pending sets back in (set union).
    pub fn restore(&self, state: PendingState) {
        self.queue.restore(state);
    }

    /// Drain and process both queues once: tasks in full, then backups.
    ///
    /// Blocking; filesystem work happens on the calling thread.
    pub fn run_sweep_once(&self) -> SweepReport {
        let _sweep = self.sweep_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let sweep_id = self.ids.generate_sweep_id();
        let span = info_span!("sweep", %sweep_id);
        let _enter = span.enter();
        let mut report = SweepReport::new(sweep_id);

        let tasks = self.queue.tasks().snapshot();
        for task in &tasks {
            report.record_task(self.cleanup.clean(task, &self.queue));
        }
        self.queue.tasks().retire(tasks.iter());

        // タスク処理で回された保護付きバックアップも、この sweep で評価される
        let backups = self.queue.backups().snapshot();
        let mut resolved = Vec::with_capacity(backups.len());
        for backup in backups {
            match self.evaluator.evaluate(&backup) {
                Verdict::Deleted(resolution) => {
                    report.record_resolved(resolution);
                    resolved.push(backup);
                }
                Verdict::Pending(reason) => report.record_pending(reason),
            }
        }
        self.queue.backups().retire(resolved.iter());

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::{self, HOUR, TestExecutor};
    use crate::domain::{BackupDeletionRequest, TaskDeletionRequest};
    use crate::impls::NativeExecutor;
    use crate::ports::DiskUsage;
    use std::io;
    use std::path::Path;
    use std::sync::atomic::Ordering;
    use std::sync::{OnceLock, Weak};

    fn reclaimer(executor: Arc<TestExecutor>, gold_protection: std::time::Duration) -> Reclaimer {
        Reclaimer::new(
            test_support::registry(gold_protection),
            executor,
            test_support::clock(),
            0.9,
        )
    }

    #[test]
    fn duplicate_task_submission_is_cleaned_once() {
        let root = tempfile::tempdir().unwrap();
        let dir = test_support::task_dir(root.path(), "job1", "task0", &["a.log"]);
        let executor = TestExecutor::new();
        let reclaimer = reclaimer(Arc::clone(&executor), 48 * HOUR);

        reclaimer.submit_task_deletion(&dir);
        reclaimer.submit_task_deletion(&dir);
        let report = reclaimer.run_sweep_once();

        assert_eq!(report.tasks_processed, 1);
        // a.log と空になった task0
        assert_eq!(executor.removals.load(Ordering::SeqCst), 2);
        assert!(reclaimer.pending().is_empty());
    }

    #[test]
    fn task_queue_is_drained_even_when_removals_fail() {
        let root = tempfile::tempdir().unwrap();
        let dir = test_support::task_dir(root.path(), "job1", "task0", &["a.log"]);
        let executor = TestExecutor::new();
        executor.fail_removals(true);
        let reclaimer = reclaimer(Arc::clone(&executor), 48 * HOUR);

        reclaimer.submit_task_deletion(&dir);
        let report = reclaimer.run_sweep_once();

        assert_eq!(report.removal_failures, 1);
        assert!(reclaimer.pending().tasks.is_empty());
    }

    #[test]
    fn protected_backup_survives_sweeps_until_expired() {
        let root = tempfile::tempdir().unwrap();
        let registry = test_support::registry(24 * HOUR);
        let gold = test_support::backup_name(&registry, "gold", 23 * HOUR);
        let dir = test_support::task_dir(root.path(), "job1", "task0", &["data.log", gold.as_str()]);
        let clock = test_support::clock();
        let reclaimer = Reclaimer::new(registry, TestExecutor::new(), clock.clone(), 0.9);

        reclaimer.submit_task_deletion(&dir);
        let first = reclaimer.run_sweep_once();
        assert_eq!(first.backups_deferred, 1);
        assert_eq!(first.backups_pending, 1);
        assert!(dir.join(&gold).exists());
        assert!(!dir.join("data.log").exists());

        let pending = reclaimer.pending();
        assert!(pending.tasks.is_empty());
        assert!(pending
            .backups
            .contains(&BackupDeletionRequest::new(dir.join(&gold), "gold")));

        clock.advance(chrono::Duration::hours(2));
        let second = reclaimer.run_sweep_once();
        assert_eq!(second.backups_deleted, 1);
        assert!(!dir.exists());
        assert!(!root.path().join("job1").exists());
        assert!(reclaimer.pending().is_empty());
    }

    #[test]
    fn failed_backup_removal_is_retried_next_sweep() {
        let root = tempfile::tempdir().unwrap();
        let executor = TestExecutor::new();
        let reclaimer = reclaimer(Arc::clone(&executor), 24 * HOUR);
        let registry = test_support::registry(24 * HOUR);
        let name = test_support::backup_name(&registry, "gold", 30 * HOUR);
        let dir = test_support::task_dir(root.path(), "job1", "task0", &[name.as_str()]);

        reclaimer.submit_backup_deletion(dir.join(&name), "gold");
        executor.fail_removals(true);
        let report = reclaimer.run_sweep_once();
        assert_eq!(report.removal_failures, 1);
        assert_eq!(reclaimer.pending().backups.len(), 1);

        executor.fail_removals(false);
        let report = reclaimer.run_sweep_once();
        assert_eq!(report.backups_deleted, 1);
        assert!(reclaimer.pending().is_empty());
    }

    #[test]
    fn unknown_backup_type_is_dropped_next_sweep() {
        let root = tempfile::tempdir().unwrap();
        let dir = test_support::task_dir(root.path(), "job1", "task0", &["backup-platinum-1"]);
        let reclaimer = reclaimer(TestExecutor::new(), 24 * HOUR);

        reclaimer.submit_backup_deletion(dir.join("backup-platinum-1"), "platinum");
        let report = reclaimer.run_sweep_once();

        assert_eq!(report.backups_dropped, 1);
        assert!(reclaimer.pending().is_empty());
    }

    /// Submits one more task the first time anything is removed, i.e. while
    /// a sweep is in the middle of processing its snapshot.
    struct SubmitDuringSweep {
        inner: NativeExecutor,
        reclaimer: OnceLock<Weak<Reclaimer>>,
        late_task: PathBuf,
        late_backup: PathBuf,
    }

    impl FilesystemExecutor for SubmitDuringSweep {
        fn remove(&self, path: &Path) -> bool {
            if let Some(reclaimer) = self.reclaimer.get().and_then(Weak::upgrade) {
                reclaimer.submit_task_deletion(&self.late_task);
                reclaimer.submit_backup_deletion(&self.late_backup, "gold");
            }
            self.inner.remove(path)
        }

        fn disk_usage(&self, _path: &Path) -> io::Result<DiskUsage> {
            Ok(DiskUsage { free: 50, total: 100 })
        }
    }

    #[test]
    fn submissions_during_a_sweep_are_kept_for_the_next_one() {
        let root = tempfile::tempdir().unwrap();
        let dir = test_support::task_dir(root.path(), "job1", "task0", &["a.log"]);
        let executor = Arc::new(SubmitDuringSweep {
            inner: NativeExecutor::new(),
            reclaimer: OnceLock::new(),
            late_task: root.path().join("job2/task9"),
            late_backup: root.path().join("job2/task9/backup-gold-240101-0000"),
        });
        let reclaimer = Arc::new(Reclaimer::new(
            test_support::registry(24 * HOUR),
            executor.clone(),
            test_support::clock(),
            0.9,
        ));
        executor.reclaimer.set(Arc::downgrade(&reclaimer)).ok();

        reclaimer.submit_task_deletion(&dir);
        let report = reclaimer.run_sweep_once();
        assert_eq!(report.tasks_processed, 1);

        let pending = reclaimer.pending();
        assert!(pending
            .tasks
            .contains(&TaskDeletionRequest::new(root.path().join("job2/task9"))));
        assert!(!pending.tasks.contains(&TaskDeletionRequest::new(&dir)));
        // バックアップ側は task の後に snapshot されるので、同じ sweep で評価済み（存在しない → 解決）
        assert!(pending.backups.is_empty());
    }

    #[test]
    fn end_to_end_task_with_expired_gold_backup() {
        let root = tempfile::tempdir().unwrap();
        let registry = test_support::registry(48 * HOUR);
        let gold = test_support::backup_name(&registry, "gold", 72 * HOUR);
        let gold_dir = format!("{gold}/");
        let dir = test_support::task_dir(root.path(), "job1", "task0", &["data.log", gold_dir.as_str()]);
        let reclaimer = Reclaimer::new(registry, TestExecutor::new(), test_support::clock(), 0.9);

        reclaimer.submit_task_deletion(&dir);
        let report = reclaimer.run_sweep_once();

        assert_eq!(report.task_children_removed, 1);
        assert_eq!(report.backups_deferred, 1);
        assert_eq!(report.backups_deleted, 1);
        assert!(!dir.join("data.log").exists());
        assert!(!dir.join(&gold).exists());
        assert!(!dir.exists());
        assert!(reclaimer.pending().is_empty());
    }
}
