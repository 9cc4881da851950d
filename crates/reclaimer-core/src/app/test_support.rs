//! Shared fixtures for app-layer tests.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use crate::domain::{BackupType, BackupTypeRegistry, RetentionTable};
use crate::impls::NativeExecutor;
use crate::ports::{DiskUsage, FilesystemExecutor, FixedClock};

pub const HOUR: Duration = Duration::from_secs(3600);

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
}

pub fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(now()))
}

/// gold (protected by `gold_protection`), daily (24h), hourly (unprotected).
pub fn registry(gold_protection: Duration) -> Arc<BackupTypeRegistry> {
    Arc::new(
        BackupTypeRegistry::new(
            "backup-",
            vec![
                BackupType::new("backup-", "gold", "%y%m%d-%H%M"),
                BackupType::new("backup-", "daily", "%y%m%d-%H%M"),
                BackupType::new("backup-", "hourly", "%y%m%d-%H%M"),
            ],
            &RetentionTable::new()
                .protect("gold", gold_protection)
                .protect("daily", 24 * HOUR),
        )
        .unwrap(),
    )
}

/// Name of a backup of `descriptor` created `age` before [`now`].
pub fn backup_name(registry: &BackupTypeRegistry, descriptor: &str, age: Duration) -> String {
    let created = now() - chrono::Duration::from_std(age).unwrap();
    registry.get(descriptor).unwrap().name_for(created)
}

/// `<root>/<job>/<task>` with the given children (files, or directories when
/// the name ends with `/`).
pub fn task_dir(root: &Path, job: &str, task: &str, children: &[&str]) -> PathBuf {
    let dir = root.join(job).join(task);
    fs::create_dir_all(&dir).unwrap();
    for child in children {
        match child.strip_suffix('/') {
            Some(name) => {
                fs::create_dir_all(dir.join(name)).unwrap();
                fs::write(dir.join(name).join("part-0"), b"data").unwrap();
            }
            None => fs::write(dir.join(child), b"data").unwrap(),
        }
    }
    dir
}

/// Native removal with a controllable disk-usage reading and a removal counter.
pub struct TestExecutor {
    inner: NativeExecutor,
    usage: Mutex<DiskUsage>,
    fail_removals: Mutex<bool>,
    pub removals: AtomicUsize,
}

impl TestExecutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: NativeExecutor::new(),
            usage: Mutex::new(DiskUsage {
                free: 50,
                total: 100,
            }),
            fail_removals: Mutex::new(false),
            removals: AtomicUsize::new(0),
        })
    }

    pub fn set_free(&self, free: u64, total: u64) {
        *self.usage.lock().unwrap() = DiskUsage { free, total };
    }

    pub fn fail_removals(&self, fail: bool) {
        *self.fail_removals.lock().unwrap() = fail;
    }
}

impl FilesystemExecutor for TestExecutor {
    fn remove(&self, path: &Path) -> bool {
        if *self.fail_removals.lock().unwrap() {
            return false;
        }
        self.removals.fetch_add(1, Ordering::SeqCst);
        self.inner.remove(path)
    }

    fn disk_usage(&self, _path: &Path) -> io::Result<DiskUsage> {
        Ok(*self.usage.lock().unwrap())
    }
}
