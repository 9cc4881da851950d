//! SweepScheduler - 一定間隔で sweep を回すバックグラウンドループ
//!
//! # フロー
//! 1. interval だけ sleep（stop が来たらその場で抜ける）
//! 2. stop 済みでなければ sweep を 1 回（blocking なので spawn_blocking）
//! 3. state store があれば pending 集合を checkpoint
//!
//! # 設計
//! - ループは 1 本だけ。sweep は直列で重ならない
//! - `start` / `stop` は同じ Mutex で排他（handle の取り合いを防ぐ）
//! - `stop` は進行中の sweep を中断しない（終わるのを待つ）
//! - sweep が panic しても log してループは続行
//! - checkpoint は「snapshot → save」を 1 つのロックで囲む
//!   （古い snapshot が新しいものを上書きしない）

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::reclaimer::Reclaimer;
use super::status::SweepReport;
use crate::domain::ReclaimError;
use crate::ports::StateStore;

struct RunningLoop {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

pub struct SweepScheduler {
    reclaimer: Arc<Reclaimer>,
    interval: Duration,
    store: Option<Arc<dyn StateStore>>,
    checkpoint_lock: Arc<Mutex<()>>,
    running: Mutex<Option<RunningLoop>>,
}

impl SweepScheduler {
    pub fn new(
        reclaimer: Arc<Reclaimer>,
        interval: Duration,
        store: Option<Arc<dyn StateStore>>,
    ) -> Self {
        Self {
            reclaimer,
            interval,
            store,
            checkpoint_lock: Arc::new(Mutex::new(())),
            running: Mutex::new(None),
        }
    }

    /// The engine producers submit to.
    pub fn reclaimer(&self) -> &Arc<Reclaimer> {
        &self.reclaimer
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub async fn is_running(&self) -> bool {
        self.running
            .lock()
            .await
            .as_ref()
            .is_some_and(|running| !running.join.is_finished())
    }

    /// Spawn the sweep loop. Returns `false` if it was already running.
    pub async fn start(&self) -> bool {
        let mut running = self.running.lock().await;
        if running.as_ref().is_some_and(|r| !r.join.is_finished()) {
            return false;
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(sweep_loop(
            Arc::clone(&self.reclaimer),
            self.interval,
            self.store.clone(),
            Arc::clone(&self.checkpoint_lock),
            shutdown_rx,
        ));
        *running = Some(RunningLoop { shutdown_tx, join });
        info!(interval = ?self.interval, "sweep scheduler started");
        true
    }

    /// Signal the loop to stop and wait for it; an in-flight sweep is allowed
    /// to finish. Returns `false` if nothing was running.
    pub async fn stop(&self) -> bool {
        let mut running = self.running.lock().await;
        let Some(RunningLoop { shutdown_tx, join }) = running.take() else {
            return false;
        };

        // ignore send error: the loop may already have exited
        let _ = shutdown_tx.send(true);
        if let Err(e) = join.await {
            error!(error = %e, "sweep loop terminated abnormally");
        }
        self.checkpoint().await;
        info!("sweep scheduler stopped");
        true
    }

    /// Run one sweep now, outside the timer. Serialized with timer sweeps.
    pub async fn run_sweep_once(&self) -> Result<SweepReport, ReclaimError> {
        let report = sweep(&self.reclaimer).await?;
        self.checkpoint().await;
        Ok(report)
    }

    /// Persist the current pending sets, if a store is configured.
    pub async fn checkpoint(&self) {
        checkpoint(&self.reclaimer, self.store.as_deref(), &self.checkpoint_lock).await;
    }
}

async fn sweep(reclaimer: &Arc<Reclaimer>) -> Result<SweepReport, ReclaimError> {
    let reclaimer = Arc::clone(reclaimer);
    tokio::task::spawn_blocking(move || reclaimer.run_sweep_once())
        .await
        .map_err(|e| ReclaimError::SweepAborted(e.to_string()))
}

async fn checkpoint(reclaimer: &Reclaimer, store: Option<&dyn StateStore>, lock: &Mutex<()>) {
    let Some(store) = store else {
        return;
    };
    let _serialized = lock.lock().await;
    if let Err(e) = store.save(&reclaimer.pending()).await {
        warn!(error = %e, "failed to checkpoint pending deletions");
    }
}

async fn sweep_loop(
    reclaimer: Arc<Reclaimer>,
    interval: Duration,
    store: Option<Arc<dyn StateStore>>,
    checkpoint_lock: Arc<Mutex<()>>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        // sleep 中の stop はエラーではなく正常終了
        tokio::select! {
            _ = shutdown_rx.changed() => break,
            _ = tokio::time::sleep(interval) => {}
        }
        if *shutdown_rx.borrow() {
            break;
        }

        match sweep(&reclaimer).await {
            Ok(report) => report.log(),
            Err(e) => error!(error = %e, kind = ?e.kind(), "sweep failed"),
        }
        checkpoint(&reclaimer, store.as_deref(), &checkpoint_lock).await;
    }
    debug!("sweep loop exited");
}
