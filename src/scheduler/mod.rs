//! Drives check cycles off the caller's task.
//!
//! The scheduler is either `Idle` or `Running`. While running, a spawned task loops:
//! run a cycle, then wait for the interval or a stop request, whichever comes first.
//! A stop request never interrupts a cycle that is already probing, but once `stop`
//! has returned no new cycle begins.
//!
//! Every finished cycle, scheduled or on demand, is published as a [`CycleReport`] to
//! all subscribers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::engine::{CycleReport, MonitorEngine};

/// How many unread reports a slow subscriber may fall behind before it lags.
const REPORT_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

#[derive(Default)]
struct Control {
    /// Present while running. Cancelled and taken by `stop`.
    token: Option<CancellationToken>,
    /// Loop tasks that may still be finishing a cycle, kept so `shutdown` can wait
    /// for all of them. A restart after `stop` does not detach the previous loop.
    handles: Vec<JoinHandle<()>>,
}

struct Shared {
    control: Mutex<Control>,
    cycles_started: AtomicU64,
}

impl Shared {
    fn control(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Start/stop control over repeated check cycles.
///
/// Must be used from within a Tokio runtime.
pub struct Scheduler {
    engine: Arc<MonitorEngine>,
    shared: Arc<Shared>,
    reports: broadcast::Sender<CycleReport>,
}

impl Scheduler {
    pub fn new(engine: Arc<MonitorEngine>) -> Self {
        let (reports, _) = broadcast::channel(REPORT_CHANNEL_CAPACITY);
        Self {
            engine,
            shared: Arc::new(Shared {
                control: Mutex::new(Control::default()),
                cycles_started: AtomicU64::new(0),
            }),
            reports,
        }
    }

    pub fn state(&self) -> SchedulerState {
        if self.shared.control().token.is_some() {
            SchedulerState::Running
        } else {
            SchedulerState::Idle
        }
    }

    /// Number of scheduled cycles that have begun since this scheduler was created.
    pub fn cycles_started(&self) -> u64 {
        self.shared.cycles_started.load(Ordering::SeqCst)
    }

    /// Receives a report after every cycle.
    pub fn subscribe(&self) -> broadcast::Receiver<CycleReport> {
        self.reports.subscribe()
    }

    /// Starts repeating cycles every `interval`. Returns false if already running.
    pub fn start(&self, interval: Duration) -> bool {
        let mut control = self.shared.control();
        if control.token.is_some() {
            return false;
        }

        let token = CancellationToken::new();
        let handle = tokio::spawn(run_loop(
            Arc::clone(&self.engine),
            Arc::clone(&self.shared),
            self.reports.clone(),
            token.clone(),
            interval,
        ));

        control.token = Some(token);
        control.handles.retain(|handle| !handle.is_finished());
        control.handles.push(handle);
        log::info!(
            "Starting continuous monitoring (checking every {}s)",
            interval.as_secs_f64()
        );
        true
    }

    /// Requests the loop to stop. Returns false if it was not running.
    ///
    /// A cycle in flight runs to completion in the background.
    pub fn stop(&self) -> bool {
        let mut control = self.shared.control();
        match control.token.take() {
            Some(token) => {
                token.cancel();
                log::info!("Monitoring stop requested");
                true
            }
            None => false,
        }
    }

    /// Stops the loop and waits for every in-flight cycle to finish, including one
    /// left over from a loop that was stopped and restarted.
    pub async fn shutdown(&self) {
        let handles = {
            let mut control = self.shared.control();
            if let Some(token) = control.token.take() {
                token.cancel();
            }
            std::mem::take(&mut control.handles)
        };

        for handle in handles {
            if let Err(e) = handle.await {
                log::error!("Monitoring task ended abnormally: {e}");
            }
        }
    }

    /// Runs a single cycle on a background task.
    ///
    /// The report is published to subscribers and also returned through the handle.
    pub fn trigger_once(&self) -> JoinHandle<CycleReport> {
        let engine = Arc::clone(&self.engine);
        let reports = self.reports.clone();
        tokio::spawn(async move {
            let report = engine.run_cycle().await;
            // No subscriber is fine.
            let _ = reports.send(report.clone());
            report
        })
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Some(token) = self.shared.control().token.take() {
            token.cancel();
        }
    }
}

async fn run_loop(
    engine: Arc<MonitorEngine>,
    shared: Arc<Shared>,
    reports: broadcast::Sender<CycleReport>,
    token: CancellationToken,
    interval: Duration,
) {
    loop {
        {
            // Checked under the same lock `stop` cancels under, so no cycle can
            // begin after `stop` has returned.
            let _control = shared.control();
            if token.is_cancelled() {
                break;
            }
            shared.cycles_started.fetch_add(1, Ordering::SeqCst);
        }

        let report = engine.run_cycle().await;
        let _ = reports.send(report);

        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    log::info!("Monitoring stopped");
}
