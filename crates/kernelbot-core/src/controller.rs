//! The session controller: single owner of the run state.
//!
//! All browser-mutating work funnels through `run` and `stop`, serialized by
//! a non-blocking run-lock. Concurrent requests are rejected with a busy
//! reply instead of queueing, so slow browser work can never stack up.

use kernelbot_models::{RunOutcome, SessionStatus};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::driver::{NotebookDriver, StopOutcome};

pub struct SessionController {
    driver: Arc<dyn NotebookDriver>,
    clock: Arc<dyn Clock>,
    /// Held across the whole open -> authenticate -> act -> close sequence.
    run_lock: Mutex<()>,
    running: AtomicBool,
    /// Epoch ms of the last activity; 0 means unset. Nonzero only while
    /// `running` is true. Read without the lock by the idle monitor.
    last_activity_ms: AtomicI64,
}

impl SessionController {
    pub fn new(driver: Arc<dyn NotebookDriver>, clock: Arc<dyn Clock>) -> Self {
        Self {
            driver,
            clock,
            run_lock: Mutex::new(()),
            running: AtomicBool::new(false),
            last_activity_ms: AtomicI64::new(0),
        }
    }

    /// Trigger a run of the notebook at `path`.
    ///
    /// Rejects immediately when a run is already active or another browser
    /// operation holds the lock. The browser is opened per task and closed
    /// before the lock is released, success or not.
    pub async fn run(&self, path: &str) -> RunOutcome {
        if self.running.load(Ordering::SeqCst) {
            return RunOutcome::failure(
                "a notebook is already running; stop it before starting another",
            );
        }
        let Ok(_guard) = self.run_lock.try_lock() else {
            return RunOutcome::failure("another browser operation is in flight, try again shortly");
        };

        let outcome = self.run_locked(path).await;
        self.driver.close().await;
        outcome
    }

    async fn run_locked(&self, path: &str) -> RunOutcome {
        if let Err(err) = self.driver.open().await {
            warn!(error = %err, "browser open failed");
            return RunOutcome::failure(format!("could not start the browser: {err}"));
        }

        match self.driver.ensure_authenticated().await {
            Ok(true) => {}
            Ok(false) => {
                return RunOutcome::failure(
                    "login failed: check the configured Kaggle email and password",
                );
            }
            Err(err) => {
                warn!(error = %err, "authentication check failed");
                return RunOutcome::failure(format!("could not verify Kaggle login: {err}"));
            }
        }

        match self.driver.trigger_run(path).await {
            Ok(()) => {
                // Timestamp first: the monitor may observe `running` without
                // the lock and must never see it paired with a zero timestamp.
                self.last_activity_ms
                    .store(self.clock.now_ms(), Ordering::SeqCst);
                self.running.store(true, Ordering::SeqCst);
                info!(notebook = %path, "notebook run triggered");
                RunOutcome::success(format!("notebook '{path}' is now running"))
            }
            Err(err) => {
                warn!(notebook = %path, error = %err, "run workflow failed");
                RunOutcome::failure(format!("run failed: {err}"))
            }
        }
    }

    /// Stop the active session, best effort.
    ///
    /// Returns false without touching the browser when nothing is running or
    /// the lock is held. The controller returns to idle even when the stop
    /// workflow fails, so one bad stop cannot wedge future runs.
    pub async fn stop(&self) -> bool {
        if !self.running.load(Ordering::SeqCst) {
            return false;
        }
        let Ok(_guard) = self.run_lock.try_lock() else {
            return false;
        };

        let stopped = self.stop_locked().await;
        self.driver.close().await;

        self.running.store(false, Ordering::SeqCst);
        self.last_activity_ms.store(0, Ordering::SeqCst);
        stopped
    }

    async fn stop_locked(&self) -> bool {
        if let Err(err) = self.driver.open().await {
            warn!(error = %err, "browser open failed during stop");
            return false;
        }

        match self.driver.stop_run().await {
            Ok(StopOutcome::Stopped) => {
                info!("active session stopped");
                true
            }
            Ok(StopOutcome::NothingRunning) => {
                info!("no active session found on the dashboard");
                true
            }
            Ok(StopOutcome::NotAuthenticated) => {
                warn!("stop skipped: browser profile is not signed in");
                false
            }
            Err(err) => {
                warn!(error = %err, "stop workflow failed");
                false
            }
        }
    }

    /// Push the activity timestamp forward without touching the browser.
    /// Monotonic; a no-op while nothing is running.
    pub fn refresh_activity(&self) {
        if !self.running.load(Ordering::SeqCst) {
            return;
        }
        self.last_activity_ms
            .fetch_max(self.clock.now_ms(), Ordering::SeqCst);
    }

    pub fn status(&self) -> SessionStatus {
        let last = self.last_activity_ms.load(Ordering::SeqCst);
        SessionStatus {
            is_running: self.running.load(Ordering::SeqCst),
            last_activity_ms: (last != 0).then_some(last),
        }
    }

    /// Milliseconds since the last activity, while running.
    pub fn idle_ms(&self) -> Option<i64> {
        if !self.running.load(Ordering::SeqCst) {
            return None;
        }
        let last = self.last_activity_ms.load(Ordering::SeqCst);
        if last == 0 {
            return None;
        }
        Some((self.clock.now_ms() - last).max(0))
    }

    /// True when the session has been idle for at least `timeout_ms`.
    pub fn idle_exceeded(&self, timeout_ms: i64) -> bool {
        self.idle_ms().is_some_and(|idle| idle >= timeout_ms)
    }
}
