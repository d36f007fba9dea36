//! Shared fakes for controller, monitor and command router tests.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use tokio::sync::Notify;

use crate::clock::Clock;
use crate::driver::{DriverError, NotebookDriver, StopOutcome};

pub(crate) struct FakeClock(AtomicI64);

impl FakeClock {
    pub(crate) fn at(ms: i64) -> Self {
        Self(AtomicI64::new(ms))
    }

    pub(crate) fn set(&self, ms: i64) {
        self.0.store(ms, Ordering::SeqCst);
    }
}

impl Clock for FakeClock {
    fn now_ms(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Driver fake with call counters and togglable failure modes.
pub(crate) struct FakeDriver {
    pub(crate) open_calls: AtomicUsize,
    pub(crate) close_calls: AtomicUsize,
    pub(crate) auth_calls: AtomicUsize,
    pub(crate) run_calls: AtomicUsize,
    pub(crate) stop_calls: AtomicUsize,
    auth_ok: AtomicBool,
    run_ok: AtomicBool,
    stop_ok: AtomicBool,
    open_gate: Option<Arc<Notify>>,
}

impl FakeDriver {
    pub(crate) fn new() -> Self {
        Self {
            open_calls: AtomicUsize::new(0),
            close_calls: AtomicUsize::new(0),
            auth_calls: AtomicUsize::new(0),
            run_calls: AtomicUsize::new(0),
            stop_calls: AtomicUsize::new(0),
            auth_ok: AtomicBool::new(true),
            run_ok: AtomicBool::new(true),
            stop_ok: AtomicBool::new(true),
            open_gate: None,
        }
    }

    /// open() parks until `release_open` is called.
    pub(crate) fn gate_open(mut self) -> Self {
        self.open_gate = Some(Arc::new(Notify::new()));
        self
    }

    pub(crate) fn release_open(&self) {
        if let Some(gate) = &self.open_gate {
            gate.notify_one();
        }
    }

    pub(crate) fn auth_fails(self) -> Self {
        self.auth_ok.store(false, Ordering::SeqCst);
        self
    }

    pub(crate) fn run_fails(self) -> Self {
        self.run_ok.store(false, Ordering::SeqCst);
        self
    }

    pub(crate) fn stop_fails(self) -> Self {
        self.stop_ok.store(false, Ordering::SeqCst);
        self
    }
}

#[async_trait]
impl NotebookDriver for FakeDriver {
    async fn open(&self) -> Result<(), DriverError> {
        self.open_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.open_gate {
            gate.notified().await;
        }
        Ok(())
    }

    async fn close(&self) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
    }

    async fn ensure_authenticated(&self) -> Result<bool, DriverError> {
        self.auth_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.auth_ok.load(Ordering::SeqCst))
    }

    async fn trigger_run(&self, _path: &str) -> Result<(), DriverError> {
        self.run_calls.fetch_add(1, Ordering::SeqCst);
        if self.run_ok.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(DriverError::ControlNotFound {
                step: "notebook editor",
                control: "Save Version button",
            })
        }
    }

    async fn stop_run(&self) -> Result<StopOutcome, DriverError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        if self.stop_ok.load(Ordering::SeqCst) {
            Ok(StopOutcome::Stopped)
        } else {
            Err(DriverError::ControlNotFound {
                step: "active session panel",
                control: "Stop Session button",
            })
        }
    }
}
