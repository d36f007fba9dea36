//! Background idle watchdog.
//!
//! Polls the controller once a minute and fires a best-effort stop once the
//! session has been idle past the configured timeout. The loop owns no state
//! of its own; it only reads the controller's unlocked atomics, so a stale
//! read costs at most one extra poll cycle.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::controller::SessionController;

const POLL_INTERVAL: Duration = Duration::from_secs(60);
/// Applied after a failed auto-stop so a broken stop workflow is not
/// hammered every poll.
const FAILURE_BACKOFF: Duration = Duration::from_secs(300);

pub struct IdleMonitor {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl IdleMonitor {
    /// Spawn the watchdog. `idle_timeout` is the duration of inactivity
    /// after which the active session is stopped.
    pub fn spawn(controller: Arc<SessionController>, idle_timeout: Duration) -> Self {
        let token = CancellationToken::new();
        let loop_token = token.clone();
        let handle = tokio::spawn(async move {
            monitor_loop(controller, idle_timeout, loop_token).await;
        });
        Self { token, handle }
    }

    /// Cancel the loop and wait for it to exit.
    pub async fn shutdown(self) {
        self.token.cancel();
        let _ = self.handle.await;
    }
}

async fn monitor_loop(
    controller: Arc<SessionController>,
    idle_timeout: Duration,
    token: CancellationToken,
) {
    let timeout_ms = idle_timeout.as_millis() as i64;
    debug!(timeout_secs = idle_timeout.as_secs(), "idle monitor started");

    loop {
        tokio::select! {
            _ = token.cancelled() => {
                debug!("idle monitor cancelled");
                return;
            }
            _ = tokio::time::sleep(POLL_INTERVAL) => {}
        }

        if !controller.idle_exceeded(timeout_ms) {
            continue;
        }

        info!(
            timeout_secs = idle_timeout.as_secs(),
            "idle timeout reached, stopping the active session"
        );
        if !controller.stop().await {
            warn!("auto-stop attempt failed, backing off");
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(FAILURE_BACKOFF) => {}
            }
        }
    }
}
