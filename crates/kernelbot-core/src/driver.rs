use async_trait::async_trait;
use thiserror::Error;

/// Failures surfaced by a notebook driver. Converted into user-facing reply
/// text at the controller boundary; nothing here escapes to the chat layer.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("browser engine could not be installed: {0}")]
    Install(String),
    #[error("browser failed to launch: {0}")]
    Launch(String),
    #[error("navigation to the {step} failed: {reason}")]
    Navigation { step: &'static str, reason: String },
    #[error("{control} not found on the {step}")]
    ControlNotFound {
        step: &'static str,
        control: &'static str,
    },
    #[error("login failed")]
    Auth,
    #[error("unexpected browser failure: {0}")]
    Unexpected(String),
}

/// Result of the stop workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    /// The dashboard showed no active session panel.
    NothingRunning,
    /// The dashboard bounced to the login page; stop never signs in.
    NotAuthenticated,
}

/// The browser seam used by the session controller.
///
/// One implementation drives Kaggle through a real browser; tests substitute
/// fakes. The controller sequences these calls under its run-lock, so
/// implementations see at most one call in flight at a time.
#[async_trait]
pub trait NotebookDriver: Send + Sync {
    /// Bring up the browser. Idempotent while a session is already open.
    async fn open(&self) -> Result<(), DriverError>;

    /// Tear the browser down. Must never fail and never hang; errors are
    /// logged internally and all handles end up cleared.
    async fn close(&self);

    /// Returns true when the profile is signed in, performing a credential
    /// login first if it is not.
    async fn ensure_authenticated(&self) -> Result<bool, DriverError>;

    /// Save-version workflow against the notebook at `path` (`owner/slug`).
    async fn trigger_run(&self, path: &str) -> Result<(), DriverError>;

    /// Stop-session workflow against the dashboard.
    async fn stop_run(&self) -> Result<StopOutcome, DriverError>;
}
