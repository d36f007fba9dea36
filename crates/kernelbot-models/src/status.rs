use serde::{Deserialize, Serialize};

/// Snapshot of the session controller state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionStatus {
    pub is_running: bool,
    /// Epoch milliseconds of the last activity; `None` while idle.
    pub last_activity_ms: Option<i64>,
}

impl SessionStatus {
    pub fn idle() -> Self {
        Self {
            is_running: false,
            last_activity_ms: None,
        }
    }
}

/// Final outcome of a `run` request, reported back to the chat layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunOutcome {
    pub ok: bool,
    pub message: String,
}

impl RunOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}
