//! The two UI workflows: trigger a notebook run, stop the active session.
//!
//! Each workflow is a fixed linear sequence of steps with bounded waits.
//! A step that cannot find its control aborts the workflow with the step
//! name attached, so the chat reply can say which button went missing
//! instead of a bare "failed".

use chromiumoxide::Page;
use kernelbot_core::{DriverError, StopOutcome};
use std::time::Duration;
use tracing::{info, warn};

use crate::auth::is_login_url;
use crate::locate::{self, Locator};

const DASHBOARD_URL: &str = "https://www.kaggle.com/";

const SAVE_CONTROL_WAIT: Duration = Duration::from_secs(20);
const CONFIRM_WAIT: Duration = Duration::from_secs(15);
const PANEL_WAIT: Duration = Duration::from_secs(10);

const SAVE_VERSION: &[Locator] = &[
    Locator::Css("button[aria-label='Save Version']"),
    Locator::Css("[data-testid='save-version-button']"),
    Locator::ButtonText("Save Version"),
    Locator::ButtonText("Save version"),
];

const SAVE_CONFIRM: &[Locator] = &[
    Locator::Css("div[role='dialog'] button[type='submit']"),
    Locator::Css("div[role='dialog'] [data-testid='save-button']"),
    Locator::ButtonText("Save"),
];

const ACTIVE_SESSIONS: &[Locator] = &[
    Locator::Css("[data-testid='active-events-button']"),
    Locator::Css("button[aria-label='Active Events']"),
    Locator::ButtonText("View Active Events"),
];

const SESSION_OVERFLOW: &[Locator] = &[
    Locator::Css("[data-testid='active-event-overflow']"),
    Locator::Css("button[aria-label='More options']"),
    Locator::Css("button[aria-label='more options']"),
];

const STOP_SESSION: &[Locator] = &[
    Locator::Css("[data-testid='stop-session-button']"),
    Locator::ButtonText("Stop Session"),
    Locator::ButtonText("Stop session"),
];

fn edit_url(path: &str) -> String {
    format!("https://www.kaggle.com/code/{path}/edit")
}

/// Save-version workflow: open the notebook editor, press Save Version,
/// confirm the dialog. Kaggle queues the committed version for execution.
pub(crate) async fn trigger_run(page: &Page, path: &str) -> Result<(), DriverError> {
    locate::navigate(page, &edit_url(path), "notebook editor").await?;
    locate::click_first(
        page,
        "notebook editor",
        "Save Version button",
        SAVE_VERSION,
        SAVE_CONTROL_WAIT,
    )
    .await?;
    locate::click_first(
        page,
        "save dialog",
        "Save confirmation button",
        SAVE_CONFIRM,
        CONFIRM_WAIT,
    )
    .await?;
    info!(notebook = %path, "save version confirmed");
    Ok(())
}

/// Stop-session workflow over the dashboard's active-events panel.
///
/// Never attempts a login: a bounce to the sign-in page aborts. A missing
/// panel means nothing is running, which is a valid answer rather than a
/// failure.
pub(crate) async fn stop_run(page: &Page) -> Result<StopOutcome, DriverError> {
    locate::navigate(page, DASHBOARD_URL, "dashboard").await?;

    let url = locate::current_url(page).await;
    if is_login_url(&url) {
        return Ok(StopOutcome::NotAuthenticated);
    }

    if locate::try_click_first(page, ACTIVE_SESSIONS, PANEL_WAIT)
        .await
        .is_none()
    {
        return Ok(StopOutcome::NothingRunning);
    }

    let candidates = locate::click_first(
        page,
        "active session panel",
        "session overflow menu",
        SESSION_OVERFLOW,
        PANEL_WAIT,
    )
    .await?;
    if candidates > 1 {
        // With several sessions active there is nothing tying the menu to a
        // specific notebook; the first one wins.
        warn!(candidates, "multiple active sessions visible, stopping the first one");
    }

    locate::click_first(
        page,
        "session menu",
        "Stop Session button",
        STOP_SESSION,
        CONFIRM_WAIT,
    )
    .await?;
    info!("stop session confirmed");
    Ok(StopOutcome::Stopped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_url_targets_the_editor() {
        assert_eq!(
            edit_url("alice/demo-nb"),
            "https://www.kaggle.com/code/alice/demo-nb/edit"
        );
    }

    #[test]
    fn fallback_chains_lead_with_precise_selectors() {
        // Text matches are the last resort in every chain
        for chain in [SAVE_VERSION, SAVE_CONFIRM, ACTIVE_SESSIONS, STOP_SESSION] {
            assert!(matches!(chain[0], Locator::Css(_)));
            assert!(!chain.is_empty());
        }
    }
}
