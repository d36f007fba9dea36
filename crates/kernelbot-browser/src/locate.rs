//! Element location over brittle markup.
//!
//! Controls are found through ordered fallback chains: each [`Locator`] in a
//! chain is tried in turn, within a shared timeout budget, and the first one
//! matching a visible element wins. Adding a fallback selector is a one-line
//! change to the chain.
//!
//! Clicks go through injected JS (matching the original behavior of the
//! flows this automates) so visibility filtering and the click happen in one
//! round trip.

use chromiumoxide::{Element, Page};
use kernelbot_core::DriverError;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, trace};

pub(crate) const NAV_SETTLE: Duration = Duration::from_secs(3);
pub(crate) const POLL_STEP: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy)]
pub(crate) enum Locator {
    /// Plain CSS selector.
    Css(&'static str),
    /// Any button-like element whose visible text contains the string.
    ButtonText(&'static str),
}

pub(crate) fn unexpected(err: chromiumoxide::error::CdpError) -> DriverError {
    DriverError::Unexpected(err.to_string())
}

pub(crate) async fn current_url(page: &Page) -> String {
    page.url().await.ok().flatten().unwrap_or_default()
}

/// Navigate and let the page settle. Redirects (e.g. login bounces) are part
/// of the settled state the caller inspects afterwards.
pub(crate) async fn navigate(page: &Page, url: &str, step: &'static str) -> Result<(), DriverError> {
    page.goto(url).await.map_err(|err| DriverError::Navigation {
        step,
        reason: err.to_string(),
    })?;
    let _ = page.wait_for_navigation().await;
    sleep(NAV_SETTLE).await;
    Ok(())
}

/// Click the first visible control matched by `chain`, polling until
/// `budget` runs out. Returns how many elements the winning locator matched.
pub(crate) async fn click_first(
    page: &Page,
    step: &'static str,
    control: &'static str,
    chain: &[Locator],
    budget: Duration,
) -> Result<u64, DriverError> {
    match poll_chain(page, chain, budget).await {
        Some((locator, matches)) => {
            debug!(?locator, matches, control, "control clicked");
            Ok(matches)
        }
        None => Err(DriverError::ControlNotFound { step, control }),
    }
}

/// Like [`click_first`] but absence is an answer, not an error.
pub(crate) async fn try_click_first(
    page: &Page,
    chain: &[Locator],
    budget: Duration,
) -> Option<u64> {
    poll_chain(page, chain, budget)
        .await
        .map(|(_, matches)| matches)
}

async fn poll_chain(
    page: &Page,
    chain: &[Locator],
    budget: Duration,
) -> Option<(Locator, u64)> {
    let deadline = Instant::now() + budget;
    loop {
        for locator in chain {
            let matches = try_click(page, locator).await;
            if matches > 0 {
                return Some((*locator, matches));
            }
        }
        if Instant::now() >= deadline {
            return None;
        }
        sleep(POLL_STEP).await;
    }
}

/// One attempt at one locator. Evaluation errors (mid-navigation, detached
/// frame) count as no match; the poll loop absorbs them.
async fn try_click(page: &Page, locator: &Locator) -> u64 {
    let script = click_script(locator);
    match page.evaluate(script).await {
        Ok(result) => result
            .value()
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0),
        Err(err) => {
            trace!(?locator, error = %err, "locator evaluation failed");
            0
        }
    }
}

fn click_script(locator: &Locator) -> String {
    match locator {
        Locator::Css(selector) => {
            let selector = js_string(selector);
            format!(
                "(() => {{\n\
                   const els = Array.from(document.querySelectorAll({selector}))\n\
                     .filter((el) => el.offsetParent !== null && !el.disabled);\n\
                   if (els.length === 0) {{ return 0; }}\n\
                   els[0].click();\n\
                   return els.length;\n\
                 }})()"
            )
        }
        Locator::ButtonText(text) => {
            let text = js_string(text);
            format!(
                "(() => {{\n\
                   const els = Array.from(document.querySelectorAll(\"button, [role='button']\"))\n\
                     .filter((el) => el.offsetParent !== null && !el.disabled)\n\
                     .filter((el) => (el.textContent || '').trim().includes({text}));\n\
                   if (els.length === 0) {{ return 0; }}\n\
                   els[0].click();\n\
                   return els.length;\n\
                 }})()"
            )
        }
    }
}

fn js_string(raw: &str) -> String {
    serde_json::Value::String(raw.to_string()).to_string()
}

/// Wait for an element to exist, for flows that need a handle to type into.
pub(crate) async fn wait_for_css(
    page: &Page,
    selector: &'static str,
    budget: Duration,
) -> Option<Element> {
    let deadline = Instant::now() + budget;
    loop {
        if let Ok(element) = page.find_element(selector).await {
            return Some(element);
        }
        if Instant::now() >= deadline {
            return None;
        }
        sleep(POLL_STEP).await;
    }
}
