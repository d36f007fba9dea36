//! Browser session lifecycle.
//!
//! One `BrowserSession` owns one Chromium process, its CDP event handler
//! task and one page. The profile directory is persistent so Kaggle login
//! cookies survive across opens; everything else is torn down after each
//! task.

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use futures_util::StreamExt;
use kernelbot_core::DriverError;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::install;

const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Runs before any page script on every navigation so Kaggle's bot checks
/// do not see the automation flag.
const STEALTH_SCRIPT: &str = r#"
Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });
Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3] });
"#;

#[derive(Debug, Clone)]
pub struct BrowserSettings {
    pub headless: bool,
    /// Persistent profile directory; login cookies live here.
    pub profile_dir: PathBuf,
    /// Explicit Chromium binary, bypassing discovery.
    pub executable: Option<PathBuf>,
}

impl BrowserSettings {
    pub fn new(profile_dir: impl Into<PathBuf>) -> Self {
        Self {
            headless: true,
            profile_dir: profile_dir.into(),
            executable: None,
        }
    }
}

pub struct BrowserSession {
    settings: BrowserSettings,
    browser: Option<Browser>,
    handler: Option<JoinHandle<()>>,
    page: Option<Page>,
}

impl BrowserSession {
    pub fn new(settings: BrowserSettings) -> Self {
        Self {
            settings,
            browser: None,
            handler: None,
            page: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.browser.is_some()
    }

    /// Launch the browser and create a page. No-op while a page is live.
    pub async fn open(&mut self) -> Result<(), DriverError> {
        if self.page.is_some() {
            return Ok(());
        }

        std::fs::create_dir_all(&self.settings.profile_dir)
            .map_err(|err| DriverError::Launch(format!("could not create profile dir: {err}")))?;

        let executable =
            install::ensure_chromium_installed(self.settings.executable.as_deref()).await?;

        let mut builder = BrowserConfig::builder()
            .user_data_dir(&self.settings.profile_dir)
            .chrome_executable(&executable)
            .window_size(1920, 1080)
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg("--disable-extensions")
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg(format!("--user-agent={USER_AGENT}"));
        if !self.settings.headless {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(DriverError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|err| DriverError::Launch(err.to_string()))?;

        // Drain CDP events for the lifetime of the browser
        let handler_task = tokio::spawn(async move {
            while (handler.next().await).is_some() {}
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(err) => {
                handler_task.abort();
                return Err(DriverError::Launch(err.to_string()));
            }
        };

        if let Ok(stealth) = AddScriptToEvaluateOnNewDocumentParams::builder()
            .source(STEALTH_SCRIPT)
            .build()
        {
            let _ = page.execute(stealth).await;
        }

        debug!(
            chromium = %executable.display(),
            headless = self.settings.headless,
            "browser session opened"
        );
        self.browser = Some(browser);
        self.handler = Some(handler_task);
        self.page = Some(page);
        Ok(())
    }

    /// The current page, recreated if it was closed underneath us.
    pub async fn page(&mut self) -> Result<Page, DriverError> {
        if let Some(page) = &self.page {
            return Ok(page.clone());
        }
        let Some(browser) = &self.browser else {
            return Err(DriverError::Unexpected("browser is not open".to_string()));
        };
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|err| DriverError::Unexpected(err.to_string()))?;
        self.page = Some(page.clone());
        Ok(page)
    }

    /// Tear everything down. Each step is bounded and failures are only
    /// logged; the handles are cleared no matter what, so a later `open()`
    /// always starts from a clean slate.
    pub async fn close(&mut self) {
        if let Some(page) = self.page.take() {
            bounded_close("page", page.close()).await;
        }

        if let Some(mut browser) = self.browser.take() {
            bounded_close("browser", browser.close()).await;
            // Reap the child process; bounded for the same reason
            if timeout(CLOSE_TIMEOUT, browser.wait()).await.is_err() {
                warn!("browser did not exit in time");
            }
        }

        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
        debug!("browser session closed");
    }
}

/// One teardown step, bounded by [`CLOSE_TIMEOUT`]. Errors and timeouts are
/// logged and swallowed; a hung close must never block plugin shutdown.
async fn bounded_close<T, E>(step: &'static str, fut: impl Future<Output = Result<T, E>>)
where
    E: std::fmt::Display,
{
    match timeout(CLOSE_TIMEOUT, fut).await {
        Ok(Ok(_)) => {}
        Ok(Err(err)) => warn!(step, error = %err, "close step failed"),
        Err(_) => warn!(step, "close step timed out"),
    }
}
