//! The real [`NotebookDriver`]: one browser session driven through the
//! auth and action workflows. The controller serializes calls under its
//! run-lock; the internal mutex only provides the interior mutability.

use async_trait::async_trait;
use kernelbot_core::{DriverError, NotebookDriver, StopOutcome};
use kernelbot_models::Credentials;
use tokio::sync::Mutex;
use tracing::info;

use crate::actions;
use crate::auth;
use crate::session::{BrowserSession, BrowserSettings};

pub struct KaggleDriver {
    credentials: Credentials,
    session: Mutex<BrowserSession>,
}

impl KaggleDriver {
    pub fn new(settings: BrowserSettings, credentials: Credentials) -> Self {
        Self {
            credentials,
            session: Mutex::new(BrowserSession::new(settings)),
        }
    }
}

#[async_trait]
impl NotebookDriver for KaggleDriver {
    async fn open(&self) -> Result<(), DriverError> {
        self.session.lock().await.open().await
    }

    async fn close(&self) {
        self.session.lock().await.close().await;
    }

    async fn ensure_authenticated(&self) -> Result<bool, DriverError> {
        let mut session = self.session.lock().await;
        let page = session.page().await?;
        if auth::is_authenticated(&page).await? {
            return Ok(true);
        }
        info!("profile not signed in, attempting credential login");
        Ok(auth::login(&page, &self.credentials).await)
    }

    async fn trigger_run(&self, path: &str) -> Result<(), DriverError> {
        let mut session = self.session.lock().await;
        let page = session.page().await?;
        actions::trigger_run(&page, path).await
    }

    async fn stop_run(&self) -> Result<StopOutcome, DriverError> {
        let mut session = self.session.lock().await;
        let page = session.page().await?;
        actions::stop_run(&page).await
    }
}
