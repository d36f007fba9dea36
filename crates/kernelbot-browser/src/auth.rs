//! Kaggle sign-in detection and credential login.

use chromiumoxide::Page;
use kernelbot_core::DriverError;
use kernelbot_models::Credentials;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::locate::{self, POLL_STEP, unexpected};

pub(crate) const LOGIN_URL: &str = "https://www.kaggle.com/account/login?phase=emailSignIn";

const FIELD_WAIT: Duration = Duration::from_secs(10);
const LOGIN_WAIT: Duration = Duration::from_secs(30);

/// A URL still on the login flow means the profile is not signed in.
pub(crate) fn is_login_url(url: &str) -> bool {
    url.contains("/account/login")
}

/// Navigates to the sign-in entry point and inspects where the site settles:
/// a signed-in profile is redirected away from the login page.
pub(crate) async fn is_authenticated(page: &Page) -> Result<bool, DriverError> {
    locate::navigate(page, LOGIN_URL, "sign-in page").await?;
    let url = locate::current_url(page).await;
    debug!(%url, "sign-in probe settled");
    Ok(!is_login_url(&url))
}

/// Fill the email sign-in form and wait for the redirect away from it.
/// Returns false on missing credentials, a changed form, or a timeout;
/// wrong password and changed markup are not distinguished further.
pub(crate) async fn login(page: &Page, credentials: &Credentials) -> bool {
    if !credentials.is_configured() {
        debug!("credentials not configured, skipping login");
        return false;
    }
    match try_login(page, credentials).await {
        Ok(signed_in) => signed_in,
        Err(err) => {
            warn!(error = %err, "login attempt failed");
            false
        }
    }
}

async fn try_login(page: &Page, credentials: &Credentials) -> Result<bool, DriverError> {
    let email = locate::wait_for_css(page, "input[name='email']", FIELD_WAIT)
        .await
        .ok_or(DriverError::ControlNotFound {
            step: "sign-in page",
            control: "email field",
        })?;
    email.click().await.map_err(unexpected)?;
    email.type_str(&credentials.email).await.map_err(unexpected)?;

    let password = locate::wait_for_css(page, "input[name='password']", FIELD_WAIT)
        .await
        .ok_or(DriverError::ControlNotFound {
            step: "sign-in page",
            control: "password field",
        })?;
    password.click().await.map_err(unexpected)?;
    password
        .type_str(&credentials.password)
        .await
        .map_err(unexpected)?;

    let submit = locate::wait_for_css(page, "button[type='submit']", FIELD_WAIT)
        .await
        .ok_or(DriverError::ControlNotFound {
            step: "sign-in page",
            control: "sign-in button",
        })?;
    submit.click().await.map_err(unexpected)?;

    let deadline = Instant::now() + LOGIN_WAIT;
    loop {
        let url = locate::current_url(page).await;
        if !url.is_empty() && !is_login_url(&url) {
            info!("kaggle login succeeded");
            return Ok(true);
        }
        if Instant::now() >= deadline {
            warn!("login did not leave the sign-in page; wrong credentials or changed markup");
            return Ok(false);
        }
        sleep(POLL_STEP).await;
    }
}
