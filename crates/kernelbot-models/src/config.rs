use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_auto_stop_minutes() -> u64 {
    30
}

fn default_refresh_keywords() -> String {
    "running,training,processing".to_string()
}

fn default_headless() -> bool {
    true
}

/// Kaggle account credentials used by the login flow.
///
/// Both fields must be non-empty before a run is attempted; the browser
/// layer never mutates them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl Credentials {
    pub fn is_configured(&self) -> bool {
        !self.email.is_empty() && !self.password.is_empty()
    }
}

/// Bot configuration, loaded from TOML with env overrides for credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default)]
    pub credentials: Credentials,
    /// Minutes of inactivity before a running session is auto-stopped.
    #[serde(default = "default_auto_stop_minutes")]
    pub auto_stop_minutes: u64,
    /// Comma-separated keywords that refresh the activity timer when seen
    /// in chat while a run is active.
    #[serde(default = "default_refresh_keywords")]
    pub refresh_keywords: String,
    /// Registry name used by `run` when no argument is given.
    #[serde(default)]
    pub default_notebook: Option<String>,
    #[serde(default = "default_headless")]
    pub headless: bool,
    /// Overrides the default data directory (registry file, browser profile).
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            credentials: Credentials::default(),
            auto_stop_minutes: default_auto_stop_minutes(),
            refresh_keywords: default_refresh_keywords(),
            default_notebook: None,
            headless: default_headless(),
            data_dir: None,
        }
    }
}

impl BotConfig {
    /// Normalized keep-alive keywords: trimmed, lowercased, empties dropped.
    pub fn keyword_list(&self) -> Vec<String> {
        self.refresh_keywords
            .split(',')
            .map(|kw| kw.trim().to_lowercase())
            .filter(|kw| !kw.is_empty())
            .collect()
    }
}
