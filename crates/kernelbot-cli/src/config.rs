use anyhow::{Context, Result};
use kernelbot_models::BotConfig;
use std::path::{Path, PathBuf};

const EMAIL_ENV: &str = "KAGGLE_EMAIL";
const PASSWORD_ENV: &str = "KAGGLE_PASSWORD";

/// Load the bot config. Priority: explicit path > default config file >
/// built-in defaults. Credentials can always be overridden from the
/// environment so they never have to live on disk.
pub fn load(explicit: Option<&Path>) -> Result<BotConfig> {
    let path = explicit.map(Path::to_path_buf).or_else(default_path);

    let mut config = match path {
        Some(path) if path.exists() => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("could not read config at {}", path.display()))?;
            toml::from_str(&raw)
                .with_context(|| format!("invalid config at {}", path.display()))?
        }
        _ => BotConfig::default(),
    };

    if let Ok(email) = std::env::var(EMAIL_ENV) {
        config.credentials.email = email;
    }
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        config.credentials.password = password;
    }

    Ok(config)
}

fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("kernelbot").join("config.toml"))
}
