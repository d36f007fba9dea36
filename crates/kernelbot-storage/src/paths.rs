//! Path utilities for Kernelbot directory resolution.

use anyhow::Result;
use std::path::{Path, PathBuf};

const KERNELBOT_DIR: &str = ".kernelbot";
const REGISTRY_FILE: &str = "notebooks.json";
const PROFILE_DIR: &str = "profile";
const LOGS_DIR: &str = "logs";

/// Environment variable to override the Kernelbot data directory.
const KERNELBOT_DIR_ENV: &str = "KERNELBOT_DIR";

/// Resolve the Kernelbot data directory.
/// Priority: explicit override > KERNELBOT_DIR env var > ~/.kernelbot/
pub fn resolve_data_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir.to_path_buf());
    }
    if let Ok(dir) = std::env::var(KERNELBOT_DIR_ENV)
        && !dir.trim().is_empty()
    {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|h| h.join(KERNELBOT_DIR))
        .ok_or_else(|| anyhow::anyhow!("Failed to determine home directory"))
}

/// Ensure the data directory exists and return its path.
pub fn ensure_data_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    let dir = resolve_data_dir(explicit)?;
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Registry file: <data>/notebooks.json
pub fn registry_file(data_dir: &Path) -> PathBuf {
    data_dir.join(REGISTRY_FILE)
}

/// Persistent browser profile: <data>/profile
/// Login cookies live here and survive across browser launches.
pub fn profile_dir(data_dir: &Path) -> PathBuf {
    data_dir.join(PROFILE_DIR)
}

/// Log files: <data>/logs
pub fn logs_dir(data_dir: &Path) -> PathBuf {
    data_dir.join(LOGS_DIR)
}
