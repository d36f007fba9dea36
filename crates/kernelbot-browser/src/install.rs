//! Chromium discovery and install-on-demand.
//!
//! Looks for an existing binary first (env override, Playwright's browser
//! cache, well-known system names) and only then shells out to
//! `npx playwright install chromium`. The whole check-then-install sequence
//! runs under a process-wide mutex so concurrent first runs cannot race the
//! installer.

use kernelbot_core::DriverError;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

const INSTALL_TIMEOUT: Duration = Duration::from_secs(300);

const CHROMIUM_ENV: &str = "KERNELBOT_CHROMIUM";
const BROWSERS_PATH_ENV: &str = "PLAYWRIGHT_BROWSERS_PATH";

/// Substrings that mark a non-zero installer exit as a real failure.
/// Anything else on stderr is npm warning noise. Substring matching is a
/// known weak point; there is no structured output to parse.
const FAILURE_MARKERS: &[&str] = &[
    "Failed to install",
    "npm ERR!",
    "EACCES",
    "EPERM",
    "ENOSPC",
    "ECONNRESET",
    "getaddrinfo",
];

/// Relative executable locations inside one downloaded browser directory.
const CACHE_EXECUTABLES: &[&str] = &[
    "chrome-linux/chrome",
    "chrome-mac/Chromium.app/Contents/MacOS/Chromium",
    "chrome-win/chrome.exe",
];

const SYSTEM_BINARIES: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
    "chrome",
];

static INSTALL_LOCK: Mutex<()> = Mutex::const_new(());

/// Locate Chromium, installing it if necessary. Idempotent; cheap once a
/// binary exists.
pub(crate) async fn ensure_chromium_installed(
    explicit: Option<&Path>,
) -> Result<PathBuf, DriverError> {
    let _guard = INSTALL_LOCK.lock().await;

    if let Some(path) = find_chromium(explicit) {
        debug!(chromium = %path.display(), "chromium executable found");
        return Ok(path);
    }

    info!("chromium not found, installing via playwright (first run only)");
    run_installer().await?;

    find_chromium(explicit).ok_or_else(|| {
        DriverError::Install("chromium executable still missing after install".to_string())
    })
}

fn find_chromium(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit
        && path.exists()
    {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CHROMIUM_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    for root in cache_roots() {
        if let Some(path) = scan_browser_cache(&root) {
            return Some(path);
        }
    }

    SYSTEM_BINARIES
        .iter()
        .find_map(|name| which::which(name).ok())
}

fn cache_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(path) = std::env::var(BROWSERS_PATH_ENV) {
        roots.push(PathBuf::from(path));
    }

    if let Ok(home) = std::env::var("HOME") {
        roots.push(PathBuf::from(&home).join(".cache/ms-playwright"));
        roots.push(PathBuf::from(&home).join("Library/Caches/ms-playwright"));
    }

    if let Ok(user_profile) = std::env::var("USERPROFILE") {
        roots.push(PathBuf::from(user_profile).join("AppData/Local/ms-playwright"));
    }

    roots
}

/// Find the newest chromium revision below a Playwright cache root.
fn scan_browser_cache(root: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(root).ok()?;

    let mut revisions: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("chromium-"))
        })
        .collect();
    revisions.sort();

    for revision in revisions.into_iter().rev() {
        for candidate in CACHE_EXECUTABLES {
            let path = revision.join(candidate);
            if path.exists() {
                return Some(path);
            }
        }
    }

    None
}

async fn run_installer() -> Result<(), DriverError> {
    let args = ["playwright", "install", "chromium"];
    let capture = run_command_capture("npx", &args, INSTALL_TIMEOUT).await?;

    if capture.exit_code != 0 {
        if is_genuine_failure(&capture.stderr) {
            return Err(DriverError::Install(format!(
                "installer exited with {}: {}",
                capture.exit_code,
                capture.stderr.trim()
            )));
        }
        warn!(
            exit_code = capture.exit_code,
            "installer exited non-zero without a recognized failure, continuing"
        );
    }

    debug!(stdout = %capture.stdout.trim(), "installer finished");
    Ok(())
}

fn is_genuine_failure(stderr: &str) -> bool {
    FAILURE_MARKERS.iter().any(|marker| stderr.contains(marker))
}

struct CommandCapture {
    exit_code: i32,
    stdout: String,
    stderr: String,
}

async fn run_command_capture(
    program: &str,
    args: &[&str],
    limit: Duration,
) -> Result<CommandCapture, DriverError> {
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = match timeout(limit, command.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(err)) => {
            return Err(DriverError::Install(format!(
                "could not spawn {program}: {err}"
            )));
        }
        Err(_) => {
            return Err(DriverError::Install(format!(
                "{program} timed out after {} seconds",
                limit.as_secs()
            )));
        }
    };

    Ok(CommandCapture {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}
