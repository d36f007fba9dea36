mod config;
mod console;

use anyhow::Result;
use clap::Parser;
use kernelbot_browser::{BrowserSettings, KaggleDriver};
use kernelbot_core::{CommandRouter, IdleMonitor, SessionController, SystemClock};
use kernelbot_storage::{NotebookRegistry, paths};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kernelbot", about = "Chat-driven Kaggle notebook runner", version)]
struct Cli {
    /// Path to the TOML config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Run the browser with a visible window
    #[arg(long)]
    headed: bool,
    /// Override the data directory
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = config::load(cli.config.as_deref())?;
    if cli.headed {
        config.headless = false;
    }
    if cli.data_dir.is_some() {
        config.data_dir = cli.data_dir;
    }

    let data_dir = paths::ensure_data_dir(config.data_dir.as_deref())?;

    // Log to file so stdout stays clean for chat replies
    let log_dir = paths::logs_dir(&data_dir);
    std::fs::create_dir_all(&log_dir).ok();
    let file_appender = tracing_appender::rolling::daily(log_dir, "kernelbot.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false)
        .init();

    let registry = NotebookRegistry::load(paths::registry_file(&data_dir))?;

    let mut settings = BrowserSettings::new(paths::profile_dir(&data_dir));
    settings.headless = config.headless;
    let driver = Arc::new(KaggleDriver::new(settings, config.credentials.clone()));

    let controller = Arc::new(SessionController::new(driver, Arc::new(SystemClock)));
    let monitor = IdleMonitor::spawn(
        controller.clone(),
        Duration::from_secs(config.auto_stop_minutes * 60),
    );
    let router = CommandRouter::new(controller.clone(), registry, config);

    let result = console::run(&router).await;

    // Let the monitor observe cancellation and exit before the process does
    monitor.shutdown().await;
    if controller.status().is_running {
        controller.stop().await;
    }

    result
}
