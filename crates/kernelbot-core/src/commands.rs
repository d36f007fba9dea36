//! Chat command routing.
//!
//! Parses `kaggle ...` command lines into [`Command`] values and executes
//! them against the registry and the session controller, producing exactly
//! one reply string per command. Non-command chat text is scanned for
//! keep-alive keywords that refresh the activity timer of a running session.

use kernelbot_models::BotConfig;
use kernelbot_storage::{NotebookRegistry, RegistryError};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::controller::SessionController;

const HELP_TEXT: &str = "Kaggle notebook runner\n\
    Commands:\n\
    kaggle list - show registered notebooks\n\
    kaggle add <name> <owner/slug> - register a notebook\n\
    kaggle remove <name> - unregister a notebook\n\
    kaggle run [name|owner/slug] - trigger a run\n\
    kaggle stop - stop the active session\n\
    kaggle status - show what is running";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    List,
    Add { name: String, path: String },
    Remove { name: String },
    Run { target: Option<String> },
    Stop,
    Status,
}

impl Command {
    /// Parse a chat line. `None` means the line is not a kaggle command.
    /// Malformed arguments come back as `Err(usage text)`.
    pub fn parse(line: &str) -> Option<Result<Command, String>> {
        let mut tokens = line.trim().strip_prefix('/').unwrap_or(line.trim()).split_whitespace();
        if tokens.next()? != "kaggle" {
            return None;
        }

        let command = match tokens.next() {
            None | Some("help") => Ok(Command::Help),
            Some("list") => Ok(Command::List),
            Some("add") => match (tokens.next(), tokens.next()) {
                (Some(name), Some(path)) => Ok(Command::Add {
                    name: name.to_string(),
                    path: path.to_string(),
                }),
                _ => Err("usage: kaggle add <name> <owner/slug>".to_string()),
            },
            Some("remove") => match tokens.next() {
                Some(name) => Ok(Command::Remove {
                    name: name.to_string(),
                }),
                None => Err("usage: kaggle remove <name>".to_string()),
            },
            Some("run") => Ok(Command::Run {
                target: tokens.next().map(str::to_string),
            }),
            Some("stop") | Some("off") => Ok(Command::Stop),
            Some("status") => Ok(Command::Status),
            Some(other) => Err(format!("unknown subcommand '{other}', try 'kaggle help'")),
        };
        Some(command)
    }
}

pub struct CommandRouter {
    controller: Arc<SessionController>,
    registry: Mutex<NotebookRegistry>,
    config: BotConfig,
    keywords: Vec<String>,
}

impl CommandRouter {
    pub fn new(
        controller: Arc<SessionController>,
        registry: NotebookRegistry,
        config: BotConfig,
    ) -> Self {
        let keywords = config.keyword_list();
        Self {
            controller,
            registry: Mutex::new(registry),
            config,
            keywords,
        }
    }

    /// Handle one chat line. Commands yield a reply; other text is scanned
    /// for keep-alive keywords and yields none.
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        match Command::parse(line) {
            Some(Ok(command)) => Some(self.execute(command).await),
            Some(Err(usage)) => Some(usage),
            None => {
                self.scan_keep_alive(line);
                None
            }
        }
    }

    pub async fn execute(&self, command: Command) -> String {
        match command {
            Command::Help => HELP_TEXT.to_string(),
            Command::List => self.list().await,
            Command::Add { name, path } => self.add(&name, &path).await,
            Command::Remove { name } => self.remove(&name).await,
            Command::Run { target } => self.run(target.as_deref()).await,
            Command::Stop => self.stop().await,
            Command::Status => self.status(),
        }
    }

    async fn list(&self) -> String {
        let registry = self.registry.lock().await;
        if registry.is_empty() {
            return "no notebooks registered yet; add one with 'kaggle add'".to_string();
        }
        let mut reply = String::from("registered notebooks:");
        for (index, (name, path)) in registry.entries().enumerate() {
            reply.push_str(&format!("\n{}. {} -> {}", index + 1, name, path));
        }
        if let Some(default) = &self.config.default_notebook {
            reply.push_str(&format!("\ndefault: {default}"));
        }
        reply
    }

    async fn add(&self, name: &str, path: &str) -> String {
        let mut registry = self.registry.lock().await;
        match registry.add(name, path) {
            Ok(()) => format!("registered {name} -> {path}"),
            Err(err @ (RegistryError::DuplicateName(_) | RegistryError::InvalidPath(_))) => {
                err.to_string()
            }
            Err(err) => {
                warn!(error = %err, "registry write failed");
                "could not save the notebook registry".to_string()
            }
        }
    }

    async fn remove(&self, name: &str) -> String {
        let mut registry = self.registry.lock().await;
        match registry.remove(name) {
            Ok(Some(path)) => format!("removed {name} ({path})"),
            Ok(None) => format!("no notebook named '{name}'"),
            Err(err) => {
                warn!(error = %err, "registry write failed");
                "could not save the notebook registry".to_string()
            }
        }
    }

    async fn run(&self, target: Option<&str>) -> String {
        let target = match target.or(self.config.default_notebook.as_deref()) {
            Some(target) => target.to_string(),
            None => {
                return "specify a notebook name or configure default_notebook".to_string();
            }
        };

        // A raw owner/slug path is accepted directly; anything else is a
        // registry name.
        let path = if target.contains('/') {
            target
        } else {
            match self.registry.lock().await.get(&target) {
                Some(path) => path,
                None => {
                    return format!("no notebook named '{target}'; see 'kaggle list'");
                }
            }
        };

        if !self.config.credentials.is_configured() {
            return "Kaggle credentials are not configured; set email and password first"
                .to_string();
        }

        let outcome = self.controller.run(&path).await;
        if outcome.ok {
            format!(
                "{}; it will auto-stop after {} idle minutes",
                outcome.message, self.config.auto_stop_minutes
            )
        } else {
            outcome.message
        }
    }

    async fn stop(&self) -> String {
        if !self.controller.status().is_running {
            return "nothing is running".to_string();
        }
        if self.controller.stop().await {
            "session stopped".to_string()
        } else {
            "could not stop the session; check the Kaggle dashboard".to_string()
        }
    }

    fn status(&self) -> String {
        match self.controller.idle_ms() {
            Some(idle_ms) => {
                let idle_minutes = idle_ms / 60_000;
                let remaining = (self.config.auto_stop_minutes as i64 - idle_minutes).max(0);
                format!(
                    "a notebook session is running; idle for {idle_minutes} min, \
                     auto-stop in {remaining} min"
                )
            }
            None => "no active session".to_string(),
        }
    }

    fn scan_keep_alive(&self, line: &str) {
        if !self.controller.status().is_running {
            return;
        }
        let text = line.to_lowercase();
        if self.keywords.iter().any(|kw| text.contains(kw)) {
            debug!("keep-alive keyword observed, refreshing activity");
            self.controller.refresh_activity();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeClock, FakeDriver};
    use kernelbot_models::Credentials;
    use std::sync::atomic::Ordering;
    use tempfile::TempDir;

    fn test_config() -> BotConfig {
        BotConfig {
            credentials: Credentials {
                email: "user@example.com".to_string(),
                password: "secret".to_string(),
            },
            ..BotConfig::default()
        }
    }

    fn router_with(driver: Arc<FakeDriver>, config: BotConfig, temp: &TempDir) -> CommandRouter {
        let clock = Arc::new(FakeClock::at(1_000));
        let controller = Arc::new(SessionController::new(driver, clock));
        let registry = NotebookRegistry::load(temp.path().join("notebooks.json")).unwrap();
        CommandRouter::new(controller, registry, config)
    }

    #[test]
    fn parse_recognizes_commands() {
        assert_eq!(Command::parse("kaggle"), Some(Ok(Command::Help)));
        assert_eq!(Command::parse("/kaggle list"), Some(Ok(Command::List)));
        assert_eq!(
            Command::parse("kaggle add sd-bot alice/sd-nb"),
            Some(Ok(Command::Add {
                name: "sd-bot".to_string(),
                path: "alice/sd-nb".to_string(),
            }))
        );
        assert_eq!(
            Command::parse("kaggle run"),
            Some(Ok(Command::Run { target: None }))
        );
        assert_eq!(Command::parse("kaggle off"), Some(Ok(Command::Stop)));
        assert_eq!(Command::parse("just chatting"), None);
    }

    #[test]
    fn parse_reports_usage_errors() {
        assert!(matches!(Command::parse("kaggle add only-name"), Some(Err(_))));
        assert!(matches!(Command::parse("kaggle remove"), Some(Err(_))));
        assert!(matches!(Command::parse("kaggle frobnicate"), Some(Err(_))));
    }

    #[tokio::test]
    async fn add_then_run_by_name_starts_the_session() {
        let temp = TempDir::new().unwrap();
        let driver = Arc::new(FakeDriver::new());
        let router = router_with(driver.clone(), test_config(), &temp);

        let reply = router.handle_line("kaggle add demo alice/demo-nb").await;
        assert_eq!(reply.as_deref(), Some("registered demo -> alice/demo-nb"));

        let reply = router.handle_line("kaggle run demo").await.unwrap();
        assert!(reply.contains("alice/demo-nb"), "unexpected reply: {reply}");
        assert!(reply.contains("auto-stop"));
        assert_eq!(driver.run_calls.load(Ordering::SeqCst), 1);
        assert!(router.controller.status().is_running);
        assert!(router.controller.status().last_activity_ms.is_some());
    }

    #[tokio::test]
    async fn run_accepts_raw_notebook_path() {
        let temp = TempDir::new().unwrap();
        let driver = Arc::new(FakeDriver::new());
        let router = router_with(driver.clone(), test_config(), &temp);

        let reply = router.execute(Command::Run {
            target: Some("bob/raw-nb".to_string()),
        });
        assert!(reply.await.contains("bob/raw-nb"));
        assert_eq!(driver.run_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn run_with_unknown_name_does_not_touch_browser() {
        let temp = TempDir::new().unwrap();
        let driver = Arc::new(FakeDriver::new());
        let router = router_with(driver.clone(), test_config(), &temp);

        let reply = router.handle_line("kaggle run ghost").await.unwrap();
        assert!(reply.contains("no notebook named 'ghost'"));
        assert_eq!(driver.open_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn run_without_credentials_is_refused_up_front() {
        let temp = TempDir::new().unwrap();
        let driver = Arc::new(FakeDriver::new());
        let config = BotConfig::default();
        let router = router_with(driver.clone(), config, &temp);

        let reply = router.handle_line("kaggle run bob/raw-nb").await.unwrap();
        assert!(reply.contains("credentials"));
        assert_eq!(driver.open_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_login_yields_one_failure_reply() {
        let temp = TempDir::new().unwrap();
        let driver = Arc::new(FakeDriver::new().auth_fails());
        let router = router_with(driver.clone(), test_config(), &temp);

        let reply = router.handle_line("kaggle run bob/raw-nb").await.unwrap();
        assert!(reply.contains("login failed"));
        assert!(!router.controller.status().is_running);
    }

    #[tokio::test]
    async fn stop_when_idle_reports_nothing_running() {
        let temp = TempDir::new().unwrap();
        let driver = Arc::new(FakeDriver::new());
        let router = router_with(driver.clone(), test_config(), &temp);

        let reply = router.handle_line("kaggle stop").await.unwrap();
        assert_eq!(reply, "nothing is running");
        assert_eq!(driver.open_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn default_notebook_is_used_when_run_has_no_target() {
        let temp = TempDir::new().unwrap();
        let driver = Arc::new(FakeDriver::new());
        let config = BotConfig {
            default_notebook: Some("demo".to_string()),
            ..test_config()
        };
        let router = router_with(driver.clone(), config, &temp);
        let _ = router.handle_line("kaggle add demo alice/demo-nb").await;

        let reply = router.handle_line("kaggle run").await.unwrap();
        assert!(reply.contains("alice/demo-nb"), "unexpected reply: {reply}");
    }

    #[tokio::test]
    async fn keep_alive_keyword_refreshes_activity() {
        let temp = TempDir::new().unwrap();
        let driver = Arc::new(FakeDriver::new());
        let router = router_with(driver.clone(), test_config(), &temp);

        assert!(router.handle_line("kaggle run bob/raw-nb").await.is_some());
        let before = router.controller.status().last_activity_ms.unwrap();

        // Keyword scanning is case-insensitive and yields no reply
        assert!(router.handle_line("model still TRAINING fine").await.is_none());
        let after = router.controller.status().last_activity_ms.unwrap();
        assert!(after >= before);
    }

    #[tokio::test]
    async fn status_reports_idle_and_remaining_minutes() {
        let temp = TempDir::new().unwrap();
        let driver = Arc::new(FakeDriver::new());
        let router = router_with(driver.clone(), test_config(), &temp);

        let reply = router.handle_line("kaggle status").await.unwrap();
        assert_eq!(reply, "no active session");

        let _ = router.handle_line("kaggle run bob/raw-nb").await;
        let reply = router.handle_line("kaggle status").await.unwrap();
        assert!(reply.contains("running"));
        assert!(reply.contains("auto-stop in 30 min"));
    }
}
