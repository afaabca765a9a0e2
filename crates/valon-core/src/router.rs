//! Command routing.
//!
//! Commands are matched by prefix in a fixed order: `system:`, `web:`,
//! `calculate:`, then the exact words `status` and `help`. Anything else is
//! acknowledged as a general command.

use crate::calc::{self, CalcError};
use crate::fetch::Fetcher;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, error};
use uuid::Uuid;
use valon_types::{
    MemoryReport, Outcome, OutcomeBody, OutcomeKind, StatusReport, Submitter, UsersReport,
};

/// Names and labels the router reports about itself.
#[derive(Debug, Clone)]
pub struct AgentIdentity {
    pub name: String,
    pub version: String,
    pub status_label: String,
    pub system_info: String,
}

impl AgentIdentity {
    pub fn display_name(&self) -> String {
        format!("{} Agent", self.name)
    }
}

/// Read-only access to the state the router reports on.
pub trait StatsView: Send + Sync {
    fn uptime(&self) -> Duration;
    fn session_count(&self) -> usize;
    fn session_ids(&self) -> Vec<Uuid>;
    fn task_count(&self) -> usize;
}

/// Maps command text to an [`Outcome`].
pub struct CommandRouter {
    identity: AgentIdentity,
    fetcher: Arc<dyn Fetcher>,
    commands_executed: AtomicU64,
}

impl CommandRouter {
    pub fn new(identity: AgentIdentity, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            identity,
            fetcher,
            commands_executed: AtomicU64::new(0),
        }
    }

    pub fn identity(&self) -> &AgentIdentity {
        &self.identity
    }

    /// Commands routed since start, regardless of outcome.
    pub fn commands_executed(&self) -> u64 {
        self.commands_executed.load(Ordering::SeqCst)
    }

    /// Route one command. Never fails: handler panics become `error` outcomes.
    pub async fn execute(&self, command: &str, submitter: &Submitter, stats: &dyn StatsView) -> Outcome {
        let count = self.commands_executed.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(target: "valon::router", "Routing command #{} from {}: {}", count, submitter, command);

        match AssertUnwindSafe(self.dispatch(command, stats)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(target: "valon::router", "Command execution error: {}", message);
                Outcome::failure(OutcomeKind::Error, format!("Error processing command: {}", message))
            }
        }
    }

    async fn dispatch(&self, command: &str, stats: &dyn StatsView) -> Outcome {
        if let Some(rest) = command.strip_prefix("system:") {
            self.system(rest.trim(), stats)
        } else if let Some(rest) = command.strip_prefix("web:") {
            self.web(rest.trim(), stats).await
        } else if let Some(rest) = command.strip_prefix("calculate:") {
            calculate(rest.trim())
        } else if command == "status" {
            self.status(stats)
        } else if command == "help" {
            Outcome::success(OutcomeKind::Help, self.help_text())
        } else {
            Outcome::success(
                OutcomeKind::General,
                format!("Command '{}' processed by {}", command, self.identity.display_name()),
            )
        }
    }

    fn system(&self, action: &str, stats: &dyn StatsView) -> Outcome {
        match action {
            "memory" => {
                let sessions = stats.session_count();
                Outcome::success(
                    OutcomeKind::System,
                    OutcomeBody::Memory(MemoryReport {
                        commands_executed: self.commands_executed(),
                        uptime: format_uptime(stats.uptime()),
                        active_users: sessions,
                        active_sessions: sessions,
                        total_tasks: stats.task_count(),
                        system_info: self.identity.system_info.clone(),
                    }),
                )
            }
            "users" => {
                let user_list = stats.session_ids();
                Outcome::success(
                    OutcomeKind::System,
                    OutcomeBody::Users(UsersReport {
                        total_users: user_list.len(),
                        active_sessions: user_list.len(),
                        user_list,
                    }),
                )
            }
            _ => Outcome::success(OutcomeKind::System, "System command executed"),
        }
    }

    async fn web(&self, action: &str, stats: &dyn StatsView) -> Outcome {
        if action == "users" {
            return Outcome::success(
                OutcomeKind::Web,
                format!("Web users: {} active sessions", stats.session_count()),
            );
        }

        if let Some(url) = action.strip_prefix("fetch ") {
            let url = url.trim();
            return match self.fetcher.fetch(url).await {
                Ok(status) => Outcome::success(
                    OutcomeKind::Web,
                    format!("Fetched {} - Status: {}", url, status),
                ),
                Err(e) => {
                    debug!(target: "valon::router", "Fetch of {} failed: {}", url, e);
                    Outcome::failure(OutcomeKind::Web, format!("Failed to fetch {}: {}", url, e))
                }
            };
        }

        Outcome::success(OutcomeKind::Web, "Web command executed")
    }

    fn status(&self, stats: &dyn StatsView) -> Outcome {
        Outcome::success(
            OutcomeKind::Status,
            OutcomeBody::Status(StatusReport {
                status: self.identity.status_label.clone(),
                uptime: format_uptime(stats.uptime()),
                commands_executed: self.commands_executed(),
                active_users: stats.session_count(),
                total_tasks: stats.task_count(),
                version: self.identity.version.clone(),
            }),
        )
    }

    fn help_text(&self) -> String {
        format!(
            "{} Commands:\n\
             - system:memory - Show system memory and stats\n\
             - system:users - Show user information\n\
             - web:users - Show web user count\n\
             - web:fetch [url] - Fetch a web page\n\
             - calculate:[expression] - Perform calculations\n\
             - status - Show agent status\n\
             - help - Show this help message",
            self.identity.display_name()
        )
    }
}

fn calculate(expression: &str) -> Outcome {
    match calc::evaluate(expression) {
        Ok(value) => Outcome::success(
            OutcomeKind::Calculation,
            format!("{} = {}", expression, calc::format_value(value)),
        ),
        Err(e @ (CalcError::InvalidCharacters | CalcError::Empty)) => {
            Outcome::failure(OutcomeKind::Calculation, e.to_string())
        }
        Err(e) => Outcome::failure(OutcomeKind::Calculation, format!("Calculation error: {}", e)),
    }
}

/// Format a duration as `H:MM:SS`, prefixed with whole days when present.
pub fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    match days {
        0 => format!("{}:{:02}:{:02}", hours, minutes, seconds),
        1 => format!("1 day, {}:{:02}:{:02}", hours, minutes, seconds),
        _ => format!("{} days, {}:{:02}:{:02}", days, hours, minutes, seconds),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "internal error".to_string()
    }
}
