//! The command engine: one owned context tying the ledger, registry,
//! router and broadcaster together.
//!
//! Every mutating entry point publishes a status snapshot explicitly and
//! returns the [`PublishReport`] so callers and tests can see it happened.

use crate::broadcast::{BroadcastCoordinator, Delivery, Outbound, PublishReport};
use crate::fetch::{Fetcher, HttpFetcher};
use crate::ledger::TaskLedger;
use crate::registry::SessionRegistry;
use crate::router::{AgentIdentity, CommandRouter, StatsView, format_uptime};
use crate::{Result, ValonError};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;
use valon_types::{
    AggregateStats, CommandReceipt, Outcome, OutcomeKind, Session, StatusSnapshot, Submitter, Task,
};

/// Configuration for the engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub agent_name: String,
    pub version: String,
    pub status_label: String,
    pub system_info: String,
    pub max_tasks: usize,
    pub max_sessions: usize,
    pub fetch_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            agent_name: "VALON".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            status_label: "Active".to_string(),
            system_info: format!("VALON Agent v{} - Production", env!("CARGO_PKG_VERSION")),
            max_tasks: 1000,
            max_sessions: 100,
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

/// Result of [`Engine::submit_command`].
#[derive(Debug, Clone)]
pub struct Submission {
    pub receipt: CommandReceipt,
    /// `None` when the command was rejected before routing. Rejections are
    /// validation failures, so their outcome is `general`, never `error`.
    pub publish: Option<PublishReport>,
}

/// Result of [`Engine::on_connect`].
#[derive(Debug, Clone)]
pub struct Connected {
    pub session: Session,
    pub snapshot: StatusSnapshot,
    pub publish: PublishReport,
}

/// Result of [`Engine::on_disconnect`].
#[derive(Debug, Clone)]
pub struct Disconnected {
    /// The removed session, if it was still registered.
    pub session: Option<Session>,
    pub publish: PublishReport,
}

/// Session/task/command-dispatch engine.
pub struct Engine {
    ledger: TaskLedger,
    registry: SessionRegistry,
    router: CommandRouter,
    broadcaster: BroadcastCoordinator,
    started_at: DateTime<Utc>,
    started: Instant,
}

impl Engine {
    pub fn new(config: EngineConfig, fetcher: Arc<dyn Fetcher>, outbound: Arc<dyn Outbound>) -> Self {
        let identity = AgentIdentity {
            name: config.agent_name,
            version: config.version,
            status_label: config.status_label,
            system_info: config.system_info,
        };
        let broadcaster =
            BroadcastCoordinator::new(outbound, identity.status_label.clone(), identity.version.clone());

        Self {
            ledger: TaskLedger::new(config.max_tasks),
            registry: SessionRegistry::new(config.max_sessions),
            router: CommandRouter::new(identity, fetcher),
            broadcaster,
            started_at: Utc::now(),
            started: Instant::now(),
        }
    }

    /// Build an engine that fetches over HTTP with the configured timeout.
    pub fn with_http_fetcher(config: EngineConfig, outbound: Arc<dyn Outbound>) -> Result<Self> {
        let fetcher = HttpFetcher::new(config.fetch_timeout).map_err(|e| ValonError::Fetch(e.to_string()))?;
        Ok(Self::new(config, Arc::new(fetcher), outbound))
    }

    /// Record, route and report one command.
    ///
    /// Session submitters get the result delivered to their own channel
    /// before the status broadcast goes out.
    pub async fn submit_command(&self, submitter: Submitter, command: &str) -> Submission {
        let session_id = submitter.session_id();

        if command.trim().is_empty() {
            let receipt = CommandReceipt {
                task_id: None,
                command: command.to_string(),
                outcome: Outcome::failure(OutcomeKind::General, "No command provided"),
            };
            if let Some(id) = session_id {
                self.deliver(id, Delivery::CommandResult(receipt.clone()));
            }
            return Submission { receipt, publish: None };
        }

        if let Some(id) = session_id {
            if self.registry.record_command(id).is_none() {
                debug!(target: "valon::engine", "Command from departed session {}", id);
            }
        }

        let task = self.ledger.add(command, submitter.clone());
        let outcome = self.router.execute(command, &submitter, self).await;

        match self.ledger.record_outcome(&task, outcome.clone()) {
            Ok(status) => info!(
                target: "valon::engine",
                "Task {} {:?} ({:?}) from {}",
                task.id(), status, outcome.kind, submitter
            ),
            Err(e) => warn!(target: "valon::engine", "Could not record outcome: {}", e),
        }

        let receipt = CommandReceipt {
            task_id: Some(task.id()),
            command: command.to_string(),
            outcome,
        };
        if let Some(id) = session_id {
            self.deliver(id, Delivery::CommandResult(receipt.clone()));
        }

        let publish = self.publish_status();
        Submission {
            receipt,
            publish: Some(publish),
        }
    }

    /// Register a new connection and tell everyone about it.
    pub fn on_connect(&self, id: Uuid, remote_address: &str) -> Result<Connected> {
        let session = self.registry.register(id, remote_address, Utc::now())?;
        let snapshot = self.status_snapshot();
        let publish = self.broadcaster.publish(&snapshot, &self.registry.list_ids());
        Ok(Connected {
            session,
            snapshot,
            publish,
        })
    }

    /// Drop a connection and tell the remaining sessions.
    pub fn on_disconnect(&self, id: Uuid) -> Disconnected {
        let session = self.registry.unregister(id);
        let publish = self.publish_status();
        Disconnected { session, publish }
    }

    fn publish_status(&self) -> PublishReport {
        let snapshot = self.status_snapshot();
        self.broadcaster.publish(&snapshot, &self.registry.list_ids())
    }

    fn deliver(&self, id: Uuid, delivery: Delivery) {
        if let Err(e) = self.broadcaster.outbound().deliver(id, delivery) {
            debug!(target: "valon::engine", "Result not delivered: {}", e);
        }
    }

    /// Hand a snapshot to a single session (e.g. on `get_status`).
    pub fn send_status(&self, id: Uuid) -> Result<()> {
        self.broadcaster
            .outbound()
            .deliver(id, Delivery::Status(self.status_snapshot()))
    }

    pub fn status_snapshot(&self) -> StatusSnapshot {
        self.broadcaster.snapshot(
            &self.ledger,
            &self.registry,
            self.router.commands_executed(),
            self.started.elapsed(),
        )
    }

    pub fn aggregate_stats(&self) -> AggregateStats {
        let identity = self.router.identity();
        let sessions = self.registry.active_count();
        AggregateStats {
            status: "online".to_string(),
            agent_status: identity.status_label.clone(),
            uptime: format_uptime(self.started.elapsed()),
            started_at: self.started_at,
            commands_executed: self.router.commands_executed(),
            active_users: sessions,
            active_sessions: sessions,
            total_tasks: self.ledger.count(),
            version: identity.version.clone(),
            timestamp: Utc::now(),
        }
    }

    pub fn recent_tasks(&self, n: usize) -> Vec<Task> {
        self.ledger.recent(n)
    }

    pub fn task_count(&self) -> usize {
        self.ledger.count()
    }

    pub fn sessions(&self) -> Vec<Session> {
        self.registry.list()
    }

    pub fn session(&self, id: Uuid) -> Option<Session> {
        self.registry.get(id)
    }

    pub fn session_count(&self) -> usize {
        self.registry.active_count()
    }

    pub fn commands_executed(&self) -> u64 {
        self.router.commands_executed()
    }

    pub fn publish_count(&self) -> u64 {
        self.broadcaster.publish_count()
    }
}

impl StatsView for Engine {
    fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    fn session_count(&self) -> usize {
        self.registry.active_count()
    }

    fn session_ids(&self) -> Vec<Uuid> {
        self.registry.list_ids()
    }

    fn task_count(&self) -> usize {
        self.ledger.count()
    }
}
