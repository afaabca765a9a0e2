//! Status fan-out to connected sessions.

use crate::ledger::TaskLedger;
use crate::registry::SessionRegistry;
use crate::router::format_uptime;
use crate::Result;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;
use valon_types::{CommandReceipt, StatusSnapshot};

/// Payload handed to the transport for one session.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Status(StatusSnapshot),
    CommandResult(CommandReceipt),
}

/// Result of one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub recipients: usize,
    pub delivered: usize,
    pub failed: usize,
}

/// Transport side of delivery. The transport owns serialization and framing.
pub trait Outbound: Send + Sync {
    /// Hand a payload to one session's outbound channel.
    fn deliver(&self, session_id: Uuid, delivery: Delivery) -> Result<()>;

    /// Deliver to every listed session. A failure for one session does not
    /// stop delivery to the rest.
    fn deliver_all(&self, sessions: &[Uuid], delivery: &Delivery) -> PublishReport {
        let mut report = PublishReport {
            recipients: sessions.len(),
            ..PublishReport::default()
        };
        for &session_id in sessions {
            match self.deliver(session_id, delivery.clone()) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    debug!(target: "valon::broadcast", "Skipping session {}: {}", session_id, e);
                    report.failed += 1;
                }
            }
        }
        report
    }
}

/// Composes status snapshots and pushes them to every session.
pub struct BroadcastCoordinator {
    outbound: Arc<dyn Outbound>,
    status_label: String,
    version: String,
    publishes: AtomicU64,
}

impl BroadcastCoordinator {
    pub fn new(outbound: Arc<dyn Outbound>, status_label: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            outbound,
            status_label: status_label.into(),
            version: version.into(),
            publishes: AtomicU64::new(0),
        }
    }

    pub fn outbound(&self) -> &Arc<dyn Outbound> {
        &self.outbound
    }

    /// Read current counts. Each owner is locked only for its own read.
    pub fn snapshot(
        &self,
        ledger: &TaskLedger,
        registry: &SessionRegistry,
        commands_executed: u64,
        uptime: Duration,
    ) -> StatusSnapshot {
        let sessions = registry.active_count();
        StatusSnapshot {
            status: self.status_label.clone(),
            uptime: format_uptime(uptime),
            commands_executed,
            user_count: sessions,
            session_count: sessions,
            task_count: ledger.count(),
            version: self.version.clone(),
        }
    }

    /// Deliver a snapshot to the given sessions.
    pub fn publish(&self, snapshot: &StatusSnapshot, sessions: &[Uuid]) -> PublishReport {
        self.publishes.fetch_add(1, Ordering::SeqCst);
        let report = self
            .outbound
            .deliver_all(sessions, &Delivery::Status(snapshot.clone()));
        debug!(
            target: "valon::broadcast",
            "Published status to {}/{} sessions",
            report.delivered, report.recipients
        );
        report
    }

    /// Number of publishes since start.
    pub fn publish_count(&self) -> u64 {
        self.publishes.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::RecordingOutbound;
    use chrono::Utc;
    use valon_types::Submitter;

    #[test]
    fn test_snapshot_reads_counts() {
        let coordinator = BroadcastCoordinator::new(Arc::new(RecordingOutbound::default()), "Active", "2.1.0");
        let ledger = TaskLedger::new(10);
        let registry = SessionRegistry::new(10);
        registry.register(Uuid::new_v4(), "a", Utc::now()).unwrap();
        ledger.add("help", Submitter::Anonymous);
        ledger.add("status", Submitter::Anonymous);

        let snapshot = coordinator.snapshot(&ledger, &registry, 7, Duration::from_secs(65));
        assert_eq!(snapshot.status, "Active");
        assert_eq!(snapshot.uptime, "0:01:05");
        assert_eq!(snapshot.commands_executed, 7);
        assert_eq!(snapshot.user_count, 1);
        assert_eq!(snapshot.session_count, 1);
        assert_eq!(snapshot.task_count, 2);
        assert_eq!(snapshot.version, "2.1.0");
    }

    #[test]
    fn test_publish_skips_closed_channels() {
        let dead = Uuid::new_v4();
        let live = vec![Uuid::new_v4(), Uuid::new_v4()];
        let outbound = Arc::new(RecordingOutbound::default());
        outbound.close(dead);
        let coordinator = BroadcastCoordinator::new(outbound.clone(), "Active", "2.1.0");
        let snapshot = coordinator.snapshot(&TaskLedger::new(1), &SessionRegistry::new(1), 0, Duration::ZERO);

        let report = coordinator.publish(&snapshot, &[live[0], dead, live[1]]);
        assert_eq!(
            report,
            PublishReport {
                recipients: 3,
                delivered: 2,
                failed: 1
            }
        );

        let delivered = outbound.delivered.lock().unwrap();
        let ids: Vec<Uuid> = delivered.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, live);
        assert!(delivered.iter().all(|(_, d)| *d == Delivery::Status(snapshot.clone())));
        assert_eq!(coordinator.publish_count(), 1);
    }

    #[test]
    fn test_publish_to_nobody() {
        let coordinator = BroadcastCoordinator::new(Arc::new(RecordingOutbound::default()), "Active", "2.1.0");
        let snapshot = coordinator.snapshot(&TaskLedger::new(1), &SessionRegistry::new(1), 0, Duration::ZERO);
        let report = coordinator.publish(&snapshot, &[]);
        assert_eq!(report, PublishReport::default());
        assert_eq!(coordinator.publish_count(), 1);
    }
}
