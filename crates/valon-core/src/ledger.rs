//! Bounded task ledger.
//!
//! Every submitted command becomes a task. The ledger holds at most
//! `capacity` tasks; appending at capacity evicts the oldest one first. Ids
//! are assigned under the same lock as the append, so they never repeat or
//! skip, and they are not reused after eviction.

use crate::{Result, ValonError};
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use tracing::{debug, warn};
use valon_types::{Outcome, Submitter, Task, TaskStatus};

/// A live task. Immutable apart from its outcome, which is written once.
#[derive(Debug)]
pub struct TaskRecord {
    id: u64,
    command: String,
    user: Submitter,
    submitted_at: DateTime<Utc>,
    outcome: OnceLock<Outcome>,
}

impl TaskRecord {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn user(&self) -> &Submitter {
        &self.user
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.get()
    }

    pub fn status(&self) -> TaskStatus {
        match self.outcome.get() {
            Some(outcome) => TaskStatus::from_success(outcome.success),
            None => TaskStatus::Pending,
        }
    }

    /// Copy out a serializable view.
    pub fn snapshot(&self) -> Task {
        Task {
            id: self.id,
            command: self.command.clone(),
            user: self.user.clone(),
            submitted_at: self.submitted_at,
            status: self.status(),
            result: self.outcome.get().cloned(),
        }
    }
}

struct LedgerInner {
    tasks: VecDeque<Arc<TaskRecord>>,
    next_id: u64,
}

/// Ring-buffer store of recent tasks.
pub struct TaskLedger {
    capacity: usize,
    inner: Mutex<LedgerInner>,
}

impl TaskLedger {
    /// Create a ledger holding at most `capacity` tasks (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            inner: Mutex::new(LedgerInner {
                tasks: VecDeque::with_capacity(capacity.min(1024)),
                next_id: 1,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LedgerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a pending task, evicting the oldest one if at capacity.
    pub fn add(&self, command: impl Into<String>, user: Submitter) -> Arc<TaskRecord> {
        let mut inner = self.lock();

        if inner.tasks.len() >= self.capacity {
            if let Some(evicted) = inner.tasks.pop_front() {
                debug!(target: "valon::ledger", "Evicted task {} (capacity {})", evicted.id, self.capacity);
            }
        }

        let id = inner.next_id;
        inner.next_id += 1;

        let task = Arc::new(TaskRecord {
            id,
            command: command.into(),
            user,
            submitted_at: Utc::now(),
            outcome: OnceLock::new(),
        });
        inner.tasks.push_back(Arc::clone(&task));
        task
    }

    /// Record the terminal outcome of a task. Only the first call succeeds.
    pub fn record_outcome(&self, task: &TaskRecord, outcome: Outcome) -> Result<TaskStatus> {
        let status = TaskStatus::from_success(outcome.success);
        if task.outcome.set(outcome).is_err() {
            warn!(target: "valon::ledger", "Rejected second outcome for task {}", task.id);
            return Err(ValonError::TaskAlreadyCompleted(task.id));
        }
        Ok(status)
    }

    /// Most recent `n` tasks, oldest first.
    pub fn recent(&self, n: usize) -> Vec<Task> {
        let inner = self.lock();
        let skip = inner.tasks.len().saturating_sub(n);
        inner.tasks.iter().skip(skip).map(|t| t.snapshot()).collect()
    }

    pub fn count(&self) -> usize {
        self.lock().tasks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use valon_types::OutcomeKind;

    #[test]
    fn test_add_assigns_sequential_ids() {
        let ledger = TaskLedger::new(10);
        let a = ledger.add("help", Submitter::Anonymous);
        let b = ledger.add("status", Submitter::Anonymous);
        assert_eq!(a.id(), 1);
        assert_eq!(b.id(), 2);
        assert_eq!(a.status(), TaskStatus::Pending);
        assert!(a.outcome().is_none());
        assert_eq!(ledger.count(), 2);
    }

    #[test]
    fn test_eviction_keeps_newest() {
        let ledger = TaskLedger::new(3);
        for i in 0..5 {
            ledger.add(format!("cmd {}", i), Submitter::Anonymous);
        }
        assert_eq!(ledger.count(), 3);
        let ids: Vec<u64> = ledger.recent(10).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3, 4, 5]);

        // Ids keep climbing after eviction
        let next = ledger.add("again", Submitter::Anonymous);
        assert_eq!(next.id(), 6);
        let ids: Vec<u64> = ledger.recent(10).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![4, 5, 6]);
    }

    #[test]
    fn test_recent_orders_newest_last() {
        let ledger = TaskLedger::new(100);
        for i in 0..20 {
            ledger.add(format!("cmd {}", i), Submitter::Anonymous);
        }
        let recent = ledger.recent(10);
        assert_eq!(recent.len(), 10);
        assert_eq!(recent.first().map(|t| t.id), Some(11));
        assert_eq!(recent.last().map(|t| t.id), Some(20));
        assert_eq!(recent.last().map(|t| t.command.as_str()), Some("cmd 19"));
        assert!(ledger.recent(0).is_empty());
    }

    #[test]
    fn test_record_outcome_once() {
        let ledger = TaskLedger::new(10);
        let task = ledger.add("calculate:1/0", Submitter::Anonymous);

        let status = ledger
            .record_outcome(&task, Outcome::failure(OutcomeKind::Calculation, "division by zero"))
            .unwrap();
        assert_eq!(status, TaskStatus::Failed);

        let second = ledger.record_outcome(&task, Outcome::success(OutcomeKind::General, "ok"));
        assert!(matches!(second, Err(ValonError::TaskAlreadyCompleted(1))));

        // First terminal transition is preserved
        let snapshot = task.snapshot();
        assert_eq!(snapshot.status, TaskStatus::Failed);
        assert_eq!(
            snapshot.result.as_ref().and_then(|o| o.result.as_text()),
            Some("division by zero")
        );
    }

    #[test]
    fn test_concurrent_completion_single_winner() {
        let ledger = Arc::new(TaskLedger::new(10));
        let task = ledger.add("status", Submitter::Anonymous);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let ledger = Arc::clone(&ledger);
                let task = Arc::clone(&task);
                std::thread::spawn(move || {
                    ledger
                        .record_outcome(&task, Outcome::success(OutcomeKind::General, format!("{}", i)))
                        .is_ok()
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(task.status(), TaskStatus::Completed);
    }

    #[test]
    fn test_concurrent_adds_never_duplicate_ids() {
        let ledger = Arc::new(TaskLedger::new(10_000));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                std::thread::spawn(move || {
                    (0..250)
                        .map(|_| ledger.add("help", Submitter::Anonymous).id())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=2000).collect::<Vec<u64>>());
        assert_eq!(ledger.count(), 2000);
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let ledger = TaskLedger::new(0);
        ledger.add("a", Submitter::Anonymous);
        ledger.add("b", Submitter::Anonymous);
        assert_eq!(ledger.count(), 1);
        assert_eq!(ledger.recent(10)[0].command, "b");
    }

    proptest! {
        #[test]
        fn prop_ledger_bounded_and_keeps_newest(capacity in 1usize..16, adds in 0usize..64) {
            let ledger = TaskLedger::new(capacity);
            let mut last_id = 0;
            for _ in 0..adds {
                let id = ledger.add("cmd", Submitter::Anonymous).id();
                prop_assert!(id > last_id);
                last_id = id;
                prop_assert!(ledger.count() <= capacity);
            }

            let held: Vec<u64> = ledger.recent(capacity).iter().map(|t| t.id).collect();
            let first = adds.saturating_sub(capacity) as u64 + 1;
            let expected: Vec<u64> = (first..=adds as u64).collect();
            prop_assert_eq!(held, expected);
        }
    }
}
