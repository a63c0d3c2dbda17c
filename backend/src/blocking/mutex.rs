//! Mutex Table
//!
//! Tracks ownership and FIFO wait queues of named mutual-exclusion
//! resources. Mutexes are created lazily on first reference and never
//! pre-declared.
//!
//! # Critical Invariants
//!
//! 1. A task waits on at most one mutex at a time
//! 2. An owner is never also waiting on any mutex
//! 3. Waiters are handed ownership strictly in arrival order

use crate::models::task::TaskId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use tracing::warn;

/// Ownership state of one mutex
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutexState {
    owner: Option<TaskId>,
    wait_queue: VecDeque<TaskId>,
}

impl MutexState {
    pub fn owner(&self) -> Option<TaskId> {
        self.owner
    }

    /// Waiting tasks, head first
    pub fn waiters(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.wait_queue.iter().copied()
    }
}

/// Result of [`MutexTable::acquire`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// Caller owns the mutex (now or already)
    Acquired,
    /// Caller was queued; it must leave the running/ready state
    Blocked,
}

/// Result of [`MutexTable::release`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// Ownership given up; `handed_to` is the waiter that now owns it and
    /// must be re-admitted by the caller
    Released { handed_to: Option<TaskId> },
    /// Caller did not own the mutex; nothing changed
    NotOwner { owner: Option<TaskId> },
}

/// All mutexes referenced so far, by name
///
/// # Example
///
/// ```rust
/// use cpu_scheduler_sim_core::blocking::mutex::{AcquireOutcome, MutexTable, ReleaseOutcome};
/// use cpu_scheduler_sim_core::models::task::TaskId;
///
/// let mut table = MutexTable::new();
/// assert_eq!(table.acquire(TaskId(0), "disk"), AcquireOutcome::Acquired);
/// assert_eq!(table.acquire(TaskId(1), "disk"), AcquireOutcome::Blocked);
///
/// let outcome = table.release(TaskId(0), "disk");
/// assert_eq!(outcome, ReleaseOutcome::Released { handed_to: Some(TaskId(1)) });
/// assert_eq!(table.owner("disk"), Some(TaskId(1)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutexTable {
    mutexes: BTreeMap<String, MutexState>,
}

impl MutexTable {
    pub fn new() -> Self {
        Self {
            mutexes: BTreeMap::new(),
        }
    }

    /// Try to take `mutex_id` for `task`
    ///
    /// Re-acquiring a mutex the task already owns succeeds without queuing.
    ///
    /// # Panics
    ///
    /// Panics if `task` is already waiting on some mutex.
    pub fn acquire(&mut self, task: TaskId, mutex_id: &str) -> AcquireOutcome {
        assert!(
            self.waiting_on(task).is_none(),
            "task {} requested mutex {} while already waiting",
            task,
            mutex_id
        );

        let state = self.mutexes.entry(mutex_id.to_string()).or_default();
        match state.owner {
            None => {
                state.owner = Some(task);
                AcquireOutcome::Acquired
            }
            Some(owner) if owner == task => AcquireOutcome::Acquired,
            Some(_) => {
                state.wait_queue.push_back(task);
                AcquireOutcome::Blocked
            }
        }
    }

    /// Give up `mutex_id` on behalf of `task`
    ///
    /// The head of the wait queue, if any, becomes the new owner. Releasing a
    /// mutex the task does not own is a no-op with a warning.
    pub fn release(&mut self, task: TaskId, mutex_id: &str) -> ReleaseOutcome {
        let state = self.mutexes.entry(mutex_id.to_string()).or_default();

        if state.owner != Some(task) {
            warn!(
                task = %task,
                mutex = mutex_id,
                owner = ?state.owner,
                "release ignored: task does not own mutex"
            );
            return ReleaseOutcome::NotOwner { owner: state.owner };
        }

        let handed_to = state.wait_queue.pop_front();
        state.owner = handed_to;
        ReleaseOutcome::Released { handed_to }
    }

    pub fn get(&self, mutex_id: &str) -> Option<&MutexState> {
        self.mutexes.get(mutex_id)
    }

    pub fn owner(&self, mutex_id: &str) -> Option<TaskId> {
        self.mutexes.get(mutex_id).and_then(|m| m.owner)
    }

    /// Mutex `task` is queued on, if any
    pub fn waiting_on(&self, task: TaskId) -> Option<&str> {
        self.mutexes
            .iter()
            .find(|(_, m)| m.wait_queue.contains(&task))
            .map(|(name, _)| name.as_str())
    }

    /// Names of all mutexes owned by `task`
    pub fn owned_by(&self, task: TaskId) -> Vec<String> {
        self.mutexes
            .iter()
            .filter(|(_, m)| m.owner == Some(task))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// All mutexes in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MutexState)> {
        self.mutexes.iter().map(|(name, m)| (name.as_str(), m))
    }

    /// Total tasks waiting across all mutexes
    pub fn num_waiting(&self) -> usize {
        self.mutexes.values().map(|m| m.wait_queue.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutex_created_lazily() {
        let mut table = MutexTable::new();
        assert!(table.get("m").is_none());
        table.acquire(TaskId(0), "m");
        assert!(table.get("m").is_some());
    }

    #[test]
    fn test_reacquire_by_owner_is_idempotent() {
        let mut table = MutexTable::new();
        assert_eq!(table.acquire(TaskId(0), "m"), AcquireOutcome::Acquired);
        assert_eq!(table.acquire(TaskId(0), "m"), AcquireOutcome::Acquired);
        assert_eq!(table.num_waiting(), 0);
    }

    #[test]
    fn test_waiters_handed_off_in_fifo_order() {
        let mut table = MutexTable::new();
        table.acquire(TaskId(0), "m");
        assert_eq!(table.acquire(TaskId(1), "m"), AcquireOutcome::Blocked);
        assert_eq!(table.acquire(TaskId(2), "m"), AcquireOutcome::Blocked);
        assert_eq!(table.waiting_on(TaskId(2)), Some("m"));

        assert_eq!(
            table.release(TaskId(0), "m"),
            ReleaseOutcome::Released {
                handed_to: Some(TaskId(1))
            }
        );
        assert_eq!(
            table.release(TaskId(1), "m"),
            ReleaseOutcome::Released {
                handed_to: Some(TaskId(2))
            }
        );
        assert_eq!(
            table.release(TaskId(2), "m"),
            ReleaseOutcome::Released { handed_to: None }
        );
        assert_eq!(table.owner("m"), None);
    }

    #[test]
    fn test_release_by_non_owner_is_noop() {
        let mut table = MutexTable::new();
        table.acquire(TaskId(0), "m");
        table.acquire(TaskId(1), "m");

        let outcome = table.release(TaskId(1), "m");
        assert_eq!(
            outcome,
            ReleaseOutcome::NotOwner {
                owner: Some(TaskId(0))
            }
        );
        assert_eq!(table.owner("m"), Some(TaskId(0)));
        assert_eq!(table.waiting_on(TaskId(1)), Some("m"));
    }

    #[test]
    fn test_release_never_acquired_mutex() {
        let mut table = MutexTable::new();
        assert_eq!(
            table.release(TaskId(3), "ghost"),
            ReleaseOutcome::NotOwner { owner: None }
        );
    }

    #[test]
    #[should_panic(expected = "while already waiting")]
    fn test_double_wait_panics() {
        let mut table = MutexTable::new();
        table.acquire(TaskId(0), "a");
        table.acquire(TaskId(0), "b");
        table.acquire(TaskId(1), "a");
        table.acquire(TaskId(1), "b");
    }

    #[test]
    fn test_owned_by() {
        let mut table = MutexTable::new();
        table.acquire(TaskId(0), "b");
        table.acquire(TaskId(0), "a");
        table.acquire(TaskId(1), "c");
        assert_eq!(table.owned_by(TaskId(0)), vec!["a".to_string(), "b".to_string()]);
    }
}
