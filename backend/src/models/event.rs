//! Event logging for simulation replay and inspection.
//!
//! This module defines the `SimEvent` enum which captures every scheduling
//! decision and state transition during a run. The log enables:
//! - Inspection (why did this task run at this tick?)
//! - Warnings side-channel (policy warnings never interrupt the tick loop)
//! - Rewind identity (the log is part of the snapshot, so rewinding a run
//!   also rewinds what it reported)
//!
//! # Event Types
//!
//! Events are grouped by tick phase:
//! - **Admission**: arrival, I/O return
//! - **Dispatch**: dispatch, preemption
//! - **Blocking**: I/O start, mutex acquire/block/release
//! - **Completion**: task finished
//! - **Warning**: non-fatal policy warning
//!
//! # Example
//!
//! ```rust
//! use cpu_scheduler_sim_core::models::event::{EventLog, SimEvent};
//! use cpu_scheduler_sim_core::models::task::TaskId;
//!
//! let mut log = EventLog::new();
//! log.log(SimEvent::Arrival { tick: 0, task: TaskId(0) });
//! log.log(SimEvent::Warning { tick: 0, message: "mutex m not held".to_string() });
//!
//! assert_eq!(log.events_at_tick(0).len(), 2);
//! assert_eq!(log.warnings().count(), 1);
//! ```

use crate::models::task::TaskId;
use serde::{Deserialize, Serialize};

/// Why a running task lost the CPU without blocking or finishing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreemptReason {
    /// A newly admitted task beat it
    Arrival,
    /// It used up its quantum
    Quantum,
}

/// Simulation event capturing a state change.
///
/// All events carry the tick they happened in. Events are logged in the
/// order they occur within a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SimEvent {
    /// Task reached its arrival tick and entered the ready queue
    Arrival { tick: usize, task: TaskId },

    /// Task finished its I/O block and re-entered the ready queue
    IoReturned { tick: usize, task: TaskId },

    /// Task was given the CPU
    Dispatched {
        tick: usize,
        task: TaskId,
        /// The tie-break chain had to fall back to randomness
        random_tie_break: bool,
    },

    /// Running task was put back in the ready queue
    Preempted {
        tick: usize,
        task: TaskId,
        reason: PreemptReason,
    },

    /// Task left the CPU to block on I/O
    IoStarted {
        tick: usize,
        task: TaskId,
        duration: usize,
    },

    /// Task became owner of a mutex (directly or by handoff)
    MutexAcquired {
        tick: usize,
        task: TaskId,
        mutex_id: String,
    },

    /// Task queued behind the current owner of a mutex
    MutexBlocked {
        tick: usize,
        task: TaskId,
        mutex_id: String,
    },

    /// Owner released a mutex
    MutexReleased {
        tick: usize,
        task: TaskId,
        mutex_id: String,
        /// Waiter that became the new owner, if any
        handed_to: Option<TaskId>,
    },

    /// Task executed its whole burst
    Finished { tick: usize, task: TaskId },

    /// Non-fatal policy warning
    Warning { tick: usize, message: String },
}

impl SimEvent {
    /// Get the tick number when this event occurred
    pub fn tick(&self) -> usize {
        match self {
            SimEvent::Arrival { tick, .. }
            | SimEvent::IoReturned { tick, .. }
            | SimEvent::Dispatched { tick, .. }
            | SimEvent::Preempted { tick, .. }
            | SimEvent::IoStarted { tick, .. }
            | SimEvent::MutexAcquired { tick, .. }
            | SimEvent::MutexBlocked { tick, .. }
            | SimEvent::MutexReleased { tick, .. }
            | SimEvent::Finished { tick, .. }
            | SimEvent::Warning { tick, .. } => *tick,
        }
    }

    /// Task the event is about, if any
    pub fn task(&self) -> Option<TaskId> {
        match self {
            SimEvent::Arrival { task, .. }
            | SimEvent::IoReturned { task, .. }
            | SimEvent::Dispatched { task, .. }
            | SimEvent::Preempted { task, .. }
            | SimEvent::IoStarted { task, .. }
            | SimEvent::MutexAcquired { task, .. }
            | SimEvent::MutexBlocked { task, .. }
            | SimEvent::MutexReleased { task, .. }
            | SimEvent::Finished { task, .. } => Some(*task),
            SimEvent::Warning { .. } => None,
        }
    }

    /// Get a short description of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            SimEvent::Arrival { .. } => "Arrival",
            SimEvent::IoReturned { .. } => "IoReturned",
            SimEvent::Dispatched { .. } => "Dispatched",
            SimEvent::Preempted { .. } => "Preempted",
            SimEvent::IoStarted { .. } => "IoStarted",
            SimEvent::MutexAcquired { .. } => "MutexAcquired",
            SimEvent::MutexBlocked { .. } => "MutexBlocked",
            SimEvent::MutexReleased { .. } => "MutexReleased",
            SimEvent::Finished { .. } => "Finished",
            SimEvent::Warning { .. } => "Warning",
        }
    }
}

/// Append-only log of simulation events
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<SimEvent>,
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Add an event to the log
    pub fn log(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Get all events
    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    /// Get events for a specific tick
    pub fn events_at_tick(&self, tick: usize) -> Vec<&SimEvent> {
        self.events.iter().filter(|e| e.tick() == tick).collect()
    }

    /// Get events of a specific type
    pub fn events_of_type(&self, event_type: &str) -> Vec<&SimEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Get events for a specific task
    pub fn events_for_task(&self, task: TaskId) -> Vec<&SimEvent> {
        self.events
            .iter()
            .filter(|e| e.task() == Some(task))
            .collect()
    }

    /// Messages of every recorded warning, oldest first
    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.events.iter().filter_map(|e| match e {
            SimEvent::Warning { message, .. } => Some(message.as_str()),
            _ => None,
        })
    }
}
