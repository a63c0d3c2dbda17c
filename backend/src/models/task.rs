//! Task model
//!
//! A task is one schedulable unit of work. Each task has:
//! - Identity (config id, display color) and a stable arena index
//! - Arrival tick and total CPU burst (`duration`)
//! - Static priority and a working (dynamic) priority used by aging
//! - Remaining time and an append-only execution history
//! - Blocking events keyed by how many ticks the task has executed
//!
//! CRITICAL: `remaining_time == duration - execution_history.len()` at all
//! times. Only the orchestrator and scheduler mutate a task, through the
//! crate-private methods below; everything else reads.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable arena index of a task
///
/// Tasks are addressed by position in the config, never by reference, so a
/// `TaskId` taken from one snapshot still names the same task in any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub usize);

impl TaskId {
    /// Position of the task in config order
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What happens when a task event fires
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// Block on I/O for `duration` ticks
    Io { duration: usize },

    /// Try to acquire a mutex
    MutexLock { mutex_id: String },

    /// Release a mutex held by this task
    MutexUnlock { mutex_id: String },
}

/// A blocking event attached to a task
///
/// `start_offset` counts *executed* ticks: an event with offset 2 fires right
/// after the task's second tick on the CPU.
///
/// # Example
/// ```
/// use cpu_scheduler_sim_core::models::task::{EventKind, TaskEvent};
///
/// let io = TaskEvent::io(2, 3);
/// assert_eq!(io.start_offset, 2);
/// assert_eq!(io.kind, EventKind::Io { duration: 3 });
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEvent {
    pub start_offset: usize,
    pub kind: EventKind,
}

impl TaskEvent {
    pub fn io(start_offset: usize, duration: usize) -> Self {
        Self {
            start_offset,
            kind: EventKind::Io { duration },
        }
    }

    pub fn lock(start_offset: usize, mutex_id: impl Into<String>) -> Self {
        Self {
            start_offset,
            kind: EventKind::MutexLock {
                mutex_id: mutex_id.into(),
            },
        }
    }

    pub fn unlock(start_offset: usize, mutex_id: impl Into<String>) -> Self {
        Self {
            start_offset,
            kind: EventKind::MutexUnlock {
                mutex_id: mutex_id.into(),
            },
        }
    }

    /// Firing order within one offset: mutex events before I/O
    fn fire_rank(&self) -> u8 {
        match self.kind {
            EventKind::MutexLock { .. } | EventKind::MutexUnlock { .. } => 0,
            EventKind::Io { .. } => 1,
        }
    }
}

/// I/O block currently in progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveIo {
    /// Index into the task's event list of the I/O event being served
    pub event_index: usize,
    /// Ticks left before the task returns to the ready queue
    pub remaining: usize,
}

/// Observable lifecycle state of a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    /// Arrival tick not reached yet
    Waiting,
    /// In the ready queue
    Ready,
    /// Holds the CPU
    Running,
    /// Counting down an I/O block
    BlockedIo,
    /// Waiting in a mutex queue
    BlockedMutex { mutex_id: String },
    /// Executed its whole burst
    Finished,
}

/// A schedulable task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Arena index (config order)
    index: TaskId,

    /// Config identifier, unique per simulation
    id: String,

    /// Display color, opaque to the engine
    color: String,

    /// Tick at which the task enters the ready queue
    arrival: usize,

    /// Total CPU ticks required
    duration: usize,

    /// Priority from config (higher = more urgent)
    static_priority: i64,

    /// Working priority, raised by aging while the task waits
    dynamic_priority: i64,

    /// Ticks still to execute
    remaining_time: usize,

    /// Ticks at which the task held the CPU (strictly increasing)
    execution_history: Vec<usize>,

    /// Events sorted by firing order
    events: Vec<TaskEvent>,

    /// Index of the next event that has not fired
    next_event: usize,

    /// I/O block in progress, if any
    active_io: Option<ActiveIo>,
}

impl Task {
    /// Create a task with no CPU time consumed
    ///
    /// `events` must already be in firing order; see [`sanitize_events`].
    ///
    /// # Panics
    /// Panics if `duration == 0`
    pub fn new(
        index: TaskId,
        id: String,
        color: String,
        arrival: usize,
        duration: usize,
        priority: i64,
        events: Vec<TaskEvent>,
    ) -> Self {
        assert!(duration > 0, "task duration must be positive");
        Self {
            index,
            id,
            color,
            arrival,
            duration,
            static_priority: priority,
            dynamic_priority: priority,
            remaining_time: duration,
            execution_history: Vec::new(),
            events,
            next_event: 0,
            active_io: None,
        }
    }

    pub fn index(&self) -> TaskId {
        self.index
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn arrival(&self) -> usize {
        self.arrival
    }

    pub fn duration(&self) -> usize {
        self.duration
    }

    pub fn static_priority(&self) -> i64 {
        self.static_priority
    }

    pub fn dynamic_priority(&self) -> i64 {
        self.dynamic_priority
    }

    pub fn remaining_time(&self) -> usize {
        self.remaining_time
    }

    pub fn execution_history(&self) -> &[usize] {
        &self.execution_history
    }

    pub fn events(&self) -> &[TaskEvent] {
        &self.events
    }

    pub fn active_io(&self) -> Option<&ActiveIo> {
        self.active_io.as_ref()
    }

    /// Ticks executed so far (the offset events are keyed by)
    pub fn executed_ticks(&self) -> usize {
        self.execution_history.len()
    }

    /// Whether the whole burst has executed
    pub fn is_complete(&self) -> bool {
        self.execution_history.len() >= self.duration
    }

    /// Whether the task has arrived by `tick`
    pub fn has_arrived(&self, tick: usize) -> bool {
        self.arrival <= tick
    }

    // ========================================================================
    // Mutation (orchestrator / scheduler only)
    // ========================================================================

    /// Record one executed tick
    ///
    /// # Panics
    /// Panics if the task already finished or `tick` does not extend the
    /// history strictly.
    pub(crate) fn record_execution(&mut self, tick: usize) {
        assert!(
            self.remaining_time > 0,
            "task {} executed with no remaining time",
            self.id
        );
        if let Some(&last) = self.execution_history.last() {
            assert!(
                tick > last,
                "task {} history not strictly increasing ({} after {})",
                self.id,
                tick,
                last
            );
        }
        self.execution_history.push(tick);
        self.remaining_time -= 1;
    }

    pub(crate) fn reset_dynamic_priority(&mut self) {
        self.dynamic_priority = self.static_priority;
    }

    pub(crate) fn age(&mut self, alpha: i64) {
        self.dynamic_priority = self.dynamic_priority.saturating_add(alpha);
    }

    /// Pop the next event due at the current offset, if any
    pub(crate) fn take_due_event(&mut self) -> Option<(usize, TaskEvent)> {
        let offset = self.executed_ticks();
        let index = self.next_event;
        let event = self.events.get(index)?;
        debug_assert!(
            event.start_offset >= offset,
            "task {} skipped event at offset {}",
            self.id,
            event.start_offset
        );
        if event.start_offset != offset {
            return None;
        }
        self.next_event += 1;
        Some((index, event.clone()))
    }

    /// Whether an event is still pending at the current offset
    pub(crate) fn has_due_event(&self) -> bool {
        self.events
            .get(self.next_event)
            .is_some_and(|e| e.start_offset == self.executed_ticks())
    }

    pub(crate) fn start_io(&mut self, event_index: usize, duration: usize) {
        self.active_io = Some(ActiveIo {
            event_index,
            remaining: duration,
        });
    }

    /// Count one tick of I/O; returns true when the block is over
    pub(crate) fn tick_io(&mut self) -> bool {
        match self.active_io.as_mut() {
            Some(io) => {
                io.remaining = io.remaining.saturating_sub(1);
                if io.remaining == 0 {
                    self.active_io = None;
                    true
                } else {
                    false
                }
            }
            None => true,
        }
    }
}

/// Drop events that can never legally fire and sort the rest into firing order
///
/// Returns the kept events plus one warning per dropped event. Offsets are
/// counted after execution, so:
/// - offset 0 never fires;
/// - I/O and lock at or past `duration` would force execution beyond the burst;
/// - unlock may fire on the final tick;
/// - I/O of zero ticks is meaningless.
pub fn sanitize_events(
    task_id: &str,
    duration: usize,
    events: Vec<TaskEvent>,
) -> (Vec<TaskEvent>, Vec<String>) {
    let mut kept = Vec::with_capacity(events.len());
    let mut warnings = Vec::new();

    for event in events {
        let problem = match &event.kind {
            _ if event.start_offset == 0 => Some("offset 0 never fires".to_string()),
            EventKind::Io { duration: 0 } => Some("I/O duration must be positive".to_string()),
            EventKind::Io { .. } | EventKind::MutexLock { .. } if event.start_offset >= duration => {
                Some(format!("offset must be below duration {}", duration))
            }
            EventKind::MutexUnlock { .. } if event.start_offset > duration => {
                Some(format!("offset exceeds duration {}", duration))
            }
            _ => None,
        };

        match problem {
            Some(reason) => warnings.push(format!(
                "task {}: ignoring {:?} at offset {}: {}",
                task_id, event.kind, event.start_offset, reason
            )),
            None => kept.push(event),
        }
    }

    kept.sort_by_key(|e| (e.start_offset, e.fire_rank()));
    (kept, warnings)
}
