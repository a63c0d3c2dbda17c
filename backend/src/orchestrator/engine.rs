//! Orchestrator Engine
//!
//! Tick-driven state machine integrating all simulation components:
//! - Task admissions (arrivals, I/O returns)
//! - Dispatch and preemption (via the scheduler)
//! - Execution of one CPU tick
//! - Blocking events (mutexes, I/O)
//! - Completion, quantum expiry and aging
//!
//! # Architecture
//!
//! `step()` runs one tick in this fixed order:
//!
//! ```text
//! For each tick t:
//!  1. I/O completion (every countdown -1, finished tasks re-admitted)
//!  2. Arrivals (arrival == t, config order)
//!  3. Arrival/return preemption check
//!  4. Dispatch if idle
//!  5. Idle tick → advance clock, return
//!  6. Execute one unit on the running task
//!  7. Mutex events at the new offset (blocked lock → early return)
//!  8. I/O event at the new offset (→ early return)
//!  9. Completion check
//! 10. Quantum check
//! 11. Aging
//! 12. Advance clock
//! ```
//!
//! # Example
//!
//! ```rust
//! use cpu_scheduler_sim_core::orchestrator::{Orchestrator, OrchestratorConfig, TaskConfig};
//!
//! let config = OrchestratorConfig {
//!     algorithm: "fifo".to_string(),
//!     quantum: 2,
//!     task_configs: vec![
//!         TaskConfig::new("T1", 0, 3, 1),
//!         TaskConfig::new("T2", 1, 1, 1),
//!     ],
//!     ..Default::default()
//! };
//!
//! let mut orchestrator = Orchestrator::new(config).unwrap();
//! while !orchestrator.is_finished() {
//!     orchestrator.step();
//! }
//! assert_eq!(orchestrator.clock(), 4);
//! ```

use crate::blocking::{AcquireOutcome, IoQueue, MutexTable, ReleaseOutcome};
use crate::core::time::SimClock;
use crate::models::event::{EventLog, PreemptReason, SimEvent};
use crate::models::state::TaskTable;
use crate::models::task::{sanitize_events, EventKind, Task, TaskEvent, TaskId, TaskState};
use crate::orchestrator::checkpoint::{compute_config_hash, validate_snapshot, StateSnapshot};
use crate::scheduler::{Algorithm, Scheduler};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Seed used when a config does not specify one
pub const DEFAULT_RNG_SEED: u64 = 0x5EED_0F_C0FFEE;

// ============================================================================
// Configuration Types
// ============================================================================

/// Complete orchestrator configuration
///
/// # Fields
///
/// * `algorithm` - Scheduling algorithm name (`fifo`, `rr`, `srtf`, `priop`,
///   `priopenv`); unknown names fall back to FIFO with a warning
/// * `quantum` - Maximum consecutive ticks under quantum-preemptive algorithms
/// * `alpha` - Aging increment per tick (PriorityAging only)
/// * `rng_seed` - Seed for the random tie-break stage
/// * `task_configs` - Tasks in config order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    pub algorithm: String,
    pub quantum: usize,
    pub alpha: i64,
    pub rng_seed: u64,
    pub task_configs: Vec<TaskConfig>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Fifo.name().to_string(),
            quantum: 1,
            alpha: 1,
            rng_seed: DEFAULT_RNG_SEED,
            task_configs: Vec::new(),
        }
    }
}

/// Per-task configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Unique task identifier
    pub id: String,

    /// Display color, passed through untouched
    pub color: String,

    /// Tick at which the task becomes ready
    pub arrival: usize,

    /// Total CPU ticks required (> 0)
    pub duration: usize,

    /// Static priority (higher = more urgent)
    pub priority: i64,

    /// Blocking events, any order
    pub events: Vec<TaskEvent>,
}

impl TaskConfig {
    /// Task with no events and a neutral color
    pub fn new(id: impl Into<String>, arrival: usize, duration: usize, priority: i64) -> Self {
        Self {
            id: id.into(),
            color: "#808080".to_string(),
            arrival,
            duration,
            priority,
            events: Vec::new(),
        }
    }

    /// Builder-style event attachment
    pub fn with_event(mut self, event: TaskEvent) -> Self {
        self.events.push(event);
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }
}

// ============================================================================
// Results and Errors
// ============================================================================

/// Result of a single tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickResult {
    /// Tick number
    pub tick: usize,

    /// Task that executed this tick (None = idle tick)
    pub ran: Option<TaskId>,

    /// Tasks admitted by arrival this tick
    pub num_arrivals: usize,

    /// Tasks returning from I/O this tick
    pub num_io_returns: usize,

    /// Tasks given the CPU this tick, in order
    pub dispatched: Vec<TaskId>,

    /// Tasks that lost the CPU to preemption this tick
    pub preemptions: Vec<(TaskId, PreemptReason)>,

    /// Task that blocked on a mutex or I/O after executing
    pub blocked: Option<TaskId>,

    /// Task that finished this tick
    pub completed: Option<TaskId>,

    /// Some dispatch this tick needed the random tie-break
    pub random_tie_break: bool,
}

impl TickResult {
    fn new(tick: usize) -> Self {
        Self {
            tick,
            ..Default::default()
        }
    }

    /// Whether no task executed
    pub fn is_idle(&self) -> bool {
        self.ran.is_none()
    }
}

/// How a bounded run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every task finished; clock at completion
    Finished { clock: usize },
    /// Every remaining task waits on a mutex that will never be released
    Deadlocked { clock: usize },
    /// Tick budget exhausted first
    TickLimit { clock: usize },
}

/// Simulation error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    /// Configuration validation error
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Snapshot taken under another config
    #[error("Config mismatch: snapshot hash {actual} does not match {expected}")]
    ConfigMismatch { expected: String, actual: String },

    /// Snapshot failed integrity validation
    #[error("State validation error: {0}")]
    StateValidationError(String),

    /// Config or state could not be serialized
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

// ============================================================================
// Orchestrator State
// ============================================================================

/// Every mutable part of a simulation, as plain values
///
/// Cloning this struct yields a fully independent copy: tasks are addressed by
/// [`TaskId`] index, never by reference, so nothing in a clone aliases the
/// live state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorState {
    pub(crate) clock: SimClock,
    pub(crate) quantum_counter: usize,
    pub(crate) tasks: TaskTable,
    pub(crate) running: Option<TaskId>,
    pub(crate) finished: Vec<TaskId>,
    pub(crate) scheduler: Scheduler,
    pub(crate) mutexes: MutexTable,
    pub(crate) io_queue: IoQueue,
    pub(crate) event_log: EventLog,
}

impl OrchestratorState {
    pub fn clock(&self) -> usize {
        self.clock.current_tick()
    }

    pub fn quantum_counter(&self) -> usize {
        self.quantum_counter
    }

    pub fn tasks(&self) -> &TaskTable {
        &self.tasks
    }

    pub fn running(&self) -> Option<TaskId> {
        self.running
    }

    pub fn finished(&self) -> &[TaskId] {
        &self.finished
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn mutexes(&self) -> &MutexTable {
        &self.mutexes
    }

    pub fn io_queue(&self) -> &IoQueue {
        &self.io_queue
    }

    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }
}

/// Whether event processing let the task keep going
enum EventFlow {
    Continue,
    Blocked,
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Main orchestrator owning all simulation state and the tick loop
///
/// External callers only advance time (`step`), query, and snapshot/restore;
/// the ready queue, mutex table and I/O queue are never exposed mutably.
///
/// # Determinism
///
/// All randomness is the scheduler's seeded xorshift64*. Same config + same
/// seed = identical runs, and a restored snapshot replays identically.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    /// Validated configuration
    config: OrchestratorConfig,

    /// Resolved scheduling algorithm
    algorithm: Algorithm,

    /// SHA-256 of the config, stamped on every snapshot
    config_hash: String,

    /// Live simulation state
    state: OrchestratorState,
}

impl Orchestrator {
    /// Create new orchestrator from configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Orchestrator)` - Successfully initialized orchestrator
    /// * `Err(SimulationError::InvalidConfig)` - zero quantum, no tasks,
    ///   duplicate task id or zero duration
    ///
    /// Policy problems (unknown algorithm name, unreachable event offsets)
    /// do not fail construction; they are recorded as warnings at tick 0.
    pub fn new(config: OrchestratorConfig) -> Result<Self, SimulationError> {
        Self::validate_config(&config)?;

        let config_hash = compute_config_hash(&config)?;
        let mut warnings = Vec::new();

        let algorithm = match config.algorithm.parse::<Algorithm>() {
            Ok(algorithm) => algorithm,
            Err(err) => {
                warnings.push(format!("{}; falling back to {}", err, Algorithm::Fifo));
                Algorithm::Fifo
            }
        };

        let mut tasks = TaskTable::new();
        for tc in &config.task_configs {
            let (events, event_warnings) = sanitize_events(&tc.id, tc.duration, tc.events.clone());
            warnings.extend(event_warnings);
            tasks.push_with(|index| {
                Task::new(
                    index,
                    tc.id.clone(),
                    tc.color.clone(),
                    tc.arrival,
                    tc.duration,
                    tc.priority,
                    events,
                )
            });
        }

        let mut orchestrator = Self {
            algorithm,
            config_hash,
            state: OrchestratorState {
                clock: SimClock::new(),
                quantum_counter: 0,
                tasks,
                running: None,
                finished: Vec::new(),
                scheduler: Scheduler::new(algorithm, config.alpha, config.rng_seed),
                mutexes: MutexTable::new(),
                io_queue: IoQueue::new(),
                event_log: EventLog::new(),
            },
            config,
        };

        for message in warnings {
            orchestrator.record_warning(0, message);
        }

        Ok(orchestrator)
    }

    /// Validate configuration
    fn validate_config(config: &OrchestratorConfig) -> Result<(), SimulationError> {
        if config.quantum == 0 {
            return Err(SimulationError::InvalidConfig(
                "quantum must be > 0".to_string(),
            ));
        }

        if config.task_configs.is_empty() {
            return Err(SimulationError::InvalidConfig(
                "Must have at least one task".to_string(),
            ));
        }

        let mut ids = HashSet::new();
        for tc in &config.task_configs {
            if !ids.insert(tc.id.as_str()) {
                return Err(SimulationError::InvalidConfig(format!(
                    "Duplicate task ID: {}",
                    tc.id
                )));
            }
            if tc.duration == 0 {
                return Err(SimulationError::InvalidConfig(format!(
                    "Task {} must have duration > 0",
                    tc.id
                )));
            }
        }

        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Current simulated time
    pub fn clock(&self) -> usize {
        self.state.clock.current_tick()
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn config_hash(&self) -> &str {
        &self.config_hash
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn quantum(&self) -> usize {
        self.config.quantum
    }

    pub fn alpha(&self) -> i64 {
        self.config.alpha
    }

    /// Read-only view of the whole live state
    pub fn state(&self) -> &OrchestratorState {
        &self.state
    }

    /// Tasks with `arrival <= clock`, in config order
    pub fn admitted_tasks(&self) -> Vec<&Task> {
        let clock = self.clock();
        self.state
            .tasks
            .iter()
            .filter(|t| t.has_arrived(clock))
            .collect()
    }

    /// Every task in config order
    pub fn all_tasks(&self) -> impl Iterator<Item = &Task> {
        self.state.tasks.iter()
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.state.tasks.get(id)
    }

    /// Look up a task by its config id
    pub fn task_by_id(&self, id: &str) -> Option<&Task> {
        self.state.tasks.find(id).and_then(|i| self.state.tasks.get(i))
    }

    pub fn running_task(&self) -> Option<TaskId> {
        self.state.running
    }

    /// Ready tasks in queue order (inspection only)
    pub fn ready_tasks(&self) -> Vec<TaskId> {
        self.state.scheduler.ready_tasks().collect()
    }

    /// Finished tasks in completion order
    pub fn finished_tasks(&self) -> &[TaskId] {
        &self.state.finished
    }

    pub fn is_finished(&self) -> bool {
        self.state.finished.len() == self.state.tasks.len()
    }

    /// Whether the latest scheduling decision needed the random tie-break
    pub fn last_tie_break_random(&self) -> bool {
        self.state.scheduler.last_decision_random()
    }

    pub fn event_log(&self) -> &EventLog {
        &self.state.event_log
    }

    /// Every policy warning recorded so far
    pub fn warnings(&self) -> Vec<&str> {
        self.state.event_log.warnings().collect()
    }

    pub fn mutexes(&self) -> &MutexTable {
        &self.state.mutexes
    }

    pub fn io_queue(&self) -> &IoQueue {
        &self.state.io_queue
    }

    /// Lifecycle state of a task
    pub fn task_state(&self, id: TaskId) -> Option<TaskState> {
        let task = self.state.tasks.get(id)?;
        let state = if self.state.finished.contains(&id) {
            TaskState::Finished
        } else if self.state.running == Some(id) {
            TaskState::Running
        } else if self.state.scheduler.contains(id) {
            TaskState::Ready
        } else if self.state.io_queue.contains(id) {
            TaskState::BlockedIo
        } else if let Some(mutex_id) = self.state.mutexes.waiting_on(id) {
            TaskState::BlockedMutex {
                mutex_id: mutex_id.to_string(),
            }
        } else {
            debug_assert!(task.arrival() >= self.clock());
            TaskState::Waiting
        };
        Some(state)
    }

    /// Whether the remaining tasks can never make progress
    ///
    /// True when nothing runs, nothing is ready or doing I/O, no arrival is
    /// pending, and some unfinished task waits on a mutex.
    pub fn is_deadlocked(&self) -> bool {
        let clock = self.clock();
        !self.is_finished()
            && self.state.running.is_none()
            && self.state.scheduler.is_empty()
            && self.state.io_queue.is_empty()
            && self.state.mutexes.num_waiting() > 0
            && self
                .state
                .tasks
                .iter()
                .filter(|t| !self.state.finished.contains(&t.index()))
                .all(|t| t.arrival() < clock)
    }

    /// Upper bound on the ticks a deadlock-free run needs
    ///
    /// `sum(duration) + max(arrival) + sum(I/O durations)`.
    pub fn termination_bound(&self) -> usize {
        let io_ticks: usize = self
            .state
            .tasks
            .iter()
            .flat_map(|t| t.events())
            .map(|e| match e.kind {
                EventKind::Io { duration } => duration,
                _ => 0,
            })
            .sum();
        self.state.tasks.total_duration() + self.state.tasks.max_arrival() + io_ticks
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    /// Capture a fully independent copy of the current state
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            config_hash: self.config_hash.clone(),
            state: self.state.clone(),
        }
    }

    /// Replace the live state with a snapshot taken from this config
    ///
    /// The live state is untouched if the snapshot is rejected.
    pub fn restore(&mut self, snapshot: StateSnapshot) -> Result<(), SimulationError> {
        if snapshot.config_hash != self.config_hash {
            return Err(SimulationError::ConfigMismatch {
                expected: self.config_hash.clone(),
                actual: snapshot.config_hash,
            });
        }
        validate_snapshot(&snapshot)?;
        if snapshot.state.tasks.len() != self.state.tasks.len() {
            return Err(SimulationError::StateValidationError(format!(
                "snapshot has {} tasks, simulation has {}",
                snapshot.state.tasks.len(),
                self.state.tasks.len()
            )));
        }

        self.state = snapshot.state;
        Ok(())
    }

    // ========================================================================
    // Event Logging
    // ========================================================================

    fn log_event(&mut self, event: SimEvent) {
        self.state.event_log.log(event);
    }

    /// Record a non-fatal policy warning
    fn record_warning(&mut self, tick: usize, message: String) {
        warn!(tick, "{}", message);
        self.log_event(SimEvent::Warning { tick, message });
    }

    // ========================================================================
    // Tick Loop Implementation
    // ========================================================================

    /// Execute one simulation tick
    ///
    /// Runs the twelve steps listed in the module docs. Stepping a finished
    /// simulation is an idle tick.
    ///
    /// # Panics
    ///
    /// Panics on internal invariant violations (a finished task selected or
    /// executed, a task queued twice); these are logic faults, not input
    /// errors.
    pub fn step(&mut self) -> TickResult {
        let tick = self.clock();
        let mut result = TickResult::new(tick);

        // STEP 1: I/O COMPLETION
        let mut admitted = 0;
        let returned = self.state.io_queue.tick(&mut self.state.tasks);
        for id in returned {
            self.log_event(SimEvent::IoReturned { tick, task: id });
            result.num_io_returns += 1;
            if self.resume(id, tick) {
                admitted += 1;
            }
        }

        // STEP 2: ARRIVALS
        let arrivals: Vec<TaskId> = self
            .state
            .tasks
            .iter()
            .filter(|t| t.arrival() == tick)
            .map(Task::index)
            .collect();
        for id in arrivals {
            self.log_event(SimEvent::Arrival { tick, task: id });
            self.state.scheduler.enqueue(id, &mut self.state.tasks);
            result.num_arrivals += 1;
            admitted += 1;
        }

        // STEP 3: ARRIVAL/RETURN PREEMPTION
        if let Some(running) = self.state.running {
            if admitted > 0
                && self.state.scheduler.preempts_on_arrival()
                && self.state.scheduler.would_preempt(running, &self.state.tasks)
            {
                self.preempt(running, PreemptReason::Arrival, tick, &mut result);
                self.dispatch(tick, &mut result);
            }
        }

        // STEP 4: DISPATCH IF IDLE
        if self.state.running.is_none() {
            self.dispatch(tick, &mut result);
        }

        // STEP 5: IDLE TICK
        let Some(id) = self.state.running else {
            self.state.clock.advance_tick();
            return result;
        };

        // STEP 6: EXECUTE ONE UNIT
        self.state.tasks[id].record_execution(tick);
        self.state.quantum_counter += 1;
        result.ran = Some(id);

        // STEPS 7-8: MUTEX THEN I/O EVENTS AT THE NEW OFFSET
        if let EventFlow::Blocked = self.fire_due_events(id, tick) {
            self.state.running = None;
            self.state.scheduler.set_running(None);
            result.blocked = Some(id);
            self.dispatch(tick, &mut result);
            self.state.clock.advance_tick();
            return result;
        }

        // STEP 9: COMPLETION
        if self.state.tasks[id].is_complete() {
            self.finish(id, tick);
            result.completed = Some(id);
            self.dispatch(tick, &mut result);
        }
        // STEP 10: QUANTUM
        else if self.state.scheduler.preempts_on_quantum()
            && self.state.quantum_counter >= self.config.quantum
        {
            self.preempt(id, PreemptReason::Quantum, tick, &mut result);
            self.dispatch(tick, &mut result);
        }

        // STEP 11: AGING
        self.state.scheduler.tick_aging(&mut self.state.tasks);

        // STEP 12: ADVANCE TIME
        self.state.clock.advance_tick();

        result
    }

    /// Step until finished, deadlocked, or `max_ticks` steps have run
    pub fn run_until_finished(&mut self, max_ticks: usize) -> RunOutcome {
        for _ in 0..max_ticks {
            if self.is_finished() {
                break;
            }
            if self.is_deadlocked() {
                return RunOutcome::Deadlocked {
                    clock: self.clock(),
                };
            }
            self.step();
        }

        if self.is_finished() {
            RunOutcome::Finished {
                clock: self.clock(),
            }
        } else if self.is_deadlocked() {
            RunOutcome::Deadlocked {
                clock: self.clock(),
            }
        } else {
            RunOutcome::TickLimit {
                clock: self.clock(),
            }
        }
    }

    /// Give the CPU to the scheduler's next choice, if any
    ///
    /// Always resets the quantum counter.
    fn dispatch(&mut self, tick: usize, result: &mut TickResult) -> Option<TaskId> {
        debug_assert!(self.state.running.is_none(), "dispatch with CPU busy");
        self.state.scheduler.set_running(None);
        self.state.quantum_counter = 0;

        let next = self.state.scheduler.dequeue_next(&mut self.state.tasks)?;
        let random_tie_break = self.state.scheduler.last_decision_random();

        self.state.running = Some(next);
        self.state.scheduler.set_running(Some(next));
        result.dispatched.push(next);
        result.random_tie_break |= random_tie_break;

        debug!(tick, task = self.state.tasks[next].id(), random_tie_break, "dispatched");
        self.log_event(SimEvent::Dispatched {
            tick,
            task: next,
            random_tie_break,
        });
        Some(next)
    }

    /// Put the running task back in the ready queue
    fn preempt(&mut self, id: TaskId, reason: PreemptReason, tick: usize, result: &mut TickResult) {
        debug_assert_eq!(self.state.running, Some(id));
        self.state.running = None;
        self.state.scheduler.set_running(None);
        self.state.scheduler.enqueue(id, &mut self.state.tasks);
        result.preemptions.push((id, reason));

        debug!(tick, task = self.state.tasks[id].id(), ?reason, "preempted");
        self.log_event(SimEvent::Preempted {
            tick,
            task: id,
            reason,
        });
    }

    /// Move the running task to the finished list
    ///
    /// Mutexes still held are released so their waiters are not stranded.
    fn finish(&mut self, id: TaskId, tick: usize) {
        assert!(
            !self.state.finished.contains(&id),
            "task {} finished twice",
            self.state.tasks[id].id()
        );
        self.state.running = None;
        self.state.scheduler.set_running(None);
        self.state.finished.push(id);

        for mutex_id in self.state.mutexes.owned_by(id) {
            let message = format!(
                "task {} finished while holding mutex {}; releasing it",
                self.state.tasks[id].id(),
                mutex_id
            );
            self.record_warning(tick, message);
            self.release_mutex(id, &mutex_id, tick);
        }

        info!(tick, task = self.state.tasks[id].id(), "task finished");
        self.log_event(SimEvent::Finished { tick, task: id });
    }

    /// Fire every event due at the task's current offset, in order
    ///
    /// Stops at the first event that blocks the task.
    fn fire_due_events(&mut self, id: TaskId, tick: usize) -> EventFlow {
        while let Some((event_index, event)) = self.state.tasks[id].take_due_event() {
            match event.kind {
                EventKind::MutexLock { mutex_id } => match self.state.mutexes.acquire(id, &mutex_id) {
                    AcquireOutcome::Acquired => {
                        self.log_event(SimEvent::MutexAcquired {
                            tick,
                            task: id,
                            mutex_id,
                        });
                    }
                    AcquireOutcome::Blocked => {
                        debug!(tick, task = self.state.tasks[id].id(), mutex = %mutex_id, "blocked on mutex");
                        self.log_event(SimEvent::MutexBlocked {
                            tick,
                            task: id,
                            mutex_id,
                        });
                        return EventFlow::Blocked;
                    }
                },
                EventKind::MutexUnlock { mutex_id } => {
                    self.release_mutex(id, &mutex_id, tick);
                }
                EventKind::Io { duration } => {
                    self.state
                        .io_queue
                        .block(id, event_index, duration, &mut self.state.tasks);
                    debug!(tick, task = self.state.tasks[id].id(), duration, "blocked on I/O");
                    self.log_event(SimEvent::IoStarted {
                        tick,
                        task: id,
                        duration,
                    });
                    return EventFlow::Blocked;
                }
            }
        }
        EventFlow::Continue
    }

    /// Release a mutex and re-admit the waiter it is handed to
    fn release_mutex(&mut self, id: TaskId, mutex_id: &str, tick: usize) {
        match self.state.mutexes.release(id, mutex_id) {
            ReleaseOutcome::Released { handed_to } => {
                self.log_event(SimEvent::MutexReleased {
                    tick,
                    task: id,
                    mutex_id: mutex_id.to_string(),
                    handed_to,
                });
                if let Some(next) = handed_to {
                    self.log_event(SimEvent::MutexAcquired {
                        tick,
                        task: next,
                        mutex_id: mutex_id.to_string(),
                    });
                    self.resume(next, tick);
                }
            }
            ReleaseOutcome::NotOwner { owner } => {
                let owner = match owner {
                    Some(owner) => self.state.tasks[owner].id().to_string(),
                    None => "nobody".to_string(),
                };
                let message = format!(
                    "task {} released mutex {} held by {}; ignored",
                    self.state.tasks[id].id(),
                    mutex_id,
                    owner
                );
                self.record_warning(tick, message);
            }
        }
    }

    /// Re-admit a task coming back from a mutex wait or I/O
    ///
    /// Events still pending at its current offset fire first; returns true
    /// if the task reached the ready queue.
    fn resume(&mut self, id: TaskId, tick: usize) -> bool {
        if self.state.tasks[id].has_due_event() {
            if let EventFlow::Blocked = self.fire_due_events(id, tick) {
                return false;
            }
        }
        self.state.scheduler.enqueue(id, &mut self.state.tasks);
        true
    }
}

// ============================================================================
// Tests
// ============================================================================
