//! Scheduler Module
//!
//! Owns the ready queue and decides which ready task gets the CPU next.
//!
//! # Overview
//!
//! The orchestrator consults the scheduler at fixed points of every tick:
//! - `enqueue` whenever a task (re)enters the ready state
//! - `would_preempt` after admissions, for arrival-preemptive algorithms
//! - `dequeue_next` whenever the CPU is free
//! - `tick_aging` once per tick, for the aging algorithm
//!
//! Tasks live in the orchestrator's [`TaskTable`]; the scheduler only holds
//! [`TaskId`]s and reads/writes task fields through the table it is handed.
//!
//! # Determinism
//!
//! The only randomness is the final link of the tie-break chain, drawn from an
//! injected [`RngManager`]. The generator is part of the scheduler's value
//! state, so snapshots capture it and replays repeat the same choices.

pub mod algorithm;
pub mod tie_break;

pub use algorithm::{Algorithm, UnknownAlgorithm};
pub use tie_break::Selection;

use crate::models::state::TaskTable;
use crate::models::task::TaskId;
use crate::rng::RngManager;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

/// Ready queue plus dispatch policy
///
/// # Example
///
/// ```rust
/// use cpu_scheduler_sim_core::models::state::TaskTable;
/// use cpu_scheduler_sim_core::models::task::Task;
/// use cpu_scheduler_sim_core::{Algorithm, Scheduler};
///
/// let mut tasks = TaskTable::new();
/// let long = tasks.push_with(|i| Task::new(i, "L".into(), "red".into(), 0, 9, 0, vec![]));
/// let short = tasks.push_with(|i| Task::new(i, "S".into(), "blue".into(), 0, 2, 0, vec![]));
///
/// let mut scheduler = Scheduler::new(Algorithm::Srtf, 1, 7);
/// scheduler.enqueue(long, &mut tasks);
/// scheduler.enqueue(short, &mut tasks);
///
/// assert_eq!(scheduler.dequeue_next(&mut tasks), Some(short));
/// assert_eq!(scheduler.dequeue_next(&mut tasks), Some(long));
/// assert_eq!(scheduler.dequeue_next(&mut tasks), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scheduler {
    /// Active dispatch policy
    algorithm: Algorithm,

    /// Ready tasks in enqueue order
    ready_queue: VecDeque<TaskId>,

    /// Aging increment per tick (PriorityAging only)
    alpha: i64,

    /// Task on the CPU, consulted only for tie-breaking
    current_running: Option<TaskId>,

    /// Source for the last tie-break stage
    rng: RngManager,

    /// Whether the latest decision needed the random stage
    last_decision_random: bool,
}

impl Scheduler {
    /// Create a scheduler with an empty ready queue
    pub fn new(algorithm: Algorithm, alpha: i64, rng_seed: u64) -> Self {
        Self {
            algorithm,
            ready_queue: VecDeque::new(),
            alpha,
            current_running: None,
            rng: RngManager::new(rng_seed),
            last_decision_random: false,
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn alpha(&self) -> i64 {
        self.alpha
    }

    pub fn preempts_on_arrival(&self) -> bool {
        self.algorithm.preempts_on_arrival()
    }

    pub fn preempts_on_quantum(&self) -> bool {
        self.algorithm.preempts_on_quantum()
    }

    /// Tell the scheduler which task holds the CPU
    pub fn set_running(&mut self, running: Option<TaskId>) {
        self.current_running = running;
    }

    pub fn current_running(&self) -> Option<TaskId> {
        self.current_running
    }

    /// Whether the latest `dequeue_next`/`would_preempt` decision was random
    pub fn last_decision_random(&self) -> bool {
        self.last_decision_random
    }

    /// Ready tasks in enqueue order (inspection only)
    pub fn ready_tasks(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.ready_queue.iter().copied()
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.ready_queue.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ready_queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ready_queue.is_empty()
    }

    /// RNG state, for checkpoint inspection
    pub fn rng_state(&self) -> u64 {
        self.rng.get_state()
    }

    /// Add a task to the back of the ready queue
    ///
    /// Entering the ready state always restarts aging from the static
    /// priority.
    ///
    /// # Panics
    ///
    /// Panics if the task is already queued or already finished.
    pub fn enqueue(&mut self, id: TaskId, tasks: &mut TaskTable) {
        assert!(
            !self.ready_queue.contains(&id),
            "task {} enqueued twice",
            id
        );
        let task = &mut tasks[id];
        assert!(!task.is_complete(), "finished task {} enqueued", task.id());
        task.reset_dynamic_priority();
        self.ready_queue.push_back(id);
    }

    /// Remove and return the task the algorithm selects
    pub fn dequeue_next(&mut self, tasks: &mut TaskTable) -> Option<TaskId> {
        self.last_decision_random = false;

        let chosen = match self.algorithm {
            Algorithm::Fifo => self.ready_queue.pop_front()?,
            Algorithm::Srtf | Algorithm::PriorityPreemptive | Algorithm::PriorityAging => {
                let candidates: Vec<TaskId> = self.ready_queue.iter().copied().collect();
                let selection = tie_break::select(
                    self.algorithm,
                    &candidates,
                    tasks,
                    self.current_running,
                    &mut self.rng,
                )?;
                self.last_decision_random = selection.random;
                self.ready_queue.retain(|id| *id != selection.task);
                selection.task
            }
        };

        let task = &mut tasks[chosen];
        assert!(!task.is_complete(), "finished task {} selected", task.id());
        if self.algorithm.uses_aging() {
            task.reset_dynamic_priority();
        }

        debug!(
            task = task.id(),
            algorithm = %self.algorithm,
            random = self.last_decision_random,
            "selected next task"
        );
        Some(chosen)
    }

    /// Whether some ready task strictly beats `running`
    ///
    /// Ties never preempt: the running task wins them. FIFO never preempts on
    /// arrival. This check never consumes randomness.
    pub fn would_preempt(&mut self, running: TaskId, tasks: &TaskTable) -> bool {
        self.last_decision_random = false;

        if !self.algorithm.preempts_on_arrival() {
            return false;
        }

        let current = &tasks[running];
        self.ready_queue.iter().any(|id| {
            tie_break::compare_primary(self.algorithm, &tasks[*id], current)
                == std::cmp::Ordering::Less
        })
    }

    /// Age every ready task by `alpha` (PriorityAging only)
    pub fn tick_aging(&self, tasks: &mut TaskTable) {
        if !self.algorithm.uses_aging() {
            return;
        }
        for id in &self.ready_queue {
            tasks[*id].age(self.alpha);
        }
    }
}
