//! I/O Queue
//!
//! Tasks blocked on a timed I/O event. Every tick, every blocked task's
//! countdown drops by exactly one, independently of the others; tasks whose
//! countdown reaches zero leave the queue in the order they entered it.

use crate::models::state::TaskTable;
use crate::models::task::TaskId;
use serde::{Deserialize, Serialize};

/// Tasks currently counting down an I/O block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoQueue {
    blocked: Vec<TaskId>,
}

impl IoQueue {
    pub fn new() -> Self {
        Self {
            blocked: Vec::new(),
        }
    }

    /// Block `task` for `duration` ticks on its event `event_index`
    ///
    /// # Panics
    ///
    /// Panics if the task is already blocked on I/O.
    pub fn block(&mut self, task: TaskId, event_index: usize, duration: usize, tasks: &mut TaskTable) {
        assert!(
            !self.blocked.contains(&task),
            "task {} blocked on I/O twice",
            task
        );
        tasks[task].start_io(event_index, duration);
        self.blocked.push(task);
    }

    /// Count one tick for every blocked task
    ///
    /// Returns the tasks whose I/O finished, in queue order; they are no
    /// longer in the queue and must be re-admitted by the caller.
    pub fn tick(&mut self, tasks: &mut TaskTable) -> Vec<TaskId> {
        let mut finished = Vec::new();
        self.blocked.retain(|id| {
            if tasks[*id].tick_io() {
                finished.push(*id);
                false
            } else {
                true
            }
        });
        finished
    }

    pub fn contains(&self, task: TaskId) -> bool {
        self.blocked.contains(&task)
    }

    /// Blocked tasks in entry order
    pub fn iter(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.blocked.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.blocked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocked.is_empty()
    }
}
