//! Task arena
//!
//! Holds every task of the simulation in config order, addressed by
//! [`TaskId`]. Tasks are never removed: finishing only changes which list
//! refers to them, so indices stay valid for the whole run and across
//! snapshots.
//!
//! # Critical Invariants
//!
//! 1. **Stable addressing**: `tasks[i].index() == TaskId(i)`
//! 2. **Unique ids**: no two tasks share a config id

use crate::models::task::{Task, TaskId};
use serde::{Deserialize, Serialize};

/// Arena of tasks indexed by [`TaskId`]
///
/// # Example
///
/// ```rust
/// use cpu_scheduler_sim_core::models::state::TaskTable;
/// use cpu_scheduler_sim_core::models::task::{Task, TaskId};
///
/// let mut table = TaskTable::new();
/// let id = table.push_with(|index| {
///     Task::new(index, "T1".to_string(), "red".to_string(), 0, 3, 1, vec![])
/// });
/// assert_eq!(id, TaskId(0));
/// assert_eq!(table.find("T1"), Some(TaskId(0)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTable {
    tasks: Vec<Task>,
}

impl TaskTable {
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Append a task built for the next free index
    ///
    /// # Panics
    ///
    /// Panics if the builder ignores the index it was given, or the task id
    /// is already taken.
    pub fn push_with(&mut self, build: impl FnOnce(TaskId) -> Task) -> TaskId {
        let index = TaskId(self.tasks.len());
        let task = build(index);
        assert_eq!(task.index(), index, "task built for the wrong arena slot");
        assert!(
            self.find(task.id()).is_none(),
            "Task ID {} already exists",
            task.id()
        );
        self.tasks.push(task);
        index
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(id.index())
    }

    pub fn get_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.get_mut(id.index())
    }

    /// Look up a task by its config id
    pub fn find(&self, id: &str) -> Option<TaskId> {
        self.tasks.iter().find(|t| t.id() == id).map(Task::index)
    }

    /// All tasks in config order
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Task> {
        self.tasks.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Whether `id` addresses a task in this arena
    pub fn contains(&self, id: TaskId) -> bool {
        id.index() < self.tasks.len()
    }

    /// Sum of all bursts
    pub fn total_duration(&self) -> usize {
        self.tasks.iter().map(Task::duration).sum()
    }

    /// Latest arrival tick (0 for an empty table)
    pub fn max_arrival(&self) -> usize {
        self.tasks.iter().map(Task::arrival).max().unwrap_or(0)
    }
}

impl std::ops::Index<TaskId> for TaskTable {
    type Output = Task;

    fn index(&self, id: TaskId) -> &Task {
        &self.tasks[id.index()]
    }
}

impl std::ops::IndexMut<TaskId> for TaskTable {
    fn index_mut(&mut self, id: TaskId) -> &mut Task {
        &mut self.tasks[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(index: TaskId, id: &str, arrival: usize, duration: usize) -> Task {
        Task::new(index, id.to_string(), "blue".to_string(), arrival, duration, 0, vec![])
    }

    #[test]
    fn test_push_assigns_sequential_ids() {
        let mut table = TaskTable::new();
        let a = table.push_with(|i| task(i, "A", 0, 2));
        let b = table.push_with(|i| task(i, "B", 3, 5));

        assert_eq!(a, TaskId(0));
        assert_eq!(b, TaskId(1));
        assert_eq!(table[b].id(), "B");
        assert_eq!(table.len(), 2);
    }

    #[test]
    #[should_panic(expected = "already exists")]
    fn test_duplicate_id_panics() {
        let mut table = TaskTable::new();
        table.push_with(|i| task(i, "A", 0, 2));
        table.push_with(|i| task(i, "A", 1, 2));
    }

    #[test]
    fn test_totals() {
        let mut table = TaskTable::new();
        table.push_with(|i| task(i, "A", 0, 2));
        table.push_with(|i| task(i, "B", 7, 5));
        table.push_with(|i| task(i, "C", 4, 1));

        assert_eq!(table.total_duration(), 8);
        assert_eq!(table.max_arrival(), 7);
        assert!(table.contains(TaskId(2)));
        assert!(!table.contains(TaskId(3)));
    }
}
