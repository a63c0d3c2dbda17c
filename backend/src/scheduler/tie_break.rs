//! Candidate selection and the common tie-break chain
//!
//! Selection narrows the candidate set in stages until one task remains:
//!
//! ```text
//! primary metric (per algorithm)
//!   → currently running task, if still a candidate
//!   → earliest arrival
//!   → smallest duration
//!   → uniform random (flagged)
//! ```
//!
//! Candidates keep ready-queue order throughout, so the random stage is
//! reproducible for a given RNG state.

use crate::models::state::TaskTable;
use crate::models::task::{Task, TaskId};
use crate::rng::RngManager;
use crate::scheduler::algorithm::Algorithm;
use std::cmp::Ordering;

/// Outcome of a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub task: TaskId,
    /// Resolved by the random stage of the chain
    pub random: bool,
}

/// Order two tasks by the algorithm's primary metric
///
/// `Less` means `a` is the better candidate. FIFO has no metric: queue order
/// already decides.
pub fn compare_primary(algorithm: Algorithm, a: &Task, b: &Task) -> Ordering {
    match algorithm {
        Algorithm::Fifo => Ordering::Equal,
        Algorithm::Srtf => a.remaining_time().cmp(&b.remaining_time()),
        Algorithm::PriorityPreemptive => b.static_priority().cmp(&a.static_priority()),
        Algorithm::PriorityAging => b
            .dynamic_priority()
            .cmp(&a.dynamic_priority())
            .then_with(|| b.static_priority().cmp(&a.static_priority())),
    }
}

/// Keep only the candidates that tie for best under `cmp`
fn retain_best(candidates: &mut Vec<TaskId>, tasks: &TaskTable, cmp: impl Fn(&Task, &Task) -> Ordering) {
    let Some(best) = candidates
        .iter()
        .copied()
        .min_by(|a, b| cmp(&tasks[*a], &tasks[*b]))
    else {
        return;
    };
    candidates.retain(|id| cmp(&tasks[*id], &tasks[best]) == Ordering::Equal);
}

/// Pick one task out of `candidates`
///
/// Returns `None` only for an empty candidate set. The RNG is consulted only
/// when every deterministic stage leaves more than one task.
pub fn select(
    algorithm: Algorithm,
    candidates: &[TaskId],
    tasks: &TaskTable,
    running: Option<TaskId>,
    rng: &mut RngManager,
) -> Option<Selection> {
    let mut set: Vec<TaskId> = candidates.to_vec();
    if set.is_empty() {
        return None;
    }

    retain_best(&mut set, tasks, |a, b| compare_primary(algorithm, a, b));
    if set.len() > 1 {
        if let Some(running) = running.filter(|r| set.contains(r)) {
            return Some(Selection {
                task: running,
                random: false,
            });
        }
    }
    if set.len() > 1 {
        retain_best(&mut set, tasks, |a, b| a.arrival().cmp(&b.arrival()));
    }
    if set.len() > 1 {
        retain_best(&mut set, tasks, |a, b| a.duration().cmp(&b.duration()));
    }

    if set.len() == 1 {
        return Some(Selection {
            task: set[0],
            random: false,
        });
    }

    rng.pick(&set).map(|&task| Selection { task, random: true })
}
