//! Type conversion utilities for FFI boundary
//!
//! Converts core types into Python dicts. Task ids cross the boundary as
//! their config strings, never as arena indices.

use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::models::task::{Task, TaskState};
use crate::orchestrator::{Orchestrator, TickResult};

fn state_name(state: &TaskState) -> &'static str {
    match state {
        TaskState::Waiting => "waiting",
        TaskState::Ready => "ready",
        TaskState::Running => "running",
        TaskState::BlockedIo => "blocked_io",
        TaskState::BlockedMutex { .. } => "blocked_mutex",
        TaskState::Finished => "finished",
    }
}

/// Convert a task plus its lifecycle state to a Python dict
pub fn task_to_py(py: Python, orchestrator: &Orchestrator, task: &Task) -> PyResult<Py<PyDict>> {
    let dict = PyDict::new(py);

    dict.set_item("id", task.id())?;
    dict.set_item("color", task.color())?;
    dict.set_item("arrival", task.arrival())?;
    dict.set_item("duration", task.duration())?;
    dict.set_item("static_priority", task.static_priority())?;
    dict.set_item("dynamic_priority", task.dynamic_priority())?;
    dict.set_item("remaining_time", task.remaining_time())?;
    dict.set_item("execution_history", task.execution_history().to_vec())?;
    dict.set_item("io_remaining", task.active_io().map(|io| io.remaining))?;

    if let Some(state) = orchestrator.task_state(task.index()) {
        dict.set_item("state", state_name(&state))?;
        if let TaskState::BlockedMutex { mutex_id } = state {
            dict.set_item("waiting_on", mutex_id)?;
        }
    }

    Ok(dict.into())
}

/// Convert a tick result to a Python dict
pub fn tick_result_to_py(py: Python, orchestrator: &Orchestrator, result: &TickResult) -> PyResult<Py<PyDict>> {
    let name = |id| orchestrator.task(id).map(|t| t.id().to_string());
    let dict = PyDict::new(py);

    dict.set_item("tick", result.tick)?;
    dict.set_item("ran", result.ran.and_then(name))?;
    dict.set_item("num_arrivals", result.num_arrivals)?;
    dict.set_item("num_io_returns", result.num_io_returns)?;
    dict.set_item(
        "dispatched",
        result.dispatched.iter().filter_map(|id| name(*id)).collect::<Vec<_>>(),
    )?;
    dict.set_item(
        "preempted",
        result
            .preemptions
            .iter()
            .filter_map(|(id, _)| name(*id))
            .collect::<Vec<_>>(),
    )?;
    dict.set_item("blocked", result.blocked.and_then(name))?;
    dict.set_item("completed", result.completed.and_then(name))?;
    dict.set_item("random_tie_break", result.random_tie_break)?;

    Ok(dict.into())
}
