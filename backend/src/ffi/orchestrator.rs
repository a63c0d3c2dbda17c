//! PyO3 wrapper for Orchestrator
//!
//! This module provides the Python interface to the Rust orchestrator.

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use super::types::{task_to_py, tick_result_to_py};
use crate::config::parse_config;
use crate::orchestrator::{Orchestrator as RustOrchestrator, StateSnapshot};

/// Python wrapper for Rust Orchestrator
///
/// # Example (from Python)
///
/// ```python
/// from cpu_scheduler_sim_core import Orchestrator
///
/// orch = Orchestrator.from_config_text("srtf;2\nT1;#f00;0;5;1\nT2;#0f0;2;3;1\n")
/// while not orch.is_finished():
///     result = orch.step()
///     print(result["tick"], result["ran"])
/// ```
#[pyclass(name = "Orchestrator")]
pub struct PyOrchestrator {
    inner: RustOrchestrator,
}

#[pymethods]
impl PyOrchestrator {
    /// Create a new orchestrator from config text
    ///
    /// Raises ValueError for malformed config text or an invalid config.
    #[staticmethod]
    #[pyo3(signature = (text, rng_seed=None))]
    fn from_config_text(text: &str, rng_seed: Option<u64>) -> PyResult<Self> {
        let mut config = parse_config(text)
            .map_err(|e| PyErr::new::<PyValueError, _>(format!("Invalid config: {}", e)))?;
        if let Some(seed) = rng_seed {
            config.rng_seed = seed;
        }

        let inner = RustOrchestrator::new(config).map_err(|e| {
            PyErr::new::<PyValueError, _>(format!("Failed to create orchestrator: {}", e))
        })?;

        Ok(PyOrchestrator { inner })
    }

    /// Execute one simulation tick
    fn step(&mut self, py: Python) -> PyResult<Py<PyDict>> {
        let result = self.inner.step();
        tick_result_to_py(py, &self.inner, &result)
    }

    fn clock(&self) -> usize {
        self.inner.clock()
    }

    fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }

    fn is_deadlocked(&self) -> bool {
        self.inner.is_deadlocked()
    }

    fn algorithm(&self) -> &'static str {
        self.inner.algorithm().name()
    }

    /// Id of the task holding the CPU, or None
    fn running_task(&self) -> Option<String> {
        self.inner
            .running_task()
            .and_then(|id| self.inner.task(id))
            .map(|t| t.id().to_string())
    }

    /// Ready task ids in queue order
    fn ready_tasks(&self) -> Vec<String> {
        self.inner
            .ready_tasks()
            .into_iter()
            .filter_map(|id| self.inner.task(id))
            .map(|t| t.id().to_string())
            .collect()
    }

    /// Tasks with arrival <= clock, as dicts, in config order
    fn admitted_tasks(&self, py: Python) -> PyResult<Vec<Py<PyDict>>> {
        self.inner
            .admitted_tasks()
            .into_iter()
            .map(|task| task_to_py(py, &self.inner, task))
            .collect()
    }

    fn warnings(&self) -> Vec<String> {
        self.inner.warnings().into_iter().map(str::to_string).collect()
    }

    /// Serialize the full state to a JSON string
    fn snapshot(&self) -> PyResult<String> {
        self.inner
            .snapshot()
            .to_json()
            .map_err(|e| PyErr::new::<PyRuntimeError, _>(e.to_string()))
    }

    /// Restore a state produced by `snapshot()`
    ///
    /// Raises ValueError if the snapshot belongs to another config or is
    /// corrupt; the live state is left unchanged.
    fn restore(&mut self, snapshot: &str) -> PyResult<()> {
        let snapshot = StateSnapshot::from_json(snapshot)
            .map_err(|e| PyErr::new::<PyValueError, _>(e.to_string()))?;
        self.inner
            .restore(snapshot)
            .map_err(|e| PyErr::new::<PyValueError, _>(e.to_string()))
    }
}
