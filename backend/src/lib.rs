//! CPU Scheduler Simulator Core - Rust Engine
//!
//! Tick-driven single-CPU scheduling simulator with deterministic execution
//! and full snapshot/rewind support.
//!
//! # Architecture
//!
//! - **core**: Simulation clock
//! - **models**: Domain types (Task, TaskTable, EventLog)
//! - **scheduler**: Ready queue, algorithms and the tie-break chain
//! - **blocking**: Mutex table and I/O queue
//! - **orchestrator**: Per-tick state machine, checkpoints, rewind timeline
//! - **config**: Text config parser
//! - **rng**: Deterministic random number generation
//!
//! # Critical Invariants
//!
//! 1. `remaining_time == duration - len(execution_history)` for every task
//! 2. All randomness is deterministic (seeded RNG inside the scheduler)
//! 3. Tasks are addressed by `TaskId` index, so snapshots never alias live state
//! 4. FFI boundary is minimal and safe

// Module declarations
pub mod blocking;
pub mod config;
pub mod core;
pub mod models;
pub mod orchestrator;
pub mod rng;
pub mod scheduler;

// Re-exports for convenience
pub use blocking::{AcquireOutcome, IoQueue, MutexTable, ReleaseOutcome};
pub use config::{load_config, parse_config, ConfigError};
pub use core::time::SimClock;
pub use models::{
    event::{EventLog, PreemptReason, SimEvent},
    state::TaskTable,
    task::{EventKind, Task, TaskEvent, TaskId, TaskState},
};
pub use orchestrator::{
    Orchestrator, OrchestratorConfig, OrchestratorState, RunOutcome, SimulationError,
    StateSnapshot, TaskConfig, TickResult, Timeline, DEFAULT_RNG_SEED,
};
pub use rng::RngManager;
pub use scheduler::{Algorithm, Scheduler, UnknownAlgorithm};

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

// PyO3 exports (when feature enabled)
#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn cpu_scheduler_sim_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ffi::orchestrator::PyOrchestrator>()?;
    Ok(())
}
