//! Orchestrator - main simulation loop
//!
//! Implements the per-tick state machine integrating the scheduler, the
//! mutex table and the I/O queue, plus snapshot/restore and the rewind
//! timeline built on it.
//!
//! See `engine.rs` for the tick loop.

pub mod checkpoint;
pub mod engine;
pub mod history;

#[cfg(test)]
mod tests;

// Re-export main types for convenience
pub use engine::{
    Orchestrator, OrchestratorConfig, OrchestratorState, RunOutcome, SimulationError, TaskConfig,
    TickResult, DEFAULT_RNG_SEED,
};
pub use history::Timeline;

// Re-export checkpoint types
pub use checkpoint::{compute_config_hash, validate_snapshot, StateSnapshot};
