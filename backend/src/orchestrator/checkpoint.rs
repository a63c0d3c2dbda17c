//! Checkpoint - Save/Restore Simulation State
//!
//! Snapshots are plain values: the whole [`OrchestratorState`] cloned, plus
//! the hash of the config it was produced under. Restoring swaps the live
//! state for the snapshot's, which is how rewind and replay work.
//!
//! # Critical Invariants
//!
//! - **Determinism**: restoring and stepping again repeats the same ticks
//!   (the scheduler RNG is part of the snapshot)
//! - **Location Integrity**: every admitted, unfinished task is in exactly
//!   one place (running, ready, I/O, or one mutex wait queue)
//! - **Time Conservation**: `remaining_time + executed ticks == duration`
//! - **Config Matching**: a snapshot only restores under the same config

use crate::orchestrator::engine::{OrchestratorState, SimulationError};
use crate::models::task::TaskId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

// ============================================================================
// Snapshot Structures
// ============================================================================

/// Complete orchestrator state snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// SHA256 hash of the config (for validation)
    pub config_hash: String,

    /// Independent copy of every mutable part of the simulation
    pub state: OrchestratorState,
}

impl StateSnapshot {
    /// Current tick position
    pub fn clock(&self) -> usize {
        self.state.clock()
    }

    pub fn to_json(&self) -> Result<String, SimulationError> {
        serde_json::to_string(self).map_err(|e| {
            SimulationError::SerializationError(format!("Snapshot serialization failed: {}", e))
        })
    }

    pub fn from_json(json: &str) -> Result<Self, SimulationError> {
        serde_json::from_str(json).map_err(|e| {
            SimulationError::SerializationError(format!("Snapshot deserialization failed: {}", e))
        })
    }
}

// ============================================================================
// Config Hashing
// ============================================================================

/// Compute deterministic SHA256 hash of config
///
/// Uses canonical JSON serialization with sorted keys so the hash does not
/// depend on map iteration order.
pub fn compute_config_hash<T: Serialize>(config: &T) -> Result<String, SimulationError> {
    use serde_json::Value;
    use std::collections::BTreeMap;

    let value = serde_json::to_value(config).map_err(|e| {
        SimulationError::SerializationError(format!("Config serialization failed: {}", e))
    })?;

    fn canonicalize(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<String, Value> =
                    map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
                Value::Object(sorted.into_iter().collect())
            }
            Value::Array(arr) => Value::Array(arr.into_iter().map(canonicalize).collect()),
            other => other,
        }
    }

    let json = serde_json::to_string(&canonicalize(value)).map_err(|e| {
        SimulationError::SerializationError(format!("Config serialization failed: {}", e))
    })?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

// ============================================================================
// Validation Functions
// ============================================================================

fn invalid(message: String) -> SimulationError {
    SimulationError::StateValidationError(message)
}

/// Validate state snapshot integrity
///
/// Checks critical invariants:
/// - Time conservation and execution history bounds
/// - Referential integrity of every queue
/// - Each task in at most one location, admitted tasks in exactly one
/// - Scheduler and orchestrator agree on the running task
pub fn validate_snapshot(snapshot: &StateSnapshot) -> Result<(), SimulationError> {
    let state = &snapshot.state;
    let clock = state.clock();
    let tasks = state.tasks();

    // 1. Time conservation
    for task in tasks.iter() {
        let executed = task.execution_history().len();
        if task.remaining_time() + executed != task.duration() {
            return Err(invalid(format!(
                "Time conservation violated for task {}: {} remaining + {} executed != {}",
                task.id(),
                task.remaining_time(),
                executed,
                task.duration()
            )));
        }
        if task.execution_history().windows(2).any(|w| w[0] >= w[1]) {
            return Err(invalid(format!(
                "Execution history of task {} is not strictly increasing",
                task.id()
            )));
        }
        if let Some(&last) = task.execution_history().last() {
            if last >= clock {
                return Err(invalid(format!(
                    "Task {} executed at tick {} but clock is {}",
                    task.id(),
                    last,
                    clock
                )));
            }
        }
    }

    // 2. Referential integrity + 3. location uniqueness
    let mut seen: HashMap<TaskId, String> = HashMap::new();
    let mut place = |id: TaskId, location: String| -> Result<(), SimulationError> {
        if !tasks.contains(id) {
            return Err(invalid(format!("Unknown task {} in {}", id, location)));
        }
        if let Some(previous) = seen.insert(id, location.clone()) {
            return Err(invalid(format!(
                "Task {} in multiple locations: {} and {}",
                tasks[id].id(),
                previous,
                location
            )));
        }
        Ok(())
    };

    if let Some(id) = state.running() {
        place(id, "running".to_string())?;
    }
    for id in state.scheduler().ready_tasks() {
        place(id, "ready queue".to_string())?;
    }
    for id in state.io_queue().iter() {
        place(id, "I/O queue".to_string())?;
    }
    for (name, mutex) in state.mutexes().iter() {
        for id in mutex.waiters() {
            place(id, format!("mutex {} wait queue", name))?;
        }
    }
    for &id in state.finished() {
        place(id, "finished list".to_string())?;
    }

    // Owners must exist and never wait
    for (name, mutex) in state.mutexes().iter() {
        if let Some(owner) = mutex.owner() {
            if !tasks.contains(owner) {
                return Err(invalid(format!("Unknown owner {} of mutex {}", owner, name)));
            }
            if state.mutexes().waiting_on(owner).is_some() {
                return Err(invalid(format!(
                    "Task {} owns mutex {} while waiting on another",
                    tasks[owner].id(),
                    name
                )));
            }
        }
    }

    // Every admitted task is somewhere; future arrivals are nowhere
    for task in tasks.iter() {
        let located = seen.get(&task.index());
        let admitted = task.arrival() < clock;
        match (admitted, located) {
            (true, None) => {
                return Err(invalid(format!(
                    "Admitted task {} is in no queue",
                    task.id()
                )))
            }
            (false, Some(location)) => {
                return Err(invalid(format!(
                    "Task {} has not arrived but is in {}",
                    task.id(),
                    location
                )))
            }
            _ => {}
        }

        let finished = located.is_some_and(|l| l == "finished list");
        if finished != task.is_complete() {
            return Err(invalid(format!(
                "Task {} completion does not match its location",
                task.id()
            )));
        }

        let in_io = state.io_queue().contains(task.index());
        if in_io != task.active_io().is_some() {
            return Err(invalid(format!(
                "Task {} I/O countdown does not match the I/O queue",
                task.id()
            )));
        }
    }

    // 4. Scheduler agrees on the running task
    if state.scheduler().current_running() != state.running() {
        return Err(invalid(format!(
            "Scheduler thinks {:?} is running, orchestrator says {:?}",
            state.scheduler().current_running(),
            state.running()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_config_hash_deterministic() {
        #[derive(Serialize)]
        struct TestConfig {
            value: i32,
            name: String,
        }

        let config1 = TestConfig {
            value: 42,
            name: "test".to_string(),
        };
        let config2 = TestConfig {
            value: 42,
            name: "test".to_string(),
        };

        let hash1 = compute_config_hash(&config1).unwrap();
        let hash2 = compute_config_hash(&config2).unwrap();

        assert_eq!(hash1, hash2, "Same config should produce same hash");
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_compute_config_hash_different_for_different_configs() {
        #[derive(Serialize)]
        struct TestConfig {
            value: i32,
        }

        let hash1 = compute_config_hash(&TestConfig { value: 42 }).unwrap();
        let hash2 = compute_config_hash(&TestConfig { value: 43 }).unwrap();

        assert_ne!(
            hash1, hash2,
            "Different configs should produce different hashes"
        );
    }

    #[test]
    fn test_hash_ignores_map_order() {
        let a: HashMap<&str, i32> = [("x", 1), ("y", 2)].into_iter().collect();
        let b: HashMap<&str, i32> = [("y", 2), ("x", 1)].into_iter().collect();
        assert_eq!(
            compute_config_hash(&a).unwrap(),
            compute_config_hash(&b).unwrap()
        );
    }
}
