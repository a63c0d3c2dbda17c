//! Simulation clock
//!
//! The simulation operates in discrete ticks. One tick is one unit of CPU
//! time; the clock only ever moves forward by one per `step()`.

use serde::{Deserialize, Serialize};

/// Monotonic tick counter owned by the orchestrator
///
/// # Example
/// ```
/// use cpu_scheduler_sim_core::SimClock;
///
/// let mut clock = SimClock::new();
/// assert_eq!(clock.current_tick(), 0);
///
/// clock.advance_tick();
/// assert_eq!(clock.current_tick(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimClock {
    /// Ticks elapsed since simulation start
    current_tick: usize,
}

impl SimClock {
    /// Create a clock at tick 0
    pub fn new() -> Self {
        Self { current_tick: 0 }
    }

    /// Advance time by one tick
    pub fn advance_tick(&mut self) {
        self.current_tick += 1;
    }

    /// Get the current tick
    pub fn current_tick(&self) -> usize {
        self.current_tick
    }
}
