//! Scheduling algorithm selection
//!
//! Closed set of dispatch policies. Preemption capabilities are derived from
//! the variant, so adding a policy forces every `match` to handle it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Algorithm name not recognized by [`Algorithm::from_str`]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown scheduling algorithm '{0}'")]
pub struct UnknownAlgorithm(pub String);

/// Dispatch policy of the scheduler
///
/// | Variant              | Config names  | Selects                      | Preempts on        |
/// |----------------------|---------------|------------------------------|--------------------|
/// | `Fifo`               | `fifo`, `rr`  | earliest enqueued            | quantum            |
/// | `Srtf`               | `srtf`        | least remaining time         | arrival            |
/// | `PriorityPreemptive` | `priop`       | highest static priority      | arrival            |
/// | `PriorityAging`      | `priopenv`    | highest dynamic priority     | arrival + quantum  |
///
/// # Example
/// ```
/// use cpu_scheduler_sim_core::Algorithm;
///
/// let algorithm: Algorithm = " SRTF ".parse().unwrap();
/// assert_eq!(algorithm, Algorithm::Srtf);
/// assert!(algorithm.preempts_on_arrival());
/// assert!(!algorithm.preempts_on_quantum());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// First-come first-served with round-robin requeue at quantum expiry
    #[default]
    Fifo,

    /// Shortest remaining time first
    Srtf,

    /// Highest static priority first
    PriorityPreemptive,

    /// Highest dynamic priority first; waiting tasks age by `alpha` per tick
    PriorityAging,
}

impl Algorithm {
    /// Canonical config name
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Fifo => "fifo",
            Algorithm::Srtf => "srtf",
            Algorithm::PriorityPreemptive => "priop",
            Algorithm::PriorityAging => "priopenv",
        }
    }

    /// Whether a newly admitted task may take the CPU from the running one
    pub fn preempts_on_arrival(self) -> bool {
        match self {
            Algorithm::Fifo => false,
            Algorithm::Srtf | Algorithm::PriorityPreemptive | Algorithm::PriorityAging => true,
        }
    }

    /// Whether the running task is requeued when its quantum expires
    pub fn preempts_on_quantum(self) -> bool {
        match self {
            Algorithm::Fifo | Algorithm::PriorityAging => true,
            Algorithm::Srtf | Algorithm::PriorityPreemptive => false,
        }
    }

    /// Whether ready tasks age every tick
    pub fn uses_aging(self) -> bool {
        matches!(self, Algorithm::PriorityAging)
    }
}

impl FromStr for Algorithm {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fifo" | "rr" => Ok(Algorithm::Fifo),
            "srtf" => Ok(Algorithm::Srtf),
            "priop" => Ok(Algorithm::PriorityPreemptive),
            "priopenv" => Ok(Algorithm::PriorityAging),
            _ => Err(UnknownAlgorithm(s.trim().to_string())),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
