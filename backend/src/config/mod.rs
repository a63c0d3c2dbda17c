//! Simulation configuration loading
//!
//! Parses the line-oriented text format into an [`OrchestratorConfig`]:
//!
//! ```text
//! # comment
//! <algorithm>;<quantum>[;<alpha>]
//! <id>;<color>;<arrival>;<duration>;<priority>[;<event>...]
//! ```
//!
//! Event tokens: `IO:<start>-<duration>`, `ML<mutex>:<start>`,
//! `MU<mutex>:<start>`.
//!
//! Loading is all-or-nothing: the first malformed line fails the whole load.
//! Algorithm names are not checked here; the orchestrator resolves them and
//! falls back to FIFO with a warning.
//!
//! [`OrchestratorConfig`]: crate::orchestrator::OrchestratorConfig

pub mod parser;

pub use parser::{load_config, parse_config, parse_event, ConfigError};
