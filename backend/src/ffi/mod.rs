//! Python bindings (feature `pyo3`)
//!
//! Thin wrappers that expose the orchestrator to a Python front end. All
//! simulation logic stays in the Rust core; this layer only converts types.

pub mod orchestrator;
pub mod types;
