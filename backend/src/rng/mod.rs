//! Deterministic random number generation
//!
//! Uses xorshift64* for fast, deterministic random numbers.
//! CRITICAL: The only randomness in the simulator is the last link of the
//! scheduler tie-break chain, and it MUST go through this module so that
//! rewinding and replaying a run reproduces the same decisions.

mod xorshift;

pub use xorshift::RngManager;
