//! Blocking subsystem
//!
//! "Blocking" is a simulated state transition, never a paused call: a task
//! leaves execution and waits in one of these structures until the
//! orchestrator re-admits it to the ready queue.
//!
//! - **mutex**: named locks with FIFO wait queues
//! - **io**: timed I/O countdowns

pub mod io;
pub mod mutex;

pub use io::IoQueue;
pub use mutex::{AcquireOutcome, MutexState, MutexTable, ReleaseOutcome};
