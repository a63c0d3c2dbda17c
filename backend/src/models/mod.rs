//! Domain models for the scheduling simulator

pub mod event;
pub mod state;
pub mod task;

// Re-exports
pub use event::{EventLog, PreemptReason, SimEvent};
pub use state::TaskTable;
pub use task::{ActiveIo, EventKind, Task, TaskEvent, TaskId, TaskState};
