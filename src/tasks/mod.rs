//! Background task scheduling.
//!
//! - [`Scheduler`] runs the search, duplicate-scan and file-operation
//!   engines on a worker pool, one live instance per [`TaskKind`].
//! - [`TaskMessage`] carries every [`TaskEvent`] tagged with its instance id.

pub mod events;
pub mod scheduler;

pub use events::{TaskEvent, TaskId, TaskKind, TaskMessage, TaskState};
pub use scheduler::{Scheduler, SchedulerError, TaskHandle};
