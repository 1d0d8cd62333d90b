//! Event types delivered from running tasks to the host.

use std::fmt;

use serde::Serialize;

use crate::actions::transfer::FileOperationResult;
use crate::duplicates::DuplicateReport;
use crate::search::SearchOutcome;

/// Identifier of one task instance. Monotonically increasing per scheduler.
pub type TaskId = u64;

/// The three kinds of background task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// File-name search under one root.
    Search,
    /// Duplicate detection across one or more roots.
    DuplicateScan,
    /// Bulk copy or move.
    FileOp,
}

impl TaskKind {
    /// All kinds, in a fixed order.
    pub const ALL: [TaskKind; 3] = [TaskKind::Search, TaskKind::DuplicateScan, TaskKind::FileOp];
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Search => "search",
            Self::DuplicateScan => "duplicate scan",
            Self::FileOp => "file operation",
        };
        f.write_str(name)
    }
}

/// Lifecycle of the current instance of a task kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Nothing has been started for this kind.
    #[default]
    Idle,
    /// The current instance is running.
    Running,
    /// The current instance ran to the end.
    Completed,
    /// The current instance stopped on its cancellation token.
    Cancelled,
}

impl TaskState {
    /// True once the instance has stopped, for either reason.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Something a running task has to say.
#[derive(Debug, Clone)]
pub enum TaskEvent {
    /// Completion percentage, non-decreasing within one instance.
    Progress(u8),
    /// Free-form status text.
    Status(String),
    /// Search result, partial if the search was cancelled.
    SearchMatches(SearchOutcome),
    /// Duplicate scan result. Never sent for a cancelled scan.
    DuplicateResult(DuplicateReport),
    /// Copy or move result, partial if the batch was cancelled.
    FileOperationResult(FileOperationResult),
    /// A fatal error that stopped the task before it did anything.
    Error { title: String, message: String },
    /// Always the last event of an instance.
    Finished,
}

impl TaskEvent {
    /// Whether this is the terminal event.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

/// An event tagged with the instance that produced it.
#[derive(Debug, Clone)]
pub struct TaskMessage {
    /// Instance id.
    pub id: TaskId,
    /// Kind of the instance.
    pub kind: TaskKind,
    /// The event itself.
    pub event: TaskEvent,
}
