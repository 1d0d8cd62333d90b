//! File actions module.
//!
//! This module provides functionality for:
//! - Bulk copy and move into a destination directory
//! - Safe deletion of duplicates via the trash crate
//! - Permanent deletion (with confirmation)
//!
//! # Transfer
//!
//! ```no_run
//! use proview::actions::transfer::{execute, FileOperationRequest, OperationKind};
//! use proview::cancel::CancellationToken;
//! use proview::progress::NoopProgress;
//! use std::path::PathBuf;
//!
//! let request = FileOperationRequest::new(
//!     vec![PathBuf::from("a.txt")],
//!     PathBuf::from("/tmp"),
//!     OperationKind::Move,
//! );
//! let _ = execute(&request, &CancellationToken::new(), &NoopProgress);
//! ```
//!
//! # Deletion
//!
//! ```no_run
//! use proview::actions::delete::delete_to_trash;
//! use std::path::PathBuf;
//!
//! let path = PathBuf::from("/path/to/duplicate.txt");
//! let result = delete_to_trash(&path);
//! ```

pub mod delete;
pub mod transfer;

// Re-export commonly used types
pub use delete::{
    delete_batch, delete_path, delete_to_trash, permanent_delete, select_duplicates,
    validate_preserves_copy, validate_selection, BatchDeleteResult, DeleteConfig, DeleteError,
    DeleteResult,
};
pub use transfer::{
    conflict_free_target, copy_entry, execute, move_entry, FileOperationRequest,
    FileOperationResult, ItemError, OperationKind, TransferError,
};
