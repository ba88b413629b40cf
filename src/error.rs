//! The error taxonomy for Taskpulse.
//!
//! Every failure the core can produce is one of these variants, surfaced to
//! the caller with the offending field or value named. Nothing in the core
//! silently substitutes a default: a log that cannot be loaded fails as a
//! whole, and a category the model was never trained on is an error, not a
//! guess.

use thiserror::Error;

/// Errors produced by the loader, the classifier adapter, and the to-do store.
#[derive(Debug, Error)]
pub enum TaskLogError {
    /// The task log file is missing or unreadable.
    #[error("failed to read task log: {0}")]
    Load(#[from] std::io::Error),

    /// The task log is not well-formed CSV.
    #[error("malformed task log: {0}")]
    Malformed(#[from] csv::Error),

    /// A required column is absent from the task log header.
    #[error("required column '{0}' is missing from the task log")]
    MissingColumn(&'static str),

    /// A row's timestamp did not match the expected format.
    ///
    /// Loading is all-or-nothing: a single bad timestamp fails the whole
    /// load rather than producing a partial record set.
    #[error("row {row}: cannot parse timestamp '{value}' (expected YYYY-MM-DD HH:MM[:SS])")]
    ParseTimestamp { row: usize, value: String },

    /// A categorical value outside the vocabulary the model was trained on.
    #[error("unknown {field} '{value}': not in the trained vocabulary")]
    UnknownCategory { field: &'static str, value: String },

    /// The classifier artifact is missing, corrupt, or inconsistent.
    #[error("classifier model is not available: {0}")]
    ModelUnavailable(String),

    /// A to-do item id that does not exist in the store.
    #[error("no to-do item with id {0}")]
    UnknownTodo(u64),
}
