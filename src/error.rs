//! Diagnostic error types for taskwise.
//!
//! Subsystems that talk to the outside world (providers, config, paths) define
//! their own error enums next to the code; this module holds the store and input
//! errors plus the top-level [`TaskwiseError`] that wraps all of them, preserving
//! the miette diagnostic chain (codes and help text) through to the CLI.
//!
//! Insight operations never return these: their contract is total. Errors only
//! surface from configuration loading, workspace I/O and input validation.

use miette::Diagnostic;
use thiserror::Error;

use crate::config::ConfigError;
use crate::parse::ParseError;
use crate::paths::PathError;
use crate::provider::ProviderError;

/// Top-level error type for taskwise.
#[derive(Debug, Error, Diagnostic)]
pub enum TaskwiseError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("failed to read workspace file: {path}")]
    #[diagnostic(
        code(taskwise::store::read),
        help("Check that the data directory exists and is readable, or run `taskwise init`.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write workspace file: {path}")]
    #[diagnostic(
        code(taskwise::store::write),
        help(
            "A filesystem operation failed. Check that the data directory exists, \
             has correct permissions, and that the disk is not full."
        )
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("workspace file is corrupt: {path}: {message}")]
    #[diagnostic(
        code(taskwise::store::corrupt),
        help(
            "The workspace JSON could not be decoded. Restore it from a backup \
             or move it aside to start with an empty workspace."
        )
    )]
    Corrupt { path: String, message: String },

    #[error("failed to encode workspace: {message}")]
    #[diagnostic(
        code(taskwise::store::encode),
        help("This is a bug: workspace records should always serialize.")
    )]
    Encode { message: String },
}

// ---------------------------------------------------------------------------
// Input errors
// ---------------------------------------------------------------------------

/// Caller-supplied data that cannot be processed.
#[derive(Debug, Error, Diagnostic)]
pub enum InputError {
    #[error("{field} is required")]
    #[diagnostic(
        code(taskwise::input::missing),
        help("Provide a non-empty value for `{field}`.")
    )]
    Missing { field: &'static str },

    #[error("unknown source type \"{value}\"")]
    #[diagnostic(
        code(taskwise::input::source_type),
        help("Use one of: email, message, note, other.")
    )]
    SourceType { value: String },

    #[error("unknown task status \"{value}\"")]
    #[diagnostic(
        code(taskwise::input::status),
        help("Use one of: todo, in-progress, completed.")
    )]
    Status { value: String },

    #[error("task {id} not found")]
    #[diagnostic(
        code(taskwise::input::task_not_found),
        help("List tasks with `taskwise task list` to find a valid id.")
    )]
    TaskNotFound { id: u64 },
}

/// Convenience alias for functions returning taskwise results.
pub type TaskwiseResult<T> = std::result::Result<T, TaskwiseError>;
