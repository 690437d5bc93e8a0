//! Error types shared by the engine, the backends and the front ends.

use std::path::PathBuf;

use thiserror::Error;

/// Input rejected before it reaches the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("task description cannot be empty")]
    EmptyDescription,

    #[error("invalid due date '{0}', expected YYYY-MM-DD")]
    InvalidDueDate(String),

    #[error("invalid priority '{0}', expected H, M or L")]
    InvalidPriority(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("backend command `{command}` failed: {message}")]
    Backend { command: String, message: String },

    #[error("task {0} not found in backend")]
    TaskNotFound(String),

    #[error("io error at {path}: {source}")]
    IoPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("terminal error: {0}")]
    Terminal(#[source] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("cannot install log subscriber: {0}")]
    Logging(#[source] tracing_subscriber::util::TryInitError),
}

pub type Result<T> = std::result::Result<T, Error>;
