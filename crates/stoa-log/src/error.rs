//! Typed error definitions for the logging layer.
//!
//! [`LogError`] covers transport setup and per-record emission failures.
//! None of these ever escape a log call: the logger folds them into a
//! per-transport outcome instead (see [`crate::logger::TransportOutcome`]).

use thiserror::Error;

/// Result alias used throughout `stoa-log`.
pub type Result<T> = std::result::Result<T, LogError>;

/// Domain-specific errors for the logging layer.
#[derive(Debug, Error)]
pub enum LogError {
    /// File or console write error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON rendering or config parsing error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A JSON document could not be converted into a BSON document.
    #[error("bson error: {0}")]
    Bson(#[from] mongodb::bson::ser::Error),

    /// Database connection or insert error.
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    /// The background writer queue is full; the record was dropped.
    #[error("transport '{0}' queue full, record dropped")]
    QueueFull(String),

    /// The background writer has exited.
    #[error("transport '{0}' is closed")]
    Closed(String),

    /// Configuration parsing or validation error.
    #[error("config error: {0}")]
    Config(String),

    /// A process-wide subscriber was already installed.
    #[error("subscriber init error: {0}")]
    SubscriberInit(#[from] tracing_subscriber::util::TryInitError),
}

impl LogError {
    /// Whether retrying the same operation later can succeed.
    ///
    /// Only driver errors qualify; a document that failed to convert will
    /// fail again.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}
