//! Log destinations.
//!
//! A [`Transport`] receives already-filtered records and renders them with
//! its bound [`Formatter`](crate::format::Formatter). Three kinds exist:
//!
//! - [`console`]: line format to stdout;
//! - [`file`]: line format to a size-rotated file through a non-blocking
//!   writer;
//! - [`database`]: JSON documents to two collections on a [`LogStore`](crate::store::LogStore).

pub mod console;
pub mod database;
pub mod file;

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;
use crate::level::Level;
use crate::record::LogRecord;

pub use console::{ConsoleTransport, build_console_transport};
pub use database::{DatabaseOptions, DatabaseTransport, ReconnectPolicy, build_database_transport};
pub use file::{FileTransport, RollingFile, build_file_transport};

/// A configured destination for rendered records.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Name used in per-transport outcomes and diagnostics.
    fn name(&self) -> &str;

    /// Transport-specific level check. `None` defers to the logger's
    /// threshold.
    fn enabled(&self, _level: Level) -> Option<bool> {
        None
    }

    /// Whether panics are recorded on this transport.
    fn handles_exceptions(&self) -> bool {
        false
    }

    /// Emit one record. Must not block on I/O beyond a direct console write.
    fn log(&self, record: &LogRecord) -> Result<()>;

    /// Stop accepting records and wait until buffered output is written.
    /// Later calls to [`Transport::log`] may fail.
    async fn close(&self) {}
}

/// Default file size limit before rotation (10 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Default number of retained log files, including the active one.
pub const DEFAULT_MAX_FILES: usize = 10;

/// Descriptor of a transport to build at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TransportConfig {
    Console {
        #[serde(default = "default_label")]
        label: String,
    },
    File {
        directory: PathBuf,
        #[serde(default = "default_label")]
        label: String,
        #[serde(default = "default_max_size")]
        max_size: u64,
        #[serde(default = "default_max_files")]
        max_files: usize,
    },
    Database {
        uri: String,
    },
}

impl TransportConfig {
    pub fn console() -> Self {
        Self::Console { label: default_label() }
    }

    pub fn file(directory: impl Into<PathBuf>) -> Self {
        Self::File {
            directory: directory.into(),
            label: default_label(),
            max_size: DEFAULT_MAX_FILE_SIZE,
            max_files: DEFAULT_MAX_FILES,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Console { .. } => "console",
            Self::File { .. } => "file",
            Self::Database { .. } => "database",
        }
    }

    /// Build a console or file transport.
    ///
    /// Returns `Ok(None)` for database descriptors: those need an
    /// established connection, see [`crate::logger::Logger::build_db_connection`].
    pub fn build(&self) -> Result<Option<Box<dyn Transport>>> {
        match self {
            Self::Console { label } => Ok(Some(Box::new(ConsoleTransport::stdout(label.clone())))),
            Self::File { directory, label, max_size, max_files } => {
                let writer = RollingFile::open(directory.join(format!("{label}.log")), *max_size, *max_files)?;
                Ok(Some(Box::new(FileTransport::new(writer, label.clone()))))
            }
            Self::Database { .. } => Ok(None),
        }
    }
}

fn default_label() -> String {
    crate::format::DEFAULT_LABEL.to_string()
}

fn default_max_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

fn default_max_files() -> usize {
    DEFAULT_MAX_FILES
}
