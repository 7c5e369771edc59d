//! Logging section of the host configuration.
//!
//! # Example
//!
//! ```json
//! {
//!   "folder": "/var/log/stoa",
//!   "label": "Stoa",
//!   "console": true,
//!   "database_url": "mongodb://localhost:27017/stoa",
//!   "environment": "production"
//! }
//! ```
//!
//! All fields are optional.

use std::path::PathBuf;

use serde::Deserialize;

use crate::format::DEFAULT_LABEL;
use crate::logger::Environment;
use crate::transport::{DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_FILES, TransportConfig};

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Directory for the rotating log file. No file output when unset.
    pub folder: Option<PathBuf>,

    /// Label bound to console and file lines.
    #[serde(default = "default_label")]
    pub label: String,

    /// Whether to add a console transport outside the `test` environment.
    #[serde(default = "default_console")]
    pub console: bool,

    /// MongoDB connection string for the database transport.
    pub database_url: Option<String>,

    /// Environment discriminator, overridden by `STOA_ENV`.
    pub environment: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            folder: None,
            label: default_label(),
            console: default_console(),
            database_url: None,
            environment: None,
        }
    }
}

fn default_label() -> String {
    DEFAULT_LABEL.to_string()
}

fn default_console() -> bool {
    true
}

impl LoggingConfig {
    /// Effective environment: `STOA_ENV`, then the config value, then
    /// production.
    pub fn environment(&self) -> Environment {
        Environment::from_env().unwrap_or_else(|| self.resolve_environment(None))
    }

    /// Environment from an explicit override, falling back to the config.
    pub fn resolve_environment(&self, override_value: Option<&str>) -> Environment {
        override_value
            .or(self.environment.as_deref())
            .map(Environment::from_discriminator)
            .unwrap_or_default()
    }

    /// Host-managed transports to add on top of what the assembler installs
    /// for `environment`.
    pub fn transports(&self, environment: Environment) -> Vec<TransportConfig> {
        let mut transports = Vec::new();
        if self.console && environment != Environment::Test {
            transports.push(TransportConfig::Console { label: self.label.clone() });
        }
        if let Some(folder) = &self.folder {
            transports.push(TransportConfig::File {
                directory: folder.clone(),
                label: self.label.clone(),
                max_size: DEFAULT_MAX_FILE_SIZE,
                max_files: DEFAULT_MAX_FILES,
            });
        }
        if let Some(uri) = &self.database_url {
            transports.push(TransportConfig::Database { uri: uri.clone() });
        }
        transports
    }
}
