//! Logger assembly and best-effort fan-out.
//!
//! [`Logger::create`] picks the minimum level and initial transport set from
//! the runtime [`Environment`]:
//!
//! | environment   | level   | transports |
//! |---------------|---------|------------|
//! | `test`        | `error` | console    |
//! | `development` | `debug` | none       |
//! | anything else | `info`  | none       |
//!
//! The host adds its own transports with [`Logger::add`] and optionally the
//! database transport with [`Logger::build_db_connection`], then wraps the
//! logger in an `Arc` and hands it to every consumer.
//!
//! Every record is offered to every transport independently. A failing
//! transport only affects its own [`TransportOutcome`].

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::error::{LogError, Result};
use crate::level::{Level, Threshold};
use crate::record::LogRecord;
use crate::store::{LogStore, MongoStore};
use crate::transport::{Transport, build_console_transport, build_database_transport};

/// Environment variable holding the environment discriminator.
pub const ENVIRONMENT_VAR: &str = "STOA_ENV";

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Runtime environment discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Environment {
    Test,
    Development,
    #[default]
    Production,
}

impl Environment {
    /// `test` and `development` are recognized; anything else is production.
    pub fn from_discriminator(value: &str) -> Self {
        match value.trim() {
            "test" => Self::Test,
            "development" => Self::Development,
            _ => Self::Production,
        }
    }

    /// Read [`ENVIRONMENT_VAR`], if set.
    pub fn from_env() -> Option<Self> {
        std::env::var(ENVIRONMENT_VAR).ok().map(|v| Self::from_discriminator(&v))
    }

    pub fn min_level(&self) -> Level {
        match self {
            Self::Test => Level::Error,
            Self::Development => Level::Debug,
            Self::Production => Level::Info,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Test => write!(f, "test"),
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// What happened to a record on one transport.
#[derive(Debug)]
pub enum Delivery {
    Written,
    /// Below the transport's (or the logger's) threshold.
    Filtered,
    Failed(LogError),
}

#[derive(Debug)]
pub struct TransportOutcome {
    pub transport: String,
    pub delivery: Delivery,
}

impl TransportOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self.delivery, Delivery::Failed(_))
    }
}

// ---------------------------------------------------------------------------
// Logger
// ---------------------------------------------------------------------------

/// A level threshold plus the transports records are fanned out to.
pub struct Logger {
    environment: Environment,
    threshold: Threshold,
    transports: Vec<Box<dyn Transport>>,
}

impl Logger {
    /// Empty logger at `level` under the standard ordering.
    pub fn new(level: Level) -> Self {
        Self {
            environment: Environment::default(),
            threshold: Threshold::standard(level),
            transports: Vec::new(),
        }
    }

    /// Assemble the logger for `environment`.
    pub fn create(environment: Environment) -> Self {
        let mut logger = Self::new(environment.min_level());
        logger.environment = environment;
        if environment == Environment::Test {
            logger.add(build_console_transport());
        }
        logger
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn level(&self) -> Level {
        self.threshold.level
    }

    pub fn add(&mut self, transport: impl Transport + 'static) -> &mut Self {
        self.add_boxed(Box::new(transport))
    }

    pub fn add_boxed(&mut self, transport: Box<dyn Transport>) -> &mut Self {
        self.transports.push(transport);
        self
    }

    /// Names of the attached transports, in fan-out order.
    pub fn transport_names(&self) -> Vec<&str> {
        self.transports.iter().map(|t| t.name()).collect()
    }

    fn accepts(&self, transport: &dyn Transport, level: Level) -> bool {
        transport.enabled(level).unwrap_or_else(|| self.threshold.allows(level))
    }

    /// Whether at least one transport would accept `level`.
    pub fn is_enabled(&self, level: Level) -> bool {
        self.transports.iter().any(|t| self.accepts(t.as_ref(), level))
    }

    /// Offer `record` to every transport; never short-circuits.
    pub fn log(&self, record: &LogRecord) -> Vec<TransportOutcome> {
        self.transports
            .iter()
            .map(|transport| {
                let delivery = if !self.accepts(transport.as_ref(), record.level) {
                    Delivery::Filtered
                } else {
                    match transport.log(record) {
                        Ok(()) => Delivery::Written,
                        Err(e) => Delivery::Failed(e),
                    }
                };
                TransportOutcome { transport: transport.name().to_string(), delivery }
            })
            .collect()
    }

    /// Record an uncaught failure on exception-handling transports only,
    /// regardless of level.
    pub fn log_exception(&self, message: impl Into<String>) -> Vec<TransportOutcome> {
        let record = LogRecord::new(Level::Error, message);
        self.transports
            .iter()
            .filter(|t| t.handles_exceptions())
            .map(|transport| {
                let delivery = match transport.log(&record) {
                    Ok(()) => Delivery::Written,
                    Err(e) => Delivery::Failed(e),
                };
                TransportOutcome { transport: transport.name().to_string(), delivery }
            })
            .collect()
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(&LogRecord::new(Level::Error, message));
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(&LogRecord::new(Level::Warn, message));
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(&LogRecord::new(Level::Info, message));
    }

    pub fn http(&self, message: impl Into<String>) {
        self.log(&LogRecord::new(Level::Http, message));
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(&LogRecord::new(Level::Debug, message));
    }

    /// Close every transport in fan-out order, waiting for buffered file
    /// lines and queued database documents to be written.
    pub async fn shutdown(&self) {
        for transport in &self.transports {
            transport.close().await;
        }
    }

    /// Connect to the log database and attach the database transport.
    ///
    /// Returns `false` (after logging the cause) when the connection cannot
    /// be established; the logger keeps working on its other transports.
    pub async fn build_db_connection(&mut self, uri: &str) -> bool {
        self.connect_database(uri, |uri| async move { MongoStore::connect(&uri).await }).await
    }

    /// [`Logger::build_db_connection`] over an arbitrary store constructor.
    pub async fn connect_database<F, Fut, S>(&mut self, uri: &str, connect: F) -> bool
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<S>>,
        S: LogStore,
    {
        match connect(uri.to_string()).await {
            Ok(store) => {
                self.add(build_database_transport(Arc::new(store)));
                true
            }
            Err(e) => {
                self.error(format!("stoa is unable to build connection for db log. Error: {e}"));
                false
            }
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("environment", &self.environment)
            .field("level", &self.threshold.level)
            .field("transports", &self.transport_names())
            .finish()
    }
}
