//! # stoa-log
//!
//! Log routing and formatting for the Stoa service:
//!
//! - **Levels** (`level`): severity levels and the two priority orderings
//! - **Records** (`record`): the `LogRecord` unit of emission
//! - **Formatting** (`format`): line and JSON-with-metadata renderings
//! - **Transports** (`transport`): console, size-rotated file, database
//! - **Stores** (`store`): `LogStore` trait, MongoDB and in-memory stores
//! - **Logger** (`logger`): environment-driven assembly and fan-out
//! - **Tracing bridge** (`layer`, `logging`): route `tracing` events and
//!   panics through a logger
//! - **Configuration** (`config`): the logging section of the host config
//! - **Error types** (`error`): `LogError` via thiserror

pub mod config;
pub mod error;
pub mod format;
pub mod layer;
pub mod level;
pub mod logger;
pub mod logging;
pub mod record;
pub mod store;
pub mod transport;

pub use error::{LogError, Result};
pub use level::{Level, SeverityLevels, Threshold};
pub use logger::{Delivery, Environment, Logger, TransportOutcome};
pub use record::LogRecord;
