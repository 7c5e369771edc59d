//! The unit of emission: one log record.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::level::Level;

/// A single log record.
///
/// Built by callers, read by formatters and transports. Label and message
/// default to the empty string.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub level: Level,
    pub message: String,
    pub label: String,
    pub timestamp: DateTime<Utc>,
    /// Extra structured fields, in insertion order.
    pub fields: Map<String, Value>,
}

impl LogRecord {
    /// New record stamped with the current time.
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self::at(level, message, Utc::now())
    }

    pub fn at(level: Level, message: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            level,
            message: message.into(),
            label: String::new(),
            timestamp,
            fields: Map::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// ISO-8601 timestamp with millisecond precision, e.g.
    /// `2021-03-04T05:06:07.089Z`.
    pub fn timestamp_string(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}
