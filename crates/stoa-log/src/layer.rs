//! Bridge from `tracing` events to a [`Logger`].
//!
//! Lets the host keep using `tracing::info!` and friends while records are
//! routed through the logger's transports. Mapping:
//!
//! - the `message` field becomes the record message, every other field goes
//!   into [`LogRecord::fields`];
//! - `TRACE` maps to `silly`, the other tracing levels map by name;
//! - events with target `http` are recorded at [`Level::Http`].
//!
//! Events emitted from inside this crate (transport diagnostics) are never
//! fed back into the logger.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Metadata, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::level::Level;
use crate::logger::Logger;
use crate::record::LogRecord;

/// Modules whose diagnostics stay out of the logger.
pub const INTERNAL_TARGETS: [&str; 2] = ["stoa_log::transport", "stoa_log::store"];

/// Target that marks an event as an access log.
pub const HTTP_TARGET: &str = "http";

pub struct StoaLayer {
    logger: Arc<Logger>,
}

impl StoaLayer {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self { logger }
    }
}

fn is_internal(target: &str) -> bool {
    INTERNAL_TARGETS.iter().any(|prefix| target.starts_with(prefix))
}

fn level_of(metadata: &Metadata<'_>) -> Level {
    if metadata.target() == HTTP_TARGET {
        Level::Http
    } else {
        Level::from(*metadata.level())
    }
}

impl<S: Subscriber> Layer<S> for StoaLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if is_internal(metadata.target()) {
            return;
        }
        let level = level_of(metadata);
        if !self.logger.is_enabled(level) {
            return;
        }

        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);

        let mut record = LogRecord::new(level, visitor.message);
        record.fields = visitor.fields;
        self.logger.log(&record);
    }
}

#[derive(Default)]
struct RecordVisitor {
    message: String,
    fields: Map<String, Value>,
}

impl RecordVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        self.fields.insert(field.name().to_string(), value);
    }
}

impl Visit for RecordVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.insert(field, Value::from(value));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.insert(field, Value::String(format!("{value:?}")));
        }
    }
}
