//! Record formatting.
//!
//! Two renderings exist:
//!
//! - **line**: `[<label>] <timestamp> <level> <message>`, used by console
//!   and file transports;
//! - **json**: a document carrying `timestamp`, `level`, `message`, the
//!   label when set, and every other field folded into `metadata`. Used by
//!   the database transport.
//!
//! Both are pure and total.

use std::borrow::Cow;

use serde_json::{Map, Value};

use crate::record::LogRecord;

/// Keys that stay at the top level of a JSON document and are never folded
/// into `metadata`.
pub const RESERVED_KEYS: [&str; 4] = ["message", "level", "timestamp", "label"];

/// Default label bound to console and file output.
pub const DEFAULT_LABEL: &str = "Stoa";

/// Render a record as a single human-readable line.
pub fn format_line(record: &LogRecord) -> String {
    format!(
        "[{}] {} {} {}",
        record.label,
        record.timestamp_string(),
        record.level,
        record.message
    )
}

/// Render a record as a JSON document with metadata folding.
pub fn format_json(record: &LogRecord) -> Value {
    let metadata: Map<String, Value> = record
        .fields
        .iter()
        .filter(|(k, _)| !RESERVED_KEYS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let mut doc = Map::new();
    doc.insert("timestamp".into(), Value::String(record.timestamp_string()));
    doc.insert("level".into(), Value::String(record.level.to_string()));
    doc.insert("message".into(), Value::String(record.message.clone()));
    if !record.label.is_empty() {
        doc.insert("label".into(), Value::String(record.label.clone()));
    }
    doc.insert("metadata".into(), Value::Object(metadata));
    Value::Object(doc)
}

/// Output shape of a [`Formatter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    Line,
    Json,
}

/// A format kind with an optional bound label.
///
/// A bound label replaces whatever label the record carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formatter {
    pub kind: FormatKind,
    pub label: Option<String>,
}

impl Formatter {
    pub fn line(label: impl Into<String>) -> Self {
        Self { kind: FormatKind::Line, label: Some(label.into()) }
    }

    pub fn json() -> Self {
        Self { kind: FormatKind::Json, label: None }
    }

    /// Apply the bound label, borrowing when there is nothing to replace.
    pub fn labeled<'a>(&self, record: &'a LogRecord) -> Cow<'a, LogRecord> {
        match &self.label {
            Some(label) if *label != record.label => Cow::Owned(record.clone().with_label(label.clone())),
            _ => Cow::Borrowed(record),
        }
    }

    pub fn render(&self, record: &LogRecord) -> String {
        let record = self.labeled(record);
        match self.kind {
            FormatKind::Line => format_line(&record),
            FormatKind::Json => format_json(&record).to_string(),
        }
    }

    pub fn render_document(&self, record: &LogRecord) -> Value {
        format_json(&self.labeled(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;
    use chrono::{TimeZone, Utc};

    fn sample() -> LogRecord {
        let ts = Utc.with_ymd_and_hms(2021, 1, 2, 3, 4, 5).unwrap();
        LogRecord::at(Level::Warn, "disk almost full", ts).with_label("Stoa")
    }

    #[test]
    fn line_layout() {
        assert_eq!(format_line(&sample()), "[Stoa] 2021-01-02T03:04:05.000Z warn disk almost full");
    }

    #[test]
    fn line_keeps_label_level_message_order() {
        let record = LogRecord::new(Level::Http, "GET /blocks").with_label("api");
        let line = format_line(&record);
        let l = line.find("api").unwrap();
        let v = line.find("http").unwrap();
        let m = line.find("GET /blocks").unwrap();
        assert!(l < v && v < m);
    }

    #[test]
    fn line_with_empty_fields() {
        let ts = Utc.with_ymd_and_hms(2021, 1, 2, 3, 4, 5).unwrap();
        let record = LogRecord::at(Level::Info, "", ts);
        assert_eq!(format_line(&record), "[] 2021-01-02T03:04:05.000Z info ");
    }

    #[test]
    fn json_folds_extras_into_metadata() {
        let record = sample()
            .with_field("height", 42)
            .with_field("peer", "10.0.0.1")
            .with_field("level", "shadowed");
        let doc = format_json(&record);

        assert_eq!(doc["level"], "warn");
        assert_eq!(doc["message"], "disk almost full");
        assert_eq!(doc["timestamp"], "2021-01-02T03:04:05.000Z");
        assert_eq!(doc["label"], "Stoa");
        assert_eq!(doc["metadata"]["height"], 42);
        assert_eq!(doc["metadata"]["peer"], "10.0.0.1");
        assert!(doc["metadata"].get("level").is_none());
    }

    #[test]
    fn json_decodes_back_to_inputs() {
        let record = sample().with_field("tx", "abc");
        let text = Formatter::json().render(&record);
        let decoded: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(decoded["level"], record.level.as_str());
        assert_eq!(decoded["message"], record.message.as_str());
        assert_eq!(decoded["timestamp"], record.timestamp_string());
        assert_eq!(decoded["metadata"]["tx"], "abc");
    }

    #[test]
    fn json_metadata_always_present() {
        let doc = format_json(&LogRecord::new(Level::Info, "x"));
        assert_eq!(doc["metadata"], Value::Object(Map::new()));
        assert!(doc.get("label").is_none());
    }

    #[test]
    fn bound_label_overrides_record() {
        let record = LogRecord::new(Level::Info, "started").with_label("other");
        let line = Formatter::line(DEFAULT_LABEL).render(&record);
        assert!(line.starts_with("[Stoa] "));
        assert!(line.ends_with(" info started"));
    }
}
