//! Database transport: JSON documents persisted through a [`LogStore`].
//!
//! One transport feeds two sinks on the same store:
//!
//! | collection       | threshold | accepts (database ordering) |
//! |------------------|-----------|-----------------------------|
//! | `operation_logs` | `info`    | `http`, `info`              |
//! | `access_logs`    | `http`    | `http`                      |
//!
//! Documents are queued on a bounded channel and inserted by a background
//! tokio task, so a log call never waits on the network. When an insert
//! fails on the connection the task backs off and retries the same document
//! (reconnect policy). Documents the store rejects outright, and any failure
//! with reconnect disabled, are dropped with a diagnostic.

use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error, warn};

use super::Transport;
use crate::error::{LogError, Result};
use crate::format::Formatter;
use crate::level::{Level, SeverityLevels, Threshold};
use crate::record::LogRecord;
use crate::store::LogStore;

/// Capacity of the pending-document queue.
const QUEUE_CAPACITY: usize = 4096;

pub const OPERATION_LOGS: &str = "operation_logs";
pub const ACCESS_LOGS: &str = "access_logs";

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Retry behavior after a failed insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub enabled: bool,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl ReconnectPolicy {
    pub fn disabled() -> Self {
        Self { enabled: false, ..Self::default() }
    }

    fn next(&self, backoff: Duration) -> Duration {
        (backoff * 2).min(self.max_backoff)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(30),
        }
    }
}

/// One database sink: target collection, its threshold and retry policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseOptions {
    pub collection: String,
    pub threshold: Threshold,
    pub reconnect: ReconnectPolicy,
}

impl DatabaseOptions {
    pub fn new(collection: impl Into<String>, level: Level) -> Self {
        Self {
            collection: collection.into(),
            threshold: Threshold::new(level, SeverityLevels::database()),
            reconnect: ReconnectPolicy::default(),
        }
    }

    /// General application logs.
    pub fn operation_logs() -> Self {
        Self::new(OPERATION_LOGS, Level::Info)
    }

    /// Access / HTTP logs.
    pub fn access_logs() -> Self {
        Self::new(ACCESS_LOGS, Level::Http)
    }

    pub fn with_reconnect(mut self, reconnect: ReconnectPolicy) -> Self {
        self.reconnect = reconnect;
        self
    }
}

// ---------------------------------------------------------------------------
// DatabaseTransport
// ---------------------------------------------------------------------------

struct Pending {
    sink: usize,
    document: Value,
}

/// JSON transport fanning out to several collections of one store.
pub struct DatabaseTransport {
    name: String,
    formatter: Formatter,
    sinks: Arc<[DatabaseOptions]>,
    tx: RwLock<Option<mpsc::Sender<Pending>>>,
    task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl DatabaseTransport {
    /// Start the insert task. Must be called from within a tokio runtime.
    pub fn new(store: Arc<dyn LogStore>, sinks: Vec<DatabaseOptions>) -> Self {
        let name = format!("database({})", store.describe());
        let sinks: Arc<[DatabaseOptions]> = sinks.into();
        let (tx, rx) = mpsc::channel::<Pending>(QUEUE_CAPACITY);

        let task = tokio::spawn(insert_loop(store, Arc::clone(&sinks), rx));

        Self {
            name,
            formatter: Formatter::json(),
            sinks,
            tx: RwLock::new(Some(tx)),
            task: Mutex::new(Some(task)),
        }
    }

    pub fn sinks(&self) -> &[DatabaseOptions] {
        &self.sinks
    }
}

#[async_trait]
impl Transport for DatabaseTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn enabled(&self, level: Level) -> Option<bool> {
        Some(self.sinks.iter().any(|sink| sink.threshold.allows(level)))
    }

    fn log(&self, record: &LogRecord) -> Result<()> {
        let guard = self.tx.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        let Some(tx) = guard.as_ref() else {
            return Err(LogError::Closed(self.name.clone()));
        };
        let document = self.formatter.render_document(record);
        let mut failure = None;

        for (sink, options) in self.sinks.iter().enumerate() {
            if !options.threshold.allows(record.level) {
                continue;
            }
            let pending = Pending { sink, document: document.clone() };
            match tx.try_send(pending) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    warn!("[{}] queue full, dropping record for '{}'", self.name, options.collection);
                    failure.get_or_insert(LogError::QueueFull(self.name.clone()));
                }
                Err(TrySendError::Closed(_)) => {
                    failure.get_or_insert(LogError::Closed(self.name.clone()));
                }
            }
        }

        failure.map_or(Ok(()), Err)
    }

    /// Stop accepting records and wait until queued documents are written.
    async fn close(&self) {
        self.tx.write().unwrap_or_else(|poisoned| poisoned.into_inner()).take();
        let task = self.task.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                error!("[{}] insert task failed: {e}", self.name);
            }
        }
    }
}

async fn insert_loop(store: Arc<dyn LogStore>, sinks: Arc<[DatabaseOptions]>, mut rx: mpsc::Receiver<Pending>) {
    while let Some(Pending { sink, document }) = rx.recv().await {
        let options = &sinks[sink];
        let mut backoff = options.reconnect.initial_backoff;

        loop {
            match store.insert(&options.collection, document.clone()).await {
                Ok(()) => break,
                Err(e) if options.reconnect.enabled && e.is_transient() => {
                    warn!("[db] insert into '{}' failed: {e}, retrying in {backoff:?}", options.collection);
                    tokio::time::sleep(backoff).await;
                    backoff = options.reconnect.next(backoff);
                }
                Err(e) => {
                    error!("[db] insert into '{}' failed: {e}, dropping record", options.collection);
                    break;
                }
            }
        }
    }
    debug!("[db] insert task exited");
}

/// Database transport with the `operation_logs` and `access_logs` sinks.
pub fn build_database_transport(store: Arc<dyn LogStore>) -> DatabaseTransport {
    DatabaseTransport::new(store, vec![DatabaseOptions::operation_logs(), DatabaseOptions::access_logs()])
}
