//! Document stores backing the database transport.
//!
//! [`LogStore`] is the only surface the transport needs: insert one JSON
//! document into a named collection. [`MongoStore`] implements it over the
//! `mongodb` driver; [`MemoryStore`] keeps documents in process.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mongodb::bson::{Document, doc};
use mongodb::{Client, Database};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::Result;

/// Insert-only document sink.
#[async_trait]
pub trait LogStore: Send + Sync + 'static {
    /// Human-readable store description for diagnostics.
    fn describe(&self) -> String;

    /// Insert `document` into `collection`.
    async fn insert(&self, collection: &str, document: Value) -> Result<()>;
}

// ---------------------------------------------------------------------------
// MongoStore
// ---------------------------------------------------------------------------

/// Database name used when the connection URI does not name one.
pub const FALLBACK_DATABASE: &str = "stoa";

/// MongoDB-backed store. Cheap to clone; clones share the driver pool.
#[derive(Clone, Debug)]
pub struct MongoStore {
    database: Database,
}

impl MongoStore {
    /// Connect and ping the server so the attempt settles to success or
    /// failure instead of deferring errors to the first insert.
    ///
    /// The driver keeps reconnecting on its own once this succeeds.
    pub async fn connect(uri: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri).await?;
        let database = client
            .default_database()
            .unwrap_or_else(|| client.database(FALLBACK_DATABASE));
        database.run_command(doc! { "ping": 1 }).await?;
        info!("connected to log database '{}'", database.name());
        Ok(Self { database })
    }
}

#[async_trait]
impl LogStore for MongoStore {
    fn describe(&self) -> String {
        format!("mongodb:{}", self.database.name())
    }

    async fn insert(&self, collection: &str, document: Value) -> Result<()> {
        let document = to_bson(&document)?;
        self.database.collection::<Document>(collection).insert_one(document).await?;
        debug!("inserted log document into '{collection}'");
        Ok(())
    }
}

/// Convert a rendered JSON document into BSON.
///
/// Fails on values BSON cannot hold, e.g. unsigned integers above `i64::MAX`.
pub fn to_bson(document: &Value) -> Result<Document> {
    Ok(mongodb::bson::to_document(document)?)
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-process store. Clones share the same collections.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    collections: Arc<Mutex<HashMap<String, Vec<Value>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the documents stored in `collection`.
    pub fn documents(&self, collection: &str) -> Vec<Value> {
        self.collections
            .lock()
            .map(|c| c.get(collection).cloned().unwrap_or_default())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LogStore for MemoryStore {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    async fn insert(&self, collection: &str, document: Value) -> Result<()> {
        let mut collections = self.collections.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        collections.entry(collection.to_string()).or_default().push(document);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn memory_store_keeps_collections_apart() {
        let store = MemoryStore::new();
        store.insert("operation_logs", json!({"message": "a"})).await.unwrap();
        store.insert("access_logs", json!({"message": "b"})).await.unwrap();
        store.insert("operation_logs", json!({"message": "c"})).await.unwrap();

        let ops = store.documents("operation_logs");
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[1]["message"], "c");
        assert_eq!(store.documents("access_logs").len(), 1);
        assert!(store.documents("missing").is_empty());
    }

    #[test]
    fn bson_conversion_rejects_oversized_unsigned() {
        assert!(to_bson(&json!({"height": 12, "nonce": u64::MAX})).is_err());
        let document = to_bson(&json!({"height": 12})).unwrap();
        assert!(document.contains_key("height"));
    }

    #[tokio::test]
    async fn mongo_connect_rejects_malformed_uri() {
        assert!(MongoStore::connect("not-a-mongo-uri").await.is_err());
    }
}
