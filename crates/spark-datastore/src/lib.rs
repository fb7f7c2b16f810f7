//! ---
//! spark_section: "03-persistence-logging"
//! spark_subsection: "module"
//! spark_type: "source"
//! spark_scope: "code"
//! spark_description: "Block document storage backends."
//! spark_version: "v0.1.0"
//! spark_owner: "tbd"
//! ---
//! Document storage for block metadata.
//!
//! [`DataStore`] supplies the query and mutation logic; implementations only
//! decide how the [`Table`] is reached via [`DataStore::with_db`].
#![warn(missing_docs)]

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

pub mod blocks;
pub mod file;
pub mod memory;
pub mod metrics;
pub mod table;

pub use blocks::{BlockRecord, BlockStore};
pub use file::FileDataStore;
pub use memory::MemoryDataStore;
pub use metrics::DataStoreMetrics;
pub use table::Table;

/// JSON object stored in a table.
pub type Document = serde_json::Map<String, Value>;

/// Result alias used throughout the datastore crate.
pub type Result<T> = std::result::Result<T, DataStoreError>;

/// Error type for datastore operations.
#[derive(Debug, thiserror::Error)]
pub enum DataStoreError {
    /// The document lacks the field used as identifier.
    #[error("document has no `{0}` field")]
    MissingKey(String),
    /// Another document already uses the identifying value.
    #[error("a document already exists with {key}={value}")]
    AlreadyExists {
        /// Identifying field.
        key: String,
        /// Conflicting value.
        value: Value,
    },
    /// More than one document matched a unique update.
    #[error("multiple documents with {key}={value} exist")]
    MultipleMatches {
        /// Identifying field.
        key: String,
        /// Matched value.
        value: Value,
    },
    /// An action was submitted before [`DataStore::start`].
    #[error("{0} not started before functions were called")]
    NotStarted(String),
    /// No reply arrived within the action timeout.
    #[error("{store} did not complete the action within {timeout:?}")]
    Timeout {
        /// Store description.
        store: String,
        /// Configured action timeout.
        timeout: Duration,
    },
    /// The store shut down before replying.
    #[error("{0} closed before the action completed")]
    Closed(String),
    /// Wrapper for IO errors encountered while reading/writing the database file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Wrapper for JSON serialization issues.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    /// Block contents rejected by the codec.
    #[error("codec error: {0}")]
    Codec(#[from] spark_codec::CodecError),
    /// Wrapper for Prometheus metrics registration failures.
    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
    /// Raised by a caller-supplied action.
    #[error("action rejected: {0}")]
    Rejected(String),
}

/// Asynchronous document store.
#[async_trait]
pub trait DataStore: Send + Sync + 'static {
    /// Prepare the store. Calling it on a started store is a no-op.
    async fn start(&self) -> Result<()> {
        Ok(())
    }

    /// Release the store. Calling it on a closed store is a no-op.
    async fn close(&self) -> Result<()> {
        Ok(())
    }

    /// Run `action` against the table and return its outcome unchanged.
    async fn with_db<F, T>(&self, action: F) -> Result<T>
    where
        F: FnOnce(&mut Table) -> Result<T> + Send + 'static,
        T: Send + 'static;

    /// Every document, in insertion order.
    async fn all(&self) -> Result<Vec<Document>> {
        self.with_db(|table| Ok(table.all())).await
    }

    /// Remove every document.
    async fn purge(&self) -> Result<()> {
        self.with_db(|table| {
            table.purge();
            Ok(())
        })
        .await
    }

    /// Documents where `doc[key] == value`.
    async fn find_by_key(&self, key: &str, value: &Value) -> Result<Vec<Document>> {
        let key = key.to_owned();
        let value = value.clone();
        self.with_db(move |table| Ok(table.search(&key, &value)))
            .await
    }

    /// Append a document without any uniqueness check.
    async fn insert(&self, doc: Document) -> Result<u64> {
        self.with_db(move |table| Ok(table.insert(doc))).await
    }

    /// Append several documents without any uniqueness check.
    async fn insert_multiple(&self, docs: Vec<Document>) -> Result<Vec<u64>> {
        self.with_db(move |table| Ok(table.insert_multiple(docs)))
            .await
    }

    /// Append `doc` unless another document shares its `id_key` value.
    async fn insert_unique(&self, id_key: &str, doc: Document) -> Result<u64> {
        let id_key = id_key.to_owned();
        self.with_db(move |table| {
            let id = doc
                .get(&id_key)
                .cloned()
                .ok_or_else(|| DataStoreError::MissingKey(id_key.clone()))?;
            if table.contains(&id_key, &id) {
                return Err(DataStoreError::AlreadyExists {
                    key: id_key,
                    value: id,
                });
            }
            Ok(table.insert(doc))
        })
        .await
    }

    /// Merge `doc` into every document where `doc[id_key] == id_val`.
    async fn update(&self, id_key: &str, id_val: &Value, doc: Document) -> Result<Vec<u64>> {
        let id_key = id_key.to_owned();
        let id_val = id_val.clone();
        self.with_db(move |table| Ok(table.update(&doc, &id_key, &id_val)))
            .await
    }

    /// Merge `doc` into the single document matching `id_key == id_val`, or
    /// insert it when none matches.
    ///
    /// With `unique_key`, no stored document may already carry
    /// `doc[unique_key]`, the matched document included.
    async fn update_unique(
        &self,
        id_key: &str,
        id_val: &Value,
        doc: Document,
        unique_key: Option<&str>,
    ) -> Result<Vec<u64>> {
        let id_key = id_key.to_owned();
        let id_val = id_val.clone();
        let unique_key = unique_key.map(str::to_owned);
        self.with_db(move |table| {
            if table.ids_matching(&id_key, &id_val).len() > 1 {
                return Err(DataStoreError::MultipleMatches {
                    key: id_key,
                    value: id_val,
                });
            }
            if let Some(unique_key) = unique_key {
                let unique_id = doc
                    .get(&unique_key)
                    .cloned()
                    .ok_or_else(|| DataStoreError::MissingKey(unique_key.clone()))?;
                if table.contains(&unique_key, &unique_id) {
                    return Err(DataStoreError::AlreadyExists {
                        key: unique_key,
                        value: unique_id,
                    });
                }
            }
            Ok(table.upsert(doc, &id_key, &id_val))
        })
        .await
    }
}
