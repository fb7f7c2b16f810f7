//! ---
//! spark_section: "03-persistence-logging"
//! spark_subsection: "module"
//! spark_type: "source"
//! spark_scope: "code"
//! spark_description: "Block document storage backends."
//! spark_version: "v0.1.0"
//! spark_owner: "tbd"
//! ---
use std::fmt;
use std::time::Instant;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::metrics::DataStoreMetrics;
use crate::{DataStore, Result, Table};

/// Volatile store keeping the table in process memory.
#[derive(Debug, Default)]
pub struct MemoryDataStore {
    table: Mutex<Table>,
    metrics: Option<DataStoreMetrics>,
}

impl MemoryDataStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report every action to `metrics` under the `memory` label.
    pub fn with_metrics(mut self, metrics: DataStoreMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

impl fmt::Display for MemoryDataStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<MemoryDataStore>")
    }
}

#[async_trait]
impl DataStore for MemoryDataStore {
    async fn with_db<F, T>(&self, action: F) -> Result<T>
    where
        F: FnOnce(&mut Table) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let started = Instant::now();
        let result = {
            let mut table = self.table.lock();
            let result = action(&mut *table);
            table.take_dirty();
            result
        };
        if let Some(metrics) = &self.metrics {
            metrics.record_action("memory", started.elapsed(), result.is_ok());
        }
        result
    }
}
