//! ---
//! spark_section: "03-persistence-logging"
//! spark_subsection: "module"
//! spark_type: "source"
//! spark_scope: "code"
//! spark_description: "Block document storage backends."
//! spark_version: "v0.1.0"
//! spark_owner: "tbd"
//! ---
use std::sync::Arc;
use std::time::Duration;

use prometheus::{self, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};

use crate::Result;

/// Metrics published by the datastore backends.
#[derive(Clone)]
pub struct DataStoreMetrics {
    actions: IntCounterVec,
    failures: IntCounterVec,
    duration: HistogramVec,
    registry: Arc<Registry>,
}

impl DataStoreMetrics {
    /// Register all datastore metrics with the provided registry.
    pub fn new(registry: Arc<Registry>) -> Result<Self> {
        let actions = IntCounterVec::new(
            Opts::new(
                "spark_datastore_actions_total",
                "Total number of actions executed against a datastore",
            ),
            &["store"],
        )?;
        registry.register(Box::new(actions.clone()))?;

        let failures = IntCounterVec::new(
            Opts::new(
                "spark_datastore_action_failures_total",
                "Total number of datastore actions that returned an error",
            ),
            &["store"],
        )?;
        registry.register(Box::new(failures.clone()))?;

        let histogram_opts = HistogramOpts::new(
            "spark_datastore_action_duration_seconds",
            "Time from action submission until its result was available",
        )
        .buckets(prometheus::exponential_buckets(0.0001, 2.0, 14)?);
        let duration = HistogramVec::new(histogram_opts, &["store"])?;
        registry.register(Box::new(duration.clone()))?;

        Ok(Self {
            actions,
            failures,
            duration,
            registry,
        })
    }

    /// Registry the metrics were registered with.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Record one completed action.
    pub fn record_action(&self, store: &str, elapsed: Duration, succeeded: bool) {
        self.actions.with_label_values(&[store]).inc();
        if !succeeded {
            self.failures.with_label_values(&[store]).inc();
        }
        self.duration
            .with_label_values(&[store])
            .observe(elapsed.as_secs_f64());
    }
}

impl std::fmt::Debug for DataStoreMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataStoreMetrics").finish_non_exhaustive()
    }
}
