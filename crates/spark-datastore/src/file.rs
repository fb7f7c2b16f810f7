//! ---
//! spark_section: "03-persistence-logging"
//! spark_subsection: "module"
//! spark_type: "source"
//! spark_scope: "code"
//! spark_description: "Block document storage backends."
//! spark_version: "v0.1.0"
//! spark_owner: "tbd"
//! ---
//! JSON file backed store.
//!
//! A single runner task owns the table and its file. Callers queue actions
//! and wait for the reply, so concurrent callers never interleave writes.
//! The reply is only sent once a changed table has reached the file.

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::metrics::DataStoreMetrics;
use crate::{DataStore, DataStoreError, Result, Table};

/// Default time a caller waits for an action result.
pub const ACTION_TIMEOUT: Duration = Duration::from_secs(5);
/// Default pause before the runner retries opening the database.
pub const DATABASE_RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Delivers an action result once the outcome of the write is known.
type Reply = Box<dyn FnOnce(Result<()>) + Send>;
type Job = Box<dyn FnOnce(&mut Table) -> Reply + Send>;

struct Runner {
    jobs: mpsc::UnboundedSender<Job>,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Store persisting its table to a JSON file after every change.
pub struct FileDataStore {
    path: PathBuf,
    read_only: bool,
    action_timeout: Duration,
    retry_interval: Duration,
    metrics: Option<DataStoreMetrics>,
    runner: Mutex<Option<Runner>>,
}

impl FileDataStore {
    /// Store backed by `path`. With `read_only`, changes stay in memory.
    pub fn new(path: impl Into<PathBuf>, read_only: bool) -> Self {
        Self {
            path: path.into(),
            read_only,
            action_timeout: ACTION_TIMEOUT,
            retry_interval: DATABASE_RETRY_INTERVAL,
            metrics: None,
            runner: Mutex::new(None),
        }
    }

    /// Override the time callers wait for an action result.
    pub fn with_action_timeout(mut self, timeout: Duration) -> Self {
        self.action_timeout = timeout;
        self
    }

    /// Override the pause between attempts to open the database.
    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    /// Report every action to `metrics` under the `file` label.
    pub fn with_metrics(mut self, metrics: DataStoreMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Database file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether changes are kept out of the file.
    pub fn read_only(&self) -> bool {
        self.read_only
    }

    async fn submit<F, T>(&self, action: F) -> Result<T>
    where
        F: FnOnce(&mut Table) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let jobs = self
            .runner
            .lock()
            .as_ref()
            .map(|runner| runner.jobs.clone())
            .ok_or_else(|| DataStoreError::NotStarted(self.to_string()))?;

        let (reply, response) = oneshot::channel();
        let job: Job = Box::new(move |table: &mut Table| {
            let result = action(table);
            Box::new(move |written: Result<()>| {
                let _ = reply.send(written.and(result));
            }) as Reply
        });
        jobs.send(job)
            .map_err(|_| DataStoreError::Closed(self.to_string()))?;

        match tokio::time::timeout(self.action_timeout, response).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(DataStoreError::Closed(self.to_string())),
            Err(_) => Err(DataStoreError::Timeout {
                store: self.to_string(),
                timeout: self.action_timeout,
            }),
        }
    }
}

impl fmt::Display for FileDataStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<FileDataStore for {}>", self.path.display())
    }
}

impl fmt::Debug for FileDataStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileDataStore")
            .field("path", &self.path)
            .field("read_only", &self.read_only)
            .field("started", &self.runner.lock().is_some())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DataStore for FileDataStore {
    async fn start(&self) -> Result<()> {
        let mut runner = self.runner.lock();
        match runner.as_ref() {
            Some(current) if !current.handle.is_finished() => return Ok(()),
            Some(_) => warn!(store = %self, "runner stopped unexpectedly, restarting"),
            None => {}
        }
        let (jobs, queue) = mpsc::unbounded_channel();
        let (shutdown, stop) = oneshot::channel();
        let worker = Worker {
            label: self.to_string(),
            path: self.path.clone(),
            read_only: self.read_only,
            retry_interval: self.retry_interval,
        };
        let handle = tokio::spawn(worker.run(queue, stop));
        *runner = Some(Runner {
            jobs,
            shutdown,
            handle,
        });
        debug!(store = %self, "runner started");
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let runner = self.runner.lock().take();
        if let Some(runner) = runner {
            let _ = runner.shutdown.send(());
            if let Err(err) = runner.handle.await {
                warn!(store = %self, error = %err, "runner ended abnormally");
            }
        }
        Ok(())
    }

    async fn with_db<F, T>(&self, action: F) -> Result<T>
    where
        F: FnOnce(&mut Table) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let started = Instant::now();
        let result = self.submit(action).await;
        if let Some(metrics) = &self.metrics {
            metrics.record_action("file", started.elapsed(), result.is_ok());
        }
        result
    }
}

struct Worker {
    label: String,
    path: PathBuf,
    read_only: bool,
    retry_interval: Duration,
}

impl Worker {
    async fn run(
        self,
        mut queue: mpsc::UnboundedReceiver<Job>,
        mut stop: oneshot::Receiver<()>,
    ) {
        'open: loop {
            let mut table = match self.load().await {
                Ok(table) => table,
                Err(err) => {
                    warn!(store = %self.label, error = %err, "unable to open database");
                    tokio::select! {
                        _ = &mut stop => break 'open,
                        _ = tokio::time::sleep(self.retry_interval) => continue 'open,
                    }
                }
            };
            info!(store = %self.label, documents = table.len(), "now available");

            loop {
                let job = tokio::select! {
                    biased;
                    _ = &mut stop => break 'open,
                    job = queue.recv() => match job {
                        Some(job) => job,
                        None => break 'open,
                    },
                };
                let snapshot = (!self.read_only).then(|| table.clone());
                let reply = job(&mut table);
                reply(self.commit(&mut table, snapshot).await);
            }
        }
        debug!(store = %self.label, "shutdown");
    }

    async fn load(&self) -> Result<Table> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Table::from_slice(&bytes),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Table::new()),
            Err(err) => Err(err.into()),
        }
    }

    // Write a changed table. On failure the table reverts to `snapshot`,
    // which matches the file contents.
    async fn commit(&self, table: &mut Table, snapshot: Option<Table>) -> Result<()> {
        if !table.take_dirty() {
            return Ok(());
        }
        let Some(snapshot) = snapshot else {
            return Ok(());
        };
        if let Err(err) = self.save(table).await {
            warn!(store = %self.label, error = %err, "unable to write database, change discarded");
            *table = snapshot;
            return Err(err);
        }
        Ok(())
    }

    async fn save(&self, table: &Table) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        tokio::fs::write(&staging, table.to_vec()?).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        Ok(())
    }
}
