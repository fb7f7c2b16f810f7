//! ---
//! spark_section: "05-networking-external-interfaces"
//! spark_subsection: "binary"
//! spark_type: "source"
//! spark_scope: "code"
//! spark_description: "Control CLI for encoding blocks and managing the block datastore."
//! spark_version: "v0.1.0"
//! spark_owner: "tbd"
//! ---
use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use serde_json::Value;
use spark_datastore::{DataStore, FileDataStore};
use tokio::runtime::Runtime;

use crate::codec::parse_json;
use crate::Session;

#[derive(Debug, Args)]
pub struct StoreArgs {
    /// Use the system database instead of the block database.
    #[arg(long)]
    system: bool,
    #[command(subcommand)]
    action: StoreAction,
}

#[derive(Debug, Subcommand)]
pub enum StoreAction {
    /// Insert a document without uniqueness checks.
    Insert {
        #[arg(long, value_name = "JSON", value_parser = parse_json)]
        json: Value,
    },
    /// Print documents where KEY equals VALUE (JSON, or a plain string).
    Find { key: String, value: String },
    /// Print every document.
    All,
    /// Remove every document.
    Purge,
}

/// Build a file store for the configured database.
pub fn open_store(session: &Session, system: bool) -> FileDataStore {
    let settings = &session.config.datastore;
    let store = FileDataStore::new(session.config.database_path(system), settings.read_only)
        .with_action_timeout(settings.action_timeout)
        .with_retry_interval(settings.retry_interval);
    match &session.metrics {
        Some(metrics) => store.with_metrics(metrics.clone()),
        None => store,
    }
}

pub fn run(session: &Session, args: StoreArgs) -> Result<()> {
    let store = open_store(session, args.system);
    let runtime = Runtime::new()?;
    runtime.block_on(run_action(&store, args.action))
}

async fn run_action(store: &FileDataStore, action: StoreAction) -> Result<()> {
    store.start().await?;
    let outcome = execute(store, action).await;
    store.close().await?;
    outcome
}

async fn execute(store: &FileDataStore, action: StoreAction) -> Result<()> {
    match action {
        StoreAction::Insert { json } => {
            let Value::Object(doc) = json else {
                return Err(anyhow!("document must be a JSON object"));
            };
            let id = store.insert(doc).await?;
            println!("{id}");
        }
        StoreAction::Find { key, value } => {
            let value = serde_json::from_str(&value).unwrap_or(Value::String(value));
            print_documents(&store.find_by_key(&key, &value).await?)?;
        }
        StoreAction::All => print_documents(&store.all().await?)?,
        StoreAction::Purge => store.purge().await?,
    }
    Ok(())
}

fn print_documents(docs: &[spark_datastore::Document]) -> Result<()> {
    for doc in docs {
        println!("{}", serde_json::to_string(doc)?);
    }
    Ok(())
}
