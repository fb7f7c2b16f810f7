//! ---
//! spark_section: "05-networking-external-interfaces"
//! spark_subsection: "binary"
//! spark_type: "source"
//! spark_scope: "code"
//! spark_description: "Control CLI for encoding blocks and managing the block datastore."
//! spark_version: "v0.1.0"
//! spark_owner: "tbd"
//! ---
use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use serde_json::Value;
use spark_codec::ObjectType;
use spark_datastore::{BlockRecord, BlockStore, DataStore, FileDataStore};
use tokio::runtime::Runtime;

use crate::codec::{parse_json, parse_object_type};
use crate::store::open_store;
use crate::Session;

#[derive(Debug, Args)]
pub struct BlockArgs {
    /// Use the system database instead of the block database.
    #[arg(long)]
    system: bool,
    #[command(subcommand)]
    action: BlockAction,
}

#[derive(Debug, Subcommand)]
pub enum BlockAction {
    /// Validate and store a block under its service id.
    Save {
        #[arg(long = "id", value_name = "SERVICE_ID")]
        service_id: String,
        #[arg(long = "type", value_name = "TYPE", value_parser = parse_object_type)]
        object_type: ObjectType,
        #[arg(long, value_name = "JSON", value_parser = parse_json)]
        json: Value,
    },
    /// Print the block stored under SERVICE_ID.
    Show {
        service_id: String,
        /// Print the codec-encoded bytes as hex instead of JSON.
        #[arg(long)]
        encoded: bool,
    },
    /// Print every stored block.
    List,
}

pub fn run(session: &Session, args: BlockArgs) -> Result<()> {
    let blocks = BlockStore::new(open_store(session, args.system));
    let runtime = Runtime::new()?;
    runtime.block_on(run_action(&blocks, args.action))
}

async fn run_action(blocks: &BlockStore<FileDataStore>, action: BlockAction) -> Result<()> {
    blocks.store().start().await?;
    let outcome = execute(blocks, action).await;
    blocks.store().close().await?;
    outcome
}

async fn execute(blocks: &BlockStore<FileDataStore>, action: BlockAction) -> Result<()> {
    match action {
        BlockAction::Save {
            service_id,
            object_type,
            json,
        } => {
            let stored = blocks
                .save(BlockRecord::new(service_id, object_type, json))
                .await?;
            println!("{}", serde_json::to_string(&stored)?);
        }
        BlockAction::Show {
            service_id,
            encoded: true,
        } => match blocks.encoded(&service_id).await? {
            Some(bytes) => println!("{}", hex::encode(bytes)),
            None => bail!("no block stored for {service_id}"),
        },
        BlockAction::Show {
            service_id,
            encoded: false,
        } => match blocks.load(&service_id).await? {
            Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
            None => bail!("no block stored for {service_id}"),
        },
        BlockAction::List => {
            for record in blocks.list().await? {
                println!("{}", serde_json::to_string(&record)?);
            }
        }
    }
    Ok(())
}
