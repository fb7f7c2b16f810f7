//! ---
//! spark_section: "05-networking-external-interfaces"
//! spark_subsection: "binary"
//! spark_type: "source"
//! spark_scope: "code"
//! spark_description: "Control CLI for encoding blocks and managing the block datastore."
//! spark_version: "v0.1.0"
//! spark_owner: "tbd"
//! ---
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use prometheus::{Encoder, Registry, TextEncoder};
use spark_common::{init_cli, init_tracing, AppConfig, LoadedAppConfig};
use spark_datastore::DataStoreMetrics;
use tracing::debug;

mod block;
mod codec;
mod store;

const DEFAULT_CONFIG: &str = "configs/spark.toml";

#[derive(Debug, Parser)]
#[command(
    author,
    disable_version_flag = true,
    about = "Spark block codec and datastore utility",
    long_about = None
)]
struct Cli {
    #[arg(
        short = 'V',
        long = "version",
        action = ArgAction::SetTrue,
        help = "Print version information and exit"
    )]
    version: bool,
    /// Configuration file (overrides configs/spark.toml).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Install the service tracing stack (stdout plus rolling log files).
    #[arg(long, global = true)]
    trace: bool,
    /// Print datastore metrics to stderr when the command finishes.
    #[arg(long, global = true)]
    metrics: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Encode JSON values into a delimited protobuf block")]
    Encode(codec::EncodeArgs),
    #[command(about = "Decode a delimited protobuf block into JSON values")]
    Decode(codec::DecodeArgs),
    #[command(about = "List the registered object types")]
    Types,
    #[command(about = "Raw document access to the datastore")]
    Store(store::StoreArgs),
    #[command(about = "Validated block records in the datastore")]
    Block(block::BlockArgs),
}

/// Shared state handed to subcommands.
pub(crate) struct Session {
    pub(crate) config: AppConfig,
    pub(crate) metrics: Option<DataStoreMetrics>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.version {
        println!("sparkctl {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let LoadedAppConfig { config, source } = load_config(cli.config.as_ref())?;
    if cli.trace {
        init_tracing(&config.service.name, &config.logging)?;
    } else {
        init_cli();
    }
    debug!(source = ?source, "configuration loaded");

    let metrics = if cli.metrics {
        let registry = Arc::new(Registry::new());
        Some(DataStoreMetrics::new(registry).context("registering datastore metrics")?)
    } else {
        None
    };
    let session = Session { config, metrics };

    match command {
        Commands::Encode(args) => codec::encode(args)?,
        Commands::Decode(args) => codec::decode(args)?,
        Commands::Types => codec::types(),
        Commands::Store(args) => store::run(&session, args)?,
        Commands::Block(args) => block::run(&session, args)?,
    }

    if let Some(metrics) = &session.metrics {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&metrics.registry().gather(), &mut buffer)?;
        eprint!("{}", String::from_utf8_lossy(&buffer));
    }
    Ok(())
}

// An explicit --config wins over SPARK_CONFIG and the default location.
fn load_config(explicit: Option<&PathBuf>) -> Result<LoadedAppConfig> {
    match explicit {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("unable to read config file {}", path.display()))?;
            let config = contents
                .parse::<AppConfig>()
                .with_context(|| format!("invalid config file {}", path.display()))?;
            Ok(LoadedAppConfig {
                config,
                source: Some(path.clone()),
            })
        }
        None => AppConfig::load_with_source(&[PathBuf::from(DEFAULT_CONFIG)]),
    }
}
