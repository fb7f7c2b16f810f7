//! ---
//! spark_section: "01-core-functionality"
//! spark_subsection: "module"
//! spark_type: "source"
//! spark_scope: "code"
//! spark_description: "Shared primitives and utilities for the Spark crates."
//! spark_version: "v0.1.0"
//! spark_owner: "tbd"
//! ---
//! Core shared primitives for the Spark workspace.
//! This crate exposes configuration loading and tracing setup consumed by
//! the datastore and the administrative CLI.

pub mod config;
pub mod logging;

pub use config::{AppConfig, DataStoreConfig, LoadedAppConfig, LoggingConfig, ServiceConfig};
pub use logging::{init_cli, init_tracing, LogFormat};
