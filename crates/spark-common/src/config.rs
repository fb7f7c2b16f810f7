//! ---
//! spark_section: "01-core-functionality"
//! spark_subsection: "module"
//! spark_type: "source"
//! spark_scope: "code"
//! spark_description: "Shared primitives and utilities for the Spark crates."
//! spark_version: "v0.1.0"
//! spark_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};
use tracing::debug;

use crate::logging::LogFormat;

fn default_service_name() -> String {
    "spark".to_owned()
}

fn default_database() -> PathBuf {
    PathBuf::from("brewblox_db.json")
}

fn default_system_database() -> PathBuf {
    PathBuf::from("brewblox_sys_db.json")
}

fn default_action_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_retry_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::StructuredJson
}

/// Primary configuration object for Spark tooling.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub datastore: DataStoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Metadata describing where an [`AppConfig`] was loaded from.
///
/// `source` is `None` when no file was found and defaults are in effect.
#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    pub config: AppConfig,
    pub source: Option<PathBuf>,
}

impl AppConfig {
    pub const ENV_CONFIG_PATH: &str = "SPARK_CONFIG";

    /// Load configuration from disk, respecting the `SPARK_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    /// Load configuration together with the effective source path.
    ///
    /// An explicit `SPARK_CONFIG` path must exist. Otherwise the first
    /// existing candidate wins, and defaults apply when none exists.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(&path)?;
                return Ok(LoadedAppConfig {
                    config,
                    source: Some(path),
                });
            }
        }

        for candidate in candidates {
            let path = candidate.as_ref();
            if path.exists() {
                let config = Self::from_path(path)?;
                return Ok(LoadedAppConfig {
                    config,
                    source: Some(path.to_path_buf()),
                });
            }
        }

        debug!(
            inspected = %candidates
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
            "no configuration file found, using defaults"
        );
        Ok(LoadedAppConfig {
            config: AppConfig::default(),
            source: None,
        })
    }

    fn from_path(path: &Path) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        contents
            .parse::<AppConfig>()
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    /// Pick the datastore file for user blocks or system blocks.
    pub fn database_path(&self, system: bool) -> &Path {
        if system {
            &self.datastore.system_database
        } else {
            &self.datastore.database
        }
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        if self.service.name.trim().is_empty() {
            return Err(anyhow!("service name must not be empty"));
        }
        self.datastore.validate()?;
        Ok(())
    }
}

impl std::str::FromStr for AppConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub name: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
        }
    }
}

/// Location and timing of the block datastores.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataStoreConfig {
    #[serde(default = "default_database")]
    pub database: PathBuf,
    #[serde(default = "default_system_database")]
    pub system_database: PathBuf,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default = "default_action_timeout")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub action_timeout: Duration,
    #[serde(default = "default_retry_interval")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub retry_interval: Duration,
}

impl Default for DataStoreConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            system_database: default_system_database(),
            read_only: false,
            action_timeout: default_action_timeout(),
            retry_interval: default_retry_interval(),
        }
    }
}

impl DataStoreConfig {
    pub fn validate(&self) -> Result<()> {
        if self.action_timeout.is_zero() {
            return Err(anyhow!("datastore action_timeout must be greater than zero"));
        }
        if self.retry_interval.is_zero() {
            return Err(anyhow!("datastore retry_interval must be greater than zero"));
        }
        if self.database == self.system_database {
            return Err(anyhow!(
                "database and system_database must differ (both are {})",
                self.database.display()
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    #[serde(default)]
    pub file_prefix: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            format: default_log_format(),
            file_prefix: None,
        }
    }
}
