//! Application configuration
//!
//! Sources, lowest priority first:
//! 1. built-in defaults
//! 2. `remediar/remediar.toml` in the user config directory
//! 3. `remediar.toml` in the working directory, or the `--config` file
//! 4. `REMEDIAR__SECTION__KEY` environment variables (after loading `.env`)

use anyhow::Context;
use config::{Config, Environment, File};
use remediar_client::ClientConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter level; `RUST_LOG` overrides it
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,

    /// Directory for a daily-rolling log file. Console only when unset.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionConfig {
    /// Bearer token issued at login
    #[serde(default)]
    pub token: Option<String>,
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let mut builder = Config::builder();
        if let Some(dir) = dirs::config_dir() {
            builder = builder
                .add_source(File::from(dir.join("remediar").join("remediar.toml")).required(false));
        }
        builder = match path {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name("remediar").required(false)),
        };
        builder = builder.add_source(
            Environment::with_prefix("REMEDIAR")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .context("Failed to read configuration sources")?
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.client.validate()?;
        if self.logging.level.trim().is_empty() {
            anyhow::bail!("logging.level must not be empty");
        }
        Ok(())
    }
}
