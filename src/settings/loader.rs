//! Configuration loading
//!
//! Embedded defaults, then `config/local.toml`, then `TOKENDIFF_*`
//! environment variables.

use super::AppConfig;
use anyhow::{Context, Result};
use config::{Config, ConfigBuilder, Environment, File, FileFormat};

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../../config/default.toml");

fn defaults() -> ConfigBuilder<config::builder::DefaultState> {
    Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
}

/// Load configuration from files and environment
pub fn load_config() -> Result<AppConfig> {
    let config = defaults()
        .add_source(File::with_name("config/local").required(false))
        // TOKENDIFF_LLM__DEPLOYMENT, not TOKENDIFF__LLM__DEPLOYMENT
        .add_source(
            Environment::with_prefix("TOKENDIFF")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}
