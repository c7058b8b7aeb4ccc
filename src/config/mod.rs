//! # Configuration Management
//!
//! Configuration is layered, later sources winning:
//!
//! 1. Built-in defaults ([`AppConfig::default`])
//! 2. An optional TOML file
//! 3. `CERTBUNDLE__SECTION__KEY` environment variables (a `.env` file is
//!    loaded into the environment first by the binary)
//!
//! Command-line flags are applied on top by the CLI.

pub mod settings;

pub use settings::{AppConfig, CatalogConfig, KeyManagerConfig, ObservabilityConfig};

use config::{Config, Environment, File, FileFormat};
use std::path::Path;

use crate::errors::Result;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "CERTBUNDLE";

/// Load and validate configuration from an optional file and the environment.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let mut builder = Config::builder().add_source(Config::try_from(&AppConfig::default())?);

    if let Some(path) = path {
        builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
    }

    let config: AppConfig = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("catalog.enabled_services")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()?;

    config.validate()?;
    Ok(config)
}
