//! Configuration loading utilities for CLI commands

use anyhow::{Context, Result};
use geoflow_core::config::{CliConfigOverrides, LayeredConfig};
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "geoflow.toml";

/// Resolve which config file to read, if any
pub fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let local = PathBuf::from(DEFAULT_CONFIG_FILE);
            local.is_file().then_some(local)
        }
    }
}

/// Load layered configuration: defaults, then file, then environment
pub fn load_config(explicit: Option<&Path>) -> Result<LayeredConfig> {
    let mut config = LayeredConfig::with_defaults();

    if let Some(path) = config_path(explicit) {
        config = config
            .load_from_file(&path)
            .with_context(|| format!("Failed to load configuration file {}", path.display()))?;
    }

    Ok(config.load_from_env())
}

/// Load layered configuration with CLI overrides
pub fn load_config_with_overrides(
    explicit: Option<&Path>,
    overrides: CliConfigOverrides,
) -> Result<LayeredConfig> {
    let mut config = load_config(explicit)?;
    config.update_from_cli(overrides);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}
