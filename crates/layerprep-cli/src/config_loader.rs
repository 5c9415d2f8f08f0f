//! Configuration loading utilities for CLI commands

use anyhow::Result;
use layerprep_core::config::{CliConfigOverrides, LayeredConfig};
use std::path::Path;

use crate::errors;

/// Load layered configuration: defaults, then the optional file, then the environment
pub fn load_config(config_file: Option<&Path>) -> Result<LayeredConfig> {
    let mut config = LayeredConfig::with_defaults();

    if let Some(path) = config_file {
        if !path.exists() {
            return Err(errors::config_file_not_found(path).into());
        }
        config = config.load_from_file(path).map_err(|e| errors::from_ingest(&e))?;
    }

    Ok(config.load_from_env())
}

/// Load layered configuration with CLI overrides
pub fn load_config_with_overrides(
    config_file: Option<&Path>,
    overrides: CliConfigOverrides,
) -> Result<LayeredConfig> {
    let mut config = load_config(config_file)?;
    config.update_from_cli(overrides);
    Ok(config)
}
