use crate::error::{IngestError, Result};
use crate::models::{Crs, ValidityMode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

/// Header-only size of a zero-field dBase III table: 32 byte header plus terminator
pub const DEFAULT_EMPTY_DBF_THRESHOLD: u64 = 33;

/// Name given to the synthetic identifier field
pub const DEFAULT_ID_FIELD: &str = "ID";

/// Null fraction above which a field is reported as a quality issue
pub const DEFAULT_NULL_FIELD_THRESHOLD: f64 = 0.5;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Resolved settings handed to the pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    pub target_crs: Crs,
    pub empty_dbf_threshold: u64,
    pub null_field_threshold: f64,
    pub id_field_name: String,
    pub geometry_validity: ValidityMode,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        LayeredConfig::with_defaults().pipeline_options()
    }
}

/// Layered configuration for layerprep
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub target_crs: ConfigValue<String>,
    pub empty_dbf_threshold: ConfigValue<u64>,
    pub null_field_threshold: ConfigValue<f64>,
    pub id_field_name: ConfigValue<String>,
    pub geometry_validity: ConfigValue<ValidityMode>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            target_crs: ConfigValue::new("EPSG:4326".to_string(), ConfigSource::Default),
            empty_dbf_threshold: ConfigValue::new(
                DEFAULT_EMPTY_DBF_THRESHOLD,
                ConfigSource::Default,
            ),
            null_field_threshold: ConfigValue::new(
                DEFAULT_NULL_FIELD_THRESHOLD,
                ConfigSource::Default,
            ),
            id_field_name: ConfigValue::new(DEFAULT_ID_FIELD.to_string(), ConfigSource::Default),
            geometry_validity: ConfigValue::new(ValidityMode::Lenient, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| IngestError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| IngestError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(target_crs) = file_config.target_crs {
            self.target_crs.update(target_crs, ConfigSource::File);
        }

        if let Some(threshold) = file_config.empty_dbf_threshold {
            self.empty_dbf_threshold.update(threshold, ConfigSource::File);
        }

        if let Some(threshold) = file_config.null_field_threshold {
            let threshold = parse_fraction("null_field_threshold", threshold)?;
            self.null_field_threshold.update(threshold, ConfigSource::File);
        }

        if let Some(name) = file_config.id_field_name {
            let name = parse_field_name("id_field_name", &name)?;
            self.id_field_name.update(name, ConfigSource::File);
        }

        if let Some(validity) = file_config.geometry_validity {
            self.geometry_validity.update(parse_validity_mode(&validity)?, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // LAYERPREP_TARGET_CRS
        if let Ok(crs) = env::var("LAYERPREP_TARGET_CRS") {
            if crs.trim().is_empty() {
                tracing::warn!("Ignoring empty LAYERPREP_TARGET_CRS");
            } else {
                self.target_crs.update(crs, ConfigSource::Environment);
            }
        }

        // LAYERPREP_EMPTY_DBF_THRESHOLD
        if let Ok(value) = env::var("LAYERPREP_EMPTY_DBF_THRESHOLD") {
            match value.parse::<u64>() {
                Ok(threshold) => {
                    self.empty_dbf_threshold.update(threshold, ConfigSource::Environment)
                }
                Err(_) => tracing::warn!(
                    "Invalid LAYERPREP_EMPTY_DBF_THRESHOLD value '{}': expected a byte count",
                    value
                ),
            }
        }

        // LAYERPREP_NULL_FIELD_THRESHOLD
        if let Ok(value) = env::var("LAYERPREP_NULL_FIELD_THRESHOLD") {
            match value.parse::<f64>().map_err(|e| e.to_string()).and_then(|v| {
                parse_fraction("null_field_threshold", v).map_err(|e| e.to_string())
            }) {
                Ok(threshold) => {
                    self.null_field_threshold.update(threshold, ConfigSource::Environment)
                }
                Err(_) => tracing::warn!(
                    "Invalid LAYERPREP_NULL_FIELD_THRESHOLD value '{}': expected a number between 0 and 1",
                    value
                ),
            }
        }

        // LAYERPREP_ID_FIELD
        if let Ok(value) = env::var("LAYERPREP_ID_FIELD") {
            match parse_field_name("id_field_name", &value) {
                Ok(name) => self.id_field_name.update(name, ConfigSource::Environment),
                Err(_) => tracing::warn!("Invalid LAYERPREP_ID_FIELD value '{}'", value),
            }
        }

        // LAYERPREP_GEOMETRY_VALIDITY
        if let Ok(value) = env::var("LAYERPREP_GEOMETRY_VALIDITY") {
            match parse_validity_mode(&value) {
                Ok(validity) => self.geometry_validity.update(validity, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid LAYERPREP_GEOMETRY_VALIDITY value '{}': expected strict or lenient",
                    value
                ),
            }
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(target_crs) = overrides.target_crs {
            self.target_crs.update(target_crs, ConfigSource::Cli);
        }

        if let Some(threshold) = overrides.empty_dbf_threshold {
            self.empty_dbf_threshold.update(threshold, ConfigSource::Cli);
        }

        if let Some(validity) = overrides.geometry_validity {
            self.geometry_validity.update(validity, ConfigSource::Cli);
        }
    }

    /// Resolve the layered values into pipeline options
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            target_crs: Crs::parse(&self.target_crs.value),
            empty_dbf_threshold: self.empty_dbf_threshold.value,
            null_field_threshold: self.null_field_threshold.value,
            id_field_name: self.id_field_name.value.clone(),
            geometry_validity: self.geometry_validity.value,
        }
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "target_crs".to_string(),
            (self.target_crs.value.clone(), self.target_crs.source),
        );

        map.insert(
            "empty_dbf_threshold".to_string(),
            (self.empty_dbf_threshold.value.to_string(), self.empty_dbf_threshold.source),
        );

        map.insert(
            "null_field_threshold".to_string(),
            (self.null_field_threshold.value.to_string(), self.null_field_threshold.source),
        );

        map.insert(
            "id_field_name".to_string(),
            (self.id_field_name.value.clone(), self.id_field_name.source),
        );

        map.insert(
            "geometry_validity".to_string(),
            (format!("{:?}", self.geometry_validity.value), self.geometry_validity.source),
        );

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    target_crs: Option<String>,
    empty_dbf_threshold: Option<u64>,
    null_field_threshold: Option<f64>,
    id_field_name: Option<String>,
    geometry_validity: Option<String>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub target_crs: Option<String>,
    pub empty_dbf_threshold: Option<u64>,
    pub geometry_validity: Option<ValidityMode>,
}

/// Parse validity mode from string
pub fn parse_validity_mode(s: &str) -> Result<ValidityMode> {
    match s.to_lowercase().as_str() {
        "strict" => Ok(ValidityMode::Strict),
        "lenient" => Ok(ValidityMode::Lenient),
        _ => Err(IngestError::ConfigInvalid {
            key: "geometry_validity".to_string(),
            reason: format!("Invalid validity mode: {}. Use strict or lenient", s),
        }),
    }
}

fn parse_fraction(key: &str, value: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(IngestError::ConfigInvalid {
            key: key.to_string(),
            reason: format!("{} is outside 0..=1", value),
        })
    }
}

fn parse_field_name(key: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(crate::models::GEOMETRY_FIELD) {
        return Err(IngestError::ConfigInvalid {
            key: key.to_string(),
            reason: format!("'{}' cannot be used as a field name", value),
        });
    }
    Ok(trimmed.to_string())
}
