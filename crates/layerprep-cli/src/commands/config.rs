//! Config command implementation

use crate::cli::ConfigArgs;
use crate::config_loader::load_config_with_overrides;
use crate::output::OutputWriter;
use crate::output_types::{ConfigEntry, ConfigOutput};
use anyhow::Result;
use layerprep_core::config::ConfigSource;
use std::path::Path;
use tabled::Tabled;

#[derive(Tabled)]
struct ConfigRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Source")]
    source: &'static str,
}

fn source_label(source: ConfigSource) -> &'static str {
    match source {
        ConfigSource::Default => "default",
        ConfigSource::File => "file",
        ConfigSource::Environment => "environment",
        ConfigSource::Cli => "cli",
    }
}

pub fn execute(args: ConfigArgs, config_file: Option<&Path>, output: &OutputWriter) -> Result<()> {
    let config = load_config_with_overrides(config_file, args.overrides.into_overrides())?;

    let mut values: Vec<ConfigEntry> = config
        .to_inspection_map()
        .into_iter()
        .map(|(key, (value, source))| ConfigEntry { key, value, source })
        .collect();
    values.sort_by(|a, b| a.key.cmp(&b.key));

    if output.is_json() {
        output.result(ConfigOutput {
            config_file: config_file.map(|p| p.display().to_string()),
            values,
        })?;
        return Ok(());
    }

    output.section("Configuration");
    if let Some(path) = config_file {
        output.kv("Config file", path.display());
    }
    let rows: Vec<ConfigRow> = values
        .into_iter()
        .map(|entry| ConfigRow {
            key: entry.key,
            value: entry.value,
            source: source_label(entry.source),
        })
        .collect();
    output.table(rows);
    Ok(())
}
