use clap::{Args, Parser, Subcommand};
use layerprep_core::config::{parse_validity_mode, CliConfigOverrides};
use layerprep_core::models::ValidityMode;
use std::path::PathBuf;

/// layerprep - Validate and prepare zipped shapefiles for publishing
#[derive(Parser, Debug)]
#[command(name = "layerprep")]
#[command(about = "Validate and prepare zipped shapefiles for publishing", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// TOML configuration file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check that an archive contains a complete shapefile
    Check(CheckArgs),

    /// Run the full pipeline and optionally write GeoJSON
    Ingest(IngestArgs),

    /// Score the data quality of an archive
    Quality(QualityArgs),

    /// Compare an archive's fields with a target layer schema
    Compare(CompareArgs),

    /// Map an archive's fields onto a target layer schema
    Map(MapArgs),

    /// Show the resolved configuration and where each value came from
    Config(ConfigArgs),
}

/// Overrides shared by every command that runs the pipeline
#[derive(Args, Debug, Default)]
pub struct OverrideArgs {
    /// Target CRS (e.g. "EPSG:4326" or "3857")
    #[arg(long, value_name = "CRS")]
    pub target_crs: Option<String>,

    /// Size in bytes at or below which a .dbf counts as empty
    #[arg(long, value_name = "BYTES")]
    pub empty_dbf_threshold: Option<u64>,

    /// Geometry validity mode (strict or lenient)
    #[arg(long, value_name = "MODE", value_parser = parse_validity)]
    pub validity: Option<ValidityMode>,
}

impl OverrideArgs {
    pub fn into_overrides(self) -> CliConfigOverrides {
        CliConfigOverrides {
            target_crs: self.target_crs,
            empty_dbf_threshold: self.empty_dbf_threshold,
            geometry_validity: self.validity,
        }
    }
}

fn parse_validity(value: &str) -> Result<ValidityMode, String> {
    parse_validity_mode(value).map_err(|e| e.to_string())
}

#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Path to the zip archive
    pub archive: PathBuf,
}

#[derive(Parser, Debug)]
pub struct IngestArgs {
    /// Path to the zip archive
    pub archive: PathBuf,

    /// Write the prepared dataset as GeoJSON to this file
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: OverrideArgs,
}

#[derive(Parser, Debug)]
pub struct QualityArgs {
    /// Path to the zip archive
    pub archive: PathBuf,

    #[command(flatten)]
    pub overrides: OverrideArgs,
}

#[derive(Parser, Debug)]
pub struct CompareArgs {
    /// Path to the zip archive
    pub archive: PathBuf,

    /// Target layer schema: a JSON array of {"name", "nullable", "type"}
    #[arg(long, value_name = "FILE")]
    pub schema: PathBuf,

    #[command(flatten)]
    pub overrides: OverrideArgs,
}

#[derive(Parser, Debug)]
pub struct MapArgs {
    /// Path to the zip archive
    pub archive: PathBuf,

    /// Target layer schema: a JSON array of {"name", "nullable", "type"}
    #[arg(long, value_name = "FILE")]
    pub schema: PathBuf,

    /// Field mapping as a JSON object of source name to target name.
    /// The suggested mapping is used when omitted.
    #[arg(long, value_name = "FILE")]
    pub mapping: Option<PathBuf>,

    /// Write the mapped dataset as GeoJSON to this file
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: OverrideArgs,
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub overrides: OverrideArgs,
}
