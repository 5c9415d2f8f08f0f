//! Command implementations

mod check;
mod compare;
mod config;
mod ingest;
mod map;
mod quality;

use crate::cli::{Cli, Commands, OverrideArgs};
use crate::config_loader::load_config_with_overrides;
use crate::errors;
use crate::output::OutputWriter;
use anyhow::{Context, Result};
use layerprep_core::models::{FeatureDataset, FieldMapping, QualityReport, QualityTier, TargetField};
use layerprep_core::ports::TracingRecorder;
use layerprep_core::IngestError;
use layerprep_ingest::{to_geojson_string, IngestOutcome, IngestPipeline};
use std::fs;
use std::path::Path;

static RECORDER: TracingRecorder = TracingRecorder;

/// Execute a CLI command
pub fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let config_file = cli.config.as_deref();

    match cli.command {
        Commands::Check(args) => check::execute(args, &output),
        Commands::Ingest(args) => ingest::execute(args, config_file, &output),
        Commands::Quality(args) => quality::execute(args, config_file, &output),
        Commands::Compare(args) => compare::execute(args, config_file, &output),
        Commands::Map(args) => map::execute(args, config_file, &output),
        Commands::Config(args) => config::execute(args, config_file, &output),
    }
}

fn ingest_error(error: IngestError) -> anyhow::Error {
    errors::from_ingest(&error).into()
}

/// Read an uploaded archive from disk
fn read_archive(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        return Err(errors::archive_not_found(path).into());
    }
    fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Build a pipeline from the layered configuration
fn build_pipeline(
    config_file: Option<&Path>,
    overrides: OverrideArgs,
) -> Result<IngestPipeline<'static>> {
    let config = load_config_with_overrides(config_file, overrides.into_overrides())?;
    let options = config.pipeline_options();
    tracing::debug!(target_crs = %options.target_crs, "Resolved pipeline options");
    Ok(IngestPipeline::new(options, &RECORDER))
}

fn run_archive(pipeline: &IngestPipeline<'_>, archive: &Path) -> Result<IngestOutcome> {
    let bytes = read_archive(archive)?;
    pipeline.run(&bytes).map_err(ingest_error)
}

fn write_geojson(path: &Path, dataset: &FeatureDataset) -> Result<()> {
    let text = to_geojson_string(dataset).map_err(ingest_error)?;
    fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))
}

fn load_schema(path: &Path) -> Result<Vec<TargetField>> {
    let content = fs::read_to_string(path)
        .map_err(|e| errors::schema_file_invalid(path, &e.to_string()))?;
    let fields: Vec<TargetField> = serde_json::from_str(&content)
        .map_err(|e| errors::schema_file_invalid(path, &e.to_string()))?;
    Ok(fields)
}

fn load_mapping(path: &Path) -> Result<FieldMapping> {
    let content = fs::read_to_string(path)
        .map_err(|e| errors::mapping_file_invalid(path, &e.to_string()))?;
    let mapping: FieldMapping = serde_json::from_str(&content)
        .map_err(|e| errors::mapping_file_invalid(path, &e.to_string()))?;
    mapping
        .validate()
        .map_err(|e| errors::mapping_file_invalid(path, &e.to_string()))?;
    Ok(mapping)
}

fn report_warnings(output: &OutputWriter, warnings: &[String]) {
    for warning in warnings {
        output.warning(warning);
    }
}

fn tier_label(tier: QualityTier) -> &'static str {
    match tier {
        QualityTier::Excellent => "excellent",
        QualityTier::Good => "good",
        QualityTier::NeedsImprovement => "needs improvement",
    }
}

fn print_quality(output: &OutputWriter, quality: &QualityReport) {
    output.kv("Score", format!("{:.1} ({})", quality.overall_score, tier_label(quality.tier)));
    output.kv("Duplicate records", quality.statistics.duplicate_records);
    output.kv("Fields with nulls", quality.statistics.fields_with_nulls);
    output.kv("Geometry issues", quality.statistics.geometry_issues);

    for issue in &quality.issues {
        output.warning(issue);
    }
    for finding in &quality.findings {
        output.info(finding);
    }
    for recommendation in &quality.recommendations {
        output.info(recommendation);
    }
}

fn list_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}
