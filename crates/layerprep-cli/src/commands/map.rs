//! Map command implementation

use crate::cli::MapArgs;
use crate::output::OutputWriter;
use crate::output_types::MapOutput;
use anyhow::Result;
use std::path::Path;
use tabled::Tabled;

use super::{build_pipeline, ingest_error, load_mapping, load_schema, run_archive, write_geojson};

#[derive(Tabled)]
struct MappingRow {
    #[tabled(rename = "Source field")]
    source: String,
    #[tabled(rename = "Target field")]
    target: String,
}

pub fn execute(args: MapArgs, config_file: Option<&Path>, output: &OutputWriter) -> Result<()> {
    let target = load_schema(&args.schema)?;
    let mapping = args.mapping.as_deref().map(load_mapping).transpose()?;
    let pipeline = build_pipeline(config_file, args.overrides)?;
    let outcome = run_archive(&pipeline, &args.archive)?;

    let (mapping, mapped) = pipeline
        .suggest_and_apply(&outcome.dataset, &target, mapping)
        .map_err(ingest_error)?;

    if let Some(path) = &args.output {
        write_geojson(path, &mapped)?;
    }

    if output.is_json() {
        output.result(MapOutput {
            archive: args.archive.display().to_string(),
            mapped_fields: mapped.field_names(),
            feature_count: mapped.feature_count(),
            mapping,
            output_file: args.output.map(|p| p.display().to_string()),
        })?;
        return Ok(());
    }

    output.section("Field Mapping");
    let rows: Vec<MappingRow> = mapping
        .iter()
        .map(|(from, to)| MappingRow {
            source: from.to_string(),
            target: to.to_string(),
        })
        .collect();
    output.table(rows);

    for name in outcome.dataset.field_names() {
        if mapping.get(&name).is_none() {
            output.warning(format!("Field '{}' is not mapped and will be dropped", name));
        }
    }

    match &args.output {
        Some(path) => output.success(format!(
            "Wrote {} mapped features to {}",
            mapped.feature_count(),
            path.display()
        )),
        None => output.info("No --output given; mapped dataset was not written"),
    }
    Ok(())
}
