//! Ingest command implementation

use crate::cli::IngestArgs;
use crate::output::OutputWriter;
use crate::output_types::IngestOutput;
use anyhow::Result;
use layerprep_geo::crs::describe_crs;
use std::path::Path;
use tabled::Tabled;

use super::{build_pipeline, print_quality, report_warnings, run_archive, write_geojson};

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
}

pub fn execute(args: IngestArgs, config_file: Option<&Path>, output: &OutputWriter) -> Result<()> {
    let pipeline = build_pipeline(config_file, args.overrides)?;
    let outcome = run_archive(&pipeline, &args.archive)?;

    if let Some(path) = &args.output {
        write_geojson(path, &outcome.dataset)?;
    }

    let crs = describe_crs(outcome.dataset.crs.as_ref());

    if output.is_json() {
        output.result(IngestOutput {
            archive: args.archive.display().to_string(),
            dataset_name: outcome.dataset.name.clone(),
            feature_count: outcome.dataset.feature_count(),
            geometry_type: outcome.geometry_type,
            fields: outcome.fields,
            crs,
            crs_action: outcome.crs_action,
            warnings: outcome.warnings,
            validation: outcome.validation,
            quality: outcome.quality,
            preparation: outcome.preparation,
            output_file: args.output.map(|p| p.display().to_string()),
        })?;
        return Ok(());
    }

    report_warnings(output, &outcome.warnings);

    output.section("Dataset");
    output.kv("Name", &outcome.dataset.name);
    output.kv("Features", outcome.dataset.feature_count());
    output.kv("Geometry type", outcome.geometry_type);
    match &outcome.dataset.crs {
        Some(dataset_crs) => output.kv("CRS", dataset_crs),
        None => output.kv("CRS", "none"),
    }
    match &outcome.crs_action {
        Some(action) => output.kv("CRS action", action),
        None => output.kv("CRS action", "source coordinates kept"),
    }
    for recommendation in &crs.recommendations {
        output.info(recommendation);
    }

    output.section("Fields");
    let rows: Vec<FieldRow> = outcome
        .fields
        .iter()
        .map(|f| FieldRow {
            name: f.name.clone(),
            kind: format!("{:?}", f.kind),
        })
        .collect();
    output.table(rows);

    output.section("Validation");
    let stats = &outcome.validation.statistics;
    output.kv("Valid", if outcome.validation.valid { "yes" } else { "no" });
    output.kv("Null geometries", stats.null_geometry_count);
    output.kv("Invalid geometries", stats.invalid_geometry_count);
    if let Some([min_x, min_y, max_x, max_y]) = stats.bounds {
        output.kv("Bounds", format!("[{}, {}, {}, {}]", min_x, min_y, max_x, max_y));
    }
    for error in &outcome.validation.errors {
        output.warning(error);
    }

    output.section("Quality");
    print_quality(output, &outcome.quality);

    output.section("Preparation");
    let preparation = &outcome.preparation;
    output.kv("Repaired geometries", preparation.repaired.len());
    output.kv("Dropped null geometries", preparation.dropped_null_geometries);
    for (from, to) in &preparation.renamed_fields {
        output.kv("Renamed field", format!("{} -> {}", from, to));
    }
    for (index, reason) in &preparation.still_invalid {
        output.warning(format!("Feature {} is still invalid: {}", index, reason));
    }

    match &args.output {
        Some(path) => output.success(format!(
            "Wrote {} features to {}",
            outcome.dataset.feature_count(),
            path.display()
        )),
        None => output.success("Archive is ready to publish"),
    }
    Ok(())
}
