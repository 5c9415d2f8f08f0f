//! Compare command implementation

use crate::cli::CompareArgs;
use crate::output::OutputWriter;
use crate::output_types::CompareOutput;
use anyhow::Result;
use std::path::Path;

use super::{build_pipeline, list_or_dash, load_schema, run_archive};

pub fn execute(args: CompareArgs, config_file: Option<&Path>, output: &OutputWriter) -> Result<()> {
    let target = load_schema(&args.schema)?;
    let pipeline = build_pipeline(config_file, args.overrides)?;
    let outcome = run_archive(&pipeline, &args.archive)?;

    let comparison = pipeline.compare_with_target(&outcome.dataset, &target);

    if output.is_json() {
        output.result(CompareOutput {
            archive: args.archive.display().to_string(),
            source_fields: outcome.dataset.field_names(),
            comparison,
        })?;
        return Ok(());
    }

    output.section("Schema Comparison");
    output.kv("Source fields", list_or_dash(&outcome.dataset.field_names()));
    output.kv("Missing in target", list_or_dash(&comparison.missing_in_target));
    output.kv("Missing in source", list_or_dash(&comparison.missing_in_source));
    output.kv("Required missing", list_or_dash(&comparison.required_missing));
    for recommendation in &comparison.recommendations {
        output.info(recommendation);
    }

    if comparison.compatible {
        output.success("Schemas are compatible");
    } else {
        output.warning("Schemas differ; use `layerprep map` to remap fields");
    }
    Ok(())
}
