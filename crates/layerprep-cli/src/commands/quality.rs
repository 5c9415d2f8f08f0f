//! Quality command implementation

use crate::cli::QualityArgs;
use crate::output::OutputWriter;
use crate::output_types::QualityOutput;
use anyhow::Result;
use std::path::Path;

use super::{build_pipeline, print_quality, run_archive};

pub fn execute(args: QualityArgs, config_file: Option<&Path>, output: &OutputWriter) -> Result<()> {
    let pipeline = build_pipeline(config_file, args.overrides)?;
    let outcome = run_archive(&pipeline, &args.archive)?;

    if output.is_json() {
        output.result(QualityOutput {
            archive: args.archive.display().to_string(),
            feature_count: outcome.quality.statistics.total_features,
            quality: outcome.quality,
        })?;
    } else {
        output.section(format!("Data Quality: {}", outcome.dataset.name));
        output.kv("Features", outcome.quality.statistics.total_features);
        print_quality(output, &outcome.quality);
    }

    Ok(())
}
