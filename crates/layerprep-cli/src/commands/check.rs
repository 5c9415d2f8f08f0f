//! Check command implementation

use crate::cli::CheckArgs;
use crate::output::OutputWriter;
use crate::output_types::CheckOutput;
use anyhow::Result;
use layerprep_core::formats::validate_archive;
use layerprep_core::IngestError;
use tabled::Tabled;

use super::{ingest_error, read_archive, report_warnings};

#[derive(Tabled)]
struct SetRow {
    #[tabled(rename = "Base name")]
    base_name: String,
    #[tabled(rename = "Status")]
    status: &'static str,
    #[tabled(rename = "Missing")]
    missing: String,
}

pub fn execute(args: CheckArgs, output: &OutputWriter) -> Result<()> {
    let bytes = read_archive(&args.archive)?;
    let validation = validate_archive(&bytes).map_err(ingest_error)?;

    if output.is_json() {
        output.result(CheckOutput {
            archive: args.archive.display().to_string(),
            validation: validation.clone(),
        })?;
    } else {
        output.section("Shapefile Sets");

        let complete = validation.complete_sets.iter().map(|name| SetRow {
            base_name: name.clone(),
            status: "complete",
            missing: "-".to_string(),
        });
        let incomplete = validation.incomplete_sets.iter().map(|set| SetRow {
            base_name: set.base_name.clone(),
            status: "incomplete",
            missing: set.missing_extensions.join(", "),
        });
        output.table(complete.chain(incomplete).collect());
        report_warnings(output, &validation.warnings);
    }

    if !validation.valid {
        let reason = validation
            .error
            .unwrap_or_else(|| "no complete shapefile found".to_string());
        return Err(ingest_error(IngestError::Archive { reason }));
    }

    if !output.is_json() {
        output.success(format!(
            "Archive contains a complete shapefile: {}",
            validation.complete_sets.join(", ")
        ));
    }
    Ok(())
}
