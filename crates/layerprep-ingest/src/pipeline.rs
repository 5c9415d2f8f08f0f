use layerprep_core::config::PipelineOptions;
use layerprep_core::error::{IngestError, Result};
use layerprep_core::formats::{
    inspect_attributes, read_geometry, ArchiveValidation, AttributeTableInfo, ShapefileArchive,
};
use layerprep_core::models::{
    FeatureDataset, Field, FieldMapping, GeometryType, QualityReport, SchemaComparison,
    TargetField, ValidationReport,
};
use layerprep_core::ports::EventRecorder;
use layerprep_core::schema::{apply_mapping, compare_schemas, suggest_mapping};
use layerprep_geo::transform::{normalize_crs, CrsAction};
use serde::Serialize;

use crate::prepare::{prepare_for_publish, PreparationSummary};
use crate::quality::QualityScorer;
use crate::validation::validate_dataset;

/// Everything one pipeline run produced
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    /// Normalized, prepared dataset for the publisher
    pub dataset: FeatureDataset,
    pub geometry_type: GeometryType,
    pub fields: Vec<Field>,
    /// Non-blocking problems met along the way, in pipeline order
    pub warnings: Vec<String>,
    pub archive: ArchiveValidation,
    pub attributes: AttributeTableInfo,
    /// `None` when reprojection failed and the source coordinates were kept
    pub crs_action: Option<CrsAction>,
    pub validation: ValidationReport,
    pub quality: QualityReport,
    pub preparation: PreparationSummary,
}

/// Ingest pipeline from uploaded archive to publishable dataset
pub struct IngestPipeline<'a> {
    options: PipelineOptions,
    recorder: &'a dyn EventRecorder,
}

impl<'a> IngestPipeline<'a> {
    /// Create a new ingest pipeline
    pub fn new(options: PipelineOptions, recorder: &'a dyn EventRecorder) -> Self {
        Self { options, recorder }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Run an uploaded zip archive through every stage.
    ///
    /// Structural failures stop the run with an error. Everything else is
    /// reported in the outcome. The working directory is removed on return,
    /// whichever way the run ends.
    pub fn run(&self, bytes: &[u8]) -> Result<IngestOutcome> {
        // Phase 1: Archive validation
        let mut archive = ShapefileArchive::open(bytes)?;
        let archive_report = archive.validate();
        self.recorder.record(
            "archive_validated",
            &[
                ("valid", archive_report.valid.to_string()),
                ("complete_sets", archive_report.complete_sets.join(",")),
            ],
        );
        if !archive_report.valid {
            return Err(IngestError::Archive {
                reason: archive_report
                    .error
                    .clone()
                    .unwrap_or_else(|| "no complete shapefile found".to_string()),
            });
        }

        let mut warnings = archive_report.warnings.clone();
        let base_name = archive_report
            .complete_sets
            .first()
            .cloned()
            .ok_or_else(|| IngestError::Archive { reason: "no complete shapefile found".to_string() })?;
        if archive_report.complete_sets.len() > 1 {
            warnings.push(format!(
                "Archive contains {} shapefiles; using '{}'",
                archive_report.complete_sets.len(),
                base_name
            ));
        }

        // Phase 2: Extraction into a directory owned by this run
        let workdir = tempfile::tempdir()?;
        let extracted = archive.extract_set(&base_name, workdir.path())?;
        self.recorder.record("set_extracted", &[("base_name", base_name.clone())]);

        // Phase 3: Attribute table and geometry
        let attributes =
            inspect_attributes(extracted.dbf.as_deref(), self.options.empty_dbf_threshold)?;
        self.recorder.record(
            "attributes_inspected",
            &[
                ("present", attributes.present.to_string()),
                ("empty", attributes.empty.to_string()),
                ("size_bytes", attributes.size_bytes.to_string()),
            ],
        );
        if attributes.present && attributes.needs_synthetic_id() {
            warnings.push(format!(
                "Attribute table has no usable columns; added identifier field '{}'",
                self.options.id_field_name
            ));
        } else if !attributes.present {
            warnings.push(format!(
                "No attribute table; added identifier field '{}'",
                self.options.id_field_name
            ));
        }
        if let Some(reason) = &attributes.header_error {
            warnings.push(format!("Attribute table header unreadable: {}", reason));
        }

        let mut dataset = read_geometry(&extracted, &attributes, &self.options.id_field_name)?;
        self.recorder.record(
            "dataset_read",
            &[
                ("features", dataset.feature_count().to_string()),
                ("geometry_type", dataset.geometry_type.to_string()),
            ],
        );
        if let Some(missing) = attributes.missing_rows(dataset.feature_count()) {
            warnings.push(format!(
                "Attribute table has no row for {} of {} features; their attributes are null",
                missing,
                dataset.feature_count()
            ));
        }
        drop(workdir);

        // Phase 4: CRS normalization
        let source_crs_defined = dataset.crs.is_some();
        let crs_action = match normalize_crs(&mut dataset, &self.options.target_crs) {
            Ok(action) => {
                self.recorder.record("crs_normalized", &[("action", action.to_string())]);
                Some(action)
            }
            Err(e) if e.is_recoverable() => {
                tracing::warn!(error = %e, "Keeping source coordinates");
                self.recorder.record("crs_normalization_failed", &[("reason", e.to_string())]);
                warnings.push(format!("{}; source coordinates were kept", e));
                None
            }
            Err(e) => return Err(e),
        };

        // Phase 5: Validation and quality
        let validation = validate_dataset(&dataset);
        warnings.extend(validation.warnings.iter().cloned());
        let quality = QualityScorer::new(self.options.null_field_threshold)
            .score_with_crs(&dataset, source_crs_defined);
        self.recorder.record(
            "quality_scored",
            &[
                ("score", quality.overall_score.to_string()),
                ("issues", quality.statistics.total_issues.to_string()),
            ],
        );

        // Phase 6: Publish preparation
        let preparation = prepare_for_publish(&mut dataset, self.options.geometry_validity);
        self.recorder.record(
            "prepared",
            &[
                ("repaired", preparation.repaired.len().to_string()),
                ("dropped", preparation.dropped_null_geometries.to_string()),
            ],
        );

        Ok(IngestOutcome {
            geometry_type: dataset.geometry_type,
            fields: dataset.fields.clone(),
            dataset,
            warnings,
            archive: archive_report,
            attributes,
            crs_action,
            validation,
            quality,
            preparation,
        })
    }

    /// Compare a dataset's fields with an existing layer's schema
    pub fn compare_with_target(
        &self,
        dataset: &FeatureDataset,
        target: &[TargetField],
    ) -> SchemaComparison {
        let comparison = compare_schemas(&dataset.field_names(), target);
        self.recorder.record(
            "schema_compared",
            &[
                ("compatible", comparison.compatible.to_string()),
                ("missing_in_target", comparison.missing_in_target.join(",")),
                ("missing_in_source", comparison.missing_in_source.join(",")),
            ],
        );
        comparison
    }

    /// Apply a caller-supplied mapping, or the suggested one when none is given.
    ///
    /// Returns the mapping used alongside the remapped dataset.
    pub fn suggest_and_apply(
        &self,
        dataset: &FeatureDataset,
        target: &[TargetField],
        mapping: Option<FieldMapping>,
    ) -> Result<(FieldMapping, FeatureDataset)> {
        let mapping = match mapping {
            Some(mapping) => mapping,
            None => suggest_mapping(&dataset.field_names(), target),
        };
        let mapped = apply_mapping(dataset, &mapping)?;
        self.recorder.record(
            "mapping_applied",
            &[("mapped", mapping.len().to_string()), ("fields", mapped.fields.len().to_string())],
        );
        Ok((mapping, mapped))
    }
}
