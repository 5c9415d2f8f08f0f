//! Data quality scoring
//!
//! Issues are counted per affected feature: each duplicate record, each null
//! value in a mostly-null field, each invalid or null geometry, plus one for a
//! missing CRS. The score is the share of features left unaffected.

use layerprep_core::config::DEFAULT_NULL_FIELD_THRESHOLD;
use layerprep_core::models::{
    FeatureDataset, FeatureRecord, QualityReport, QualityStatistics, QualityTier,
};
use layerprep_geo::crs::describe_crs;
use layerprep_geo::validation::count_invalid_geometries;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;

/// Characters that show up when text was decoded with the wrong code page
const MOJIBAKE_MARKERS: [char; 4] = ['Ã', 'â', '¿', '\u{FFFD}'];

/// Scores datasets against a null-density threshold
#[derive(Debug, Clone, Copy)]
pub struct QualityScorer {
    /// Null fraction above which a field counts against the score
    pub null_field_threshold: f64,
}

impl Default for QualityScorer {
    fn default() -> Self {
        Self { null_field_threshold: DEFAULT_NULL_FIELD_THRESHOLD }
    }
}

impl QualityScorer {
    pub fn new(null_field_threshold: f64) -> Self {
        Self { null_field_threshold }
    }

    /// Score a dataset, judging CRS presence from the dataset itself
    pub fn score(&self, dataset: &FeatureDataset) -> QualityReport {
        self.score_with_crs(dataset, dataset.crs.is_some())
    }

    /// Score a dataset whose CRS may already have been assumed.
    ///
    /// `crs_defined` says whether the source declared a CRS.
    pub fn score_with_crs(&self, dataset: &FeatureDataset, crs_defined: bool) -> QualityReport {
        let total_features = dataset.feature_count();
        let mut issues = Vec::new();
        let mut recommendations = Vec::new();
        let mut stats = QualityStatistics { total_features, ..Default::default() };

        if total_features == 0 {
            issues.push("Dataset has no features".to_string());
            recommendations.push(QualityTier::NeedsImprovement.recommendation().to_string());
            return QualityReport {
                overall_score: 0.0,
                tier: QualityTier::NeedsImprovement,
                issues,
                findings: vec![],
                recommendations,
                statistics: stats,
            };
        }

        let mut issue_count = 0usize;

        let duplicates = count_duplicates(dataset);
        if duplicates > 0 {
            issues.push(format!("{} duplicate records found", duplicates));
            recommendations.push("Consider removing duplicate records".to_string());
            issue_count += duplicates;
        }
        stats.duplicate_records = duplicates;

        for field in &dataset.fields {
            let nulls = dataset.records.iter().filter(|r| r.value(&field.name).is_null()).count();
            if nulls == 0 {
                continue;
            }
            stats.fields_with_nulls += 1;
            let fraction = nulls as f64 / total_features as f64;
            if fraction > self.null_field_threshold {
                issues.push(format!(
                    "Field '{}' has {:.1}% null values",
                    field.name,
                    fraction * 100.0
                ));
                issue_count += nulls;
            }
        }

        let invalid = count_invalid_geometries(dataset);
        let null_geometries = dataset.null_geometry_count();
        if invalid > 0 {
            issues.push(format!("{} features have invalid geometry", invalid));
        }
        if null_geometries > 0 {
            issues.push(format!("{} features have null geometry", null_geometries));
        }
        stats.geometry_issues = invalid + null_geometries;
        issue_count += stats.geometry_issues;

        if !crs_defined {
            issues.push("No coordinate reference system defined".to_string());
            recommendations.extend(describe_crs(None).recommendations);
            issue_count += 1;
        }

        stats.total_issues = issue_count;

        let raw = (100.0 - issue_count as f64 / total_features as f64 * 100.0).max(0.0);
        let overall_score = (raw * 10.0).round() / 10.0;
        let tier = QualityTier::from_score(overall_score);
        recommendations.push(tier.recommendation().to_string());

        let findings = check_fields(dataset).messages();

        tracing::info!(
            score = overall_score,
            issues = issue_count,
            features = total_features,
            "Scored dataset quality"
        );

        QualityReport {
            overall_score,
            tier,
            issues,
            findings,
            recommendations,
            statistics: stats,
        }
    }
}

/// Score a dataset with the given null-field threshold
pub fn score_quality(dataset: &FeatureDataset, null_field_threshold: f64) -> QualityReport {
    QualityScorer::new(null_field_threshold).score(dataset)
}

/// Records identical to an earlier record in geometry and every attribute
fn count_duplicates(dataset: &FeatureDataset) -> usize {
    let mut seen = HashSet::new();
    dataset
        .records
        .iter()
        .filter(|record| !seen.insert(record_key(dataset, record)))
        .count()
}

fn record_key(dataset: &FeatureDataset, record: &FeatureRecord) -> String {
    let values: Vec<&Value> = dataset.fields.iter().map(|f| record.value(&f.name)).collect();
    let geometry = record.geometry.as_ref().map(|g| g.to_geojson());
    serde_json::json!([geometry, values]).to_string()
}

/// Attribute problems that do not count against the score
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldFindings {
    /// Fields with no value in any record
    pub all_null: Vec<String>,
    /// Fields whose text looks like it was decoded with the wrong encoding
    pub encoding_issues: Vec<String>,
}

impl FieldFindings {
    pub fn is_empty(&self) -> bool {
        self.all_null.is_empty() && self.encoding_issues.is_empty()
    }

    /// One line per finding
    pub fn messages(&self) -> Vec<String> {
        self.all_null
            .iter()
            .map(|f| format!("Field '{}' is entirely null", f))
            .chain(
                self.encoding_issues
                    .iter()
                    .map(|f| format!("Field '{}' may have encoding issues", f)),
            )
            .collect()
    }
}

/// Look for empty columns and garbled text
pub fn check_fields(dataset: &FeatureDataset) -> FieldFindings {
    let mut findings = FieldFindings::default();
    if dataset.records.is_empty() {
        return findings;
    }

    for field in &dataset.fields {
        let values = || dataset.records.iter().map(|r| r.value(&field.name));

        if values().all(Value::is_null) {
            findings.all_null.push(field.name.clone());
            continue;
        }

        let garbled = values()
            .filter_map(Value::as_str)
            .any(|s| s.contains(&MOJIBAKE_MARKERS[..]));
        if garbled {
            findings.encoding_issues.push(field.name.clone());
        }
    }

    findings
}
