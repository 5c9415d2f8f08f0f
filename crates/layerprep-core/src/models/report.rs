//! Plain-data reports returned alongside a successful ingest.
//!
//! None of these carry behavior beyond small accessors; the reporting layer
//! serializes them as they are.

use serde::{Deserialize, Serialize};

/// Structured findings for one dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub statistics: DatasetStatistics,
    /// Record indices whose geometry failed validation
    pub invalid_indices: Vec<usize>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self { valid: true, ..Default::default() }
    }

    /// Add a blocking error; the report becomes invalid
    pub fn error(&mut self, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(message.into());
    }

    /// Add a non-blocking warning
    pub fn warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetStatistics {
    pub feature_count: usize,
    pub null_geometry_count: usize,
    pub invalid_geometry_count: usize,
    pub geometry_types: Vec<String>,
    /// `[min_x, min_y, max_x, max_y]`
    pub bounds: Option<[f64; 4]>,
}

/// Advisory quality tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityTier {
    Excellent,
    Good,
    NeedsImprovement,
}

impl QualityTier {
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            QualityTier::Excellent
        } else if score >= 70.0 {
            QualityTier::Good
        } else {
            QualityTier::NeedsImprovement
        }
    }

    pub fn recommendation(self) -> &'static str {
        match self {
            QualityTier::Excellent => "Data quality is excellent",
            QualityTier::Good => "Data quality is good with minor issues",
            QualityTier::NeedsImprovement => "Data quality needs improvement before upload",
        }
    }
}

/// Data quality score with the findings behind it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    /// Score in `[0, 100]`, rounded to one decimal
    pub overall_score: f64,
    pub tier: QualityTier,
    /// Findings that count against the score
    pub issues: Vec<String>,
    /// Findings that do not affect the score
    pub findings: Vec<String>,
    pub recommendations: Vec<String>,
    pub statistics: QualityStatistics,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityStatistics {
    pub total_features: usize,
    pub total_issues: usize,
    pub duplicate_records: usize,
    pub fields_with_nulls: usize,
    pub geometry_issues: usize,
}

/// Result of inspecting a coordinate reference system
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrsReport {
    pub has_crs: bool,
    pub definition: Option<String>,
    pub name: Option<String>,
    pub epsg: Option<u32>,
    pub is_geographic: bool,
    pub recommendations: Vec<String>,
}
