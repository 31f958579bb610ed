//! Report envelope shared by every analysis output.

use crate::analyzers::content::ContentAnomalies;
use crate::analyzers::diversity::DiversityReport;
use crate::analyzers::geography::{CountryProfiles, GeographicalBias};
use crate::analyzers::institution::{InstitutionMetrics, InstitutionRankings};
use crate::analyzers::quality::DataQuality;
use crate::analyzers::rating::RatingPatterns;
use crate::analyzers::reviewer::{ReviewerAnomalies, ReviewerMetrics};
use crate::analyzers::submission::SubmissionAnomalies;
use crate::config::AnalysisConfig;
use crate::stats::DatasetStats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bumped when a report's field layout changes.
pub const SCHEMA_VERSION: u8 = 1;
/// Bumped when a metric is computed differently.
pub const ALGORITHM_VERSION: u8 = 1;

/// Provenance attached to every report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    pub schema_version: u8,
    pub algorithm_version: u8,
    pub config: AnalysisConfig,
    pub dataset: DatasetStats,
}

impl ReportMetadata {
    pub fn new(config: &AnalysisConfig, dataset: DatasetStats) -> Self {
        Self {
            generated_at: Utc::now(),
            schema_version: SCHEMA_VERSION,
            algorithm_version: ALGORITHM_VERSION,
            config: config.clone(),
            dataset,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report<T> {
    pub metadata: ReportMetadata,
    pub data: T,
}

impl<T> Report<T> {
    pub fn new(metadata: &ReportMetadata, data: T) -> Self {
        Self {
            metadata: metadata.clone(),
            data,
        }
    }
}

/// Everything one analysis run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSet {
    pub reviewer_anomalies: Report<ReviewerAnomalies>,
    pub submission_anomalies: Report<SubmissionAnomalies>,
    pub rating_patterns: Report<RatingPatterns>,
    pub content_anomalies: Report<ContentAnomalies>,
    pub data_quality: Report<DataQuality>,
    pub diversity: Report<DiversityReport>,
    pub country_profiles: Report<CountryProfiles>,
    pub geographical_bias: Report<GeographicalBias>,
    pub institution_rankings: Report<InstitutionRankings>,
    /// Flat rows for the CSV snapshots.
    pub reviewer_metrics: Vec<ReviewerMetrics>,
    pub institution_metrics: Vec<InstitutionMetrics>,
}
