//! Analysis thresholds and top-N limits.
//!
//! Every field has a default, so a config file only needs the values it
//! overrides:
//! ```json
//! {
//!   "thresholds": { "reviewer_min_reviews": 5 },
//!   "limits": { "institution_top_n": 50 }
//! }
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Full analysis configuration, echoed into every report's metadata block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub thresholds: Thresholds,
    pub limits: Limits,
}

impl AnalysisConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: AnalysisConfig = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let t = &self.thresholds;
        if t.rating_min >= t.rating_max || t.confidence_min >= t.confidence_max {
            return Err(Error::Config("value ranges must have min < max".into()));
        }
        if !(0.0..1.0).contains(&t.significance_alpha) {
            return Err(Error::Config("significance_alpha must be in [0, 1)".into()));
        }
        if t.low_diversity >= t.high_diversity {
            return Err(Error::Config(
                "low_diversity must be below high_diversity".into(),
            ));
        }
        Ok(())
    }
}

/// Numeric gates and cut-offs used by the analyzers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub rating_min: f64,
    pub rating_max: f64,
    pub confidence_min: f64,
    pub confidence_max: f64,

    // reviewer anomalies
    pub reviewer_min_reviews: usize,
    pub extreme_rating_sigma: f64,
    pub inconsistent_rating_std: f64,
    pub low_effort_text_sigma: f64,
    pub low_effort_content_quality: f64,
    pub confidence_sigma: f64,
    pub outlier_z: f64,

    // submission anomalies
    pub submission_min_reviews: usize,
    pub controversial_std: f64,
    pub consensus_std: f64,
    pub extreme_low_rating: f64,
    pub extreme_high_rating: f64,
    pub low_quality_text_length: f64,
    pub low_quality_min_reviews: usize,

    // rating patterns
    pub over_frequent_ratio: f64,
    pub under_frequent_ratio: f64,
    pub mismatch_min_samples: usize,
    pub mismatch_deviation: f64,
    pub position_min_samples: usize,
    pub position_bias: f64,
    pub normality_sample_cap: usize,
    pub significance_alpha: f64,

    // content anomalies
    pub short_review_length: usize,
    pub long_review_length: usize,
    pub duplicate_min_length: usize,

    // geography
    pub country_profile_min_reviews: usize,
    pub ranking_min_reviewers: usize,
    pub cross_country_min_ratings: usize,
    pub target_country_min_ratings: usize,
    pub culture_target_min_ratings: usize,
    pub bias_threshold: f64,
    pub cluster_min_countries: usize,

    // diversity
    pub gender_min_reviews: usize,
    pub culture_min_reviews: usize,
    pub institution_type_min_reviews: usize,
    pub high_diversity: f64,
    pub low_diversity: f64,
    pub diversity_test_min_samples: usize,
    pub correlation_min_samples: usize,

    // institutions
    pub institution_min_reviewers: usize,
    pub institution_author_min_submissions: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            rating_min: 1.0,
            rating_max: 10.0,
            confidence_min: 1.0,
            confidence_max: 5.0,

            reviewer_min_reviews: 3,
            extreme_rating_sigma: 2.0,
            inconsistent_rating_std: 2.5,
            low_effort_text_sigma: 2.0,
            low_effort_content_quality: 1.5,
            confidence_sigma: 1.5,
            outlier_z: 3.0,

            submission_min_reviews: 3,
            controversial_std: 2.0,
            consensus_std: 0.2,
            extreme_low_rating: 2.5,
            extreme_high_rating: 8.0,
            low_quality_text_length: 500.0,
            low_quality_min_reviews: 2,

            over_frequent_ratio: 2.0,
            under_frequent_ratio: 0.3,
            mismatch_min_samples: 10,
            mismatch_deviation: 1.0,
            position_min_samples: 50,
            position_bias: 0.2,
            normality_sample_cap: 5000,
            significance_alpha: 0.05,

            short_review_length: 100,
            long_review_length: 10_000,
            duplicate_min_length: 50,

            country_profile_min_reviews: 5,
            ranking_min_reviewers: 20,
            cross_country_min_ratings: 10,
            target_country_min_ratings: 5,
            culture_target_min_ratings: 3,
            bias_threshold: 0.3,
            cluster_min_countries: 2,

            gender_min_reviews: 10,
            culture_min_reviews: 20,
            institution_type_min_reviews: 50,
            high_diversity: 0.7,
            low_diversity: 0.3,
            diversity_test_min_samples: 5,
            correlation_min_samples: 10,

            institution_min_reviewers: 20,
            institution_author_min_submissions: 3,
        }
    }
}

impl Thresholds {
    pub fn rating_in_range(&self, rating: f64) -> bool {
        (self.rating_min..=self.rating_max).contains(&rating)
    }

    pub fn confidence_in_range(&self, confidence: f64) -> bool {
        (self.confidence_min..=self.confidence_max).contains(&confidence)
    }
}

/// Fixed top-N truncation per leaderboard family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub deviation_top_n: usize,
    pub count_top_n: usize,
    pub submission_top_n: usize,
    pub content_top_n: usize,
    pub bias_target_top_n: usize,
    pub scale_top_n: usize,
    pub characteristic_top_n: usize,
    pub bias_ranking_top_n: usize,
    pub institution_top_n: usize,
    pub flow_top_n: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            deviation_top_n: 20,
            count_top_n: 15,
            submission_top_n: 20,
            content_top_n: 20,
            bias_target_top_n: 5,
            scale_top_n: 20,
            characteristic_top_n: 15,
            bias_ranking_top_n: 10,
            institution_top_n: 200,
            flow_top_n: 200,
        }
    }
}
