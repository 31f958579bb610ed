//! Rating distribution patterns: value frequencies, rating/confidence
//! mismatches, positional bias and the overall shape.

use crate::analyzers::aggregate::Aggregates;
use crate::analyzers::grade::{DistributionType, distribution_type};
use crate::analyzers::significance::shapiro_wilk;
use crate::analyzers::utility::{kurtosis, mean, percentage, round2, round3, skewness, stddev};
use crate::config::Thresholds;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Share each rating value would have under a uniform 1-10 distribution.
const UNIFORM_SHARE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyAnomaly {
    OverFrequent,
    UnderFrequent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingCount {
    pub rating: f64,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnusualFrequency {
    pub rating: f64,
    pub count: usize,
    pub percentage: f64,
    pub expected_percentage: f64,
    pub frequency_ratio: f64,
    pub anomaly_type: FrequencyAnomaly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceMismatch {
    pub rating: f64,
    pub avg_confidence: f64,
    pub expected_confidence: f64,
    pub mismatch_degree: f64,
    pub sample_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionBias {
    /// 1-based ordinal of the review within its submission.
    pub position: usize,
    pub avg_rating: f64,
    pub global_avg: f64,
    pub bias_degree: f64,
    pub sample_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalityTest {
    pub statistic: f64,
    pub p_value: f64,
    pub is_normal: bool,
    pub sample_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionShape {
    /// `None` when the test could not run (fewer than 3 ratings or all equal).
    pub normality_test: Option<NormalityTest>,
    pub skewness: Option<f64>,
    pub kurtosis: Option<f64>,
    pub mean: f64,
    pub std: f64,
    pub distribution_type: Option<DistributionType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalousPatterns {
    pub unusual_rating_frequencies: Vec<UnusualFrequency>,
    pub rating_confidence_mismatches: Vec<ConfidenceMismatch>,
    pub position_bias_effects: Vec<PositionBias>,
    pub distribution_anomalies: DistributionShape,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingPatterns {
    pub total_ratings_analyzed: usize,
    pub rating_distribution: Vec<RatingCount>,
    pub anomalous_patterns: AnomalousPatterns,
}

/// Groups values by rating with a stable key; ratings are compared at two
/// decimals.
fn rating_key(rating: f64) -> i64 {
    (rating * 100.0).round() as i64
}

fn key_rating(key: i64) -> f64 {
    key as f64 / 100.0
}

/// Expected mean confidence for a rating under a linear model.
pub fn expected_confidence(rating: f64) -> f64 {
    2.0 + (rating - 1.0) * 0.3
}

pub fn distribution_shape(ratings: &[f64], t: &Thresholds) -> DistributionShape {
    let capped = &ratings[..ratings.len().min(t.normality_sample_cap)];
    let normality_test = shapiro_wilk(capped).ok().map(|n| NormalityTest {
        statistic: round3(n.statistic),
        p_value: round3(n.p_value),
        is_normal: n.p_value > t.significance_alpha,
        sample_size: capped.len(),
    });
    let skew = skewness(ratings);
    let kurt = kurtosis(ratings);
    let m = mean(ratings);

    DistributionShape {
        normality_test,
        skewness: skew.map(round3),
        kurtosis: kurt.map(round3),
        mean: round2(m),
        std: round2(stddev(ratings, m)),
        distribution_type: skew.zip(kurt).map(|(s, k)| distribution_type(s, k)),
    }
}

#[tracing::instrument(skip_all)]
pub fn analyze(agg: &Aggregates, t: &Thresholds) -> RatingPatterns {
    let ratings = agg.global.ratings();
    let total = ratings.len();

    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for r in ratings {
        *counts.entry(rating_key(*r)).or_default() += 1;
    }

    let rating_distribution: Vec<RatingCount> = counts
        .iter()
        .map(|(key, count)| RatingCount {
            rating: key_rating(*key),
            count: *count,
            percentage: percentage(*count, total),
        })
        .collect();

    let expected = total as f64 * UNIFORM_SHARE;
    let unusual_rating_frequencies = counts
        .iter()
        .filter_map(|(key, count)| {
            let ratio = *count as f64 / expected;
            let anomaly_type = if ratio > t.over_frequent_ratio {
                FrequencyAnomaly::OverFrequent
            } else if ratio < t.under_frequent_ratio {
                FrequencyAnomaly::UnderFrequent
            } else {
                return None;
            };
            Some(UnusualFrequency {
                rating: key_rating(*key),
                count: *count,
                percentage: percentage(*count, total),
                expected_percentage: UNIFORM_SHARE * 100.0,
                frequency_ratio: round2(ratio),
                anomaly_type,
            })
        })
        .collect();

    let mut confidence_by_rating: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
    for (r, c) in agg.global.rating_confidence_pairs() {
        confidence_by_rating
            .entry(rating_key(*r))
            .or_default()
            .push(*c);
    }
    let rating_confidence_mismatches = confidence_by_rating
        .iter()
        .filter(|(_, confidences)| confidences.len() >= t.mismatch_min_samples)
        .filter_map(|(key, confidences)| {
            let rating = key_rating(*key);
            let avg = mean(confidences);
            let expected = expected_confidence(rating);
            let degree = (avg - expected).abs();
            (degree > t.mismatch_deviation).then(|| ConfidenceMismatch {
                rating,
                avg_confidence: round2(avg),
                expected_confidence: round2(expected),
                mismatch_degree: round2(degree),
                sample_count: confidences.len(),
            })
        })
        .collect();

    let global_avg = mean(ratings);
    let qualifying: Vec<(usize, &[f64])> = agg
        .positions
        .iter()
        .map(|(position, bucket)| (*position, bucket.ratings()))
        .filter(|(_, ratings)| ratings.len() >= t.position_min_samples)
        .collect();
    let position_bias_effects = if qualifying.len() >= 2 {
        qualifying
            .iter()
            .filter_map(|(position, ratings)| {
                let avg = mean(ratings);
                ((avg - global_avg).abs() > t.position_bias).then(|| PositionBias {
                    position: position + 1,
                    avg_rating: round2(avg),
                    global_avg: round2(global_avg),
                    bias_degree: round2(avg - global_avg),
                    sample_count: ratings.len(),
                })
            })
            .collect()
    } else {
        Vec::new()
    };

    tracing::debug!(total, qualifying_positions = qualifying.len(), "Rating patterns computed");

    RatingPatterns {
        total_ratings_analyzed: total,
        rating_distribution,
        anomalous_patterns: AnomalousPatterns {
            unusual_rating_frequencies,
            rating_confidence_mismatches,
            position_bias_effects,
            distribution_anomalies: distribution_shape(ratings, t),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::aggregate::aggregate;
    use crate::model::test_support::{DatasetBuilder, review};

    fn patterns(panels: &[Vec<(f64, f64)>]) -> RatingPatterns {
        let mut b = DatasetBuilder::default();
        for (n, panel) in panels.iter().enumerate() {
            let reviews = panel
                .iter()
                .enumerate()
                .map(|(i, (rating, confidence))| {
                    let id = format!("r{i}");
                    let person = b.person(&id, "Italy", &[]);
                    let mut r = review(person, &id, Some(*rating));
                    r.confidence = Some(*confidence);
                    r
                })
                .collect();
            b.submission(n as u32 + 1, &[], reviews);
        }
        let agg = aggregate(&b.build(), &Thresholds::default());
        analyze(&agg, &Thresholds::default())
    }

    #[test]
    fn test_frequency_anomalies() {
        // 10 ratings: 6 is 50% of them, 5 sits exactly at twice the uniform share.
        let panel: Vec<(f64, f64)> = [6.0, 6.0, 6.0, 6.0, 6.0, 3.0, 8.0, 5.0, 5.0, 7.0]
            .iter()
            .map(|r| (*r, 3.0))
            .collect();
        let report = patterns(&[panel]);

        assert_eq!(report.total_ratings_analyzed, 10);
        assert_eq!(report.rating_distribution.len(), 5);
        let unusual = &report.anomalous_patterns.unusual_rating_frequencies;
        assert_eq!(unusual.len(), 1);
        assert_eq!(unusual[0].rating, 6.0);
        assert_eq!(unusual[0].frequency_ratio, 5.0);
        assert_eq!(unusual[0].percentage, 50.0);
        assert_eq!(unusual[0].anomaly_type, FrequencyAnomaly::OverFrequent);
    }

    #[test]
    fn test_confidence_mismatch() {
        // Rating 10 expects confidence 4.7; ten reviews at 2.0 are 2.7 off.
        let low: Vec<(f64, f64)> = (0..10).map(|_| (10.0, 2.0)).collect();
        // Rating 1 expects 2.0; nine samples are below the gate.
        let thin: Vec<(f64, f64)> = (0..9).map(|_| (1.0, 5.0)).collect();
        let report = patterns(&[low, thin]);

        let mismatches = &report.anomalous_patterns.rating_confidence_mismatches;
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].rating, 10.0);
        assert_eq!(mismatches[0].expected_confidence, 4.7);
        assert_eq!(mismatches[0].mismatch_degree, 2.7);
        assert_eq!(mismatches[0].sample_count, 10);
    }

    #[test]
    fn test_position_bias_needs_two_positions() {
        // 50 submissions, first reviewer gives 7, second gives 5.
        let panels: Vec<Vec<(f64, f64)>> = (0..50).map(|_| vec![(7.0, 3.0), (5.0, 3.0)]).collect();
        let report = patterns(&panels);
        let effects = &report.anomalous_patterns.position_bias_effects;
        assert_eq!(effects.len(), 2);
        assert_eq!(effects[0].position, 1);
        assert_eq!(effects[0].bias_degree, 1.0);
        assert_eq!(effects[1].bias_degree, -1.0);

        let single: Vec<Vec<(f64, f64)>> = (0..50).map(|_| vec![(7.0, 3.0)]).collect();
        let report = patterns(&single);
        assert!(report.anomalous_patterns.position_bias_effects.is_empty());
    }

    #[test]
    fn test_distribution_shape() {
        let shape = distribution_shape(&[2.0, 4.0, 4.0, 6.0, 8.0], &Thresholds::default());
        assert_eq!(shape.mean, 4.8);
        assert_eq!(shape.std, 2.04);
        assert_eq!(shape.skewness, Some(0.272));
        assert_eq!(shape.kurtosis, Some(-1.044));
        assert_eq!(shape.distribution_type, Some(DistributionType::ApproximatelyNormal));
        assert!(shape.normality_test.is_some_and(|n| n.is_normal));

        let flat = distribution_shape(&[5.0, 5.0, 5.0], &Thresholds::default());
        assert_eq!(flat.normality_test, None);
        assert_eq!(flat.distribution_type, None);
    }
}
