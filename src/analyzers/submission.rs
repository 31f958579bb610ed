//! Submission-level anomalies: disagreement, consensus, extreme averages
//! and thin reviews.

use crate::analyzers::aggregate::{Aggregates, SubmissionAggregate};
use crate::analyzers::ranking::{Direction, EntityId, Ranked, top_n};
use crate::analyzers::utility::{mean, round_to, round2};
use crate::config::{Limits, Thresholds};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtremeType {
    VeryLow,
    VeryHigh,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadEntry {
    pub submission_num: u32,
    pub rating_std: f64,
    pub avg_rating: f64,
    pub rating_range: f64,
    pub num_reviews: usize,
    pub ratings: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtremeRated {
    pub submission_num: u32,
    pub avg_rating: f64,
    pub min_rating: f64,
    pub max_rating: f64,
    pub num_reviews: usize,
    pub extreme_type: ExtremeType,
    /// Distance from the global submission average.
    pub distance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LowQualityEntry {
    pub submission_num: u32,
    pub avg_text_length: f64,
    pub avg_rating: f64,
    pub num_reviews: usize,
}

macro_rules! ranked_by_submission {
    ($($ty:ty),*) => {
        $(impl Ranked for $ty {
            fn sample_count(&self) -> usize {
                self.num_reviews
            }

            fn entity_id(&self) -> EntityId<'_> {
                EntityId::Number(u64::from(self.submission_num))
            }
        })*
    };
}

ranked_by_submission!(SpreadEntry, ExtremeRated, LowQualityEntry);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnomalousSubmissions {
    pub controversial_submissions: Vec<SpreadEntry>,
    pub consensus_outliers: Vec<SpreadEntry>,
    pub extreme_rated_submissions: Vec<ExtremeRated>,
    pub low_quality_reviews: Vec<LowQualityEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionGlobalStatistics {
    pub total_submissions: usize,
    pub rated_submissions: usize,
    pub global_avg_rating: f64,
    pub global_avg_std: f64,
    pub global_avg_text_length: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionAnomalies {
    pub anomalous_submissions: AnomalousSubmissions,
    pub global_statistics: SubmissionGlobalStatistics,
}

/// Spread-based classification: `> controversial_std` is controversial,
/// `< consensus_std` is a consensus outlier. Both need the review gate.
fn spread_entry(sub: &SubmissionAggregate) -> Option<SpreadEntry> {
    let rating = sub.bucket.rating?;
    Some(SpreadEntry {
        submission_num: sub.number,
        rating_std: round2(rating.std),
        avg_rating: round2(rating.mean),
        rating_range: round_to(rating.max - rating.min, 1),
        num_reviews: sub.bucket.review_count,
        ratings: sub.bucket.ratings().to_vec(),
    })
}

#[tracing::instrument(skip_all)]
pub fn analyze(agg: &Aggregates, t: &Thresholds, limits: &Limits) -> SubmissionAnomalies {
    let rated: Vec<&SubmissionAggregate> = agg
        .submissions
        .iter()
        .filter(|s| s.bucket.rating.is_some())
        .collect();

    let averages: Vec<f64> = rated.iter().filter_map(|s| s.bucket.avg_rating()).collect();
    let stds: Vec<f64> = rated.iter().filter_map(|s| s.bucket.rating_std()).collect();
    let lengths: Vec<f64> = rated.iter().map(|s| s.bucket.avg_text_length()).collect();
    let global_avg = mean(&averages);

    let mut out = AnomalousSubmissions::default();
    for sub in &rated {
        let bucket = &sub.bucket;
        let Some(rating) = bucket.rating else {
            continue;
        };

        if bucket.review_count >= t.submission_min_reviews {
            if rating.std > t.controversial_std {
                out.controversial_submissions.extend(spread_entry(sub));
            } else if rating.std < t.consensus_std {
                out.consensus_outliers.extend(spread_entry(sub));
            }
        }

        let extreme_type = if rating.mean <= t.extreme_low_rating {
            Some(ExtremeType::VeryLow)
        } else if rating.mean >= t.extreme_high_rating {
            Some(ExtremeType::VeryHigh)
        } else {
            None
        };
        if let Some(extreme_type) = extreme_type {
            out.extreme_rated_submissions.push(ExtremeRated {
                submission_num: sub.number,
                avg_rating: round2(rating.mean),
                min_rating: rating.min,
                max_rating: rating.max,
                num_reviews: bucket.review_count,
                extreme_type,
                distance: round2((rating.mean - global_avg).abs()),
            });
        }

        let avg_len = bucket.avg_text_length();
        if avg_len < t.low_quality_text_length && bucket.review_count >= t.low_quality_min_reviews
        {
            out.low_quality_reviews.push(LowQualityEntry {
                submission_num: sub.number,
                avg_text_length: round_to(avg_len, 0),
                avg_rating: round2(rating.mean),
                num_reviews: bucket.review_count,
            });
        }
    }

    let n = limits.submission_top_n;
    let anomalous = AnomalousSubmissions {
        controversial_submissions: top_n(
            out.controversial_submissions,
            |e| e.rating_std,
            Direction::Descending,
            n,
        ),
        consensus_outliers: top_n(out.consensus_outliers, |e| e.rating_std, Direction::Ascending, n),
        extreme_rated_submissions: top_n(
            out.extreme_rated_submissions,
            |e| e.distance,
            Direction::Descending,
            n,
        ),
        low_quality_reviews: top_n(
            out.low_quality_reviews,
            |e| e.avg_text_length,
            Direction::Ascending,
            n,
        ),
    };
    tracing::debug!(
        controversial = anomalous.controversial_submissions.len(),
        extreme = anomalous.extreme_rated_submissions.len(),
        "Submission anomalies detected"
    );

    SubmissionAnomalies {
        anomalous_submissions: anomalous,
        global_statistics: SubmissionGlobalStatistics {
            total_submissions: agg.submissions.len(),
            rated_submissions: rated.len(),
            global_avg_rating: round2(global_avg),
            global_avg_std: round2(mean(&stds)),
            global_avg_text_length: round_to(mean(&lengths), 0),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::aggregate::aggregate;
    use crate::model::test_support::{DatasetBuilder, review, review_with_text};

    fn report(panels: &[(u32, &[f64])]) -> SubmissionAnomalies {
        let mut b = DatasetBuilder::default();
        for (number, ratings) in panels {
            let reviews = ratings
                .iter()
                .enumerate()
                .map(|(i, r)| {
                    let id = format!("r{i}");
                    let person = b.person(&id, "Canada", &[]);
                    review_with_text(person, &id, *r, 800)
                })
                .collect();
            b.submission(*number, &[], reviews);
        }
        let agg = aggregate(&b.build(), &Thresholds::default());
        analyze(&agg, &Thresholds::default(), &Limits::default())
    }

    #[test]
    fn test_controversial_threshold_is_strict() {
        // Population std of [3, 7, 3, 7] is exactly 2.0.
        let report = report(&[(1, &[2.0, 4.0, 4.0, 6.0, 8.0]), (2, &[3.0, 7.0, 3.0, 7.0])]);
        let controversial = &report.anomalous_submissions.controversial_submissions;
        assert_eq!(controversial.len(), 1);
        assert_eq!(controversial[0].submission_num, 1);
        assert_eq!(controversial[0].rating_std, 2.04);
        assert_eq!(controversial[0].avg_rating, 4.8);
        assert_eq!(controversial[0].rating_range, 6.0);
    }

    #[test]
    fn test_consensus_needs_three_reviews() {
        let report = report(&[(1, &[5.0, 5.0, 5.0]), (2, &[6.0, 6.0])]);
        let consensus = &report.anomalous_submissions.consensus_outliers;
        assert_eq!(consensus.len(), 1);
        assert_eq!(consensus[0].submission_num, 1);
        assert_eq!(consensus[0].rating_std, 0.0);
    }

    #[test]
    fn test_extreme_low_is_inclusive() {
        let report = report(&[(1, &[2.0, 3.0]), (2, &[2.0, 3.1]), (3, &[8.0, 8.0]), (4, &[5.0])]);
        let extreme = &report.anomalous_submissions.extreme_rated_submissions;
        let got: Vec<(u32, ExtremeType)> =
            extreme.iter().map(|e| (e.submission_num, e.extreme_type)).collect();
        // Global average 4.51: submission 3 is furthest away.
        assert_eq!(got, vec![(3, ExtremeType::VeryHigh), (1, ExtremeType::VeryLow)]);
    }

    #[test]
    fn test_low_quality_reviews() {
        let mut b = DatasetBuilder::default();
        let r1 = b.person("r1", "Canada", &[]);
        let r2 = b.person("r2", "Canada", &[]);
        b.submission(
            1,
            &[],
            vec![review_with_text(r1, "r1", 5.0, 100), review_with_text(r2, "r2", 5.0, 200)],
        );
        b.submission(2, &[], vec![review(r1, "r1", Some(5.0))]);
        let agg = aggregate(&b.build(), &Thresholds::default());
        let report = analyze(&agg, &Thresholds::default(), &Limits::default());

        let low = &report.anomalous_submissions.low_quality_reviews;
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].avg_text_length, 150.0);
        assert_eq!(report.global_statistics.rated_submissions, 2);
    }

    #[test]
    fn test_unrated_submissions_are_skipped() {
        let mut b = DatasetBuilder::default();
        let r = b.person("r", "Canada", &[]);
        b.submission(1, &[], vec![review(r, "r", None)]);
        let agg = aggregate(&b.build(), &Thresholds::default());
        let report = analyze(&agg, &Thresholds::default(), &Limits::default());

        assert_eq!(report.global_statistics.total_submissions, 1);
        assert_eq!(report.global_statistics.rated_submissions, 0);
        assert_eq!(report.global_statistics.global_avg_rating, 0.0);
    }
}
