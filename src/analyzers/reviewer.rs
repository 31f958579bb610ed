//! Reviewer-level anomaly detection against global rating, confidence and
//! text-length statistics.

use crate::analyzers::aggregate::Aggregates;
use crate::analyzers::ranking::{Direction, EntityId, Ranked, top_by_count, top_n};
use crate::analyzers::utility::{round_to, round2, round3};
use crate::config::{Limits, Thresholds};
use crate::identity::IdentityGraph;
use serde::{Deserialize, Serialize};

/// Global mean and population standard deviation of one metric over all reviews.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Moments {
    pub mean: f64,
    pub std: f64,
}

impl Moments {
    fn z(&self, value: f64) -> Option<f64> {
        (self.std > 0.0).then(|| (value - self.mean) / self.std)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GlobalMoments {
    pub rating: Moments,
    pub confidence: Moments,
    pub text_length: Moments,
}

impl GlobalMoments {
    pub fn from_aggregates(agg: &Aggregates) -> Self {
        let moments = |d: Option<crate::analyzers::aggregate::Descriptive>| {
            d.map_or(Moments::default(), |d| Moments {
                mean: d.mean,
                std: d.std,
            })
        };
        Self {
            rating: moments(agg.global.rating),
            confidence: moments(agg.global.confidence),
            text_length: moments(agg.global.text_length),
        }
    }
}

/// Finalized per-reviewer values the detectors look at.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewerProfile {
    pub reviewer_id: String,
    pub review_count: usize,
    pub avg_rating: Option<f64>,
    pub rating_std: f64,
    pub rating_range: f64,
    pub avg_confidence: Option<f64>,
    pub avg_text_length: f64,
    pub avg_content_quality: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtremeDirection {
    ExtremeHigh,
    ExtremeLow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtremeRater {
    pub reviewer_id: String,
    pub avg_rating: f64,
    pub global_avg: f64,
    pub deviation: f64,
    pub review_count: usize,
    pub anomaly_type: ExtremeDirection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InconsistentRater {
    pub reviewer_id: String,
    pub rating_std: f64,
    pub avg_rating: f64,
    pub review_count: usize,
    pub rating_range: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LowEffortReviewer {
    pub reviewer_id: String,
    pub avg_text_length: f64,
    pub global_avg_length: f64,
    pub content_quality: f64,
    pub review_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceOutlier {
    pub reviewer_id: String,
    pub avg_confidence: f64,
    pub global_avg_confidence: f64,
    pub review_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierReviewer {
    pub reviewer_id: String,
    pub max_z_score: f64,
    pub avg_rating: Option<f64>,
    pub avg_confidence: Option<f64>,
    pub avg_text_length: f64,
    pub review_count: usize,
}

macro_rules! ranked_by_reviewer {
    ($($ty:ty),*) => {
        $(impl Ranked for $ty {
            fn sample_count(&self) -> usize {
                self.review_count
            }

            fn entity_id(&self) -> EntityId<'_> {
                EntityId::Name(&self.reviewer_id)
            }
        })*
    };
}

ranked_by_reviewer!(
    ExtremeRater,
    InconsistentRater,
    LowEffortReviewer,
    ConfidenceOutlier,
    OutlierReviewer
);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnomalousReviewers {
    pub extreme_raters: Vec<ExtremeRater>,
    pub inconsistent_raters: Vec<InconsistentRater>,
    pub low_effort_reviewers: Vec<LowEffortReviewer>,
    pub over_confident: Vec<ConfidenceOutlier>,
    pub under_confident: Vec<ConfidenceOutlier>,
    pub outlier_reviewers: Vec<OutlierReviewer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewerGlobalStatistics {
    pub total_reviewers: usize,
    pub eligible_reviewers: usize,
    pub excluded_reviewers: usize,
    pub global_rating_mean: f64,
    pub global_rating_std: f64,
    pub global_confidence_mean: f64,
    pub global_confidence_std: f64,
    pub global_text_mean: f64,
    pub global_text_std: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewerAnomalies {
    pub anomalous_reviewers: AnomalousReviewers,
    pub global_statistics: ReviewerGlobalStatistics,
}

/// Flat per-reviewer row for the metrics snapshot; every reviewer, no gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewerMetrics {
    pub reviewer_id: String,
    pub review_count: usize,
    pub avg_rating: Option<f64>,
    pub rating_std: Option<f64>,
    pub avg_confidence: Option<f64>,
    pub avg_text_words: f64,
    pub avg_question_words: f64,
    pub rating_conf_corr: Option<f64>,
}

pub fn metrics(agg: &Aggregates, graph: &IdentityGraph) -> Vec<ReviewerMetrics> {
    agg.reviewers
        .iter()
        .map(|(id, bucket)| ReviewerMetrics {
            reviewer_id: graph.person(*id).id.clone(),
            review_count: bucket.review_count,
            avg_rating: bucket.avg_rating().map(round2),
            rating_std: bucket.rating_std().map(round2),
            avg_confidence: bucket.avg_confidence().map(round2),
            avg_text_words: round2(bucket.avg_text_words),
            avg_question_words: round2(bucket.avg_question_words),
            rating_conf_corr: bucket.rating_confidence_corr.map(round3),
        })
        .collect()
}

/// Runs every detector over profiles that passed the review-count gate.
/// A reviewer may land in several categories.
pub fn detect(
    profiles: &[ReviewerProfile],
    global: &GlobalMoments,
    t: &Thresholds,
    limits: &Limits,
) -> AnomalousReviewers {
    let mut out = AnomalousReviewers::default();

    for p in profiles {
        if let Some(avg) = p.avg_rating {
            let deviation = (avg - global.rating.mean).abs();
            if deviation > t.extreme_rating_sigma * global.rating.std {
                out.extreme_raters.push(ExtremeRater {
                    reviewer_id: p.reviewer_id.clone(),
                    avg_rating: round2(avg),
                    global_avg: round2(global.rating.mean),
                    deviation: round2(deviation),
                    review_count: p.review_count,
                    anomaly_type: if avg > global.rating.mean {
                        ExtremeDirection::ExtremeHigh
                    } else {
                        ExtremeDirection::ExtremeLow
                    },
                });
            }

            if p.rating_std > t.inconsistent_rating_std {
                out.inconsistent_raters.push(InconsistentRater {
                    reviewer_id: p.reviewer_id.clone(),
                    rating_std: round2(p.rating_std),
                    avg_rating: round2(avg),
                    review_count: p.review_count,
                    rating_range: round_to(p.rating_range, 1),
                });
            }
        }

        let text_floor = global.text_length.mean - t.low_effort_text_sigma * global.text_length.std;
        if p.avg_text_length < text_floor || p.avg_content_quality < t.low_effort_content_quality {
            out.low_effort_reviewers.push(LowEffortReviewer {
                reviewer_id: p.reviewer_id.clone(),
                avg_text_length: round_to(p.avg_text_length, 0),
                global_avg_length: round_to(global.text_length.mean, 0),
                content_quality: round_to(p.avg_content_quality, 1),
                review_count: p.review_count,
            });
        }

        if let Some(conf) = p.avg_confidence {
            let band = t.confidence_sigma * global.confidence.std;
            let entry = || ConfidenceOutlier {
                reviewer_id: p.reviewer_id.clone(),
                avg_confidence: round2(conf),
                global_avg_confidence: round2(global.confidence.mean),
                review_count: p.review_count,
            };
            if conf > global.confidence.mean + band {
                out.over_confident.push(entry());
            } else if conf < global.confidence.mean - band {
                out.under_confident.push(entry());
            }
        }

        let max_z = [
            p.avg_rating.and_then(|v| global.rating.z(v)),
            p.avg_confidence.and_then(|v| global.confidence.z(v)),
            global.text_length.z(p.avg_text_length),
        ]
        .into_iter()
        .flatten()
        .map(f64::abs)
        .fold(0.0, f64::max);
        if max_z > t.outlier_z {
            out.outlier_reviewers.push(OutlierReviewer {
                reviewer_id: p.reviewer_id.clone(),
                max_z_score: round2(max_z),
                avg_rating: p.avg_rating.map(round2),
                avg_confidence: p.avg_confidence.map(round2),
                avg_text_length: round_to(p.avg_text_length, 0),
                review_count: p.review_count,
            });
        }
    }

    AnomalousReviewers {
        extreme_raters: top_n(
            out.extreme_raters,
            |e| e.deviation,
            Direction::Descending,
            limits.deviation_top_n,
        ),
        outlier_reviewers: top_n(
            out.outlier_reviewers,
            |e| e.max_z_score,
            Direction::Descending,
            limits.deviation_top_n,
        ),
        inconsistent_raters: top_by_count(out.inconsistent_raters, limits.count_top_n),
        low_effort_reviewers: top_by_count(out.low_effort_reviewers, limits.count_top_n),
        over_confident: top_by_count(out.over_confident, limits.count_top_n),
        under_confident: top_by_count(out.under_confident, limits.count_top_n),
    }
}

/// Builds reviewer profiles from the aggregates and runs the detectors.
#[tracing::instrument(skip_all)]
pub fn analyze(
    agg: &Aggregates,
    graph: &IdentityGraph,
    t: &Thresholds,
    limits: &Limits,
) -> ReviewerAnomalies {
    let global = GlobalMoments::from_aggregates(agg);

    let profiles: Vec<ReviewerProfile> = agg
        .reviewers
        .iter()
        .filter(|(_, bucket)| bucket.review_count >= t.reviewer_min_reviews)
        .map(|(id, bucket)| ReviewerProfile {
            reviewer_id: graph.person(*id).id.clone(),
            review_count: bucket.review_count,
            avg_rating: bucket.avg_rating(),
            rating_std: bucket.rating_std().unwrap_or(0.0),
            rating_range: bucket.rating.map_or(0.0, |d| d.max - d.min),
            avg_confidence: bucket.avg_confidence(),
            avg_text_length: bucket.avg_text_length(),
            avg_content_quality: bucket.avg_content_quality,
        })
        .collect();

    let anomalous = detect(&profiles, &global, t, limits);
    tracing::debug!(
        eligible = profiles.len(),
        extreme = anomalous.extreme_raters.len(),
        outliers = anomalous.outlier_reviewers.len(),
        "Reviewer anomalies detected"
    );

    ReviewerAnomalies {
        anomalous_reviewers: anomalous,
        global_statistics: ReviewerGlobalStatistics {
            total_reviewers: agg.reviewers.len(),
            eligible_reviewers: profiles.len(),
            excluded_reviewers: agg.reviewers.len() - profiles.len(),
            global_rating_mean: round2(global.rating.mean),
            global_rating_std: round2(global.rating.std),
            global_confidence_mean: round2(global.confidence.mean),
            global_confidence_std: round2(global.confidence.std),
            global_text_mean: round_to(global.text_length.mean, 0),
            global_text_std: round_to(global.text_length.std, 0),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::aggregate::aggregate;
    use crate::model::test_support::{DatasetBuilder, review};

    fn global() -> GlobalMoments {
        GlobalMoments {
            rating: Moments {
                mean: 5.0,
                std: 1.0,
            },
            confidence: Moments {
                mean: 3.0,
                std: 0.5,
            },
            text_length: Moments {
                mean: 1000.0,
                std: 200.0,
            },
        }
    }

    fn profile(id: &str, avg_rating: f64) -> ReviewerProfile {
        ReviewerProfile {
            reviewer_id: id.into(),
            review_count: 3,
            avg_rating: Some(avg_rating),
            rating_std: 0.5,
            rating_range: 1.0,
            avg_confidence: Some(3.0),
            avg_text_length: 1000.0,
            avg_content_quality: 3.0,
        }
    }

    fn run(profiles: &[ReviewerProfile]) -> AnomalousReviewers {
        detect(profiles, &global(), &Thresholds::default(), &Limits::default())
    }

    #[test]
    fn test_extreme_rater_threshold_is_strict() {
        let out = run(&[profile("at", 7.0), profile("beyond", 7.01), profile("low", 2.5)]);
        let ids: Vec<&str> = out
            .extreme_raters
            .iter()
            .map(|e| e.reviewer_id.as_str())
            .collect();
        assert_eq!(ids, vec!["low", "beyond"]);
        assert_eq!(out.extreme_raters[0].anomaly_type, ExtremeDirection::ExtremeLow);
        assert_eq!(out.extreme_raters[0].deviation, 2.5);
        assert_eq!(out.extreme_raters[1].anomaly_type, ExtremeDirection::ExtremeHigh);
    }

    #[test]
    fn test_inconsistent_and_low_effort() {
        let mut wild = profile("wild", 5.0);
        wild.rating_std = 2.6;
        wild.rating_range = 7.0;
        let mut terse = profile("terse", 5.0);
        terse.avg_content_quality = 1.0;
        let mut short = profile("short", 5.0);
        short.avg_text_length = 599.0;

        let out = run(&[wild, terse, short, profile("ok", 5.0)]);
        assert_eq!(out.inconsistent_raters.len(), 1);
        assert_eq!(out.inconsistent_raters[0].rating_range, 7.0);
        let low: Vec<&str> = out
            .low_effort_reviewers
            .iter()
            .map(|e| e.reviewer_id.as_str())
            .collect();
        assert_eq!(low, vec!["short", "terse"]);
    }

    #[test]
    fn test_confidence_bands_and_outliers() {
        let mut sure = profile("sure", 5.0);
        sure.avg_confidence = Some(3.8);
        let mut unsure = profile("unsure", 5.0);
        unsure.avg_confidence = Some(2.2);
        let mut far = profile("far", 5.0);
        far.avg_text_length = 1700.0;

        let out = run(&[sure, unsure, far]);
        assert_eq!(out.over_confident[0].reviewer_id, "sure");
        assert_eq!(out.under_confident[0].reviewer_id, "unsure");
        assert_eq!(out.outlier_reviewers.len(), 1);
        assert_eq!(out.outlier_reviewers[0].reviewer_id, "far");
        assert_eq!(out.outlier_reviewers[0].max_z_score, 3.5);
    }

    #[test]
    fn test_count_ranked_lists_are_capped() {
        let profiles: Vec<ReviewerProfile> = (0..20)
            .map(|i| {
                let mut p = profile(&format!("r{i:02}"), 5.0);
                p.avg_content_quality = 0.0;
                p.review_count = 3 + i;
                p
            })
            .collect();
        let out = run(&profiles);
        assert_eq!(out.low_effort_reviewers.len(), 15);
        assert_eq!(out.low_effort_reviewers[0].reviewer_id, "r19");
    }

    #[test]
    fn test_review_count_gate() {
        let mut b = DatasetBuilder::default();
        let three = b.person("three", "China", &[]);
        let two = b.person("two", "China", &[]);
        for n in 1..=3 {
            let mut reviews = vec![review(three, "three", Some(5.0))];
            if n < 3 {
                reviews.push(review(two, "two", Some(5.0)));
            }
            b.submission(n, &[], reviews);
        }
        let dataset = b.build();
        let agg = aggregate(&dataset, &Thresholds::default());
        let report = analyze(&agg, &dataset.graph, &Thresholds::default(), &Limits::default());

        assert_eq!(report.global_statistics.total_reviewers, 2);
        assert_eq!(report.global_statistics.eligible_reviewers, 1);
        assert_eq!(report.global_statistics.excluded_reviewers, 1);
    }
}
