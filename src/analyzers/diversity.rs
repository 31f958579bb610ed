//! Reviewer-panel diversity along gender, cultural cluster and institution
//! type, and its association with rating outcomes.
//!
//! A panel's diversity score is the number of distinct known categories
//! divided by the number of reviewers with a known category. It is a
//! heuristic: a panel of two different categories scores 1.0, the same as a
//! panel of five different ones.

use crate::analyzers::aggregate::{Aggregates, Bucket, SubmissionAggregate};
use crate::analyzers::grade::CountryScores;
use crate::analyzers::significance::{pearson, welch_t_test};
use crate::analyzers::utility::{mean, round_to, round2, round3};
use crate::config::Thresholds;
use crate::identity::{IdentityGraph, PersonId, UNKNOWN_GENDER};
use crate::model::Role;
use crate::normalize::{InstitutionType, primary_cluster};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Label for reviewers whose nationality is in no cultural cluster.
pub const NO_CLUSTER: &str = "Other";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiversityDimension {
    GenderDiversity,
    CulturalDiversity,
    InstitutionalDiversity,
}

impl DiversityDimension {
    pub const ALL: [DiversityDimension; 3] = [
        DiversityDimension::GenderDiversity,
        DiversityDimension::CulturalDiversity,
        DiversityDimension::InstitutionalDiversity,
    ];

    /// The reviewer's category, `None` when unknown.
    fn category<'g>(&self, graph: &'g IdentityGraph, reviewer: PersonId) -> Option<&'g str> {
        let person = graph.person(reviewer);
        match self {
            DiversityDimension::GenderDiversity => {
                person.gender_known().then_some(person.gender.as_str())
            }
            DiversityDimension::CulturalDiversity => {
                primary_cluster(&person.nationality).map(|c| c.as_str())
            }
            DiversityDimension::InstitutionalDiversity => match graph.institution_type_of(reviewer) {
                InstitutionType::Unknown => None,
                kind => Some(kind.as_str()),
            },
        }
    }

    fn unknown_label(&self) -> &'static str {
        match self {
            DiversityDimension::GenderDiversity => UNKNOWN_GENDER,
            DiversityDimension::CulturalDiversity => NO_CLUSTER,
            DiversityDimension::InstitutionalDiversity => InstitutionType::Unknown.as_str(),
        }
    }

    fn min_reviews(&self, t: &Thresholds) -> usize {
        match self {
            DiversityDimension::GenderDiversity => t.gender_min_reviews,
            DiversityDimension::CulturalDiversity => t.culture_min_reviews,
            DiversityDimension::InstitutionalDiversity => t.institution_type_min_reviews,
        }
    }

    /// Per-category buckets with unknown categories left out.
    fn buckets<'a>(&self, agg: &'a Aggregates) -> Vec<(String, &'a Bucket)> {
        match self {
            DiversityDimension::GenderDiversity => agg
                .genders
                .iter()
                .filter(|(g, _)| g.as_str() != UNKNOWN_GENDER)
                .map(|(g, b)| (g.clone(), b))
                .collect(),
            DiversityDimension::CulturalDiversity => agg
                .clusters
                .iter()
                .map(|(c, b)| (c.as_str().to_string(), b))
                .collect(),
            DiversityDimension::InstitutionalDiversity => agg
                .institution_types
                .iter()
                .filter(|(k, _)| **k != InstitutionType::Unknown)
                .map(|(k, b)| (k.as_str().to_string(), b))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryProfile {
    pub review_count: usize,
    pub avg_rating: f64,
    pub rating_std: f64,
    pub avg_confidence: f64,
    pub avg_text_length: f64,
    pub strictness_score: f64,
    pub detail_score: f64,
    pub consistency_score: f64,
}

impl CategoryProfile {
    pub fn of(bucket: &Bucket) -> Self {
        let avg_rating = bucket.avg_rating().unwrap_or(0.0);
        let rating_std = bucket.rating_std().unwrap_or(0.0);
        let avg_confidence = bucket.avg_confidence().unwrap_or(0.0);
        let avg_text_length = bucket.avg_text_length();
        let scores = CountryScores::new(avg_rating, rating_std, avg_text_length, avg_confidence);
        Self {
            review_count: bucket.review_count,
            avg_rating: round2(avg_rating),
            rating_std: round2(rating_std),
            avg_confidence: round2(avg_confidence),
            avg_text_length: round_to(avg_text_length, 0),
            strictness_score: round2(scores.strictness_score),
            detail_score: round2(scores.detail_score),
            consistency_score: round2(scores.consistency_score),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelStats {
    pub avg_rating: f64,
    pub avg_rating_std: f64,
    pub avg_confidence: f64,
    pub avg_text_length: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingTest {
    pub test_type: String,
    pub t_statistic: f64,
    pub p_value: f64,
    pub degrees_of_freedom: f64,
    pub significant: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiversityImpact {
    pub high_diversity_count: usize,
    pub low_diversity_count: usize,
    pub total_analyzed: usize,
    pub high_diversity_stats: Option<PanelStats>,
    pub low_diversity_stats: Option<PanelStats>,
    pub statistical_test: Option<RatingTest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub correlation: f64,
    pub p_value: f64,
    pub significant: bool,
    pub sample_size: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiversityCorrelation {
    /// `None` when fewer than the minimum pairs exist or the statistic is undefined.
    pub rating_correlation: Option<CorrelationResult>,
    pub consistency_correlation: Option<CorrelationResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionDiversity {
    /// Reviewer counts per category, unknown included.
    pub distribution: BTreeMap<String, usize>,
    pub profiles: BTreeMap<String, CategoryProfile>,
    pub categories_below_gate: usize,
    pub submission_diversity_analysis: DiversityImpact,
    pub diversity_correlation: DiversityCorrelation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    #[serde(rename = "type")]
    pub dimension: DiversityDimension,
    pub effect: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiversityBenefits {
    pub quality_improvements: Vec<Effect>,
    pub consistency_effects: Vec<Effect>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeDiversity {
    pub gender_impact_summary: DiversityImpact,
    pub cultural_impact_summary: DiversityImpact,
    pub institutional_impact_summary: DiversityImpact,
    pub overall_diversity_benefits: DiversityBenefits,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiversityReport {
    pub gender_diversity: DimensionDiversity,
    pub cultural_diversity: DimensionDiversity,
    pub institutional_diversity: DimensionDiversity,
    pub composite_diversity: CompositeDiversity,
}

static RECOMMENDATIONS: &[&str] = &[
    "Encourage diverse reviewer panels for more comprehensive evaluation",
    "Balance cultural perspectives to reduce geographical bias",
    "Mix academic and industry reviewers for practical relevance",
    "Monitor diversity metrics to ensure fair representation",
];

/// Distinct known categories over known-category reviewers. `None` below two
/// known reviewers.
pub fn diversity_score(categories: &[Option<&str>]) -> Option<f64> {
    let known: Vec<&str> = categories.iter().flatten().copied().collect();
    if known.len() < 2 {
        return None;
    }
    let distinct: BTreeSet<&str> = known.iter().copied().collect();
    Some(distinct.len() as f64 / known.len() as f64)
}

/// One submission's panel score and outcome.
#[derive(Debug, Clone, PartialEq)]
struct PanelOutcome {
    score: f64,
    avg_rating: Option<f64>,
    rating_std: f64,
    avg_confidence: Option<f64>,
    avg_text_length: f64,
}

fn panel_outcome(
    dimension: DiversityDimension,
    graph: &IdentityGraph,
    sub: &SubmissionAggregate,
) -> Option<PanelOutcome> {
    let categories: Vec<Option<&str>> = sub
        .panel
        .iter()
        .map(|seat| dimension.category(graph, seat.reviewer))
        .collect();
    let score = diversity_score(&categories)?;
    Some(PanelOutcome {
        score,
        avg_rating: sub.bucket.avg_rating(),
        rating_std: sub.bucket.rating_std().unwrap_or(0.0),
        avg_confidence: sub.bucket.avg_confidence(),
        avg_text_length: sub.bucket.avg_text_length(),
    })
}

fn panel_stats(panels: &[&PanelOutcome]) -> PanelStats {
    let ratings: Vec<f64> = panels.iter().filter_map(|p| p.avg_rating).collect();
    let stds: Vec<f64> = panels.iter().map(|p| p.rating_std).collect();
    let confidences: Vec<f64> = panels.iter().filter_map(|p| p.avg_confidence).collect();
    let lengths: Vec<f64> = panels.iter().map(|p| p.avg_text_length).collect();
    PanelStats {
        avg_rating: round2(mean(&ratings)),
        avg_rating_std: round2(mean(&stds)),
        avg_confidence: round2(mean(&confidences)),
        avg_text_length: round_to(mean(&lengths), 0),
    }
}

fn impact(panels: &[PanelOutcome], t: &Thresholds) -> DiversityImpact {
    let high: Vec<&PanelOutcome> = panels.iter().filter(|p| p.score >= t.high_diversity).collect();
    let low: Vec<&PanelOutcome> = panels.iter().filter(|p| p.score <= t.low_diversity).collect();

    let mut out = DiversityImpact {
        high_diversity_count: high.len(),
        low_diversity_count: low.len(),
        total_analyzed: panels.len(),
        ..Default::default()
    };
    if high.is_empty() || low.is_empty() {
        return out;
    }

    out.high_diversity_stats = Some(panel_stats(&high));
    out.low_diversity_stats = Some(panel_stats(&low));

    let high_ratings: Vec<f64> = high.iter().filter_map(|p| p.avg_rating).collect();
    let low_ratings: Vec<f64> = low.iter().filter_map(|p| p.avg_rating).collect();
    if high_ratings.len() > t.diversity_test_min_samples
        && low_ratings.len() > t.diversity_test_min_samples
    {
        out.statistical_test = welch_t_test(&high_ratings, &low_ratings)
            .ok()
            .map(|test| RatingTest {
                test_type: "welch_t_test".into(),
                t_statistic: round3(test.statistic),
                p_value: round3(test.p_value),
                degrees_of_freedom: round2(test.df),
                significant: test.p_value < t.significance_alpha,
            });
    }
    out
}

fn correlate(pairs: &[(f64, f64)], t: &Thresholds) -> Option<CorrelationResult> {
    if pairs.len() < t.correlation_min_samples {
        return None;
    }
    let (xs, ys): (Vec<f64>, Vec<f64>) = pairs.iter().copied().unzip();
    match pearson(&xs, &ys) {
        Ok(c) => Some(CorrelationResult {
            correlation: round3(c.r),
            p_value: round3(c.p_value),
            significant: c.p_value < t.significance_alpha,
            sample_size: c.n,
        }),
        Err(e) => {
            tracing::debug!(error = %e, "Diversity correlation not computed");
            None
        }
    }
}

fn correlation(panels: &[PanelOutcome], t: &Thresholds) -> DiversityCorrelation {
    let rated: Vec<&PanelOutcome> = panels.iter().filter(|p| p.avg_rating.is_some()).collect();
    let rating_pairs: Vec<(f64, f64)> = rated
        .iter()
        .filter_map(|p| p.avg_rating.map(|r| (p.score, r)))
        .collect();
    let std_pairs: Vec<(f64, f64)> = rated.iter().map(|p| (p.score, p.rating_std)).collect();
    DiversityCorrelation {
        rating_correlation: correlate(&rating_pairs, t),
        consistency_correlation: correlate(&std_pairs, t),
    }
}

fn dimension_report(
    dimension: DiversityDimension,
    agg: &Aggregates,
    graph: &IdentityGraph,
    t: &Thresholds,
) -> DimensionDiversity {
    let mut distribution: BTreeMap<String, usize> = BTreeMap::new();
    for (id, person) in graph.people() {
        if person.has_role(Role::Reviewer) {
            let label = dimension
                .category(graph, id)
                .unwrap_or(dimension.unknown_label());
            *distribution.entry(label.to_string()).or_default() += 1;
        }
    }

    let gate = dimension.min_reviews(t);
    let mut profiles = BTreeMap::new();
    let mut categories_below_gate = 0;
    for (label, bucket) in dimension.buckets(agg) {
        if bucket.review_count >= gate {
            profiles.insert(label, CategoryProfile::of(bucket));
        } else {
            categories_below_gate += 1;
        }
    }

    let panels: Vec<PanelOutcome> = agg
        .submissions
        .iter()
        .filter_map(|sub| panel_outcome(dimension, graph, sub))
        .collect();

    DimensionDiversity {
        distribution,
        profiles,
        categories_below_gate,
        submission_diversity_analysis: impact(&panels, t),
        diversity_correlation: correlation(&panels, t),
    }
}

pub fn benefits(impacts: &[(DiversityDimension, &DiversityImpact)]) -> DiversityBenefits {
    let mut out = DiversityBenefits::default();
    for (dimension, impact) in impacts {
        let (Some(high), Some(low)) = (&impact.high_diversity_stats, &impact.low_diversity_stats)
        else {
            continue;
        };

        let rating_diff = high.avg_rating - low.avg_rating;
        if rating_diff.abs() > 0.1 {
            let direction = if rating_diff > 0.0 { "higher" } else { "lower" };
            out.quality_improvements.push(Effect {
                dimension: *dimension,
                effect: format!("{direction} average rating by {:.2}", rating_diff.abs()),
            });
        }

        let std_diff = high.avg_rating_std - low.avg_rating_std;
        if std_diff.abs() > 0.05 {
            let effect = if std_diff < 0.0 {
                "more consistent"
            } else {
                "less consistent"
            };
            out.consistency_effects.push(Effect {
                dimension: *dimension,
                effect: format!("{effect} ratings (std diff: {std_diff:.3})"),
            });
        }
    }
    out.recommendations = RECOMMENDATIONS.iter().map(|r| r.to_string()).collect();
    out
}

#[tracing::instrument(skip_all)]
pub fn analyze(agg: &Aggregates, graph: &IdentityGraph, t: &Thresholds) -> DiversityReport {
    let [gender, culture, institution] =
        DiversityDimension::ALL.map(|d| dimension_report(d, agg, graph, t));

    let overall_diversity_benefits = benefits(&[
        (
            DiversityDimension::GenderDiversity,
            &gender.submission_diversity_analysis,
        ),
        (
            DiversityDimension::CulturalDiversity,
            &culture.submission_diversity_analysis,
        ),
        (
            DiversityDimension::InstitutionalDiversity,
            &institution.submission_diversity_analysis,
        ),
    ]);
    tracing::debug!(
        gender_panels = gender.submission_diversity_analysis.total_analyzed,
        cultural_panels = culture.submission_diversity_analysis.total_analyzed,
        "Diversity impact computed"
    );

    DiversityReport {
        composite_diversity: CompositeDiversity {
            gender_impact_summary: gender.submission_diversity_analysis.clone(),
            cultural_impact_summary: culture.submission_diversity_analysis.clone(),
            institutional_impact_summary: institution.submission_diversity_analysis.clone(),
            overall_diversity_benefits,
        },
        gender_diversity: gender,
        cultural_diversity: culture,
        institutional_diversity: institution,
    }
}
