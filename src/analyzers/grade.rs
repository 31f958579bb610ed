//! Threshold classifications that turn numeric scores into labels.

use crate::normalize::CulturalCluster;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionType {
    ApproximatelyNormal,
    RightSkewed,
    LeftSkewed,
    HeavyTailed,
    LightTailed,
    Irregular,
}

/// Classifies a rating distribution by skewness and excess kurtosis.
///
/// | Condition                        | Type                 |
/// |----------------------------------|----------------------|
/// | \|skew\| < 0.5 and \|kurt\| < 3  | approximately_normal |
/// | skew > 0.5                       | right_skewed         |
/// | skew < -0.5                      | left_skewed          |
/// | kurt > 3                         | heavy_tailed         |
/// | kurt < -1                        | light_tailed         |
/// | otherwise                        | irregular            |
pub fn distribution_type(skewness: f64, kurtosis: f64) -> DistributionType {
    match (skewness, kurtosis) {
        (s, k) if s.abs() < 0.5 && k.abs() < 3.0 => DistributionType::ApproximatelyNormal,
        (s, _) if s > 0.5 => DistributionType::RightSkewed,
        (s, _) if s < -0.5 => DistributionType::LeftSkewed,
        (_, k) if k > 3.0 => DistributionType::HeavyTailed,
        (_, k) if k < -1.0 => DistributionType::LightTailed,
        _ => DistributionType::Irregular,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountryTag {
    LargeAcademicCommunity,
    MediumAcademicCommunity,
    SmallAcademicCommunity,
    StrictReviewCulture,
    LenientReviewCulture,
    NeutralReviewCulture,
    DetailedReviewStyle,
    ConciseReviewStyle,
    UniformStandards,
    DiverseStandards,
    HighlyEngaged,
    ActivelyEngaged,
    ModeratelyEngaged,
}

/// The 0-100 scores a country profile is tagged from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CountryScores {
    pub strictness_score: f64,
    pub detail_score: f64,
    pub consistency_score: f64,
    pub confidence_score: f64,
}

impl CountryScores {
    pub fn new(avg_rating: f64, rating_std: f64, avg_text_length: f64, avg_confidence: f64) -> Self {
        Self {
            strictness_score: if avg_rating > 0.0 {
                (10.0 - avg_rating) / 8.0 * 100.0
            } else {
                0.0
            },
            detail_score: (avg_text_length / 2000.0 * 100.0).min(100.0),
            consistency_score: ((1.0 - rating_std / 4.0) * 100.0).max(0.0),
            confidence_score: avg_confidence / 5.0 * 100.0,
        }
    }
}

pub fn country_tags(
    scores: &CountryScores,
    num_reviewers: usize,
    reviews_per_reviewer: f64,
) -> Vec<CountryTag> {
    let mut tags = Vec::with_capacity(5);

    tags.push(match num_reviewers {
        n if n >= 200 => CountryTag::LargeAcademicCommunity,
        n if n >= 50 => CountryTag::MediumAcademicCommunity,
        _ => CountryTag::SmallAcademicCommunity,
    });
    tags.push(match scores.strictness_score {
        s if s >= 70.0 => CountryTag::StrictReviewCulture,
        s if s <= 50.0 => CountryTag::LenientReviewCulture,
        _ => CountryTag::NeutralReviewCulture,
    });
    match scores.detail_score {
        d if d >= 70.0 => tags.push(CountryTag::DetailedReviewStyle),
        d if d <= 30.0 => tags.push(CountryTag::ConciseReviewStyle),
        _ => {}
    }
    match scores.consistency_score {
        c if c >= 80.0 => tags.push(CountryTag::UniformStandards),
        c if c <= 60.0 => tags.push(CountryTag::DiverseStandards),
        _ => {}
    }
    tags.push(match reviews_per_reviewer {
        r if r >= 3.0 => CountryTag::HighlyEngaged,
        r if r >= 2.0 => CountryTag::ActivelyEngaged,
        _ => CountryTag::ModeratelyEngaged,
    });

    tags
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollaborationType {
    #[serde(rename = "Global Academic Hub")]
    GlobalAcademicHub,
    #[serde(rename = "Major Academic Power")]
    MajorAcademicPower,
    #[serde(rename = "Active Regional Player")]
    ActiveRegionalPlayer,
    #[serde(rename = "Emerging Academic Force")]
    EmergingAcademicForce,
    #[serde(rename = "Specialized Contributor")]
    SpecializedContributor,
}

pub fn collaboration_type(num_reviewers: usize, reviews_per_reviewer: f64) -> CollaborationType {
    match (num_reviewers, reviews_per_reviewer) {
        (n, r) if n >= 200 && r >= 2.5 => CollaborationType::GlobalAcademicHub,
        (n, _) if n >= 200 => CollaborationType::MajorAcademicPower,
        (n, r) if n >= 50 && r >= 2.0 => CollaborationType::ActiveRegionalPlayer,
        (n, _) if n >= 50 => CollaborationType::EmergingAcademicForce,
        _ => CollaborationType::SpecializedContributor,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircleTrait {
    StrictTradition,
    LenientCulture,
    DetailedFeedback,
    ConciseFeedback,
    Meticulous,
    WellStructured,
    Direct,
    InnovationOriented,
    Rigorous,
    Balanced,
    Analytical,
    Constructive,
}

/// Score-derived traits followed by the cluster's fixed traits.
pub fn circle_traits(cluster: CulturalCluster, strictness: f64, detail: f64) -> Vec<CircleTrait> {
    let mut traits = Vec::new();
    match strictness {
        s if s >= 70.0 => traits.push(CircleTrait::StrictTradition),
        s if s <= 50.0 => traits.push(CircleTrait::LenientCulture),
        _ => {}
    }
    match detail {
        d if d >= 70.0 => traits.push(CircleTrait::DetailedFeedback),
        d if d <= 30.0 => traits.push(CircleTrait::ConciseFeedback),
        _ => {}
    }
    traits.extend_from_slice(match cluster {
        CulturalCluster::EastAsian => &[CircleTrait::Meticulous, CircleTrait::WellStructured],
        CulturalCluster::Western => &[CircleTrait::Direct, CircleTrait::InnovationOriented],
        CulturalCluster::European => &[CircleTrait::Rigorous, CircleTrait::Balanced],
        CulturalCluster::SouthAsian => &[CircleTrait::Analytical, CircleTrait::Constructive],
        CulturalCluster::MiddleEastern => &[],
    });
    traits
}
