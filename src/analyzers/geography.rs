//! Country profiles, geographical rating bias and country leaderboards.
//!
//! A country is profiled from the reviews its nationals wrote. Bias compares
//! the ratings of same-country co-reviewers on a shared submission against
//! what the country's reviewers give to submissions whose known authors all
//! come from elsewhere.
//!
//! The openness and collaboration strength values are heuristics over
//! institution and reviewer counts, not measurements of collaboration.

use crate::analyzers::aggregate::{Aggregates, Bucket, Descriptive};
use crate::analyzers::grade::{
    CircleTrait, CollaborationType, CountryScores, CountryTag, circle_traits, collaboration_type,
    country_tags,
};
use crate::analyzers::ranking::{Direction, EntityId, Ranked, compare, top_n};
use crate::analyzers::utility::{mean, round_to, round2, round3};
use crate::config::{Limits, Thresholds};
use crate::identity::{IdentityGraph, InstitutionId};
use crate::model::Role;
use crate::normalize::{CulturalCluster, country, primary_cluster};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademicScale {
    pub num_reviewers: usize,
    pub num_authors: usize,
    pub num_institutions: usize,
    pub total_reviews: usize,
    pub reviews_per_reviewer: f64,
    pub author_reviewer_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewingCharacteristics {
    pub avg_rating: f64,
    pub rating_std: f64,
    pub median_rating: f64,
    pub avg_confidence: f64,
    pub confidence_std: f64,
    pub avg_text_length: f64,
    pub text_std: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryProfile {
    pub country: String,
    pub academic_scale: AcademicScale,
    pub reviewing_characteristics: ReviewingCharacteristics,
    pub country_scores: CountryScores,
    pub tags: Vec<CountryTag>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpennessEntry {
    pub country: String,
    pub openness_score: f64,
    pub num_reviewers: usize,
    pub num_institutions: usize,
    pub reviews_per_reviewer: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollaborationPattern {
    pub collaboration_type: CollaborationType,
    pub collaboration_strength: f64,
}

/// One country on a leaderboard, carrying the metric it was ranked by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCountry {
    pub country: String,
    pub value: f64,
    pub num_reviewers: usize,
    pub total_reviews: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AcademicScaleRankings {
    pub largest_academic_communities: Vec<RankedCountry>,
    pub most_institutions: Vec<RankedCountry>,
    pub highest_participation: Vec<RankedCountry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CharacteristicRankings {
    pub most_strict: Vec<RankedCountry>,
    pub most_lenient: Vec<RankedCountry>,
    pub most_detailed: Vec<RankedCountry>,
    pub most_consistent: Vec<RankedCountry>,
    pub highest_confidence: Vec<RankedCountry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InternationalizationRankings {
    pub most_open: Vec<OpennessEntry>,
    pub collaboration_types: BTreeMap<String, CollaborationPattern>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiasRankEntry {
    pub country: String,
    pub home_bias_score: f64,
    pub bias_magnitude: f64,
    pub total_cross_reviews: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BiasRankings {
    pub most_biased: Vec<BiasRankEntry>,
    pub most_fair: Vec<BiasRankEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CulturalCircle {
    pub countries: Vec<String>,
    pub country_count: usize,
    pub total_reviewers: usize,
    pub avg_strictness: f64,
    pub avg_detail_score: f64,
    pub avg_confidence: f64,
    pub characteristics: Vec<CircleTrait>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountryRankings {
    pub qualified_countries: usize,
    pub academic_scale: AcademicScaleRankings,
    pub reviewing_characteristics: CharacteristicRankings,
    pub internationalization: InternationalizationRankings,
    pub geographical_bias: BiasRankings,
    pub cultural_analysis: BTreeMap<CulturalCluster, CulturalCircle>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryProfiles {
    pub country_profiles: BTreeMap<String, CountryProfile>,
    pub countries_below_gate: usize,
    pub openness_rankings: Vec<OpennessEntry>,
    pub collaboration_patterns: BTreeMap<String, CollaborationPattern>,
    pub rankings: CountryRankings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetBias {
    pub target_country: String,
    pub avg_rating: f64,
    pub difference: f64,
    pub review_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CulturalDistance {
    pub reviewer_cultural_group: CulturalCluster,
    pub same_culture_avg_rating: f64,
    pub different_culture_avg_rating: f64,
    pub cultural_bias_score: f64,
    pub same_culture_count: usize,
    pub different_culture_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryBias {
    pub overall_cross_country_avg: f64,
    /// `None` when nobody from the country reviewed a home submission.
    pub same_country_avg: Option<f64>,
    pub home_bias_score: Option<f64>,
    pub total_cross_reviews: usize,
    pub biased_towards: Vec<TargetBias>,
    pub biased_against: Vec<TargetBias>,
    pub cultural_distance_effects: Option<CulturalDistance>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeographicalBias {
    pub country_bias: BTreeMap<String, CountryBias>,
    /// Profiled countries with too few cross-country ratings.
    pub countries_below_gate: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeographyReport {
    pub profiles: CountryProfiles,
    pub bias: GeographicalBias,
}

impl Ranked for RankedCountry {
    fn sample_count(&self) -> usize {
        self.total_reviews
    }

    fn entity_id(&self) -> EntityId<'_> {
        EntityId::Name(&self.country)
    }
}

impl Ranked for OpennessEntry {
    fn sample_count(&self) -> usize {
        self.num_reviewers
    }

    fn entity_id(&self) -> EntityId<'_> {
        EntityId::Name(&self.country)
    }
}

impl Ranked for BiasRankEntry {
    fn sample_count(&self) -> usize {
        self.total_cross_reviews
    }

    fn entity_id(&self) -> EntityId<'_> {
        EntityId::Name(&self.country)
    }
}

impl Ranked for TargetBias {
    fn sample_count(&self) -> usize {
        self.review_count
    }

    fn entity_id(&self) -> EntityId<'_> {
        EntityId::Name(&self.target_country)
    }
}

/// Reviewer institutions and authors per nationality, counted once from the graph.
struct CountryCounts<'g> {
    institutions: BTreeMap<&'g str, BTreeSet<InstitutionId>>,
    authors: BTreeMap<&'g str, usize>,
}

impl<'g> CountryCounts<'g> {
    fn of(graph: &'g IdentityGraph) -> Self {
        let mut institutions: BTreeMap<&str, BTreeSet<InstitutionId>> = BTreeMap::new();
        let mut authors = BTreeMap::new();
        for (_, person) in graph.people() {
            let nationality = person.nationality.as_str();
            if person.has_role(Role::Reviewer) {
                institutions
                    .entry(nationality)
                    .or_default()
                    .extend(person.institutions.iter().copied());
            }
            if person.has_role(Role::Author) {
                *authors.entry(nationality).or_default() += 1;
            }
        }
        Self {
            institutions,
            authors,
        }
    }

    fn institutions(&self, country: &str) -> usize {
        self.institutions.get(country).map_or(0, BTreeSet::len)
    }

    fn authors(&self, country: &str) -> usize {
        self.authors.get(country).copied().unwrap_or(0)
    }
}

fn profile(country: &str, bucket: &Bucket, counts: &CountryCounts) -> CountryProfile {
    let num_reviewers = bucket.reviewer_count;
    let num_institutions = counts.institutions(country);
    let total_reviews = bucket.review_count;
    let reviews_per_reviewer = total_reviews as f64 / num_reviewers.max(1) as f64;

    let rating = or_zero(bucket.rating);
    let confidence = or_zero(bucket.confidence);
    let text = or_zero(bucket.text_length);
    let scores = CountryScores::new(rating.mean, rating.std, text.mean, confidence.mean);

    CountryProfile {
        country: country.to_string(),
        academic_scale: AcademicScale {
            num_reviewers,
            num_authors: counts.authors(country),
            num_institutions,
            total_reviews,
            reviews_per_reviewer: round2(reviews_per_reviewer),
            author_reviewer_ratio: round2(counts.authors(country) as f64 / num_reviewers.max(1) as f64),
        },
        reviewing_characteristics: ReviewingCharacteristics {
            avg_rating: round2(rating.mean),
            rating_std: round2(rating.std),
            median_rating: round2(rating.median),
            avg_confidence: round2(confidence.mean),
            confidence_std: round2(confidence.std),
            avg_text_length: round_to(text.mean, 0),
            text_std: round_to(text.std, 0),
        },
        country_scores: CountryScores {
            strictness_score: round2(scores.strictness_score),
            detail_score: round2(scores.detail_score),
            consistency_score: round2(scores.consistency_score),
            confidence_score: round2(scores.confidence_score),
        },
        tags: country_tags(&scores, num_reviewers, reviews_per_reviewer),
    }
}

fn or_zero(d: Option<Descriptive>) -> Descriptive {
    d.unwrap_or(Descriptive {
        count: 0,
        mean: 0.0,
        std: 0.0,
        median: 0.0,
        min: 0.0,
        max: 0.0,
    })
}

/// Institutions per reviewer, capped at 1.
pub fn openness(num_institutions: usize, num_reviewers: usize) -> f64 {
    (num_institutions as f64 / num_reviewers.max(1) as f64).min(1.0)
}

pub fn collaboration_strength(num_reviewers: usize, num_institutions: usize) -> f64 {
    round2((num_reviewers as f64 * 0.7 + num_institutions as f64 * 0.3) / 100.0).min(1.0)
}

fn openness_entry(p: &CountryProfile) -> OpennessEntry {
    let scale = &p.academic_scale;
    OpennessEntry {
        country: p.country.clone(),
        openness_score: round3(openness(scale.num_institutions, scale.num_reviewers)),
        num_reviewers: scale.num_reviewers,
        num_institutions: scale.num_institutions,
        reviews_per_reviewer: scale.reviews_per_reviewer,
    }
}

fn collaboration(p: &CountryProfile) -> CollaborationPattern {
    let scale = &p.academic_scale;
    CollaborationPattern {
        collaboration_type: collaboration_type(scale.num_reviewers, scale.reviews_per_reviewer),
        collaboration_strength: collaboration_strength(scale.num_reviewers, scale.num_institutions),
    }
}

fn cultural_distance(
    reviewer_country: &str,
    targets: &[(&str, &Bucket)],
    t: &Thresholds,
) -> Option<CulturalDistance> {
    let group = primary_cluster(reviewer_country)?;
    let mut same = Vec::new();
    let mut different = Vec::new();
    for (target, bucket) in targets {
        if bucket.ratings().len() < t.culture_target_min_ratings {
            continue;
        }
        let (Some(target_group), Some(avg)) = (primary_cluster(target), bucket.avg_rating()) else {
            continue;
        };
        if target_group == group {
            same.push(round2(avg));
        } else {
            different.push(round2(avg));
        }
    }
    if same.is_empty() || different.is_empty() {
        return None;
    }
    let (same_avg, different_avg) = (mean(&same), mean(&different));
    Some(CulturalDistance {
        reviewer_cultural_group: group,
        same_culture_avg_rating: round2(same_avg),
        different_culture_avg_rating: round2(different_avg),
        cultural_bias_score: round2(same_avg - different_avg),
        same_culture_count: same.len(),
        different_culture_count: different.len(),
    })
}

fn country_bias(
    reviewer_country: &str,
    agg: &Aggregates,
    t: &Thresholds,
    limits: &Limits,
) -> Option<CountryBias> {
    let cross = agg.cross.get(reviewer_country)?;
    let cross_ratings = cross.ratings();
    if cross_ratings.len() < t.cross_country_min_ratings {
        return None;
    }
    let cross_avg = mean(cross_ratings);
    let same_avg = agg
        .same_country
        .get(reviewer_country)
        .filter(|pairs| !pairs.is_empty())
        .map(|pairs| mean(pairs));

    let targets: Vec<(&str, &Bucket)> = agg
        .country_pairs
        .range((reviewer_country.to_string(), String::new())..)
        .take_while(|((reviewer, _), _)| reviewer == reviewer_country)
        .map(|((_, target), bucket)| (target.as_str(), bucket))
        .collect();

    let mut towards = Vec::new();
    let mut against = Vec::new();
    for (target, bucket) in &targets {
        let Some(avg) = bucket.avg_rating() else {
            continue;
        };
        if bucket.ratings().len() < t.target_country_min_ratings {
            continue;
        }
        let difference = round2(avg) - cross_avg;
        if difference.abs() < t.bias_threshold {
            continue;
        }
        let entry = TargetBias {
            target_country: target.to_string(),
            avg_rating: round2(avg),
            difference: round2(difference),
            review_count: bucket.ratings().len(),
        };
        if difference > 0.0 {
            towards.push(entry);
        } else {
            against.push(entry);
        }
    }

    let n = limits.bias_target_top_n;
    Some(CountryBias {
        overall_cross_country_avg: round2(cross_avg),
        same_country_avg: same_avg.map(round2),
        home_bias_score: same_avg.map(|same| round2(same - cross_avg)),
        total_cross_reviews: cross_ratings.len(),
        biased_towards: top_n(towards, |e| e.difference, Direction::Descending, n),
        biased_against: top_n(against, |e| e.difference, Direction::Ascending, n),
        cultural_distance_effects: cultural_distance(reviewer_country, &targets, t),
    })
}

/// Home/cross-country comparison for every profiled country.
pub fn bias(
    agg: &Aggregates,
    profiles: &BTreeMap<String, CountryProfile>,
    t: &Thresholds,
    limits: &Limits,
) -> GeographicalBias {
    let mut out = GeographicalBias::default();
    for country in profiles.keys() {
        match country_bias(country, agg, t, limits) {
            Some(bias) => {
                out.country_bias.insert(country.clone(), bias);
            }
            None => out.countries_below_gate += 1,
        }
    }
    out
}

fn ranked(
    qualified: &[&CountryProfile],
    value: impl Fn(&CountryProfile) -> f64,
    direction: Direction,
    n: usize,
) -> Vec<RankedCountry> {
    let entries = qualified
        .iter()
        .map(|p| RankedCountry {
            country: p.country.clone(),
            value: value(p),
            num_reviewers: p.academic_scale.num_reviewers,
            total_reviews: p.academic_scale.total_reviews,
        })
        .collect();
    top_n(entries, |e| e.value, direction, n)
}

fn cultural_circles(
    qualified: &[&CountryProfile],
    t: &Thresholds,
) -> BTreeMap<CulturalCluster, CulturalCircle> {
    let mut circles = BTreeMap::new();
    for cluster in CulturalCluster::ALL {
        let members: Vec<&CountryProfile> = qualified
            .iter()
            .copied()
            .filter(|p| cluster.members().contains(&p.country.as_str()))
            .collect();
        if members.len() < t.cluster_min_countries {
            continue;
        }
        let scores = |f: fn(&CountryScores) -> f64| -> f64 {
            let values: Vec<f64> = members.iter().map(|p| f(&p.country_scores)).collect();
            mean(&values)
        };
        let strictness = scores(|s| s.strictness_score);
        let detail = scores(|s| s.detail_score);
        circles.insert(
            cluster,
            CulturalCircle {
                countries: members.iter().map(|p| p.country.clone()).collect(),
                country_count: members.len(),
                total_reviewers: members.iter().map(|p| p.academic_scale.num_reviewers).sum(),
                avg_strictness: round2(strictness),
                avg_detail_score: round2(detail),
                avg_confidence: round2(scores(|s| s.confidence_score)),
                characteristics: circle_traits(cluster, strictness, detail),
            },
        );
    }
    circles
}

/// Leaderboards over countries with enough distinct reviewers.
pub fn rankings(
    profiles: &BTreeMap<String, CountryProfile>,
    bias: &GeographicalBias,
    t: &Thresholds,
    limits: &Limits,
) -> CountryRankings {
    let qualified: Vec<&CountryProfile> = profiles
        .values()
        .filter(|p| p.academic_scale.num_reviewers >= t.ranking_min_reviewers)
        .collect();

    let scale_n = limits.scale_top_n;
    let academic_scale = AcademicScaleRankings {
        largest_academic_communities: ranked(
            &qualified,
            |p| p.academic_scale.num_reviewers as f64,
            Direction::Descending,
            scale_n,
        ),
        most_institutions: ranked(
            &qualified,
            |p| p.academic_scale.num_institutions as f64,
            Direction::Descending,
            scale_n,
        ),
        highest_participation: ranked(
            &qualified,
            |p| p.academic_scale.reviews_per_reviewer,
            Direction::Descending,
            scale_n,
        ),
    };

    let n = limits.characteristic_top_n;
    let reviewing_characteristics = CharacteristicRankings {
        most_strict: ranked(&qualified, |p| p.country_scores.strictness_score, Direction::Descending, n),
        most_lenient: ranked(&qualified, |p| p.country_scores.strictness_score, Direction::Ascending, n),
        most_detailed: ranked(&qualified, |p| p.country_scores.detail_score, Direction::Descending, n),
        most_consistent: ranked(
            &qualified,
            |p| p.country_scores.consistency_score,
            Direction::Descending,
            n,
        ),
        highest_confidence: ranked(
            &qualified,
            |p| p.country_scores.confidence_score,
            Direction::Descending,
            n,
        ),
    };

    let internationalization = InternationalizationRankings {
        most_open: top_n(
            qualified.iter().map(|p| openness_entry(p)).collect(),
            |e| e.openness_score,
            Direction::Descending,
            n,
        ),
        collaboration_types: qualified
            .iter()
            .map(|p| (p.country.clone(), collaboration(p)))
            .collect(),
    };

    let bias_entries: Vec<BiasRankEntry> = qualified
        .iter()
        .filter_map(|p| {
            let entry = bias.country_bias.get(&p.country)?;
            let home_bias_score = entry.home_bias_score?;
            Some(BiasRankEntry {
                country: p.country.clone(),
                home_bias_score,
                bias_magnitude: home_bias_score.abs(),
                total_cross_reviews: entry.total_cross_reviews,
            })
        })
        .collect();
    let bias_n = limits.bias_ranking_top_n;
    let geographical_bias = BiasRankings {
        most_biased: top_n(bias_entries.clone(), |e| e.bias_magnitude, Direction::Descending, bias_n),
        most_fair: top_n(bias_entries, |e| e.bias_magnitude, Direction::Ascending, bias_n),
    };

    CountryRankings {
        qualified_countries: qualified.len(),
        academic_scale,
        reviewing_characteristics,
        internationalization,
        geographical_bias,
        cultural_analysis: cultural_circles(&qualified, t),
    }
}

#[tracing::instrument(skip_all)]
pub fn analyze(
    agg: &Aggregates,
    graph: &IdentityGraph,
    t: &Thresholds,
    limits: &Limits,
) -> GeographyReport {
    let counts = CountryCounts::of(graph);

    let mut country_profiles = BTreeMap::new();
    let mut countries_below_gate = 0;
    for (name, bucket) in &agg.countries {
        if !country::is_known(name) {
            continue;
        }
        if bucket.review_count < t.country_profile_min_reviews {
            countries_below_gate += 1;
            continue;
        }
        country_profiles.insert(name.clone(), profile(name, bucket, &counts));
    }

    let mut openness_rankings: Vec<OpennessEntry> =
        country_profiles.values().map(openness_entry).collect();
    openness_rankings.sort_by(|a, b| compare(a, b, |e| e.openness_score, Direction::Descending));
    let collaboration_patterns = country_profiles
        .values()
        .filter(|p| p.academic_scale.num_reviewers >= t.ranking_min_reviewers)
        .map(|p| (p.country.clone(), collaboration(p)))
        .collect();

    let bias = self::bias(agg, &country_profiles, t, limits);
    let rankings = self::rankings(&country_profiles, &bias, t, limits);

    tracing::debug!(
        profiled = country_profiles.len(),
        below_gate = countries_below_gate,
        with_bias = bias.country_bias.len(),
        "Country profiles computed"
    );

    GeographyReport {
        profiles: CountryProfiles {
            country_profiles,
            countries_below_gate,
            openness_rankings,
            collaboration_patterns,
            rankings,
        },
        bias,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::aggregate::aggregate;
    use crate::model::Dataset;
    use crate::model::test_support::{DatasetBuilder, review};

    fn run(dataset: &Dataset) -> GeographyReport {
        let t = Thresholds::default();
        analyze(&aggregate(dataset, &t), &dataset.graph, &t, &Limits::default())
    }

    #[test]
    fn test_home_bias() {
        let mut b = DatasetBuilder::default();
        let j1 = b.person("j1", "Japan", &["University of Tokyo"]);
        let j2 = b.person("j2", "Japan", &[]);
        let french = b.person("fa", "France", &[]);
        let japanese = b.person("ja", "Japan", &[]);
        for n in 1..=10 {
            b.submission(n, &[french], vec![review(j1, "j1", Some(5.0))]);
        }
        for n in 11..=12 {
            b.submission(
                n,
                &[japanese],
                vec![review(j1, "j1", Some(6.0)), review(j2, "j2", Some(6.0))],
            );
        }
        let report = run(&b.build());

        let japan = &report.profiles.country_profiles["Japan"];
        assert_eq!(japan.academic_scale.total_reviews, 14);
        assert_eq!(japan.academic_scale.num_reviewers, 2);
        assert_eq!(japan.academic_scale.num_authors, 1);
        assert_eq!(japan.academic_scale.num_institutions, 1);

        let bias = &report.bias.country_bias["Japan"];
        assert_eq!(bias.overall_cross_country_avg, 5.0);
        assert_eq!(bias.same_country_avg, Some(6.0));
        assert_eq!(bias.home_bias_score, Some(1.0));
        assert_eq!(bias.total_cross_reviews, 10);
        assert!(bias.biased_towards.is_empty());
        assert!(bias.biased_against.is_empty());
        assert_eq!(bias.cultural_distance_effects, None);
    }

    #[test]
    fn test_same_country_co_reviewers_on_foreign_submission() {
        let mut b = DatasetBuilder::default();
        let j1 = b.person("j1", "Japan", &[]);
        let j2 = b.person("j2", "Japan", &[]);
        let french = b.person("fa", "France", &[]);
        for n in 1..=10 {
            b.submission(n, &[french], vec![review(j1, "j1", Some(5.0))]);
        }
        b.submission(
            11,
            &[french],
            vec![review(j1, "j1", Some(7.0)), review(j2, "j2", Some(7.0))],
        );
        let report = run(&b.build());

        let bias = &report.bias.country_bias["Japan"];
        assert_eq!(bias.total_cross_reviews, 12);
        assert_eq!(bias.overall_cross_country_avg, 5.33);
        assert_eq!(bias.same_country_avg, Some(7.0));
        assert_eq!(bias.home_bias_score, Some(1.67));
    }

    #[test]
    fn test_num_institutions_counts_reviewer_affiliations_only() {
        let mut b = DatasetBuilder::default();
        let j1 = b.person("j1", "Japan", &["University of Tokyo", "Kyoto University"]);
        let j2 = b.person("j2", "Japan", &["University of Tokyo"]);
        let author = b.person("ja", "Japan", &["Osaka University"]);
        for n in 1..=10 {
            b.submission(
                n,
                &[author],
                vec![review(j1, "j1", Some(5.0)), review(j2, "j2", Some(6.0))],
            );
        }
        let report = run(&b.build());

        let scale = &report.profiles.country_profiles["Japan"].academic_scale;
        assert_eq!(scale.num_reviewers, 2);
        assert_eq!(scale.num_authors, 1);
        assert_eq!(scale.num_institutions, 2);
    }

    #[test]
    fn test_target_bias_and_cultural_distance() {
        let mut b = DatasetBuilder::default();
        let reviewer = b.person("j1", "Japan", &[]);
        let targets = [("France", 5, 7.0), ("Germany", 5, 4.0), ("China", 3, 6.0)];
        let mut n = 0;
        for (country, count, rating) in targets {
            let author = b.person(&format!("a-{country}"), country, &[]);
            for _ in 0..count {
                n += 1;
                b.submission(n, &[author], vec![review(reviewer, "j1", Some(rating))]);
            }
        }
        let report = run(&b.build());
        let bias = &report.bias.country_bias["Japan"];

        assert_eq!(bias.total_cross_reviews, 13);
        assert_eq!(bias.overall_cross_country_avg, 5.62);
        assert_eq!(bias.home_bias_score, None);
        assert_eq!(bias.biased_towards.len(), 1);
        assert_eq!(bias.biased_towards[0].target_country, "France");
        assert_eq!(bias.biased_towards[0].difference, 1.38);
        assert_eq!(bias.biased_against[0].target_country, "Germany");
        assert_eq!(bias.biased_against[0].difference, -1.62);

        let distance = bias.cultural_distance_effects.as_ref().unwrap();
        assert_eq!(distance.reviewer_cultural_group, CulturalCluster::EastAsian);
        assert_eq!(distance.same_culture_avg_rating, 6.0);
        assert_eq!(distance.different_culture_avg_rating, 5.5);
        assert_eq!(distance.cultural_bias_score, 0.5);
        assert_eq!(distance.different_culture_count, 2);
    }

    #[test]
    fn test_profile_gate_and_cross_gate() {
        let mut b = DatasetBuilder::default();
        let reviewer = b.person("i1", "India", &[]);
        let author = b.person("us", "United States", &[]);
        for n in 1..=4 {
            b.submission(n, &[author], vec![review(reviewer, "i1", Some(5.0))]);
        }
        let report = run(&b.build());
        assert!(report.profiles.country_profiles.is_empty());
        assert_eq!(report.profiles.countries_below_gate, 1);

        let mut b = DatasetBuilder::default();
        let reviewer = b.person("i1", "India", &[]);
        let author = b.person("us", "United States", &[]);
        for n in 1..=9 {
            b.submission(n, &[author], vec![review(reviewer, "i1", Some(5.0))]);
        }
        let report = run(&b.build());
        assert!(report.profiles.country_profiles.contains_key("India"));
        assert!(report.bias.country_bias.is_empty());
        assert_eq!(report.bias.countries_below_gate, 1);
    }

    #[test]
    fn test_rankings_and_cultural_circles() {
        let mut b = DatasetBuilder::default();
        let mut n = 0;
        for (country, rating) in [("United States", 4.0), ("China", 7.0), ("Japan", 5.0)] {
            for i in 0..20 {
                let id = format!("{country}-{i}");
                let reviewer = b.person(&id, country, &[]);
                n += 1;
                b.submission(n, &[], vec![review(reviewer, &id, Some(rating))]);
            }
        }
        let rankings = run(&b.build()).profiles.rankings;

        assert_eq!(rankings.qualified_countries, 3);
        let strict = &rankings.reviewing_characteristics.most_strict;
        assert_eq!(strict[0].country, "United States");
        assert_eq!(strict[0].value, 75.0);
        assert_eq!(rankings.reviewing_characteristics.most_lenient[0].country, "China");

        // Equal reviewer counts fall back to the country name.
        let largest: Vec<&str> = rankings
            .academic_scale
            .largest_academic_communities
            .iter()
            .map(|c| c.country.as_str())
            .collect();
        assert_eq!(largest, vec!["China", "Japan", "United States"]);

        let circles = &rankings.cultural_analysis;
        assert_eq!(circles.len(), 1);
        let east_asian = &circles[&CulturalCluster::EastAsian];
        assert_eq!(east_asian.countries, vec!["China", "Japan"]);
        assert_eq!(east_asian.total_reviewers, 40);
        assert_eq!(east_asian.avg_strictness, 50.0);
        assert_eq!(
            east_asian.characteristics,
            vec![
                CircleTrait::LenientCulture,
                CircleTrait::ConciseFeedback,
                CircleTrait::Meticulous,
                CircleTrait::WellStructured,
            ]
        );
        assert_eq!(
            rankings.internationalization.collaboration_types["China"].collaboration_type,
            CollaborationType::SpecializedContributor
        );
    }

    #[test]
    fn test_openness_and_strength() {
        assert_eq!(openness(3, 20), 0.15);
        assert_eq!(openness(30, 20), 1.0);
        assert_eq!(openness(0, 0), 0.0);
        assert_eq!(collaboration_strength(200, 100), 1.0);
        assert_eq!(collaboration_strength(20, 10), 0.17);
    }
}
