//! Single-pass metric aggregation over every (submission, review) pair.
//!
//! Each review is reduced to a [`Sample`] and folded into accumulator buckets
//! keyed by reviewer, institution (reviewer side and author side), country,
//! cultural cluster, gender, institution type, review position and
//! submission. Accumulators only append, so partial states built over
//! contiguous submission ranges merge back into exactly the sequential
//! result. Summaries are computed once, after the last merge.

use crate::analyzers::significance::pearson;
use crate::analyzers::utility::{mean, median, stddev};
use crate::config::Thresholds;
use crate::identity::{InstitutionId, PersonId};
use crate::model::{Dataset, Review, ReviewMetrics, Submission};
use crate::normalize::{CulturalCluster, InstitutionType, clusters_of, country};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Deref;

/// The per-review values folded into buckets. Out-of-range ratings and
/// confidences are already dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub rating: Option<f64>,
    pub confidence: Option<f64>,
    pub metrics: ReviewMetrics,
}

impl Sample {
    pub fn of(review: &Review, thresholds: &Thresholds) -> Self {
        Self {
            rating: review.rating.filter(|r| thresholds.rating_in_range(*r)),
            confidence: review
                .confidence
                .filter(|c| thresholds.confidence_in_range(*c)),
            metrics: ReviewMetrics::of(review),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Accumulator {
    review_count: usize,
    ratings: Vec<f64>,
    confidences: Vec<f64>,
    rating_confidence: Vec<(f64, f64)>,
    text_lengths: Vec<f64>,
    text_words: Vec<f64>,
    question_words: Vec<f64>,
    content_quality: Vec<f64>,
    submissions: BTreeSet<u32>,
    reviewers: BTreeSet<PersonId>,
}

impl Accumulator {
    pub fn push(&mut self, submission: u32, reviewer: PersonId, sample: &Sample) {
        self.review_count += 1;
        if let Some(rating) = sample.rating {
            self.ratings.push(rating);
        }
        if let Some(confidence) = sample.confidence {
            self.confidences.push(confidence);
        }
        if let (Some(r), Some(c)) = (sample.rating, sample.confidence) {
            self.rating_confidence.push((r, c));
        }
        let m = &sample.metrics;
        self.text_lengths.push(m.total_length as f64);
        self.text_words.push(m.text_words as f64);
        self.question_words.push(m.question_words as f64);
        self.content_quality.push(m.content_quality as f64);
        self.submissions.insert(submission);
        self.reviewers.insert(reviewer);
    }

    /// Appends `other`, which must cover later submissions than `self`.
    pub fn merge(&mut self, other: Accumulator) {
        self.review_count += other.review_count;
        self.ratings.extend(other.ratings);
        self.confidences.extend(other.confidences);
        self.rating_confidence.extend(other.rating_confidence);
        self.text_lengths.extend(other.text_lengths);
        self.text_words.extend(other.text_words);
        self.question_words.extend(other.question_words);
        self.content_quality.extend(other.content_quality);
        self.submissions.extend(other.submissions);
        self.reviewers.extend(other.reviewers);
    }

    fn finalize(self) -> Bucket {
        let (xs, ys): (Vec<f64>, Vec<f64>) = self.rating_confidence.iter().copied().unzip();
        let summary = BucketSummary {
            review_count: self.review_count,
            submission_count: self.submissions.len(),
            reviewer_count: self.reviewers.len(),
            rating: Descriptive::of(&self.ratings),
            confidence: Descriptive::of(&self.confidences),
            text_length: Descriptive::of(&self.text_lengths),
            avg_text_words: mean(&self.text_words),
            avg_question_words: mean(&self.question_words),
            avg_content_quality: mean(&self.content_quality),
            rating_confidence_corr: pearson(&xs, &ys).ok().map(|c| c.r),
        };
        Bucket {
            samples: self,
            summary,
        }
    }
}

/// Mean, population standard deviation, median and range of a sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Descriptive {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

impl Descriptive {
    pub fn of(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let m = mean(values);
        Some(Self {
            count: values.len(),
            mean: m,
            std: stddev(values, m),
            median: median(values),
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BucketSummary {
    pub review_count: usize,
    pub submission_count: usize,
    pub reviewer_count: usize,
    pub rating: Option<Descriptive>,
    pub confidence: Option<Descriptive>,
    pub text_length: Option<Descriptive>,
    pub avg_text_words: f64,
    pub avg_question_words: f64,
    pub avg_content_quality: f64,
    pub rating_confidence_corr: Option<f64>,
}

impl BucketSummary {
    pub fn avg_rating(&self) -> Option<f64> {
        self.rating.map(|d| d.mean)
    }

    pub fn rating_std(&self) -> Option<f64> {
        self.rating.map(|d| d.std)
    }

    pub fn avg_confidence(&self) -> Option<f64> {
        self.confidence.map(|d| d.mean)
    }

    pub fn avg_text_length(&self) -> f64 {
        self.text_length.map_or(0.0, |d| d.mean)
    }
}

/// A finalized bucket: its summary plus read-only access to the raw samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    samples: Accumulator,
    pub summary: BucketSummary,
}

impl Bucket {
    pub fn ratings(&self) -> &[f64] {
        &self.samples.ratings
    }

    pub fn confidences(&self) -> &[f64] {
        &self.samples.confidences
    }

    pub fn rating_confidence_pairs(&self) -> &[(f64, f64)] {
        &self.samples.rating_confidence
    }

    pub fn text_lengths(&self) -> &[f64] {
        &self.samples.text_lengths
    }

    pub fn reviewers(&self) -> &BTreeSet<PersonId> {
        &self.samples.reviewers
    }
}

impl Deref for Bucket {
    type Target = BucketSummary;

    fn deref(&self) -> &BucketSummary {
        &self.summary
    }
}

/// One reviewer's place on a submission's panel.
#[derive(Debug, Clone, PartialEq)]
pub struct Seat {
    pub reviewer: PersonId,
    pub rating: Option<f64>,
    pub confidence: Option<f64>,
    pub text_length: f64,
}

#[derive(Debug, Clone, PartialEq)]
struct SubmissionState {
    number: u32,
    panel: Vec<Seat>,
    samples: Accumulator,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionAggregate {
    pub number: u32,
    pub panel: Vec<Seat>,
    pub bucket: Bucket,
}

/// Values the range check kept out of every bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Excluded {
    pub ratings: usize,
    pub confidences: usize,
}

/// Mergeable partial aggregation over a contiguous range of submissions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateState {
    reviewers: BTreeMap<PersonId, Accumulator>,
    reviewer_institutions: BTreeMap<InstitutionId, Accumulator>,
    author_institutions: BTreeMap<InstitutionId, Accumulator>,
    flows: BTreeMap<(InstitutionId, InstitutionId), Accumulator>,
    countries: BTreeMap<String, Accumulator>,
    clusters: BTreeMap<CulturalCluster, Accumulator>,
    genders: BTreeMap<String, Accumulator>,
    institution_types: BTreeMap<InstitutionType, Accumulator>,
    positions: BTreeMap<usize, Accumulator>,
    same_country: BTreeMap<String, Vec<f64>>,
    cross: BTreeMap<String, Accumulator>,
    country_pairs: BTreeMap<(String, String), Accumulator>,
    submissions: Vec<SubmissionState>,
    global: Accumulator,
    section_lengths: [Vec<f64>; 4],
    reviews_without_institution: usize,
    excluded: Excluded,
}

fn merge_maps<K: Ord>(into: &mut BTreeMap<K, Accumulator>, from: BTreeMap<K, Accumulator>) {
    for (key, acc) in from {
        into.entry(key).or_default().merge(acc);
    }
}

fn finalize_map<K: Ord>(map: BTreeMap<K, Accumulator>) -> BTreeMap<K, Bucket> {
    map.into_iter().map(|(k, acc)| (k, acc.finalize())).collect()
}

impl AggregateState {
    fn fold_submission(&mut self, dataset: &Dataset, submission: &Submission, t: &Thresholds) {
        let graph = &dataset.graph;

        let author_institutions: BTreeSet<InstitutionId> = submission
            .authors
            .iter()
            .flat_map(|a| graph.person(*a).institutions.iter().copied())
            .collect();
        let author_countries: BTreeSet<&str> = submission
            .authors
            .iter()
            .map(|a| graph.person(*a).nationality.as_str())
            .filter(|c| country::is_known(c))
            .collect();

        let mut countries: Vec<(&str, Option<f64>)> = Vec::with_capacity(submission.reviews.len());
        let mut state = SubmissionState {
            number: submission.number,
            panel: Vec::with_capacity(submission.reviews.len()),
            samples: Accumulator::default(),
        };

        for (position, review) in submission.reviews.iter().enumerate() {
            let sample = Sample::of(review, t);
            if review.rating.is_some() && sample.rating.is_none() {
                self.excluded.ratings += 1;
            }
            if review.confidence.is_some() && sample.confidence.is_none() {
                self.excluded.confidences += 1;
            }

            let reviewer = review.reviewer;
            let person = graph.person(reviewer);
            let number = submission.number;

            macro_rules! fold {
                ($map:expr, $key:expr) => {
                    $map.entry($key).or_default().push(number, reviewer, &sample)
                };
            }

            fold!(self.reviewers, reviewer);

            if person.institutions.is_empty() {
                self.reviews_without_institution += 1;
            }
            for inst in &person.institutions {
                fold!(self.reviewer_institutions, *inst);
                for author_inst in &author_institutions {
                    fold!(self.flows, (*inst, *author_inst));
                }
            }
            for author_inst in &author_institutions {
                fold!(self.author_institutions, *author_inst);
            }

            let home_country = person.nationality.as_str();
            fold!(self.countries, home_country.to_string());
            for cluster in clusters_of(home_country) {
                fold!(self.clusters, cluster);
            }
            fold!(self.genders, person.gender.clone());
            fold!(self.institution_types, graph.institution_type_of(reviewer));
            fold!(self.positions, position);

            if country::is_known(home_country)
                && !author_countries.is_empty()
                && !author_countries.contains(home_country)
            {
                fold!(self.cross, home_country.to_string());
                for target in &author_countries {
                    fold!(
                        self.country_pairs,
                        (home_country.to_string(), target.to_string())
                    );
                }
            }
            countries.push((home_country, sample.rating));

            state.samples.push(number, reviewer, &sample);
            state.panel.push(Seat {
                reviewer,
                rating: sample.rating,
                confidence: sample.confidence,
                text_length: sample.metrics.total_length as f64,
            });
            self.global.push(number, reviewer, &sample);
            for (lengths, len) in self
                .section_lengths
                .iter_mut()
                .zip(sample.metrics.section_lengths)
            {
                lengths.push(len as f64);
            }
        }

        self.fold_co_reviewers(&countries);
        self.submissions.push(state);
    }

    /// Every ordered pair of distinct rated seats whose reviewers share a
    /// known country contributes the mean of the two ratings.
    fn fold_co_reviewers(&mut self, panel: &[(&str, Option<f64>)]) {
        for (i, (country_i, rating_i)) in panel.iter().enumerate() {
            let Some(rating_i) = rating_i else { continue };
            if !country::is_known(country_i) {
                continue;
            }
            for (j, (country_j, rating_j)) in panel.iter().enumerate() {
                let Some(rating_j) = rating_j else { continue };
                if i != j && country_i == country_j {
                    self.same_country
                        .entry(country_i.to_string())
                        .or_default()
                        .push((rating_i + rating_j) / 2.0);
                }
            }
        }
    }

    /// Appends a state built over later submissions.
    pub fn merge(&mut self, other: AggregateState) {
        merge_maps(&mut self.reviewers, other.reviewers);
        merge_maps(&mut self.reviewer_institutions, other.reviewer_institutions);
        merge_maps(&mut self.author_institutions, other.author_institutions);
        merge_maps(&mut self.flows, other.flows);
        merge_maps(&mut self.countries, other.countries);
        merge_maps(&mut self.clusters, other.clusters);
        merge_maps(&mut self.genders, other.genders);
        merge_maps(&mut self.institution_types, other.institution_types);
        merge_maps(&mut self.positions, other.positions);
        for (country, pairs) in other.same_country {
            self.same_country.entry(country).or_default().extend(pairs);
        }
        merge_maps(&mut self.cross, other.cross);
        merge_maps(&mut self.country_pairs, other.country_pairs);
        self.submissions.extend(other.submissions);
        self.global.merge(other.global);
        for (mine, theirs) in self.section_lengths.iter_mut().zip(other.section_lengths) {
            mine.extend(theirs);
        }
        self.reviews_without_institution += other.reviews_without_institution;
        self.excluded.ratings += other.excluded.ratings;
        self.excluded.confidences += other.excluded.confidences;
    }

    pub fn finalize(self) -> Aggregates {
        Aggregates {
            reviewers: finalize_map(self.reviewers),
            reviewer_institutions: finalize_map(self.reviewer_institutions),
            author_institutions: finalize_map(self.author_institutions),
            flows: finalize_map(self.flows),
            countries: finalize_map(self.countries),
            clusters: finalize_map(self.clusters),
            genders: finalize_map(self.genders),
            institution_types: finalize_map(self.institution_types),
            positions: finalize_map(self.positions),
            same_country: self.same_country,
            cross: finalize_map(self.cross),
            country_pairs: finalize_map(self.country_pairs),
            submissions: self
                .submissions
                .into_iter()
                .map(|s| SubmissionAggregate {
                    number: s.number,
                    panel: s.panel,
                    bucket: s.samples.finalize(),
                })
                .collect(),
            global: self.global.finalize(),
            section_lengths: self.section_lengths,
            reviews_without_institution: self.reviews_without_institution,
            excluded: self.excluded,
        }
    }
}

/// Finalized buckets for every grouping dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregates {
    pub reviewers: BTreeMap<PersonId, Bucket>,
    pub reviewer_institutions: BTreeMap<InstitutionId, Bucket>,
    pub author_institutions: BTreeMap<InstitutionId, Bucket>,
    pub flows: BTreeMap<(InstitutionId, InstitutionId), Bucket>,
    /// Keyed by the reviewer's nationality, "Unknown" included.
    pub countries: BTreeMap<String, Bucket>,
    pub clusters: BTreeMap<CulturalCluster, Bucket>,
    pub genders: BTreeMap<String, Bucket>,
    pub institution_types: BTreeMap<InstitutionType, Bucket>,
    pub positions: BTreeMap<usize, Bucket>,
    /// Pairwise means of same-country co-reviewer ratings, in submission order.
    pub same_country: BTreeMap<String, Vec<f64>>,
    /// Reviews of submissions whose known author countries exclude the reviewer's.
    pub cross: BTreeMap<String, Bucket>,
    /// (reviewer country, author country) for cross-country reviews.
    pub country_pairs: BTreeMap<(String, String), Bucket>,
    pub submissions: Vec<SubmissionAggregate>,
    pub global: Bucket,
    /// Per-section character counts of every review, in section order.
    pub section_lengths: [Vec<f64>; 4],
    pub reviews_without_institution: usize,
    pub excluded: Excluded,
}

/// Folds every submission of `dataset` in canonical order.
#[tracing::instrument(skip_all, fields(submissions = dataset.submissions.len()))]
pub fn aggregate(dataset: &Dataset, thresholds: &Thresholds) -> Aggregates {
    let mut state = AggregateState::default();
    for submission in &dataset.submissions {
        state.fold_submission(dataset, submission, thresholds);
    }
    state.finalize()
}

/// Folds contiguous submission ranges on rayon workers, merges the partial
/// states in range order and finalizes once. Equal to [`aggregate`].
#[tracing::instrument(skip(dataset, thresholds), fields(submissions = dataset.submissions.len()))]
pub fn aggregate_sharded(dataset: &Dataset, thresholds: &Thresholds, shards: usize) -> Aggregates {
    let shards = shards.max(1);
    let chunk = dataset.submissions.len().div_ceil(shards).max(1);

    let partials: Vec<AggregateState> = dataset
        .submissions
        .par_chunks(chunk)
        .map(|range| {
            let mut state = AggregateState::default();
            for submission in range {
                state.fold_submission(dataset, submission, thresholds);
            }
            state
        })
        .collect();

    let mut merged = AggregateState::default();
    for partial in partials {
        merged.merge(partial);
    }
    tracing::debug!(shards, chunk, "Shard states merged");
    merged.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_support::{DatasetBuilder, review, review_with_text};
    use proptest::prelude::*;

    fn two_institution_dataset() -> Dataset {
        let mut b = DatasetBuilder::default();
        let r1 = b.person("r1", "China", &["Tsinghua University", "Microsoft Research"]);
        let r2 = b.person("r2", "United States", &["Stanford University"]);
        let a1 = b.person("a1", "China", &["Peking University"]);
        let a2 = b.person("a2", "Germany", &["Peking University"]);
        b.submission(
            1,
            &[a1, a2],
            vec![
                review_with_text(r1, "r1", 6.0, 120),
                review_with_text(r2, "r2", 4.0, 80),
            ],
        );
        b.build()
    }

    #[test]
    fn test_reviewer_institutions_fan_out() {
        let dataset = two_institution_dataset();
        let agg = aggregate(&dataset, &Thresholds::default());

        let names: Vec<(&str, usize)> = agg
            .reviewer_institutions
            .iter()
            .map(|(id, b)| (dataset.graph.institution(*id).name.as_str(), b.review_count))
            .collect();
        assert_eq!(
            names,
            vec![
                ("Tsinghua University", 1),
                ("Microsoft", 1),
                ("Stanford University", 1)
            ]
        );
        assert_eq!(agg.global.review_count, 2);
    }

    #[test]
    fn test_author_institution_counted_once_per_review() {
        let dataset = two_institution_dataset();
        let agg = aggregate(&dataset, &Thresholds::default());

        assert_eq!(agg.author_institutions.len(), 1);
        let pku = agg.author_institutions.values().next().unwrap();
        assert_eq!(pku.review_count, 2);
        assert_eq!(pku.submission_count, 1);
        assert_eq!(pku.avg_rating(), Some(5.0));
        // Three reviewer institutions, one author institution.
        assert_eq!(agg.flows.len(), 3);
    }

    #[test]
    fn test_cross_country_buckets() {
        let dataset = two_institution_dataset();
        let agg = aggregate(&dataset, &Thresholds::default());

        assert!(agg.same_country.is_empty());
        assert_eq!(agg.cross["United States"].ratings(), &[4.0]);
        assert!(!agg.cross.contains_key("China"));
        let targets: Vec<&str> = agg
            .country_pairs
            .keys()
            .map(|(_, target)| target.as_str())
            .collect();
        assert_eq!(targets, vec!["China", "Germany"]);
    }

    #[test]
    fn test_same_country_co_reviewer_pairs() {
        let mut b = DatasetBuilder::default();
        let j1 = b.person("j1", "Japan", &[]);
        let j2 = b.person("j2", "Japan", &[]);
        let j3 = b.person("j3", "Japan", &[]);
        let k1 = b.person("k1", "South Korea", &[]);
        let u1 = b.person("u1", "", &[]);
        let u2 = b.person("u2", "", &[]);
        let author = b.person("fa", "France", &[]);
        b.submission(
            1,
            &[author],
            vec![
                review(j1, "j1", Some(4.0)),
                review(j2, "j2", Some(8.0)),
                review(j3, "j3", None),
                review(k1, "k1", Some(2.0)),
                review(u1, "u1", Some(1.0)),
                review(u2, "u2", Some(9.0)),
            ],
        );
        b.submission(2, &[author], vec![review(j1, "j1", Some(3.0))]);
        let agg = aggregate(&b.build(), &Thresholds::default());

        // One unordered pair counted in both orders; unrated and unknown seats skipped.
        assert_eq!(agg.same_country.len(), 1);
        assert_eq!(agg.same_country["Japan"], vec![6.0, 6.0]);
        assert_eq!(agg.cross["Japan"].ratings(), &[4.0, 8.0, 3.0]);
    }

    #[test]
    fn test_germany_folds_into_both_clusters() {
        let mut b = DatasetBuilder::default();
        let r = b.person("r", "Germany", &[]);
        b.submission(1, &[], vec![review(r, "r", Some(5.0))]);
        let agg = aggregate(&b.build(), &Thresholds::default());

        let clusters: Vec<CulturalCluster> = agg.clusters.keys().copied().collect();
        assert_eq!(
            clusters,
            vec![CulturalCluster::Western, CulturalCluster::European]
        );
        assert_eq!(agg.reviews_without_institution, 1);
    }

    #[test]
    fn test_out_of_range_values_are_excluded() {
        let mut b = DatasetBuilder::default();
        let r = b.person("r", "France", &[]);
        let mut bad = review(r, "r", Some(11.0));
        bad.confidence = Some(0.0);
        b.submission(1, &[], vec![bad, review(r, "r", Some(4.0))]);
        let agg = aggregate(&b.build(), &Thresholds::default());

        assert_eq!(agg.global.ratings(), &[4.0]);
        assert_eq!(agg.global.confidences(), &[3.0]);
        assert_eq!(agg.global.review_count, 2);
        assert_eq!(
            agg.excluded,
            Excluded {
                ratings: 1,
                confidences: 1
            }
        );
    }

    #[test]
    fn test_submission_bucket_statistics() {
        let mut b = DatasetBuilder::default();
        let ratings = [2.0, 4.0, 4.0, 6.0, 8.0];
        let reviews = ratings
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let id = format!("r{i}");
                let person = b.person(&id, "Japan", &[]);
                review(person, &id, Some(*r))
            })
            .collect();
        b.submission(7, &[], reviews);
        let agg = aggregate(&b.build(), &Thresholds::default());

        let sub = &agg.submissions[0];
        let rating = sub.bucket.rating.unwrap();
        assert_eq!(sub.number, 7);
        assert_eq!(sub.panel.len(), 5);
        assert_eq!(rating.mean, 4.8);
        assert!((rating.std - 2.0396).abs() < 1e-4);
        assert_eq!(rating.median, 4.0);
        assert_eq!((rating.min, rating.max), (2.0, 8.0));
        assert_eq!(agg.positions.len(), 5);
    }

    fn synthetic_dataset(ratings: &[Vec<u8>]) -> Dataset {
        let mut b = DatasetBuilder::default();
        let countries = ["China", "Germany", "India", "Brazil"];
        let institutions = ["MIT", "Google", "Tsinghua University"];
        for (n, panel) in ratings.iter().enumerate() {
            let author = b.person(
                &format!("a{n}"),
                countries[n % countries.len()],
                &[institutions[n % institutions.len()]],
            );
            let reviews = panel
                .iter()
                .enumerate()
                .map(|(i, r)| {
                    let id = format!("r{}", (n + i) % 7);
                    let person = b.person(
                        &id,
                        countries[(n + i) % countries.len()],
                        &[institutions[i % institutions.len()]],
                    );
                    review_with_text(person, &id, *r as f64, (n * 37 + i * 11) % 400)
                })
                .collect();
            b.submission(n as u32 + 1, &[author], reviews);
        }
        b.build()
    }

    #[test]
    fn test_sharded_pass_equals_sequential() {
        let panels: Vec<Vec<u8>> = (0..9)
            .map(|n| (0..3).map(|i| ((n * 3 + i) % 10 + 1) as u8).collect())
            .collect();
        let dataset = synthetic_dataset(&panels);
        let sequential = aggregate(&dataset, &Thresholds::default());
        for shards in 1..=5 {
            assert_eq!(
                aggregate_sharded(&dataset, &Thresholds::default(), shards),
                sequential
            );
        }
    }

    proptest! {
        #[test]
        fn prop_shard_merge_matches_sequential(
            panels in prop::collection::vec(prop::collection::vec(0u8..=12, 1..5), 1..12),
            shards in 1usize..6,
        ) {
            let dataset = synthetic_dataset(&panels);
            let thresholds = Thresholds::default();
            prop_assert_eq!(
                aggregate_sharded(&dataset, &thresholds, shards),
                aggregate(&dataset, &thresholds)
            );
        }
    }
}
