//! Institution metrics, leaderboards, reviewer-to-author institution flows
//! and per-country / per-type roll-ups.

use crate::analyzers::aggregate::{Aggregates, Bucket};
use crate::analyzers::ranking::{Direction, EntityId, Ranked, top_by_count, top_n};
use crate::analyzers::utility::{mean, round2, round3};
use crate::config::{Limits, Thresholds};
use crate::identity::{IdentityGraph, InstitutionId};
use crate::normalize::InstitutionType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How an institution's members review.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewerSide {
    pub review_count: usize,
    pub reviewer_count: usize,
    pub avg_rating: Option<f64>,
    pub median_rating: Option<f64>,
    pub rating_std: Option<f64>,
    pub avg_confidence: Option<f64>,
    pub avg_text_words: f64,
    pub avg_question_words: f64,
    pub rating_conf_corr: Option<f64>,
}

/// How submissions with an author from the institution are reviewed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorSide {
    pub submission_count: usize,
    pub review_count: usize,
    pub avg_rating: Option<f64>,
    pub median_rating: Option<f64>,
    pub rating_std: Option<f64>,
    pub avg_confidence: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstitutionMetrics {
    pub institution: String,
    pub country: String,
    #[serde(rename = "type")]
    pub kind: InstitutionType,
    pub author_count: usize,
    pub reviewer_count: usize,
    pub total_members: usize,
    pub reviewer_side: ReviewerSide,
    pub author_side: AuthorSide,
}

/// A leaderboard row. `count` is the gated sample: distinct reviewers on the
/// reviewer side, submissions on the author side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub institution: String,
    pub value: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Leaderboards {
    pub lenient_institutions: Vec<Standing>,
    pub strict_institutions: Vec<Standing>,
    pub volatile_institutions: Vec<Standing>,
    pub steady_institutions: Vec<Standing>,
    pub verbose_institutions: Vec<Standing>,
    pub concise_institutions: Vec<Standing>,
    pub question_heavy_institutions: Vec<Standing>,
    pub confidence_outliers: Vec<Standing>,
    pub author_side_high: Vec<Standing>,
    pub author_side_low: Vec<Standing>,
    pub author_side_stable: Vec<Standing>,
    pub author_side_volatile: Vec<Standing>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    pub reviewer_institution: String,
    pub author_institution: String,
    pub count: usize,
    pub avg_rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRollup {
    pub group: String,
    /// Mean of the member institutions' reviewer-side averages.
    pub avg_rating: Option<f64>,
    pub avg_confidence: Option<f64>,
    pub review_count: usize,
    pub institution_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstitutionRankings {
    pub total_institutions: usize,
    pub reviewer_side_ranked: usize,
    pub author_side_ranked: usize,
    pub reviews_without_institution: usize,
    pub rankings: Leaderboards,
    pub flows: Vec<Flow>,
    pub by_country: Vec<GroupRollup>,
    pub by_type: Vec<GroupRollup>,
}

impl Ranked for Standing {
    fn sample_count(&self) -> usize {
        self.count
    }

    fn entity_id(&self) -> EntityId<'_> {
        EntityId::Name(&self.institution)
    }
}

impl Ranked for Flow {
    fn sample_count(&self) -> usize {
        self.count
    }

    fn entity_id(&self) -> EntityId<'_> {
        EntityId::Pair(&self.reviewer_institution, &self.author_institution)
    }
}

fn reviewer_side(bucket: Option<&Bucket>) -> ReviewerSide {
    let Some(b) = bucket else {
        return ReviewerSide::default();
    };
    ReviewerSide {
        review_count: b.review_count,
        reviewer_count: b.reviewer_count,
        avg_rating: b.avg_rating().map(round2),
        median_rating: b.rating.map(|d| round2(d.median)),
        rating_std: b.rating_std().map(round2),
        avg_confidence: b.avg_confidence().map(round2),
        avg_text_words: round2(b.avg_text_words),
        avg_question_words: round2(b.avg_question_words),
        rating_conf_corr: b.rating_confidence_corr.map(round3),
    }
}

fn author_side(bucket: Option<&Bucket>) -> AuthorSide {
    let Some(b) = bucket else {
        return AuthorSide::default();
    };
    AuthorSide {
        submission_count: b.submission_count,
        review_count: b.review_count,
        avg_rating: b.avg_rating().map(round2),
        median_rating: b.rating.map(|d| round2(d.median)),
        rating_std: b.rating_std().map(round2),
        avg_confidence: b.avg_confidence().map(round2),
    }
}

/// One row per institution in the graph, in institution order.
pub fn metrics(agg: &Aggregates, graph: &IdentityGraph) -> Vec<InstitutionMetrics> {
    graph
        .institutions()
        .map(|(id, inst)| InstitutionMetrics {
            institution: inst.name.clone(),
            country: inst.country.clone(),
            kind: inst.kind,
            author_count: inst.author_count,
            reviewer_count: inst.reviewer_count,
            total_members: inst.total_members,
            reviewer_side: reviewer_side(agg.reviewer_institutions.get(&id)),
            author_side: author_side(agg.author_institutions.get(&id)),
        })
        .collect()
}

fn board(
    rows: &[&InstitutionMetrics],
    value: impl Fn(&InstitutionMetrics) -> Option<f64>,
    count: impl Fn(&InstitutionMetrics) -> usize,
    direction: Direction,
    n: usize,
) -> Vec<Standing> {
    let standings = rows
        .iter()
        .filter_map(|m| {
            Some(Standing {
                institution: m.institution.clone(),
                value: value(m)?,
                count: count(m),
            })
        })
        .collect();
    top_n(standings, |s| s.value, direction, n)
}

fn leaderboards(all: &[InstitutionMetrics], t: &Thresholds, n: usize) -> (Leaderboards, usize, usize) {
    let reviewed: Vec<&InstitutionMetrics> = all
        .iter()
        .filter(|m| m.reviewer_side.reviewer_count >= t.institution_min_reviewers)
        .collect();
    let authored: Vec<&InstitutionMetrics> = all
        .iter()
        .filter(|m| m.author_side.submission_count >= t.institution_author_min_submissions)
        .collect();

    let reviewers = |m: &InstitutionMetrics| m.reviewer_side.reviewer_count;
    let submissions = |m: &InstitutionMetrics| m.author_side.submission_count;
    use Direction::{Ascending, Descending};

    let boards = Leaderboards {
        lenient_institutions: board(&reviewed, |m| m.reviewer_side.avg_rating, reviewers, Descending, n),
        strict_institutions: board(&reviewed, |m| m.reviewer_side.avg_rating, reviewers, Ascending, n),
        volatile_institutions: board(&reviewed, |m| m.reviewer_side.rating_std, reviewers, Descending, n),
        steady_institutions: board(&reviewed, |m| m.reviewer_side.rating_std, reviewers, Ascending, n),
        verbose_institutions: board(
            &reviewed,
            |m| Some(m.reviewer_side.avg_text_words),
            reviewers,
            Descending,
            n,
        ),
        concise_institutions: board(
            &reviewed,
            |m| Some(m.reviewer_side.avg_text_words),
            reviewers,
            Ascending,
            n,
        ),
        question_heavy_institutions: board(
            &reviewed,
            |m| Some(m.reviewer_side.avg_question_words),
            reviewers,
            Descending,
            n,
        ),
        confidence_outliers: board(
            &reviewed,
            |m| m.reviewer_side.rating_conf_corr,
            reviewers,
            Ascending,
            n,
        ),
        author_side_high: board(&authored, |m| m.author_side.avg_rating, submissions, Descending, n),
        author_side_low: board(&authored, |m| m.author_side.avg_rating, submissions, Ascending, n),
        author_side_stable: board(&authored, |m| m.author_side.rating_std, submissions, Ascending, n),
        author_side_volatile: board(&authored, |m| m.author_side.rating_std, submissions, Descending, n),
    };
    (boards, reviewed.len(), authored.len())
}

fn flows(agg: &Aggregates, graph: &IdentityGraph, n: usize) -> Vec<Flow> {
    let name = |id: InstitutionId| graph.institution(id).name.clone();
    let all = agg
        .flows
        .iter()
        .map(|((reviewer, author), bucket)| Flow {
            reviewer_institution: name(*reviewer),
            author_institution: name(*author),
            count: bucket.review_count,
            avg_rating: bucket.avg_rating().map(round2),
        })
        .collect();
    top_by_count(all, n)
}

#[derive(Default)]
struct Rollup {
    ratings: Vec<f64>,
    confidences: Vec<f64>,
    review_count: usize,
    institution_count: usize,
}

fn rollups<'a>(
    all: &'a [InstitutionMetrics],
    group: impl Fn(&'a InstitutionMetrics) -> &'a str,
) -> Vec<GroupRollup> {
    let mut groups: BTreeMap<&str, Rollup> = BTreeMap::new();
    for m in all {
        let entry = groups.entry(group(m)).or_default();
        entry.ratings.extend(m.reviewer_side.avg_rating);
        entry.confidences.extend(m.reviewer_side.avg_confidence);
        entry.review_count += m.reviewer_side.review_count;
        entry.institution_count += 1;
    }
    groups
        .into_iter()
        .map(|(group, r)| GroupRollup {
            group: group.to_string(),
            avg_rating: (!r.ratings.is_empty()).then(|| round2(mean(&r.ratings))),
            avg_confidence: (!r.confidences.is_empty()).then(|| round2(mean(&r.confidences))),
            review_count: r.review_count,
            institution_count: r.institution_count,
        })
        .collect()
}

#[tracing::instrument(skip_all)]
pub fn analyze(
    all: &[InstitutionMetrics],
    agg: &Aggregates,
    graph: &IdentityGraph,
    t: &Thresholds,
    limits: &Limits,
) -> InstitutionRankings {
    let (rankings, reviewer_side_ranked, author_side_ranked) =
        leaderboards(all, t, limits.institution_top_n);

    tracing::debug!(
        institutions = all.len(),
        reviewer_side_ranked,
        author_side_ranked,
        flows = agg.flows.len(),
        "Institution rankings computed"
    );

    InstitutionRankings {
        total_institutions: all.len(),
        reviewer_side_ranked,
        author_side_ranked,
        reviews_without_institution: agg.reviews_without_institution,
        rankings,
        flows: flows(agg, graph, limits.flow_top_n),
        by_country: rollups(all, |m| m.country.as_str()),
        by_type: rollups(all, |m| m.kind.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::aggregate::aggregate;
    use crate::model::Dataset;
    use crate::model::test_support::{DatasetBuilder, review};

    /// `reviewers` people from `inst` each rate one submission by `author`.
    fn panel(
        b: &mut DatasetBuilder,
        inst: &str,
        reviewers: usize,
        rating: f64,
        next: &mut u32,
        author: crate::identity::PersonId,
    ) {
        for i in 0..reviewers {
            let id = format!("{inst}-{i}");
            let person = b.person(&id, "Canada", &[inst]);
            *next += 1;
            b.submission(*next, &[author], vec![review(person, &id, Some(rating))]);
        }
    }

    fn run(dataset: &Dataset) -> (Vec<InstitutionMetrics>, InstitutionRankings) {
        let t = Thresholds::default();
        let agg = aggregate(dataset, &t);
        let all = metrics(&agg, &dataset.graph);
        let rankings = analyze(&all, &agg, &dataset.graph, &t, &Limits::default());
        (all, rankings)
    }

    #[test]
    fn test_reviewer_side_gate_and_order() {
        let mut b = DatasetBuilder::default();
        let author = b.person("author", "Canada", &["University of Toronto"]);
        let mut next = 0;
        panel(&mut b, "McGill University", 20, 7.0, &mut next, author);
        panel(&mut b, "Google", 20, 4.0, &mut next, author);
        panel(&mut b, "Microsoft", 19, 9.0, &mut next, author);
        let (_, report) = run(&b.build());

        assert_eq!(report.reviewer_side_ranked, 2);
        let lenient: Vec<&str> = report
            .rankings
            .lenient_institutions
            .iter()
            .map(|s| s.institution.as_str())
            .collect();
        assert_eq!(lenient, vec!["McGill University", "Google DeepMind"]);
        assert_eq!(report.rankings.strict_institutions[0].institution, "Google DeepMind");
        assert_eq!(report.rankings.strict_institutions[0].count, 20);
        // No confidence variation: correlation undefined, nobody listed.
        assert!(report.rankings.confidence_outliers.is_empty());
    }

    #[test]
    fn test_author_side_and_flows() {
        let mut b = DatasetBuilder::default();
        let author = b.person("author", "Canada", &["University of Toronto"]);
        let mut next = 0;
        panel(&mut b, "McGill University", 2, 6.0, &mut next, author);
        panel(&mut b, "Google", 1, 3.0, &mut next, author);
        let (all, report) = run(&b.build());

        let toronto = all
            .iter()
            .find(|m| m.institution == "University of Toronto")
            .unwrap();
        assert_eq!(toronto.author_side.submission_count, 3);
        assert_eq!(toronto.author_side.avg_rating, Some(5.0));
        assert_eq!(toronto.reviewer_side.review_count, 0);
        assert_eq!(report.author_side_ranked, 1);
        assert_eq!(report.rankings.author_side_high[0].value, 5.0);

        assert_eq!(report.flows.len(), 2);
        assert_eq!(report.flows[0].reviewer_institution, "McGill University");
        assert_eq!(report.flows[0].author_institution, "University of Toronto");
        assert_eq!(report.flows[0].count, 2);
        assert_eq!(report.flows[1].avg_rating, Some(3.0));
    }

    #[test]
    fn test_rollups_average_institution_means() {
        let mut b = DatasetBuilder::default();
        let author = b.person("author", "Canada", &[]);
        let mut next = 0;
        panel(&mut b, "McGill University", 3, 6.0, &mut next, author);
        panel(&mut b, "University of Toronto", 1, 4.0, &mut next, author);
        let (_, report) = run(&b.build());

        let canada = report.by_country.iter().find(|g| g.group == "Canada").unwrap();
        assert_eq!(canada.avg_rating, Some(5.0));
        assert_eq!(canada.review_count, 4);
        assert_eq!(canada.institution_count, 2);
        let universities = report.by_type.iter().find(|g| g.group == "University").unwrap();
        assert_eq!(universities.institution_count, 2);
        assert_eq!(report.reviews_without_institution, 0);
    }
}
