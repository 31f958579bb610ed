//! Review text anomalies: empty, very short or very long reviews, missing
//! core sections and duplicated text.

use crate::analyzers::aggregate::Aggregates;
use crate::analyzers::ranking::{EntityId, Ranked, top_by_count};
use crate::analyzers::utility::{mean, median, percentage, round_to, stddev};
use crate::config::{Limits, Thresholds};
use crate::model::{Dataset, Review, ReviewMetrics, Section};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};

/// Sections whose absence counts toward `missing_sections`.
const CORE_SECTIONS: [Section; 3] = [Section::Summary, Section::Strengths, Section::Weaknesses];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRef {
    pub submission_num: u32,
    pub reviewer_id: String,
    pub review_index: usize,
    pub total_length: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortReview {
    #[serde(flatten)]
    pub review: ReviewRef,
    pub summary_len: usize,
    pub strengths_len: usize,
    pub weaknesses_len: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingSections {
    #[serde(flatten)]
    pub review: ReviewRef,
    pub missing_sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub duplicate_count: usize,
    pub reviews: Vec<ReviewRef>,
    pub content_hash: String,
}

impl Ranked for DuplicateGroup {
    fn sample_count(&self) -> usize {
        self.duplicate_count
    }

    fn entity_id(&self) -> EntityId<'_> {
        EntityId::Name(&self.content_hash)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnomalousContent {
    pub empty_content: Vec<ReviewRef>,
    pub extremely_short: Vec<ShortReview>,
    pub extremely_long: Vec<ReviewRef>,
    pub missing_sections: Vec<MissingSections>,
    pub duplicate_content: Vec<DuplicateGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionStatistics {
    pub avg_length: f64,
    pub median_length: f64,
    pub zero_count: usize,
    pub zero_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentStatistics {
    pub total_reviews: usize,
    pub avg_text_length: f64,
    pub median_text_length: f64,
    pub text_length_std: f64,
    pub section_statistics: BTreeMap<Section, SectionStatistics>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentAnomalies {
    pub anomalous_content: AnomalousContent,
    pub content_statistics: ContentStatistics,
}

/// SHA-256 over summary, strengths and weaknesses, each terminated by a unit
/// separator so that moving text between sections changes the digest.
pub fn content_fingerprint(review: &Review) -> String {
    let mut hasher = Sha256::new();
    for section in CORE_SECTIONS {
        hasher.update(review.content.section(section).unwrap_or_default().as_bytes());
        hasher.update([0x1f_u8]);
    }
    format!("{:x}", hasher.finalize())
}

fn by_length<T>(mut items: Vec<T>, review: impl Fn(&T) -> &ReviewRef, n: usize) -> Vec<T> {
    items.sort_by(|a, b| {
        let (a, b) = (review(a), review(b));
        a.total_length
            .cmp(&b.total_length)
            .then(a.submission_num.cmp(&b.submission_num))
            .then(a.review_index.cmp(&b.review_index))
    });
    items.truncate(n);
    items
}

#[tracing::instrument(skip_all)]
pub fn analyze(
    dataset: &Dataset,
    agg: &Aggregates,
    t: &Thresholds,
    limits: &Limits,
) -> ContentAnomalies {
    let mut out = AnomalousContent::default();
    let mut groups: Vec<(String, Vec<ReviewRef>)> = Vec::new();
    let mut group_index: HashMap<String, usize> = HashMap::new();

    for (submission, index, review) in dataset.reviews() {
        let metrics = ReviewMetrics::of(review);
        let [summary_len, strengths_len, weaknesses_len, _] = metrics.section_lengths;
        let review_ref = ReviewRef {
            submission_num: submission.number,
            reviewer_id: review.reviewer_id.clone(),
            review_index: index,
            total_length: metrics.total_length,
        };

        if metrics.total_length == 0 {
            out.empty_content.push(review_ref.clone());
        } else if metrics.total_length < t.short_review_length {
            out.extremely_short.push(ShortReview {
                review: review_ref.clone(),
                summary_len,
                strengths_len,
                weaknesses_len,
            });
        } else if metrics.total_length > t.long_review_length {
            out.extremely_long.push(review_ref.clone());
        }

        let missing: Vec<Section> = CORE_SECTIONS
            .into_iter()
            .filter(|s| !review.content.has(*s))
            .collect();
        if missing.len() >= 2 {
            out.missing_sections.push(MissingSections {
                review: review_ref.clone(),
                missing_sections: missing,
            });
        }

        if summary_len + strengths_len + weaknesses_len > t.duplicate_min_length {
            let hash = content_fingerprint(review);
            let slot = *group_index.entry(hash.clone()).or_insert_with(|| {
                groups.push((hash, Vec::new()));
                groups.len() - 1
            });
            groups[slot].1.push(review_ref);
        }
    }

    let n = limits.content_top_n;
    let duplicates: Vec<DuplicateGroup> = groups
        .into_iter()
        .filter(|(_, reviews)| reviews.len() > 1)
        .map(|(content_hash, reviews)| DuplicateGroup {
            duplicate_count: reviews.len(),
            reviews,
            content_hash,
        })
        .collect();
    out.duplicate_content = top_by_count(duplicates, n);
    out.extremely_short = by_length(out.extremely_short, |s| &s.review, n);
    out.extremely_long = by_length(out.extremely_long, |r| r, n);
    out.missing_sections = by_length(out.missing_sections, |m| &m.review, n);

    tracing::debug!(
        empty = out.empty_content.len(),
        short = out.extremely_short.len(),
        duplicates = out.duplicate_content.len(),
        "Content anomalies detected"
    );

    ContentAnomalies {
        anomalous_content: out,
        content_statistics: statistics(agg),
    }
}

fn statistics(agg: &Aggregates) -> ContentStatistics {
    let lengths = agg.global.text_lengths();
    let m = mean(lengths);

    let section_statistics = Section::ALL
        .into_iter()
        .zip(&agg.section_lengths)
        .map(|(section, values)| {
            let zeros = values.iter().filter(|v| **v == 0.0).count();
            (
                section,
                SectionStatistics {
                    avg_length: round_to(mean(values), 0),
                    median_length: round_to(median(values), 0),
                    zero_count: zeros,
                    zero_percentage: percentage(zeros, values.len()),
                },
            )
        })
        .collect();

    ContentStatistics {
        total_reviews: lengths.len(),
        avg_text_length: round_to(m, 0),
        median_text_length: round_to(median(lengths), 0),
        text_length_std: round_to(stddev(lengths, m), 0),
        section_statistics,
    }
}
