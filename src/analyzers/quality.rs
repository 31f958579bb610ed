//! Data-quality findings: missing fields, out-of-range values, invalid ids,
//! completeness tiers and people-record gaps.

use crate::analyzers::aggregate::Aggregates;
use crate::analyzers::utility::percentage;
use crate::config::Thresholds;
use crate::model::{Dataset, ReviewMetrics, Section};
use crate::stats::SkipCounts;
use serde::{Deserialize, Serialize};

/// Highest completeness score a review can reach.
pub const MAX_COMPLETENESS: u8 = 7;
/// Lowest score counted as a partial review.
pub const PARTIAL_COMPLETENESS: u8 = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldCount {
    pub count: usize,
    pub percentage: f64,
}

impl FieldCount {
    fn of(count: usize, total: usize) -> Self {
        Self {
            count,
            percentage: percentage(count, total),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MissingData {
    pub rating: FieldCount,
    pub confidence: FieldCount,
    pub reviewer_id: FieldCount,
    pub content_summary: FieldCount,
    pub content_strengths: FieldCount,
    pub content_weaknesses: FieldCount,
    pub content_questions: FieldCount,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutOfRangeRating {
    pub submission_num: u32,
    pub rating: f64,
    pub reviewer_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutOfRangeConfidence {
    pub submission_num: u32,
    pub confidence: f64,
    pub reviewer_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvalidReviewerId {
    pub submission_num: u32,
    pub reviewer_id: String,
    #[serde(rename = "type")]
    pub id_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvalidValues {
    pub out_of_range_ratings: Vec<OutOfRangeRating>,
    pub out_of_range_confidences: Vec<OutOfRangeConfidence>,
    pub invalid_reviewer_ids: Vec<InvalidReviewerId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletenessAnalysis {
    pub total_reviews: usize,
    pub complete_reviews: FieldCount,
    pub partial_reviews: FieldCount,
    pub incomplete_reviews: FieldCount,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeopleDataQuality {
    pub missing_gender: FieldCount,
    pub missing_nationality: FieldCount,
    pub invalid_affiliations: FieldCount,
    pub total_people: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestionSummary {
    pub skipped_records: SkipCounts,
    pub withdrawn_submissions: usize,
    pub ratings_excluded_from_statistics: usize,
    pub confidences_excluded_from_statistics: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataQuality {
    pub missing_data: MissingData,
    pub invalid_values: InvalidValues,
    pub completeness_analysis: CompletenessAnalysis,
    pub people_data_quality: PeopleDataQuality,
    pub ingestion: IngestionSummary,
}

#[derive(Default)]
struct Tally {
    total: usize,
    rating: usize,
    confidence: usize,
    reviewer_id: usize,
    sections: [usize; 4],
    complete: usize,
    partial: usize,
    incomplete: usize,
}

#[tracing::instrument(skip_all)]
pub fn analyze(dataset: &Dataset, agg: &Aggregates, t: &Thresholds) -> DataQuality {
    let mut tally = Tally::default();
    let mut invalid = InvalidValues::default();

    for (submission, _, review) in dataset.reviews() {
        tally.total += 1;
        tally.rating += review.rating.is_none() as usize;
        tally.confidence += review.confidence.is_none() as usize;
        tally.reviewer_id += !review.reviewer_id_provided as usize;
        for (missing, section) in tally.sections.iter_mut().zip(Section::ALL) {
            *missing += !review.content.has(section) as usize;
        }

        let reviewer_id = review
            .reviewer_id_provided
            .then(|| review.reviewer_id.clone());
        if let Some(rating) = review.rating.filter(|r| !t.rating_in_range(*r)) {
            invalid.out_of_range_ratings.push(OutOfRangeRating {
                submission_num: submission.number,
                rating,
                reviewer_id: reviewer_id.clone(),
            });
        }
        if let Some(confidence) = review.confidence.filter(|c| !t.confidence_in_range(*c)) {
            invalid.out_of_range_confidences.push(OutOfRangeConfidence {
                submission_num: submission.number,
                confidence,
                reviewer_id,
            });
        }
        if let Some(id_type) = review.reviewer_id_type {
            invalid.invalid_reviewer_ids.push(InvalidReviewerId {
                submission_num: submission.number,
                reviewer_id: review.reviewer_id.clone(),
                id_type: id_type.to_string(),
            });
        }

        match ReviewMetrics::of(review).completeness {
            MAX_COMPLETENESS => tally.complete += 1,
            c if c >= PARTIAL_COMPLETENESS => tally.partial += 1,
            _ => tally.incomplete += 1,
        }
    }

    let total = tally.total;
    let [summary, strengths, weaknesses, questions] = tally.sections;
    let missing_data = MissingData {
        rating: FieldCount::of(tally.rating, total),
        confidence: FieldCount::of(tally.confidence, total),
        reviewer_id: FieldCount::of(tally.reviewer_id, total),
        content_summary: FieldCount::of(summary, total),
        content_strengths: FieldCount::of(strengths, total),
        content_weaknesses: FieldCount::of(weaknesses, total),
        content_questions: FieldCount::of(questions, total),
    };

    let total_people = dataset.graph.person_count();
    let (mut gender, mut nationality, mut affiliations) = (0, 0, 0);
    for (_, person) in dataset.graph.people() {
        gender += !person.gender_known() as usize;
        nationality += !person.nationality_known() as usize;
        affiliations += person.institutions.is_empty() as usize;
    }
    let people_data_quality = PeopleDataQuality {
        missing_gender: FieldCount::of(gender, total_people),
        missing_nationality: FieldCount::of(nationality, total_people),
        invalid_affiliations: FieldCount::of(affiliations, total_people),
        total_people,
    };

    tracing::debug!(
        total,
        out_of_range_ratings = invalid.out_of_range_ratings.len(),
        invalid_ids = invalid.invalid_reviewer_ids.len(),
        "Data quality assessed"
    );

    DataQuality {
        missing_data,
        invalid_values: invalid,
        completeness_analysis: CompletenessAnalysis {
            total_reviews: total,
            complete_reviews: FieldCount::of(tally.complete, total),
            partial_reviews: FieldCount::of(tally.partial, total),
            incomplete_reviews: FieldCount::of(tally.incomplete, total),
        },
        people_data_quality,
        ingestion: IngestionSummary {
            skipped_records: dataset.skipped,
            withdrawn_submissions: dataset.withdrawn_submissions,
            ratings_excluded_from_statistics: agg.excluded.ratings,
            confidences_excluded_from_statistics: agg.excluded.confidences,
        },
    }
}
