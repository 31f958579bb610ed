//! Typed dataset records, resolved once at ingestion.

use crate::identity::{IdentityGraph, PersonId};
use crate::stats::SkipCounts;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Author,
    Reviewer,
}

/// The four free-text sections of a review, in their canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Summary,
    Strengths,
    Weaknesses,
    Questions,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Summary,
        Section::Strengths,
        Section::Weaknesses,
        Section::Questions,
    ];

    /// Minimum character count for a section to count toward content quality.
    pub fn quality_threshold(&self) -> usize {
        match self {
            Section::Summary => 50,
            Section::Strengths => 30,
            Section::Weaknesses => 30,
            Section::Questions => 20,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Summary => "summary",
            Section::Strengths => "strengths",
            Section::Weaknesses => "weaknesses",
            Section::Questions => "questions",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewContent {
    pub summary: Option<String>,
    pub strengths: Option<String>,
    pub weaknesses: Option<String>,
    pub questions: Option<String>,
}

impl ReviewContent {
    pub fn section(&self, section: Section) -> Option<&str> {
        match section {
            Section::Summary => self.summary.as_deref(),
            Section::Strengths => self.strengths.as_deref(),
            Section::Weaknesses => self.weaknesses.as_deref(),
            Section::Questions => self.questions.as_deref(),
        }
    }

    /// A section counts as present when it is non-empty.
    pub fn has(&self, section: Section) -> bool {
        self.section(section).is_some_and(|s| !s.is_empty())
    }

    /// Character counts (Unicode scalar values) per section, in [`Section::ALL`] order.
    pub fn section_lengths(&self) -> [usize; 4] {
        Section::ALL.map(|s| self.section(s).map_or(0, |t| t.chars().count()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub review_id: Option<String>,
    pub reviewer: PersonId,
    /// Identifier as referenced by reports: the given id or its synthesized placeholder.
    pub reviewer_id: String,
    pub reviewer_id_provided: bool,
    /// JSON type of a reviewer id that was present but not a string.
    pub reviewer_id_type: Option<&'static str>,
    pub rating: Option<f64>,
    pub confidence: Option<f64>,
    pub content: ReviewContent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub number: u32,
    pub authors: Vec<PersonId>,
    pub reviews: Vec<Review>,
}

/// A fully ingested snapshot: submissions with at least one review, ordered
/// by number, plus the identity graph they reference.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub submissions: Vec<Submission>,
    pub graph: IdentityGraph,
    pub skipped: SkipCounts,
    pub withdrawn_submissions: usize,
}

impl Dataset {
    pub fn review_count(&self) -> usize {
        self.submissions.iter().map(|s| s.reviews.len()).sum()
    }

    /// Iterates every (submission, position, review) triple in canonical order.
    pub fn reviews(&self) -> impl Iterator<Item = (&Submission, usize, &Review)> {
        self.submissions
            .iter()
            .flat_map(|s| s.reviews.iter().enumerate().map(move |(i, r)| (s, i, r)))
    }
}

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+").expect("word pattern must compile"));

pub fn count_words(text: &str) -> usize {
    WORD.find_iter(text).count()
}

/// Per-review derived metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewMetrics {
    pub section_lengths: [usize; 4],
    pub total_length: usize,
    pub text_words: usize,
    pub question_words: usize,
    pub content_quality: u8,
    pub completeness: u8,
}

impl ReviewMetrics {
    pub fn of(review: &Review) -> Self {
        let content = &review.content;
        let section_lengths = content.section_lengths();
        let total_length = section_lengths.iter().sum();

        let content_quality = Section::ALL
            .iter()
            .zip(section_lengths)
            .filter(|(section, len)| *len > section.quality_threshold())
            .count() as u8;

        let text_words = Section::ALL
            .iter()
            .filter_map(|s| content.section(*s))
            .map(count_words)
            .sum();
        let question_words = content.questions.as_deref().map_or(0, count_words);

        let sections_present = Section::ALL.iter().filter(|s| content.has(**s)).count();
        let completeness = review.rating.is_some() as u8
            + review.confidence.is_some() as u8
            + review.reviewer_id_provided as u8
            + sections_present as u8;

        Self {
            section_lengths,
            total_length,
            text_words,
            question_words,
            content_quality,
            completeness,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::PersonId;

    fn content(summary: &str, strengths: &str, weaknesses: &str, questions: &str) -> ReviewContent {
        ReviewContent {
            summary: Some(summary.into()),
            strengths: Some(strengths.into()),
            weaknesses: Some(weaknesses.into()),
            questions: Some(questions.into()),
        }
    }

    #[test]
    fn test_content_quality_thresholds_are_strict() {
        let mut review = test_support::review(PersonId(0), "a", Some(5.0));
        review.content = content(&"s".repeat(51), &"s".repeat(30), &"w".repeat(31), &"q".repeat(21));

        let metrics = ReviewMetrics::of(&review);
        assert_eq!(metrics.section_lengths, [51, 30, 31, 21]);
        assert_eq!(metrics.total_length, 133);
        assert_eq!(metrics.content_quality, 3);
    }

    #[test]
    fn test_lengths_count_characters_not_bytes() {
        let mut review = test_support::review(PersonId(0), "a", None);
        review.content.summary = Some("réseau neuronal".into());
        assert_eq!(ReviewMetrics::of(&review).section_lengths[0], 15);
    }

    #[test]
    fn test_completeness_score() {
        let mut review = test_support::review(PersonId(0), "a", Some(5.0));
        review.content = content("a", "b", "", "d");
        assert_eq!(ReviewMetrics::of(&review).completeness, 6);

        review.reviewer_id_provided = false;
        review.confidence = None;
        assert_eq!(ReviewMetrics::of(&review).completeness, 4);
    }

    #[test]
    fn test_word_counts() {
        let mut review = test_support::review(PersonId(0), "a", None);
        review.content = content("one two", "three", "four-five", "why? how");
        let metrics = ReviewMetrics::of(&review);
        assert_eq!(metrics.text_words, 7);
        assert_eq!(metrics.question_words, 2);
    }
}
