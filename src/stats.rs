use serde::{Deserialize, Serialize};

use crate::error::RecordKind;
use crate::model::{Dataset, Role};

/// Records dropped at ingestion because they could not be decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipCounts {
    pub people: usize,
    pub submissions: usize,
    pub reviews: usize,
    pub institutions: usize,
}

impl SkipCounts {
    pub fn record(&mut self, kind: RecordKind) {
        match kind {
            RecordKind::Person => self.people += 1,
            RecordKind::Submission => self.submissions += 1,
            RecordKind::Review => self.reviews += 1,
            RecordKind::Institution => self.institutions += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.people + self.submissions + self.reviews + self.institutions
    }
}

/// Entity counts for a loaded snapshot, echoed into every report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetStats {
    pub submissions: usize,
    pub withdrawn_submissions: usize,
    pub reviews: usize,
    pub people: usize,
    pub authors: usize,
    pub reviewers: usize,
    pub anonymous_reviewers: usize,
    pub institutions: usize,
    pub skipped: SkipCounts,
}

impl DatasetStats {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let mut s = DatasetStats {
            submissions: dataset.submissions.len(),
            withdrawn_submissions: dataset.withdrawn_submissions,
            reviews: dataset.review_count(),
            people: dataset.graph.person_count(),
            institutions: dataset.graph.institution_count(),
            skipped: dataset.skipped,
            ..Default::default()
        };

        for (_, person) in dataset.graph.people() {
            if person.has_role(Role::Author) {
                s.authors += 1;
            }

            if person.has_role(Role::Reviewer) {
                s.reviewers += 1;

                if person.id.starts_with(crate::parser::ANONYMOUS_PREFIX) {
                    s.anonymous_reviewers += 1;
                }
            }
        }

        s
    }

    pub fn pct(part: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            (part as f64 / total as f64) * 100.0
        }
    }

    pub fn reviews_per_submission(&self) -> f64 {
        if self.submissions == 0 {
            0.0
        } else {
            self.reviews as f64 / self.submissions as f64
        }
    }
}
