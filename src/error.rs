//! Error types for review_rater.
//!
//! Only unreadable input documents abort a run. Every other variant is
//! produced at a record or metric boundary and handled there: malformed
//! records are skipped and counted, out-of-range values become data-quality
//! findings, and precondition violations turn a single metric into "not
//! computed".

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the analysis core.
#[derive(Error, Debug)]
pub enum Error {
    /// An input document could not be read or a report could not be written
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An input document is not valid JSON
    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A single submission/review/person/institution record could not be decoded
    #[error("malformed {kind} record {key}: {reason}")]
    MalformedRecord {
        kind: RecordKind,
        key: String,
        reason: String,
    },

    /// Rating or confidence outside its documented bounds
    #[error("{field} value {value} is out of range")]
    OutOfRange { field: &'static str, value: f64 },

    /// Fewer observations than a stated minimum
    #[error("insufficient sample: needed {needed}, got {got}")]
    InsufficientSample { needed: usize, got: usize },

    /// Input to a derived statistic does not satisfy its preconditions
    #[error("precondition violated: {0}")]
    PreconditionViolation(String),

    /// Configuration file loading errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Snapshot writing errors
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Report writing errors
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The kind of record a [`Error::MalformedRecord`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Person,
    Submission,
    Review,
    Institution,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RecordKind::Person => "person",
            RecordKind::Submission => "submission",
            RecordKind::Review => "review",
            RecordKind::Institution => "institution",
        };
        f.write_str(name)
    }
}

impl Error {
    pub(crate) fn malformed(kind: RecordKind, key: impl Into<String>, reason: impl ToString) -> Self {
        Error::MalformedRecord {
            kind,
            key: key.into(),
            reason: reason.to_string(),
        }
    }
}

/// Convenience Result type using the crate [`Error`]
pub type Result<T> = std::result::Result<T, Error>;
