//! Per-entity aggregation and the report-producing analyzers.
//!
//! [`aggregate`] makes one pass over the dataset and fills keyed buckets;
//! every other module reads those buckets and emits a serializable report.
//! [`analyzer::analyze`] runs them all and wraps the results in
//! [`types::Report`] envelopes.

pub mod aggregate;
pub mod analyzer;
pub mod content;
pub mod diversity;
pub mod geography;
pub mod grade;
pub mod institution;
pub mod quality;
pub mod ranking;
pub mod rating;
pub mod reviewer;
pub mod significance;
pub mod submission;
pub mod types;
pub mod utility;
