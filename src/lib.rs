//! Peer-review statistics over a conference snapshot: reviewer and submission
//! anomalies, rating patterns, data quality, panel diversity, geography and
//! institution rankings.

pub mod analyzers;
pub mod config;
pub mod error;
pub mod identity;
pub mod model;
pub mod normalize;
pub mod output;
pub mod parser;
pub mod stats;

pub use error::{Error, Result};
