//! Report persistence: pretty JSON per report, CSV metric snapshots and an
//! append-only dataset summary log.

use crate::analyzers::institution::InstitutionMetrics;
use crate::analyzers::types::ReportSet;
use crate::error::{Error, Result};
use crate::normalize::InstitutionType;
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::stats::DatasetStats;

pub const REVIEWER_METRICS_CSV: &str = "reviewer_metrics.csv";
pub const INSTITUTION_METRICS_CSV: &str = "institution_metrics.csv";

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> Error + '_ {
    move |source| Error::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Logs a value as pretty-printed JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes `value` as pretty JSON to `path`, replacing any existing file.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).map_err(io_error(path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush().map_err(io_error(path))?;
    Ok(())
}

/// Writes `rows` to a fresh CSV file with a header line.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(true).from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush().map_err(io_error(path))?;
    Ok(())
}

/// Appends one row to a CSV file, writing the header only when the file is new.
pub fn append_record<T: Serialize>(path: &Path, record: &T) -> Result<()> {
    let file_exists = path.exists();
    debug!(path = %path.display(), file_exists, "Appending CSV record");

    let file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(io_error(path))?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);

    writer.serialize(record)?;
    writer.flush().map_err(io_error(path))?;
    Ok(())
}

/// Flat institution row; the nested metrics do not fit a CSV record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstitutionRow<'a> {
    pub institution: &'a str,
    pub country: &'a str,
    #[serde(rename = "type")]
    pub kind: InstitutionType,
    pub author_count: usize,
    pub reviewer_count: usize,
    pub total_members: usize,
    pub reviewer_review_count: usize,
    pub reviewer_distinct_reviewers: usize,
    pub reviewer_avg_rating: Option<f64>,
    pub reviewer_rating_std: Option<f64>,
    pub reviewer_avg_confidence: Option<f64>,
    pub reviewer_avg_text_words: f64,
    pub reviewer_avg_question_words: f64,
    pub reviewer_rating_conf_corr: Option<f64>,
    pub author_submission_count: usize,
    pub author_review_count: usize,
    pub author_avg_rating: Option<f64>,
    pub author_rating_std: Option<f64>,
    pub author_avg_confidence: Option<f64>,
}

impl<'a> From<&'a InstitutionMetrics> for InstitutionRow<'a> {
    fn from(m: &'a InstitutionMetrics) -> Self {
        let r = &m.reviewer_side;
        let a = &m.author_side;
        Self {
            institution: &m.institution,
            country: &m.country,
            kind: m.kind,
            author_count: m.author_count,
            reviewer_count: m.reviewer_count,
            total_members: m.total_members,
            reviewer_review_count: r.review_count,
            reviewer_distinct_reviewers: r.reviewer_count,
            reviewer_avg_rating: r.avg_rating,
            reviewer_rating_std: r.rating_std,
            reviewer_avg_confidence: r.avg_confidence,
            reviewer_avg_text_words: r.avg_text_words,
            reviewer_avg_question_words: r.avg_question_words,
            reviewer_rating_conf_corr: r.rating_conf_corr,
            author_submission_count: a.submission_count,
            author_review_count: a.review_count,
            author_avg_rating: a.avg_rating,
            author_rating_std: a.rating_std,
            author_avg_confidence: a.avg_confidence,
        }
    }
}

/// One line of the dataset summary log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub timestamp: DateTime<Utc>,
    pub submissions: usize,
    pub withdrawn_submissions: usize,
    pub reviews: usize,
    pub reviews_per_submission: f64,
    pub people: usize,
    pub authors: usize,
    pub reviewers: usize,
    pub anonymous_reviewer_pct: f64,
    pub institutions: usize,
    pub skipped_records: usize,
}

impl SummaryRow {
    pub fn new(stats: &DatasetStats, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            submissions: stats.submissions,
            withdrawn_submissions: stats.withdrawn_submissions,
            reviews: stats.reviews,
            reviews_per_submission: stats.reviews_per_submission(),
            people: stats.people,
            authors: stats.authors,
            reviewers: stats.reviewers,
            anonymous_reviewer_pct: DatasetStats::pct(stats.anonymous_reviewers, stats.reviewers),
            institutions: stats.institutions,
            skipped_records: stats.skipped.total(),
        }
    }
}

/// Writes every report and both CSV snapshots into `dir`, creating it if
/// needed. Returns the written paths in write order.
#[tracing::instrument(skip(reports), fields(dir = %dir.display()))]
pub fn write_reports(dir: &Path, reports: &ReportSet) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).map_err(io_error(dir))?;
    let mut written = Vec::new();

    macro_rules! json {
        ($($field:ident),* $(,)?) => {
            $(
                let path = dir.join(concat!(stringify!($field), ".json"));
                write_json(&path, &reports.$field)?;
                written.push(path);
            )*
        };
    }

    json!(
        reviewer_anomalies,
        submission_anomalies,
        rating_patterns,
        content_anomalies,
        data_quality,
        diversity,
        country_profiles,
        geographical_bias,
        institution_rankings,
    );

    let path = dir.join(REVIEWER_METRICS_CSV);
    write_csv(&path, &reports.reviewer_metrics)?;
    written.push(path);

    let rows: Vec<InstitutionRow> = reports.institution_metrics.iter().map(InstitutionRow::from).collect();
    let path = dir.join(INSTITUTION_METRICS_CSV);
    write_csv(&path, &rows)?;
    written.push(path);

    info!(files = written.len(), "Reports written");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::analyzer::analyze;
    use crate::config::AnalysisConfig;
    use crate::model::test_support::{DatasetBuilder, review};
    use std::fs;

    fn reports() -> ReportSet {
        let mut b = DatasetBuilder::default();
        let author = b.person("a", "Germany", &["ETH Zurich"]);
        let r1 = b.person("r1", "China", &["Peking University"]);
        let r2 = b.person("r2", "Brazil", &[]);
        b.submission(1, &[author], vec![review(r1, "r1", Some(6.0)), review(r2, "r2", Some(3.0))]);
        analyze(&b.build(), &AnalysisConfig::default(), 1)
    }

    #[test]
    fn test_write_reports_creates_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let written = write_reports(&out, &reports()).unwrap();

        assert_eq!(written.len(), 11);
        for name in [
            "reviewer_anomalies.json",
            "geographical_bias.json",
            "institution_rankings.json",
            REVIEWER_METRICS_CSV,
            INSTITUTION_METRICS_CSV,
        ] {
            assert!(out.join(name).exists(), "{name} missing");
        }

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join("data_quality.json")).unwrap()).unwrap();
        assert_eq!(json["metadata"]["dataset"]["reviews"], 2);
        assert_eq!(json["data"]["completeness_analysis"]["total_reviews"], 2);
    }

    #[test]
    fn test_csv_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        write_reports(dir.path(), &reports()).unwrap();

        let reviewers = fs::read_to_string(dir.path().join(REVIEWER_METRICS_CSV)).unwrap();
        let lines: Vec<&str> = reviewers.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("reviewer_id,review_count,avg_rating"));
        // Single rating: correlation undefined, written as an empty field.
        assert!(lines[1].starts_with("r1,1,6.0,0.0,3.0,"));
        assert!(lines[1].ends_with(','));

        let institutions = fs::read_to_string(dir.path().join(INSTITUTION_METRICS_CSV)).unwrap();
        assert!(institutions.lines().next().unwrap().starts_with("institution,country,type,"));
        assert_eq!(institutions.lines().count(), 3);
    }

    #[test]
    fn test_append_record_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");
        let row = SummaryRow::new(&DatasetStats::default(), Utc::now());

        append_record(&path, &row).unwrap();
        append_record(&path, &row).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header_count = content.lines().filter(|l| l.contains("timestamp")).count();
        assert_eq!(header_count, 1);
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn test_summary_row_ratios() {
        let stats = DatasetStats {
            submissions: 4,
            reviews: 10,
            reviewers: 8,
            anonymous_reviewers: 2,
            ..Default::default()
        };
        let row = SummaryRow::new(&stats, Utc::now());
        assert_eq!(row.reviews_per_submission, 2.5);
        assert_eq!(row.anonymous_reviewer_pct, 25.0);
    }

    #[test]
    fn test_write_json_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_json(&dir.path().join("nope/report.json"), &1).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
