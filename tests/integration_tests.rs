use review_rater::analyzers::analyzer::analyze;
use review_rater::analyzers::submission::ExtremeType;
use review_rater::config::AnalysisConfig;
use review_rater::model::Dataset;
use review_rater::output::write_reports;
use review_rater::parser::load_dataset;
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

fn fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/snapshot")
}

/// Three submissions, six reviews; expected reports are computed by hand.
fn golden_fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/golden_snapshot")
}

fn golden_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/golden")
        .join(name)
}

fn load() -> Dataset {
    load_dataset(&fixture_dir()).expect("Failed to load fixture snapshot")
}

/// Compares `data` against a stored golden document.
fn assert_golden<T: Serialize>(name: &str, data: &T) {
    let actual = serde_json::to_value(data).unwrap();
    let path = golden_path(name);
    let expected: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(actual, expected, "{name} drifted from its golden copy");
}

#[test]
fn test_ingestion_counts() {
    let dataset = load();

    assert_eq!(dataset.submissions.len(), 3);
    assert_eq!(dataset.review_count(), 11);
    assert_eq!(dataset.withdrawn_submissions, 1);
    assert_eq!(dataset.skipped.submissions, 1);
    assert_eq!(dataset.skipped.institutions, 1);
}

#[test]
fn test_full_pipeline() {
    let dataset = load();
    let reports = analyze(&dataset, &AnalysisConfig::default(), 1);

    let meta = &reports.data_quality.metadata;
    assert_eq!(meta.dataset.submissions, 3);
    assert_eq!(meta.dataset.reviews, 11);
    assert_eq!(meta.dataset.anonymous_reviewers, 1);

    // Ratings [2, 4, 4, 6, 8] have population std 2.04.
    let submissions = &reports.submission_anomalies.data.anomalous_submissions;
    let controversial: Vec<u32> = submissions
        .controversial_submissions
        .iter()
        .map(|s| s.submission_num)
        .collect();
    assert_eq!(controversial, vec![1]);
    assert_eq!(submissions.controversial_submissions[0].avg_rating, 4.8);

    let very_low = submissions
        .extreme_rated_submissions
        .iter()
        .find(|s| s.submission_num == 2)
        .expect("submission 2 averages 2.0");
    assert_eq!(very_low.extreme_type, ExtremeType::VeryLow);

    let invalid = &reports.data_quality.data.invalid_values;
    assert_eq!(invalid.out_of_range_ratings.len(), 1);
    assert_eq!(invalid.out_of_range_ratings[0].submission_num, 3);
    assert_eq!(invalid.out_of_range_ratings[0].rating, 12.0);
    assert_eq!(invalid.out_of_range_confidences.len(), 1);
    assert_eq!(invalid.out_of_range_confidences[0].confidence, 9.0);
    assert_eq!(invalid.invalid_reviewer_ids.len(), 1);
    assert_eq!(invalid.invalid_reviewer_ids[0].reviewer_id, "17");

    let r1 = reports
        .reviewer_metrics
        .iter()
        .find(|m| m.reviewer_id == "r1")
        .unwrap();
    assert_eq!(r1.review_count, 3);
    assert!(
        reports
            .reviewer_metrics
            .iter()
            .any(|m| m.reviewer_id == "anonymous_reviewer_abc")
    );

    let institutions: Vec<&str> = reports
        .institution_metrics
        .iter()
        .map(|m| m.institution.as_str())
        .collect();
    assert!(institutions.contains(&"Google DeepMind"));
    assert!(institutions.contains(&"Peking University"));
}

#[test]
fn test_golden_reports() {
    let dataset = load_dataset(&golden_fixture_dir()).expect("Failed to load golden snapshot");
    assert_eq!(dataset.submissions.len(), 3);
    assert_eq!(dataset.review_count(), 6);

    let reports = analyze(&dataset, &AnalysisConfig::default(), 1);

    assert_golden("submission_anomalies.json", &reports.submission_anomalies.data);
    assert_golden("data_quality.json", &reports.data_quality.data);
    assert_golden("reviewer_anomalies.json", &reports.reviewer_anomalies.data);
}

#[test]
fn test_sharding_does_not_change_reports() {
    let dataset = load();
    let config = AnalysisConfig::default();
    let sequential = analyze(&dataset, &config, 1);
    let sharded = analyze(&dataset, &config, 4);

    assert_eq!(
        sequential.submission_anomalies.data,
        sharded.submission_anomalies.data
    );
    assert_eq!(sequential.data_quality.data, sharded.data_quality.data);
    assert_eq!(sequential.institution_metrics, sharded.institution_metrics);
}

#[test]
fn test_reports_written_and_readable() {
    let reports = analyze(&load(), &AnalysisConfig::default(), 1);
    let dir = tempfile::tempdir().unwrap();

    let written = write_reports(dir.path(), &reports).unwrap();
    assert_eq!(written.len(), 11);

    let content = std::fs::read_to_string(dir.path().join("country_profiles.json")).unwrap();
    let back: review_rater::analyzers::types::Report<
        review_rater::analyzers::geography::CountryProfiles,
    > = serde_json::from_str(&content).unwrap();
    assert_eq!(back, reports.country_profiles);
}

#[test]
fn test_missing_snapshot_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_dataset(dir.path()).unwrap_err();
    assert!(matches!(err, review_rater::Error::Io { .. }));
}

#[test]
fn test_config_override_changes_gates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{ "thresholds": { "submission_min_reviews": 6 } }"#,
    )
    .unwrap();

    let config = AnalysisConfig::load(&path).unwrap();
    let reports = analyze(&load(), &config, 1);
    assert!(
        reports
            .submission_anomalies
            .data
            .anomalous_submissions
            .controversial_submissions
            .is_empty()
    );
    assert_eq!(
        reports
            .submission_anomalies
            .metadata
            .config
            .thresholds
            .submission_min_reviews,
        6
    );
}
