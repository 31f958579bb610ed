//! CLI entry point for the review rater.
//!
//! Provides subcommands for running the full analysis over a snapshot
//! directory, summarizing a snapshot, and checking how raw institution or
//! country strings normalize.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use review_rater::analyzers::analyzer::analyze;
use review_rater::{
    config::AnalysisConfig,
    normalize::{
        clusters_of, infer_institution_type, institution_country_override, normalize_country,
        normalize_institution,
    },
    output::{SummaryRow, append_record, print_json, write_reports},
    parser::load_dataset,
    stats::DatasetStats,
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const CONFIG_ENV: &str = "REVIEW_RATER_CONFIG";

#[derive(Parser)]
#[command(name = "review_rater")]
#[command(about = "Peer-review statistics over a conference snapshot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every analyzer and write the reports
    Analyze {
        /// Directory holding people.json, reviews.json and optionally institutions.json
        #[arg(short, long, default_value = "data")]
        input: PathBuf,

        /// Directory to write reports into
        #[arg(short, long, default_value = "reports")]
        output: PathBuf,

        /// Split aggregation across this many rayon shards (1 = sequential)
        #[arg(short, long, default_value_t = 1)]
        shards: usize,

        /// JSON config overriding thresholds and limits
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print entity counts for a snapshot
    Summary {
        /// Directory holding the snapshot documents
        #[arg(short, long, default_value = "data")]
        input: PathBuf,

        /// CSV file to append the summary to
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Show how a raw institution or country string normalizes
    Normalize {
        /// Raw value to normalize
        value: String,

        /// Treat the value as a country instead of an institution
        #[arg(long, default_value_t = false)]
        country: bool,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/review_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("review_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            output,
            shards,
            config,
        } => {
            let config = load_config(config)?;
            let dataset = load_dataset(&input)
                .with_context(|| format!("loading snapshot from {}", input.display()))?;

            let reports = analyze(&dataset, &config, shards.max(1));
            let written = write_reports(&output, &reports)
                .with_context(|| format!("writing reports to {}", output.display()))?;

            info!(
                output = %output.display(),
                files = written.len(),
                eligible_reviewers = reports.reviewer_anomalies.data.global_statistics.eligible_reviewers,
                "Analysis finished"
            );
        }
        Commands::Summary { input, csv } => {
            let dataset = load_dataset(&input)
                .with_context(|| format!("loading snapshot from {}", input.display()))?;
            let stats = DatasetStats::from_dataset(&dataset);

            info!(
                reviews_per_submission = %format!("{:.2}", stats.reviews_per_submission()),
                anonymous_pct = %format!(
                    "{:.1}",
                    DatasetStats::pct(stats.anonymous_reviewers, stats.reviewers)
                ),
                skipped = stats.skipped.total(),
                "Snapshot summary"
            );
            print_json(&stats)?;

            if let Some(path) = csv {
                append_record(&path, &SummaryRow::new(&stats, Utc::now()))
                    .with_context(|| format!("appending summary to {}", path.display()))?;
            }
        }
        Commands::Normalize { value, country } => {
            if country {
                let canonical = normalize_country(Some(&value));
                let clusters: Vec<&str> = clusters_of(&canonical).map(|c| c.as_str()).collect();
                info!(raw = %value, country = %canonical, clusters = ?clusters, "Normalized country");
            } else {
                let canonical = normalize_institution(&value);
                info!(
                    raw = %value,
                    institution = %canonical,
                    kind = infer_institution_type(&canonical).as_str(),
                    country = institution_country_override(&canonical).unwrap_or("-"),
                    "Normalized institution"
                );
            }
        }
    }

    Ok(())
}

/// Explicit `--config` wins over the environment; without either the
/// defaults apply.
fn load_config(path: Option<PathBuf>) -> Result<AnalysisConfig> {
    let path = path.or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
    match path {
        Some(path) => {
            let config = AnalysisConfig::load(&path)
                .with_context(|| format!("loading config from {}", path.display()))?;
            info!(path = %path.display(), "Config loaded");
            Ok(config)
        }
        None => Ok(AnalysisConfig::default()),
    }
}
