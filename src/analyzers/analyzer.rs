use crate::analyzers::aggregate::{aggregate, aggregate_sharded};
use crate::analyzers::types::{Report, ReportMetadata, ReportSet};
use crate::analyzers::{
    content, diversity, geography, institution, quality, rating, reviewer, submission,
};
use crate::config::AnalysisConfig;
use crate::model::Dataset;
use crate::stats::DatasetStats;
use tracing::info;

/// Runs every analyzer over `dataset` and wraps the results in reports.
///
/// With `shards > 1` the aggregation pass is split across rayon workers; the
/// reports are identical either way.
#[tracing::instrument(skip_all, fields(shards = shards))]
pub fn analyze(dataset: &Dataset, config: &AnalysisConfig, shards: usize) -> ReportSet {
    let t = &config.thresholds;
    let limits = &config.limits;

    let agg = if shards > 1 {
        aggregate_sharded(dataset, t, shards)
    } else {
        aggregate(dataset, t)
    };
    let graph = &dataset.graph;

    let stats = DatasetStats::from_dataset(dataset);
    info!(
        submissions = stats.submissions,
        reviews = stats.reviews,
        reviewers = stats.reviewers,
        "Aggregation complete"
    );
    let meta = ReportMetadata::new(config, stats);

    let geography = geography::analyze(&agg, graph, t, limits);
    let institution_metrics = institution::metrics(&agg, graph);
    let institution_rankings =
        institution::analyze(&institution_metrics, &agg, graph, t, limits);

    ReportSet {
        reviewer_anomalies: Report::new(&meta, reviewer::analyze(&agg, graph, t, limits)),
        submission_anomalies: Report::new(&meta, submission::analyze(&agg, t, limits)),
        rating_patterns: Report::new(&meta, rating::analyze(&agg, t)),
        content_anomalies: Report::new(&meta, content::analyze(dataset, &agg, t, limits)),
        data_quality: Report::new(&meta, quality::analyze(dataset, &agg, t)),
        diversity: Report::new(&meta, diversity::analyze(&agg, graph, t)),
        country_profiles: Report::new(&meta, geography.profiles),
        geographical_bias: Report::new(&meta, geography.bias),
        institution_rankings: Report::new(&meta, institution_rankings),
        reviewer_metrics: reviewer::metrics(&agg, graph),
        institution_metrics,
    }
}
