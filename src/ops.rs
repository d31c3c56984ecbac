//! Shared operation wrappers for all interfaces (CLI, plugin).
//!
//! Each `op_*` function is a synchronous wrapper around one or more `algo`
//! stages. Stages take an owned table and hand back the enriched one; errors
//! carry the name of the stage that failed.

use serde::{Deserialize, Serialize};

use crate::algo::clustering::{self, GroupOutcome};
use crate::algo::normalize;
use crate::algo::region;
use crate::algo::report::{self, ClusterSummary, Distribution, RegionBreakdown, ServiceBreakdown};
use crate::algo::sentiment::{self, ScoringFailure, SentimentOracle};
use crate::config::SurveyConfig;
use crate::dataset::Dataset;
use crate::error::{Result, STAGE_CLUSTER, STAGE_NORMALIZE, STAGE_REGION, STAGE_SENTIMENT};

/// Everything a full run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Every input row, with region and sentiment columns.
    pub enriched: Dataset,
    /// Negative rows only, with cleaned-comment and cluster columns.
    pub clustered: Dataset,
    pub failures: Vec<ScoringFailure>,
    pub groups: Vec<GroupOutcome>,
}

/// Aggregates written alongside the output table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyReport {
    pub total_rows: usize,
    pub negative_rows: usize,
    pub distribution: Distribution,
    pub by_region: Vec<RegionBreakdown>,
    pub by_service: Vec<ServiceBreakdown>,
    pub clusters: Vec<ClusterSummary>,
    pub groups: Vec<GroupOutcome>,
    pub failures: Vec<ScoringFailure>,
}

// ── Operations ───────────────────────────────────────────────────────────────

pub fn op_normalize(raw: Dataset, config: &SurveyConfig) -> Result<Dataset> {
    normalize::normalize(raw, &config.columns).map_err(|e| e.at(STAGE_NORMALIZE))
}

pub fn op_region(ds: Dataset, config: &SurveyConfig) -> Result<Dataset> {
    region::add_regions(ds, &config.columns.location, &config.columns.region)
        .map_err(|e| e.at(STAGE_REGION))
}

pub fn op_sentiment(
    ds: Dataset,
    oracle: &mut dyn SentimentOracle,
    config: &SurveyConfig,
) -> Result<(Dataset, Vec<ScoringFailure>)> {
    sentiment::add_sentiments(
        ds,
        oracle,
        &config.sentiment,
        &config.columns.comment,
        &config.columns.sentiment,
    )
    .map_err(|e| e.at(STAGE_SENTIMENT))
}

pub fn op_cluster(ds: &Dataset, config: &SurveyConfig) -> Result<(Dataset, Vec<GroupOutcome>)> {
    config.validate().map_err(|e| e.at(STAGE_CLUSTER))?;
    clustering::cluster_negative_comments(ds, &config.columns, &config.clustering)
        .map_err(|e| e.at(STAGE_CLUSTER))
}

/// Full pipeline: normalize, derive regions, score sentiments, cluster
/// negative comments.
pub fn op_run(
    raw: Dataset,
    oracle: &mut dyn SentimentOracle,
    config: &SurveyConfig,
) -> Result<PipelineOutput> {
    config.validate()?;
    let ds = op_normalize(raw, config)?;
    let ds = op_region(ds, config)?;
    let (enriched, failures) = op_sentiment(ds, oracle, config)?;
    let (clustered, groups) = op_cluster(&enriched, config)?;
    tracing::info!(
        rows = enriched.len(),
        negative = clustered.len(),
        scoring_failures = failures.len(),
        "pipeline finished"
    );
    Ok(PipelineOutput {
        enriched,
        clustered,
        failures,
        groups,
    })
}

/// Aggregate tables for a finished run.
pub fn op_report(output: &PipelineOutput, config: &SurveyConfig) -> Result<SurveyReport> {
    let columns = &config.columns;
    Ok(SurveyReport {
        total_rows: output.enriched.len(),
        negative_rows: output.clustered.len(),
        distribution: report::sentiment_distribution(&output.enriched, columns)?,
        by_region: report::sentiment_by_region(&output.enriched, columns)?,
        by_service: report::sentiment_by_service(&output.enriched, columns)?,
        clusters: report::cluster_summaries(&output.clustered, columns, &config.report)?,
        groups: output.groups.clone(),
        failures: output.failures.clone(),
    })
}
