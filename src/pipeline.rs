//! Paginator → Constraint Filter → Time-Series Aggregator → Table Emitter
//!
//! Each invocation starts from scratch; nothing is cached between calls.

use tracing::info;

use crate::error::PipelineError;
use crate::models::{LeaderboardSelection, Run};
use crate::scrapers::{RunsQuery, SpeedrunClient};
use crate::timeline::{aggregate, filter_runs, run_listing_table, timeline_table, Table};

/// Output of one pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// Runs returned by the API
    pub fetched: usize,
    /// Runs left after the sub-category filter
    pub kept: usize,
    pub table: Table,
}

async fn fetch_runs(
    client: &SpeedrunClient,
    selection: &LeaderboardSelection,
) -> Result<Vec<Run>, PipelineError> {
    let query = RunsQuery::from_selection(selection);
    info!(
        game = %selection.game_id,
        category = %selection.category_id,
        level = ?selection.level_id,
        "Fetching runs"
    );
    Ok(client.runs(&query).await?)
}

/// Personal-best progression table for the selected leaderboard.
///
/// An empty leaderboard yields a header-only table, not an error.
pub async fn timeline_report(
    client: &SpeedrunClient,
    selection: &LeaderboardSelection,
    top: Option<usize>,
) -> Result<Report, PipelineError> {
    let runs = fetch_runs(client, selection).await?;
    let constraints = selection.constraints();
    let kept = filter_runs(&runs, &constraints);
    info!(fetched = runs.len(), kept = kept.len(), "Filtered runs");

    let timeline = aggregate(kept.iter().copied(), top)?;
    info!(
        dates = timeline.dates.len(),
        participants = timeline.rows.len(),
        top = ?top,
        "Timeline built"
    );

    Ok(Report {
        fetched: runs.len(),
        kept: kept.len(),
        table: timeline_table(&timeline),
    })
}

/// Flat one-row-per-run listing for the selected leaderboard.
pub async fn listing_report(
    client: &SpeedrunClient,
    selection: &LeaderboardSelection,
) -> Result<Report, PipelineError> {
    let runs = fetch_runs(client, selection).await?;
    let kept = filter_runs(&runs, &selection.constraints());

    Ok(Report {
        fetched: runs.len(),
        kept: kept.len(),
        table: run_listing_table(kept.iter().copied()),
    })
}
