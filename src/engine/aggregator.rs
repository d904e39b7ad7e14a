//! Replays completed weeks into per-team season statistics.

use futures_util::future::try_join_all;
use tracing::{debug, info};

use super::stats::SeasonStats;
use crate::error::PickError;
use crate::feed::ScoreboardSource;
use crate::season::clamp_week;

/// Build season stats from weeks `1..=last_completed_week`.
///
/// A cutoff below 1 means there is no history and yields empty stats; above
/// 18 it is clamped. Week fetches run concurrently but are folded strictly in
/// week order so every team's result sequence stays chronological.
///
/// Scores that are missing or unparsable count as 0 here: weeks being folded
/// are assumed complete.
pub async fn build_season_stats(
    feed: &dyn ScoreboardSource,
    last_completed_week: i64,
) -> Result<SeasonStats, PickError> {
    let mut stats = SeasonStats::new();
    if last_completed_week < 1 {
        return Ok(stats);
    }
    let cutoff = clamp_week(last_completed_week);

    let snapshots = try_join_all((1..=cutoff).map(|week| feed.fetch(Some(week)))).await?;

    for (week, snapshot) in (1..=cutoff).zip(snapshots) {
        debug!("Folding week {} ({} games)", week, snapshot.games.len());
        for game in &snapshot.games {
            stats.record_game(
                &game.home_team,
                &game.away_team,
                game.home_score.unwrap_or(0),
                game.away_score.unwrap_or(0),
            );
        }
    }

    info!(
        "Built season stats for {} teams through week {}",
        stats.len(),
        cutoff
    );
    Ok(stats)
}
