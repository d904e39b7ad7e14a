use anyhow::Result;
use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use tracing::info;

use super::aggregator::build_season_stats;
use super::predictor::predict;
use super::reconcile::{reconcile_week, ReconcileSummary};
use super::stats::TeamSeasonStats;
use crate::db::models::{GameStatus, Prediction};
use crate::db::Database;
use crate::error::PickError;
use crate::season::{clamp_week, SeasonResolver};

pub const MIN_RECENT_GAMES: i64 = 1;
pub const MAX_RECENT_GAMES: i64 = 10;

/// Ties the season resolver, stats aggregation and predictor together for the
/// caller-facing operations.
#[derive(Clone)]
pub struct PickEngine {
    resolver: SeasonResolver,
    default_recent_games: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeekPredictions {
    pub week: u32,
    pub last_completed_week: u32,
    pub recent_games: usize,
    pub count: usize,
    pub games: Vec<PredictedGame>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PredictedGame {
    pub game_id: String,
    pub kickoff: Option<DateTime<Utc>>,
    pub away_team: String,
    pub home_team: String,
    pub pick: String,
    pub confidence: f64,
    pub home: Option<TeamSummary>,
    pub away: Option<TeamSummary>,
    pub notes: String,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct TeamSummary {
    pub wins: u32,
    pub losses: u32,
    pub ppg: f64,
    pub papg: f64,
}

impl From<&TeamSeasonStats> for TeamSummary {
    fn from(s: &TeamSeasonStats) -> Self {
        TeamSummary {
            wins: s.wins,
            losses: s.losses,
            ppg: s.points_for_per_game(),
            papg: s.points_against_per_game(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeekReview {
    pub week: u32,
    pub season_year: i32,
    pub predictions: Vec<ReviewedPrediction>,
    #[serde(flatten)]
    pub summary: ReconcileSummary,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewedPrediction {
    #[serde(flatten)]
    pub prediction: Prediction,
    pub game: Option<GameState>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub kickoff: Option<DateTime<Utc>>,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub is_final: bool,
    pub is_in_progress: bool,
    pub status: GameStatus,
}

/// Recency window bounded to `[1, 10]`.
pub fn clamp_recent_games(recent: i64) -> usize {
    recent.clamp(MIN_RECENT_GAMES, MAX_RECENT_GAMES) as usize
}

impl PickEngine {
    pub fn new(resolver: SeasonResolver, default_recent_games: usize) -> Self {
        PickEngine {
            resolver,
            default_recent_games,
        }
    }

    pub fn resolver(&self) -> &SeasonResolver {
        &self.resolver
    }

    pub async fn predict_active_week(
        &self,
        recent: Option<i64>,
    ) -> Result<WeekPredictions, PickError> {
        self.predict_active_week_at(recent, Utc::now()).await
    }

    /// Predict every game of the active picks week from stats through the
    /// week before it.
    pub async fn predict_active_week_at(
        &self,
        recent: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<WeekPredictions, PickError> {
        let recent_games =
            clamp_recent_games(recent.unwrap_or(self.default_recent_games as i64));
        let upcoming = self.resolver.resolve_upcoming_games_at(now).await?;
        let week = upcoming.week;
        let last_completed_week = week.saturating_sub(1).max(1);

        let stats =
            build_season_stats(self.resolver.feed().as_ref(), last_completed_week as i64).await?;

        // Unscheduled games sort last
        let mut games = upcoming.games;
        games.sort_by_key(|g| (g.kickoff.is_none(), g.kickoff));

        let games: Vec<PredictedGame> = games
            .iter()
            .map(|g| {
                let home = stats.get(&g.home_team);
                let away = stats.get(&g.away_team);
                let p = predict(g, home, away, recent_games);
                PredictedGame {
                    game_id: p.game_id,
                    kickoff: g.kickoff,
                    away_team: p.away_team,
                    home_team: p.home_team,
                    pick: p.predicted_winner,
                    confidence: p.confidence,
                    home: home.map(TeamSummary::from),
                    away: away.map(TeamSummary::from),
                    notes: p.notes,
                }
            })
            .collect();

        info!(
            "Predicted {} game(s) for week {} (stats through week {}, last {} games)",
            games.len(),
            week,
            last_completed_week,
            recent_games
        );

        Ok(WeekPredictions {
            week,
            last_completed_week,
            recent_games,
            count: games.len(),
            games,
        })
    }

    /// Load a week's stored picks, settle any that are now final, and return
    /// them alongside their games.
    pub async fn review_week(
        &self,
        db: &Database,
        week: i64,
        season_year: Option<i32>,
    ) -> Result<WeekReview> {
        let week = clamp_week(week);
        let season_year = season_year.unwrap_or_else(|| Utc::now().year());

        let mut predictions = db.week_predictions(week, season_year)?;
        if predictions.is_empty() {
            return Ok(WeekReview {
                week,
                season_year,
                predictions: Vec::new(),
                summary: ReconcileSummary::default(),
            });
        }

        let view = self.resolver.week_games(week as i64).await?;
        let summary = reconcile_week(db, &mut predictions, &view.games)?;

        let predictions = predictions
            .into_iter()
            .map(|prediction| {
                let game = view
                    .games
                    .iter()
                    .find(|g| g.game_id == prediction.game_id)
                    .map(|g| GameState {
                        kickoff: g.kickoff,
                        home_score: g.home_score,
                        away_score: g.away_score,
                        is_final: g.is_final,
                        is_in_progress: g.is_in_progress,
                        status: g.status,
                    });
                ReviewedPrediction { prediction, game }
            })
            .collect();

        Ok(WeekReview {
            week,
            season_year,
            predictions,
            summary,
        })
    }
}
