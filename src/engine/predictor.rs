//! Winner pick and confidence for one matchup.
//!
//! Each side gets a linear rating from season offense (points scored per
//! game), season defense (points allowed per game, negated) and recent-form
//! trend:
//!
//! ```text
//! trend  = (recent_off - season_off) + (recent_def - season_def)
//! rating = 0.5 * off + 0.4 * def + 0.1 * trend
//! ```
//!
//! The higher rating is the pick; the home side wins ties. Confidence is
//! `0.5 + 0.4 * tanh(|diff| / 10)`, so it never leaves `[0.5, 0.9]` however
//! lopsided the matchup.

use serde::Serialize;

use super::stats::TeamSeasonStats;
use crate::db::models::GameRecord;

const OFFENSE_WEIGHT: f64 = 0.5;
const DEFENSE_WEIGHT: f64 = 0.4;
const TREND_WEIGHT: f64 = 0.1;

/// Pick used when either side has no history.
pub const FALLBACK_CONFIDENCE: f64 = 0.55;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GamePrediction {
    pub game_id: String,
    pub home_team: String,
    pub away_team: String,
    pub predicted_winner: String,
    pub confidence: f64,
    pub notes: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct SideRating {
    offense: f64,
    defense: f64,
    trend: f64,
}

impl SideRating {
    fn of(stats: &TeamSeasonStats, window: usize) -> Self {
        let offense = stats.points_for_per_game();
        let defense = -stats.points_against_per_game();
        let recent_offense = stats.recent_points_for_per_game(window);
        let recent_defense = -stats.recent_points_against_per_game(window);
        SideRating {
            offense,
            defense,
            trend: (recent_offense - offense) + (recent_defense - defense),
        }
    }

    fn combined(&self) -> f64 {
        self.offense * OFFENSE_WEIGHT + self.defense * DEFENSE_WEIGHT + self.trend * TREND_WEIGHT
    }
}

pub fn confidence_for_gap(rating_diff: f64) -> f64 {
    0.5 + 0.4 * (rating_diff.abs() / 10.0).tanh()
}

pub fn predict(
    game: &GameRecord,
    home: Option<&TeamSeasonStats>,
    away: Option<&TeamSeasonStats>,
    recent_window: usize,
) -> GamePrediction {
    let (home_stats, away_stats) = match (home, away) {
        (Some(h), Some(a)) if h.games_played > 0 && a.games_played > 0 => (h, a),
        _ => {
            return GamePrediction {
                game_id: game.game_id.clone(),
                home_team: game.home_team.clone(),
                away_team: game.away_team.clone(),
                predicted_winner: game.home_team.clone(),
                confidence: FALLBACK_CONFIDENCE,
                notes: "Fallback: insufficient stats; pick home.".to_string(),
            };
        }
    };

    let home_rating = SideRating::of(home_stats, recent_window).combined();
    let away_rating = SideRating::of(away_stats, recent_window).combined();

    let predicted_winner = if home_rating >= away_rating {
        &game.home_team
    } else {
        &game.away_team
    };

    let notes = format!(
        "Season Off/Def plus last {} games trend. Home PPG {:.1}, PAPG {:.1}. Away PPG {:.1}, PAPG {:.1}.",
        recent_window,
        home_stats.points_for_per_game(),
        home_stats.points_against_per_game(),
        away_stats.points_for_per_game(),
        away_stats.points_against_per_game(),
    );

    GamePrediction {
        game_id: game.game_id.clone(),
        home_team: game.home_team.clone(),
        away_team: game.away_team.clone(),
        predicted_winner: predicted_winner.clone(),
        confidence: confidence_for_gap(home_rating - away_rating),
        notes,
    }
}
