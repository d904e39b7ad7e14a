use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored winner pick for one game
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub id: i64,
    pub week: u32,
    pub season_year: i32,
    /// Feed game identifier
    pub game_id: String,
    pub home_team: String,
    pub away_team: String,
    pub predicted_winner: String,
    /// 0.0–1.0
    pub confidence: f64,
    /// `None` until the game is final; written once and never changed after
    pub was_correct: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub notes: String,
}

/// A pick submitted by the caller, keyed by (week, season_year, game_id)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PredictionDraft {
    pub week: u32,
    pub season_year: i32,
    pub game_id: String,
    pub home_team: String,
    pub away_team: String,
    pub predicted_winner: String,
    pub confidence: f64,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SaveSummary {
    pub inserted: usize,
    pub updated: usize,
    pub total: usize,
}

/// One scheduled game as mapped from a scoreboard snapshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub game_id: String,
    pub home_team: String,
    pub away_team: String,
    /// `None` when the feed gives no usable date
    pub kickoff: Option<DateTime<Utc>>,
    /// `None` when the feed has no score yet or the value does not parse
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub status: GameStatus,
    pub is_final: bool,
    pub is_in_progress: bool,
}

impl GameRecord {
    /// Final and carrying both scores.
    pub fn has_final_score(&self) -> bool {
        self.is_final && self.home_score.is_some() && self.away_score.is_some()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Pre,
    #[serde(rename = "in")]
    InProgress,
    #[serde(rename = "post")]
    Final,
}

impl GameStatus {
    pub fn from_feed_state(state: Option<&str>) -> Self {
        match state.map(|s| s.to_lowercase()).as_deref() {
            Some("in") => GameStatus::InProgress,
            Some("post") => GameStatus::Final,
            _ => GameStatus::Pre,
        }
    }
}
