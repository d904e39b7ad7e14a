use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::db::models::GameRecord;
use crate::error::PickError;

/// Trait that every scoreboard source must implement.
#[async_trait]
pub trait ScoreboardSource: Send + Sync {
    /// Fetch one week of the schedule. `None` asks for the feed's current week.
    async fn fetch(&self, week: Option<u32>) -> Result<Arc<FeedSnapshot>, PickError>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

/// One scoreboard response: the raw body plus everything mapped out of it.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSnapshot {
    pub raw: String,
    /// Week number as reported by the feed, unclamped
    pub week_number: Option<i64>,
    /// Timing for every event, including ones that did not map to a game
    pub events: Vec<EventTiming>,
    pub games: Vec<GameRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventTiming {
    pub kickoff: Option<DateTime<Utc>>,
    /// Competition completion flag; `None` when the event carries no status
    pub completed: Option<bool>,
}
