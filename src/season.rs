//! Season-state resolution: which week the league is in and which week is
//! open for new picks.
//!
//! Once every game of the current week has kicked off and finished, picks for
//! that week are pointless, so the open week rolls forward to `current + 1`.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::db::models::GameRecord;
use crate::error::PickError;
use crate::feed::{EventTiming, ScoreboardSource};

pub const FIRST_WEEK: u32 = 1;
pub const MAX_WEEK: u32 = 18;

/// Clamp any requested or reported week into `[1, 18]`. Out-of-range weeks are
/// never an error.
pub fn clamp_week(week: i64) -> u32 {
    week.clamp(FIRST_WEEK as i64, MAX_WEEK as i64) as u32
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SeasonContext {
    pub current_year: i32,
    pub current_week: u32,
    pub season_type: u32,
    pub active_picks_week: u32,
    pub max_week: u32,
}

/// Games for one week, scores and status included.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeekView {
    pub week: u32,
    pub season_year: i32,
    pub season_type: u32,
    pub is_upcoming_week: bool,
    pub games: Vec<GameRecord>,
}

#[derive(Clone)]
pub struct SeasonResolver {
    feed: Arc<dyn ScoreboardSource>,
    season_type: u32,
}

impl SeasonResolver {
    pub fn new(feed: Arc<dyn ScoreboardSource>, season_type: u32) -> Self {
        SeasonResolver { feed, season_type }
    }

    pub fn feed(&self) -> &Arc<dyn ScoreboardSource> {
        &self.feed
    }

    pub async fn resolve_context(&self) -> Result<SeasonContext, PickError> {
        self.resolve_context_at(Utc::now()).await
    }

    pub async fn resolve_context_at(&self, now: DateTime<Utc>) -> Result<SeasonContext, PickError> {
        let snapshot = self.feed.fetch(None).await?;

        let reported = snapshot.week_number.unwrap_or(FIRST_WEEK as i64);
        let current_week = clamp_week(reported);
        if reported != current_week as i64 {
            warn!(
                "{} reported week {}, clamped to {}",
                self.feed.name(),
                reported,
                current_week
            );
        }

        let active_picks_week = if has_active_games(&snapshot.events, now) {
            current_week
        } else {
            clamp_week(current_week as i64 + 1)
        };
        debug!(
            "Season context: current week {}, picks open for week {}",
            current_week, active_picks_week
        );

        Ok(SeasonContext {
            current_year: now.year(),
            current_week,
            season_type: self.season_type,
            active_picks_week,
            max_week: MAX_WEEK,
        })
    }

    /// One week's games with scores; the week is clamped first.
    pub async fn week_games(&self, week: i64) -> Result<WeekView, PickError> {
        let week = clamp_week(week);
        let snapshot = self.feed.fetch(Some(week)).await?;
        Ok(WeekView {
            week,
            season_year: Utc::now().year(),
            season_type: self.season_type,
            is_upcoming_week: false,
            games: snapshot.games.clone(),
        })
    }

    pub async fn resolve_upcoming_games(&self) -> Result<WeekView, PickError> {
        self.resolve_upcoming_games_at(Utc::now()).await
    }

    pub async fn resolve_upcoming_games_at(&self, now: DateTime<Utc>) -> Result<WeekView, PickError> {
        let context = self.resolve_context_at(now).await?;
        let mut view = self.week_games(context.active_picks_week as i64).await?;
        view.is_upcoming_week = true;
        Ok(view)
    }
}

/// A week is still active while any event kicks off after `now` or has not
/// completed. An event without a status counts as completed.
fn has_active_games(events: &[EventTiming], now: DateTime<Utc>) -> bool {
    events.iter().any(|ev| {
        ev.kickoff.is_some_and(|k| k > now) || !ev.completed.unwrap_or(true)
    })
}
