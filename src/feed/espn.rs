//! Scoreboard source backed by the ESPN public site API.
//!
//! No API key is required. The default (weekless) request returns whatever
//! week ESPN considers current; explicit weeks are requested with
//! `?week={n}&seasontype={segment}`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::cache::{cache_key, FeedCache};
use super::provider::{EventTiming, FeedSnapshot, ScoreboardSource};
use crate::db::models::{GameRecord, GameStatus};
use crate::error::PickError;

pub const DEFAULT_SCOREBOARD_URL: &str =
    "https://site.api.espn.com/apis/site/v2/sports/football/nfl/scoreboard";

pub struct EspnScoreboard {
    http: Client,
    base_url: Url,
    season_type: u32,
    cache: Arc<dyn FeedCache>,
}

impl EspnScoreboard {
    pub fn new(
        base_url: &str,
        season_type: u32,
        timeout: Duration,
        cache: Arc<dyn FeedCache>,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid scoreboard URL: {base_url}"))?;
        Ok(EspnScoreboard {
            http,
            base_url,
            season_type,
            cache,
        })
    }

    fn request_url(&self, week: Option<u32>) -> Url {
        let mut url = self.base_url.clone();
        if let Some(week) = week {
            url.query_pairs_mut()
                .append_pair("week", &week.to_string())
                .append_pair("seasontype", &self.season_type.to_string());
        }
        url
    }
}

#[async_trait]
impl ScoreboardSource for EspnScoreboard {
    fn name(&self) -> &str {
        "ESPN"
    }

    async fn fetch(&self, week: Option<u32>) -> Result<Arc<FeedSnapshot>, PickError> {
        let key = cache_key(week);
        if let Some(cached) = self.cache.get(&key).await {
            return Ok(cached);
        }

        let url = self.request_url(week);
        debug!("Fetching scoreboard from {}", url);

        let resp = self.http.get(url.clone()).send().await.map_err(|e| {
            let message = if e.is_timeout() {
                "request timed out".to_string()
            } else {
                format!("request failed: {e}")
            };
            PickError::feed_unavailable(url.as_str(), message)
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(PickError::feed_unavailable(
                url.as_str(),
                format!("HTTP {status}"),
            ));
        }

        let raw = resp.text().await.map_err(|e| {
            PickError::feed_unavailable(url.as_str(), format!("failed to read body: {e}"))
        })?;
        let snapshot = parse_scoreboard(&raw).map_err(|e| {
            PickError::feed_unavailable(url.as_str(), format!("unparsable scoreboard: {e}"))
        })?;

        info!(
            "Fetched scoreboard {} ({} events, {} games)",
            key,
            snapshot.events.len(),
            snapshot.games.len()
        );

        let snapshot = Arc::new(snapshot);
        self.cache.put(&key, Arc::clone(&snapshot)).await;
        Ok(snapshot)
    }
}

// ── ESPN response types ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ScoreboardDocument {
    #[serde(default)]
    week: Option<WeekInfo>,
    #[serde(default)]
    events: Option<Vec<EspnEvent>>,
}

impl ScoreboardDocument {
    fn events(&self) -> &[EspnEvent] {
        self.events.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct WeekInfo {
    #[serde(default)]
    number: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct EspnEvent {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    competitions: Option<Vec<EspnCompetition>>,
}

impl EspnEvent {
    fn competition(&self) -> Option<&EspnCompetition> {
        self.competitions.as_deref().and_then(|c| c.first())
    }
}

#[derive(Debug, Deserialize)]
struct EspnCompetition {
    #[serde(default)]
    competitors: Option<Vec<EspnCompetitor>>,
    #[serde(default)]
    status: Option<EspnStatus>,
}

#[derive(Debug, Deserialize)]
struct EspnCompetitor {
    #[serde(rename = "homeAway", default)]
    home_away: Option<String>,
    #[serde(default)]
    team: Option<EspnTeam>,
    #[serde(default)]
    score: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct EspnTeam {
    #[serde(rename = "displayName", default)]
    display_name: Option<String>,
    #[serde(default)]
    abbreviation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EspnStatus {
    #[serde(rename = "type", default)]
    status_type: Option<EspnStatusType>,
}

#[derive(Debug, Deserialize)]
struct EspnStatusType {
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    completed: Option<bool>,
}

// ── Mapping ───────────────────────────────────────────────────────────────────

/// Parse a raw scoreboard body into a snapshot. Events that cannot be mapped
/// to a game are dropped from `games` but keep their timing in `events`.
/// A JSON `null` where a list is expected reads as an empty list.
pub fn parse_scoreboard(raw: &str) -> Result<FeedSnapshot, serde_json::Error> {
    let doc: ScoreboardDocument = serde_json::from_str(raw)?;

    let events = doc
        .events()
        .iter()
        .map(|ev| EventTiming {
            kickoff: ev.date.as_deref().and_then(parse_kickoff),
            completed: ev
                .competition()
                .and_then(|c| c.status.as_ref())
                .and_then(|s| s.status_type.as_ref())
                .and_then(|t| t.completed),
        })
        .collect();

    let games = doc
        .events()
        .iter()
        .filter_map(|ev| match map_event(ev) {
            Ok(game) => Some(game),
            Err(e) => {
                warn!("Skipping event: {}", e);
                None
            }
        })
        .collect();

    Ok(FeedSnapshot {
        raw: raw.to_string(),
        week_number: doc.week.and_then(|w| w.number),
        events,
        games,
    })
}

fn map_event(ev: &EspnEvent) -> Result<GameRecord, PickError> {
    let event_ref = ev.id.clone().unwrap_or_else(|| "<no id>".to_string());
    let comp = ev
        .competition()
        .ok_or_else(|| PickError::malformed_game(&event_ref, "no competition"))?;
    let competitors = comp.competitors.as_deref().unwrap_or_default();

    let home = find_side(competitors, "home")
        .ok_or_else(|| PickError::malformed_game(&event_ref, "missing home team"))?;
    let away = find_side(competitors, "away")
        .ok_or_else(|| PickError::malformed_game(&event_ref, "missing away team"))?;

    // A missing or unreadable date leaves the game unscheduled, not skipped
    let kickoff = ev.date.as_deref().and_then(parse_kickoff);
    if kickoff.is_none() {
        debug!("Event {} has no usable kickoff: {:?}", event_ref, ev.date);
    }

    let home_team = team_code(home.0, "HOME");
    let away_team = team_code(away.0, "AWAY");
    let game_id = match ev.id.as_deref().filter(|id| !id.is_empty()) {
        Some(id) => id.to_string(),
        None => synthesize_game_id(&home_team, &away_team, kickoff),
    };

    let status_type = comp.status.as_ref().and_then(|s| s.status_type.as_ref());
    let state = status_type.and_then(|t| t.state.as_deref());
    let is_final = status_type.and_then(|t| t.completed).unwrap_or(false);

    Ok(GameRecord {
        game_id,
        home_team,
        away_team,
        kickoff,
        home_score: parse_score(home.1),
        away_score: parse_score(away.1),
        status: GameStatus::from_feed_state(state),
        is_final,
        is_in_progress: state == Some("in"),
    })
}

/// Locate a competitor by its `homeAway` marker; only competitors with a team
/// reference qualify.
fn find_side<'a>(
    competitors: &'a [EspnCompetitor],
    side: &str,
) -> Option<(&'a EspnTeam, Option<&'a serde_json::Value>)> {
    competitors
        .iter()
        .find(|c| {
            c.home_away
                .as_deref()
                .is_some_and(|h| h.eq_ignore_ascii_case(side))
        })
        .and_then(|c| c.team.as_ref().map(|t| (t, c.score.as_ref())))
}

/// Abbreviation, else display name, else a positional placeholder.
fn team_code(team: &EspnTeam, placeholder: &str) -> String {
    team.abbreviation
        .as_deref()
        .filter(|s| !s.is_empty())
        .or_else(|| team.display_name.as_deref().filter(|s| !s.is_empty()))
        .unwrap_or(placeholder)
        .to_string()
}

/// `{home}-{away}-{kickoff}`, with `TBD` standing in for an unknown kickoff.
pub fn synthesize_game_id(home: &str, away: &str, kickoff: Option<DateTime<Utc>>) -> String {
    let when = kickoff
        .map(|k| k.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| "TBD".to_string());
    format!("{}-{}-{}", home, away, when)
}

/// Scores arrive string-encoded; a bare number is accepted too. Anything
/// else is unknown rather than zero.
fn parse_score(value: Option<&serde_json::Value>) -> Option<i32> {
    let value = value?;
    value
        .as_str()
        .and_then(|s| s.trim().parse().ok())
        .or_else(|| value.as_i64().and_then(|v| i32::try_from(v).ok()))
}

/// ESPN dates are minute precision (`2024-09-08T17:00Z`); full RFC 3339 is
/// accepted as well.
pub fn parse_kickoff(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%MZ")
        .ok()
        .map(|naive| naive.and_utc())
}
