//! Fixture builders shared by the unit tests.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::PickError;
use crate::feed::espn::parse_scoreboard;
use crate::feed::provider::FeedSnapshot;
use crate::feed::ScoreboardSource;

pub struct EventFixture {
    pub id: Option<String>,
    pub home: String,
    pub away: String,
    pub home_score: Option<String>,
    pub away_score: Option<String>,
    pub state: String,
    pub completed: bool,
    pub date: String,
}

impl EventFixture {
    pub fn final_game(id: &str, home: &str, away: &str, home_score: &str, away_score: &str) -> Self {
        EventFixture {
            id: Some(id.to_string()),
            home: home.to_string(),
            away: away.to_string(),
            home_score: Some(home_score.to_string()),
            away_score: Some(away_score.to_string()),
            state: "post".to_string(),
            completed: true,
            date: "2024-09-08T17:00Z".to_string(),
        }
    }

    pub fn scheduled(id: &str, home: &str, away: &str) -> Self {
        EventFixture {
            state: "pre".to_string(),
            completed: false,
            ..Self::final_game(id, home, away, "0", "0")
        }
    }

    pub fn in_progress(id: &str, home: &str, away: &str, home_score: &str, away_score: &str) -> Self {
        EventFixture {
            state: "in".to_string(),
            completed: false,
            ..Self::final_game(id, home, away, home_score, away_score)
        }
    }

    pub fn on(mut self, date: &str) -> Self {
        self.date = date.to_string();
        self
    }
}

pub fn event_json(f: EventFixture) -> Value {
    let mut ev = json!({
        "date": f.date,
        "competitions": [{
            "competitors": [
                { "homeAway": "home", "team": { "abbreviation": f.home, "displayName": f.home }, "score": f.home_score },
                { "homeAway": "away", "team": { "abbreviation": f.away, "displayName": f.away }, "score": f.away_score }
            ],
            "status": { "type": { "state": f.state, "completed": f.completed } }
        }]
    });
    if let Some(id) = f.id {
        ev["id"] = json!(id);
    }
    ev
}

pub fn scoreboard_json(week: i64, events: Vec<Value>) -> String {
    json!({ "week": { "number": week }, "events": events }).to_string()
}

/// A week of finished games given as (home, away, home_score, away_score).
pub fn final_week(week: i64, results: &[(&str, &str, i32, i32)]) -> String {
    let events = results
        .iter()
        .enumerate()
        .map(|(i, (home, away, hs, aws))| {
            event_json(EventFixture::final_game(
                &format!("w{week}g{i}"),
                home,
                away,
                &hs.to_string(),
                &aws.to_string(),
            ))
        })
        .collect();
    scoreboard_json(week, events)
}

/// In-memory scoreboard source that records every request.
#[derive(Default)]
pub struct StaticSource {
    weeks: HashMap<Option<u32>, Arc<FeedSnapshot>>,
    calls: Mutex<Vec<Option<u32>>>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_week(mut self, week: Option<u32>, raw: &str) -> Self {
        let snapshot = parse_scoreboard(raw).expect("fixture parses");
        self.weeks.insert(week, Arc::new(snapshot));
        self
    }

    pub fn calls(&self) -> Vec<Option<u32>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScoreboardSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch(&self, week: Option<u32>) -> Result<Arc<FeedSnapshot>, PickError> {
        self.calls.lock().unwrap().push(week);
        self.weeks
            .get(&week)
            .cloned()
            .ok_or_else(|| PickError::feed_unavailable(format!("static://{week:?}"), "no fixture"))
    }
}
