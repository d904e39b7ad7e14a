use serde::Serialize;
use std::collections::HashMap;

/// One game from a team's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GameResult {
    pub points_for: i32,
    pub points_against: i32,
}

/// Season totals for one team, plus its results in the order they were played.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamSeasonStats {
    /// Team code as first seen
    pub team: String,
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub points_for: i64,
    pub points_against: i64,
    pub results: Vec<GameResult>,
}

impl TeamSeasonStats {
    pub fn new(team: &str) -> Self {
        TeamSeasonStats {
            team: team.to_string(),
            games_played: 0,
            wins: 0,
            losses: 0,
            points_for: 0,
            points_against: 0,
            results: Vec::new(),
        }
    }

    /// Fold one game into the totals. A tie is neither a win nor a loss.
    pub fn add_game(&mut self, points_for: i32, points_against: i32) {
        self.games_played += 1;
        self.points_for += points_for as i64;
        self.points_against += points_against as i64;
        self.results.push(GameResult {
            points_for,
            points_against,
        });
        if points_for > points_against {
            self.wins += 1;
        } else if points_against > points_for {
            self.losses += 1;
        }
    }

    pub fn points_for_per_game(&self) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.points_for as f64 / self.games_played as f64
    }

    pub fn points_against_per_game(&self) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.points_against as f64 / self.games_played as f64
    }

    pub fn recent_points_for_per_game(&self, window: usize) -> f64 {
        average(self.recent(window).iter().map(|r| r.points_for))
    }

    pub fn recent_points_against_per_game(&self, window: usize) -> f64 {
        average(self.recent(window).iter().map(|r| r.points_against))
    }

    /// The last `window` results, window clamped to `[1, results.len()]`.
    pub fn recent(&self, window: usize) -> &[GameResult] {
        let n = window.max(1).min(self.results.len());
        &self.results[self.results.len() - n..]
    }
}

fn average(values: impl ExactSizeIterator<Item = i32>) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    values.map(|v| v as f64).sum::<f64>() / n as f64
}

/// Team stats keyed case-insensitively. The display casing of each team is
/// whatever was seen first and lives in [`TeamSeasonStats::team`].
#[derive(Debug, Clone, Default)]
pub struct SeasonStats {
    teams: HashMap<String, TeamSeasonStats>,
}

fn team_key(team: &str) -> String {
    team.trim().to_lowercase()
}

impl SeasonStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, team: &str) -> Option<&TeamSeasonStats> {
        self.teams.get(&team_key(team))
    }

    pub fn entry(&mut self, team: &str) -> &mut TeamSeasonStats {
        self.teams
            .entry(team_key(team))
            .or_insert_with(|| TeamSeasonStats::new(team))
    }

    /// Record a game for both sides.
    pub fn record_game(&mut self, home: &str, away: &str, home_score: i32, away_score: i32) {
        self.entry(home).add_game(home_score, away_score);
        self.entry(away).add_game(away_score, home_score);
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }
}
