use anyhow::{anyhow, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use crate::engine::CorrectnessStore;
use crate::season::clamp_week;

pub mod models;
use models::*;

/// Thread-safe SQLite prediction store (single connection with mutex)
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the SQLite database at the given path
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let db = Database {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Run schema migrations (idempotent)
    fn run_migrations(&self) -> Result<()> {
        self.conn()?.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("database connection mutex poisoned"))
    }

    // ── Predictions ───────────────────────────────────────────────────────────

    /// Upsert picks by (week, season_year, game_id). Weeks are clamped the
    /// same way lookups are. An existing pick whose winner or confidence
    /// changes loses its correctness flag.
    pub fn save_predictions(&self, drafts: &[PredictionDraft]) -> Result<SaveSummary> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut summary = SaveSummary::default();

        for draft in drafts {
            let week = clamp_week(draft.week as i64);
            let existing: Option<(i64, String, f64)> = tx
                .query_row(
                    "SELECT id, predicted_winner, confidence FROM predictions
                     WHERE week=?1 AND season_year=?2 AND game_id=?3",
                    params![week, draft.season_year, draft.game_id],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .optional()?;

            match existing {
                Some((id, winner, confidence)) => {
                    let changed = winner != draft.predicted_winner
                        || (confidence - draft.confidence).abs() > f64::EPSILON;
                    tx.execute(
                        "UPDATE predictions SET
                            predicted_winner=?1,
                            confidence=?2,
                            notes=?3,
                            was_correct=CASE WHEN ?4 THEN NULL ELSE was_correct END
                         WHERE id=?5",
                        params![
                            draft.predicted_winner,
                            draft.confidence,
                            draft.notes,
                            changed,
                            id
                        ],
                    )?;
                    summary.updated += 1;
                }
                None => {
                    tx.execute(
                        "INSERT INTO predictions (
                            week, season_year, game_id, home_team, away_team,
                            predicted_winner, confidence, was_correct, created_at, notes
                         ) VALUES (?1,?2,?3,?4,?5,?6,?7,NULL,?8,?9)",
                        params![
                            week,
                            draft.season_year,
                            draft.game_id,
                            draft.home_team,
                            draft.away_team,
                            draft.predicted_winner,
                            draft.confidence,
                            Utc::now(),
                            draft.notes,
                        ],
                    )?;
                    summary.inserted += 1;
                }
            }
        }

        tx.commit()?;
        summary.total = summary.inserted + summary.updated;
        debug!(
            "Saved predictions: {} inserted, {} updated",
            summary.inserted, summary.updated
        );
        Ok(summary)
    }

    /// Predictions for one week of one season
    pub fn week_predictions(&self, week: u32, season_year: i32) -> Result<Vec<Prediction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{PREDICTION_COLUMNS} WHERE week=?1 AND season_year=?2 ORDER BY id"
        ))?;
        let rows = stmt
            .query_map(params![week, season_year], map_prediction)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// All stored predictions, optionally filtered, newest first
    pub fn prediction_history(
        &self,
        week: Option<u32>,
        season_year: Option<i32>,
    ) -> Result<Vec<Prediction>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{PREDICTION_COLUMNS}
             WHERE (?1 IS NULL OR week=?1) AND (?2 IS NULL OR season_year=?2)
             ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt
            .query_map(params![week, season_year], map_prediction)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

impl CorrectnessStore for Database {
    fn record_correctness(&self, prediction_id: i64, was_correct: bool) -> Result<bool> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE predictions SET was_correct=?1 WHERE id=?2 AND was_correct IS NULL",
            params![was_correct, prediction_id],
        )?;
        if changed == 0 {
            debug!("Prediction {} already reconciled", prediction_id);
        }
        Ok(changed > 0)
    }
}

// ── SQL helpers ────────────────────────────────────────────────────────────────

const PREDICTION_COLUMNS: &str = "SELECT id, week, season_year, game_id, home_team, away_team,
        predicted_winner, confidence, was_correct, created_at, notes
 FROM predictions";

fn map_prediction(row: &rusqlite::Row) -> rusqlite::Result<Prediction> {
    Ok(Prediction {
        id: row.get(0)?,
        week: row.get(1)?,
        season_year: row.get(2)?,
        game_id: row.get(3)?,
        home_team: row.get(4)?,
        away_team: row.get(5)?,
        predicted_winner: row.get(6)?,
        confidence: row.get(7)?,
        was_correct: row.get(8)?,
        created_at: row.get(9)?,
        notes: row.get(10)?,
    })
}

/// SQLite schema (idempotent CREATE IF NOT EXISTS)
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS predictions (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    week             INTEGER NOT NULL,
    season_year      INTEGER NOT NULL,
    game_id          TEXT    NOT NULL,
    home_team        TEXT    NOT NULL,
    away_team        TEXT    NOT NULL,
    predicted_winner TEXT    NOT NULL,
    confidence       REAL    NOT NULL,
    was_correct      INTEGER,
    created_at       TEXT    NOT NULL,
    notes            TEXT    NOT NULL DEFAULT ''
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_predictions_pick
    ON predictions(week, season_year, game_id);
CREATE INDEX IF NOT EXISTS idx_predictions_game ON predictions(game_id);
CREATE INDEX IF NOT EXISTS idx_predictions_created ON predictions(created_at);
"#;
