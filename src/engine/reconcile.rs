//! Freezing prediction correctness once a game is final.
//!
//! `was_correct` is written at most once. Score corrections published after
//! the first reconciliation never flip a stored result.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::db::models::{GameRecord, Prediction};

/// Write side of the prediction store used by reconciliation.
pub trait CorrectnessStore {
    /// Set `was_correct` for a prediction that has none yet. Writing a flag
    /// that is already set must be a no-op. Returns whether a row changed.
    fn record_correctness(&self, prediction_id: i64, was_correct: bool) -> Result<bool>;
}

/// Winner by strictly higher final score. `None` for unfinished games,
/// missing scores, and final ties.
pub fn actual_winner(game: &GameRecord) -> Option<&str> {
    if !game.has_final_score() {
        return None;
    }
    match (game.home_score?, game.away_score?) {
        (h, a) if h > a => Some(game.home_team.as_str()),
        (h, a) if a > h => Some(game.away_team.as_str()),
        _ => None,
    }
}

/// The flag this prediction should receive now, if any. Already-reconciled
/// predictions yield `None`.
pub fn reconcile(prediction: &Prediction, game: &GameRecord) -> Option<bool> {
    if prediction.was_correct.is_some() {
        return None;
    }
    actual_winner(game).map(|winner| prediction.predicted_winner == winner)
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileSummary {
    /// Predictions marked correct, whenever that was determined
    pub correct_count: usize,
    /// Predictions whose flag was stored by this pass
    pub newly_determined: usize,
    /// Predictions whose game is final with both scores present
    pub total_finished: usize,
}

/// Reconcile a batch of stored predictions against one week's games.
///
/// Flags are updated in `predictions` as well as written through `store`; a
/// store failure aborts the pass and is returned.
pub fn reconcile_week(
    store: &dyn CorrectnessStore,
    predictions: &mut [Prediction],
    games: &[GameRecord],
) -> Result<ReconcileSummary> {
    let by_id: HashMap<&str, &GameRecord> =
        games.iter().map(|g| (g.game_id.as_str(), g)).collect();

    let mut summary = ReconcileSummary::default();
    for prediction in predictions.iter_mut() {
        let Some(game) = by_id.get(prediction.game_id.as_str()) else {
            debug!("No game {} in this week's feed", prediction.game_id);
            continue;
        };
        if !game.has_final_score() {
            continue;
        }
        summary.total_finished += 1;

        if let Some(flag) = reconcile(prediction, game) {
            if store.record_correctness(prediction.id, flag)? {
                summary.newly_determined += 1;
            } else {
                debug!("Prediction {} was reconciled concurrently", prediction.id);
            }
            prediction.was_correct = Some(flag);
        }
        if prediction.was_correct == Some(true) {
            summary.correct_count += 1;
        }
    }

    if summary.newly_determined > 0 {
        info!(
            "Reconciled {} prediction(s); {}/{} finished correct",
            summary.newly_determined, summary.correct_count, summary.total_finished
        );
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::GameStatus;
    use chrono::{TimeZone, Utc};
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingStore {
        writes: RefCell<Vec<(i64, bool)>>,
        already_set: Vec<i64>,
        fail: bool,
    }

    impl CorrectnessStore for RecordingStore {
        fn record_correctness(&self, prediction_id: i64, was_correct: bool) -> Result<bool> {
            if self.fail {
                anyhow::bail!("disk full");
            }
            if self.already_set.contains(&prediction_id) {
                return Ok(false);
            }
            self.writes.borrow_mut().push((prediction_id, was_correct));
            Ok(true)
        }
    }

    fn game(id: &str, home: Option<i32>, away: Option<i32>, is_final: bool) -> GameRecord {
        GameRecord {
            game_id: id.into(),
            home_team: "KC".into(),
            away_team: "BAL".into(),
            kickoff: Utc.with_ymd_and_hms(2024, 9, 6, 0, 20, 0).single(),
            home_score: home,
            away_score: away,
            status: if is_final { GameStatus::Final } else { GameStatus::InProgress },
            is_final,
            is_in_progress: !is_final,
        }
    }

    fn prediction(id: i64, game_id: &str, winner: &str) -> Prediction {
        Prediction {
            id,
            week: 1,
            season_year: 2024,
            game_id: game_id.into(),
            home_team: "KC".into(),
            away_team: "BAL".into(),
            predicted_winner: winner.into(),
            confidence: 0.6,
            was_correct: None,
            created_at: Utc.with_ymd_and_hms(2024, 9, 5, 12, 0, 0).unwrap(),
            notes: String::new(),
        }
    }

    #[test]
    fn test_actual_winner() {
        assert_eq!(actual_winner(&game("1", Some(27), Some(20), true)), Some("KC"));
        assert_eq!(actual_winner(&game("1", Some(20), Some(27), true)), Some("BAL"));
        assert_eq!(actual_winner(&game("1", Some(20), Some(20), true)), None);
        assert_eq!(actual_winner(&game("1", Some(27), Some(20), false)), None);
        assert_eq!(actual_winner(&game("1", None, Some(20), true)), None);
    }

    #[test]
    fn test_reconcile_sets_flag_once() {
        let g = game("1", Some(27), Some(20), true);
        let mut p = prediction(1, "1", "KC");
        assert_eq!(reconcile(&p, &g), Some(true));

        p.was_correct = Some(false);
        assert_eq!(reconcile(&p, &g), None);
    }

    #[test]
    fn test_reconcile_week_counts() {
        let games = vec![
            game("1", Some(27), Some(20), true),
            game("2", Some(10), Some(13), true),
            game("3", Some(7), Some(0), false),
            game("4", Some(17), Some(17), true),
        ];
        let mut preds = vec![
            prediction(10, "1", "KC"),
            prediction(11, "2", "KC"),
            prediction(12, "3", "KC"),
            prediction(13, "4", "KC"),
            prediction(14, "missing", "KC"),
        ];
        let store = RecordingStore::default();

        let summary = reconcile_week(&store, &mut preds, &games).unwrap();
        assert_eq!(
            summary,
            ReconcileSummary { correct_count: 1, newly_determined: 2, total_finished: 3 }
        );
        assert_eq!(*store.writes.borrow(), vec![(10, true), (11, false)]);
        assert_eq!(preds[0].was_correct, Some(true));
        assert_eq!(preds[1].was_correct, Some(false));
        assert_eq!(preds[2].was_correct, None);
        // final tie stays unset
        assert_eq!(preds[3].was_correct, None);
    }

    #[test]
    fn test_reconcile_week_is_idempotent() {
        let mut games = vec![game("1", Some(27), Some(20), true)];
        let mut preds = vec![prediction(10, "1", "BAL")];
        let store = RecordingStore::default();

        reconcile_week(&store, &mut preds, &games).unwrap();
        // a later score correction must not flip the stored result
        games[0].away_score = Some(30);
        let second = reconcile_week(&store, &mut preds, &games).unwrap();

        assert_eq!(preds[0].was_correct, Some(false));
        assert_eq!(second.newly_determined, 0);
        assert_eq!(second.correct_count, 0);
        assert_eq!(store.writes.borrow().len(), 1);
    }

    #[test]
    fn test_concurrent_write_not_counted() {
        let games = vec![
            game("1", Some(27), Some(20), true),
            game("2", Some(27), Some(20), true),
        ];
        let mut preds = vec![prediction(10, "1", "KC"), prediction(11, "2", "KC")];
        let store = RecordingStore { already_set: vec![10], ..Default::default() };

        let summary = reconcile_week(&store, &mut preds, &games).unwrap();
        assert_eq!(
            summary,
            ReconcileSummary { correct_count: 2, newly_determined: 1, total_finished: 2 }
        );
        assert_eq!(*store.writes.borrow(), vec![(11, true)]);
    }

    #[test]
    fn test_store_failure_surfaces() {
        let games = vec![game("1", Some(27), Some(20), true)];
        let mut preds = vec![prediction(10, "1", "KC")];
        let store = RecordingStore { fail: true, ..Default::default() };

        let err = reconcile_week(&store, &mut preds, &games).unwrap_err();
        assert!(err.to_string().contains("disk full"));
        assert_eq!(preds[0].was_correct, None);
    }
}
