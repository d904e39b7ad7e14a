use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::error;

use crate::db::models::PredictionDraft;
use crate::db::Database;
use crate::engine::PickEngine;
use crate::error::PickError;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub engine: PickEngine,
}

type ApiError = (StatusCode, String);

/// Build the Axum router for the pick API.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(ping_handler))
        .route("/api/scoreboard/context", get(context_handler))
        .route("/api/scoreboard/current", get(current_handler))
        .route("/api/scoreboard/week/:week", get(week_handler))
        .route("/predict", get(predict_handler))
        .route("/api/picks", post(save_picks_handler))
        .route("/api/picks/week/:week", get(week_picks_handler))
        .route("/api/picks/history", get(history_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

fn feed_error(e: PickError) -> ApiError {
    error!("Feed request failed: {}", e);
    match e {
        PickError::FeedUnavailable { .. } => (StatusCode::BAD_GATEWAY, e.to_string()),
        PickError::MalformedGameData { .. } => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

fn internal_error(e: anyhow::Error) -> ApiError {
    match e.downcast::<PickError>() {
        Ok(pick) => feed_error(pick),
        Err(e) => {
            error!("Request failed: {:#}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// GET /ping
async fn ping_handler() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

/// GET /api/scoreboard/context
async fn context_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .engine
        .resolver()
        .resolve_context()
        .await
        .map(Json)
        .map_err(feed_error)
}

/// GET /api/scoreboard/current
async fn current_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .engine
        .resolver()
        .resolve_upcoming_games()
        .await
        .map(Json)
        .map_err(feed_error)
}

/// GET /api/scoreboard/week/:week
async fn week_handler(
    State(state): State<Arc<AppState>>,
    Path(week): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .engine
        .resolver()
        .week_games(week)
        .await
        .map(Json)
        .map_err(feed_error)
}

#[derive(Debug, Deserialize)]
struct PredictQuery {
    recent: Option<i64>,
}

/// GET /predict?recent=3
async fn predict_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PredictQuery>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .engine
        .predict_active_week(query.recent)
        .await
        .map(Json)
        .map_err(feed_error)
}

/// POST /api/picks
async fn save_picks_handler(
    State(state): State<Arc<AppState>>,
    Json(drafts): Json<Vec<PredictionDraft>>,
) -> Result<impl IntoResponse, ApiError> {
    if drafts.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "No predictions provided".to_string(),
        ));
    }
    state
        .db
        .save_predictions(&drafts)
        .map(Json)
        .map_err(internal_error)
}

#[derive(Debug, Deserialize)]
struct YearQuery {
    year: Option<i32>,
}

/// GET /api/picks/week/:week?year=2024
async fn week_picks_handler(
    State(state): State<Arc<AppState>>,
    Path(week): Path<i64>,
    Query(query): Query<YearQuery>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .engine
        .review_week(&state.db, week, query.year)
        .await
        .map(Json)
        .map_err(internal_error)
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    week: Option<u32>,
    year: Option<i32>,
}

/// GET /api/picks/history?week=3&year=2024
async fn history_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .db
        .prediction_history(query.week, query.year)
        .map(Json)
        .map_err(internal_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::season::SeasonResolver;
    use crate::testing::{final_week, StaticSource};
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use serde_json::Value;
    use tower::ServiceExt;

    fn app(source: StaticSource) -> Router {
        let db = Database::open(":memory:").unwrap();
        let engine = PickEngine::new(SeasonResolver::new(Arc::new(source), 2), 3);
        router(AppState { db, engine })
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                req = req.header("content-type", "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let resp = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_ping() {
        let (status, body) = send(&app(StaticSource::new()), Method::GET, "/ping", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "ok": true }));
    }

    #[tokio::test]
    async fn test_context_rolls_past_finished_week() {
        let source = StaticSource::new().with_week(None, &final_week(5, &[("KC", "NO", 26, 13)]));
        let (status, body) = send(&app(source), Method::GET, "/api/scoreboard/context", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["currentWeek"], 5);
        assert_eq!(body["activePicksWeek"], 6);
        assert_eq!(body["maxWeek"], 18);
    }

    #[tokio::test]
    async fn test_week_route_clamps() {
        let source = StaticSource::new().with_week(Some(18), &final_week(18, &[("KC", "DEN", 0, 38)]));
        let (status, body) = send(&app(source), Method::GET, "/api/scoreboard/week/25", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["week"], 18);
        assert_eq!(body["games"][0]["homeTeam"], "KC");
        assert_eq!(body["games"][0]["awayScore"], 38);
        assert_eq!(body["games"][0]["status"], "post");
    }

    #[tokio::test]
    async fn test_feed_failure_is_bad_gateway() {
        let (status, _) = send(&app(StaticSource::new()), Method::GET, "/predict?recent=3", None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_save_and_review_picks() {
        let source = StaticSource::new().with_week(Some(2), &final_week(2, &[("KC", "CIN", 26, 25)]));
        let app = app(source);

        let (status, _) = send(&app, Method::POST, "/api/picks", Some(json!([]))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let picks = json!([{
            "week": 2, "seasonYear": 2024, "gameId": "w2g0",
            "homeTeam": "KC", "awayTeam": "CIN",
            "predictedWinner": "KC", "confidence": 0.62
        }]);
        let (status, body) = send(&app, Method::POST, "/api/picks", Some(picks)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "inserted": 1, "updated": 0, "total": 1 }));

        let (status, body) = send(&app, Method::GET, "/api/picks/week/2?year=2024", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["correctCount"], 1);
        assert_eq!(body["totalFinished"], 1);
        assert_eq!(body["predictions"][0]["wasCorrect"], true);
        assert_eq!(body["predictions"][0]["game"]["homeScore"], 26);

        let (status, body) = send(&app, Method::GET, "/api/picks/history?year=2024", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(1));
        assert_eq!(body[0]["wasCorrect"], true);
    }
}
