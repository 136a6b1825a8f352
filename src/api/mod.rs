//! REST API endpoints.
//!
//! Axum-based HTTP API for managing seasons, teams and results, and for
//! querying standings and leaderboards.

pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::models::{LeagueError, Season, SeasonId, Team, TeamId};
use crate::storage::{LeagueStore, StorageError, WriteBatch};
pub use state::AppState;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Unprocessable(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<LeagueError> for ApiError {
    fn from(err: LeagueError) -> Self {
        match err {
            LeagueError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            LeagueError::InvalidReference(_)
            | LeagueError::InvariantViolation(_)
            | LeagueError::Validation(_) => ApiError::Unprocessable(err.to_string()),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        error!("Storage failure: {}", err);
        ApiError::Internal(err.to_string())
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Unprocessable(_) => (StatusCode::UNPROCESSABLE_ENTITY, "UNPROCESSABLE"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Build the application router with tracing and CORS layers.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origin);
    Router::new()
        .merge(routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origin == "*" {
        return layer.allow_origin(Any);
    }
    match origin.parse::<HeaderValue>() {
        Ok(value) => layer.allow_origin(value),
        Err(e) => {
            warn!("Ignoring invalid CORS origin {:?}: {}", origin, e);
            layer
        }
    }
}

pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub(crate) fn load_season(store: &LeagueStore, id: &SeasonId) -> Result<Season, ApiError> {
    store
        .season(id)?
        .ok_or_else(|| LeagueError::not_found("Season", id).into())
}

pub(crate) fn load_team(store: &LeagueStore, id: &TeamId) -> Result<Team, ApiError> {
    store
        .team(id)?
        .ok_or_else(|| LeagueError::not_found("Team", id).into())
}

/// Apply a write batch on the blocking thread pool.
pub(crate) async fn persist(
    store: &Arc<LeagueStore>,
    batch: WriteBatch,
) -> Result<usize, ApiError> {
    let store = Arc::clone(store);
    let written = tokio::task::spawn_blocking(move || store.apply(batch))
        .await
        .map_err(|e| ApiError::Internal(format!("write task failed: {}", e)))??;
    Ok(written)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::config::AppConfig;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use std::path::Path;
    use tower::util::ServiceExt;

    pub fn setup_test_state(dir: &Path) -> AppState {
        let config = AppConfig {
            data_dir: dir.to_path_buf(),
            ..AppConfig::default()
        };
        AppState::new(config)
    }

    pub async fn send_json(
        app: Router,
        method: &str,
        uri: &str,
        body: Option<&str>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        let request = match body {
            Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let resp = app.oneshot(request).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        send_json(app, "GET", uri, None).await
    }

    pub async fn post_json(app: Router, uri: &str, body: &str) -> (StatusCode, Value) {
        send_json(app, "POST", uri, Some(body)).await
    }

    /// Create a season with two registered teams of two players each.
    ///
    /// Returns `(season_id, round_id, match_id, home_id, away_id)`.
    pub async fn seed_fixture(state: &AppState) -> (String, String, String, String, String) {
        let (_, season) = post_json(
            build_router(state.clone()),
            "/api/seasons",
            r#"{"name":"Sunday League","start_date":"2025-08-01","end_date":"2026-05-31"}"#,
        )
        .await;
        let season_id = season["id"].as_str().unwrap().to_string();

        let mut team_ids = Vec::new();
        for (name, players) in [("Rovers", ["Ann", "Bea"]), ("United", ["Cal", "Dee"])] {
            let (_, team) = post_json(
                build_router(state.clone()),
                "/api/teams",
                &format!(r#"{{"name":"{}"}}"#, name),
            )
            .await;
            let team_id = team["id"].as_str().unwrap().to_string();
            for (i, player) in players.iter().enumerate() {
                post_json(
                    build_router(state.clone()),
                    &format!("/api/teams/{}/members", team_id),
                    &format!(r#"{{"name":"{}","number":{}}}"#, player, i + 7),
                )
                .await;
            }
            post_json(
                build_router(state.clone()),
                &format!("/api/seasons/{}/teams", season_id),
                &format!(r#"{{"team_id":"{}"}}"#, team_id),
            )
            .await;
            team_ids.push(team_id);
        }

        let (_, round) = post_json(
            build_router(state.clone()),
            &format!("/api/seasons/{}/rounds", season_id),
            r#"{"number":1}"#,
        )
        .await;
        let round_id = round["id"].as_str().unwrap().to_string();

        let (_, m) = post_json(
            build_router(state.clone()),
            &format!("/api/seasons/{}/rounds/{}/matches", season_id, round_id),
            &format!(
                r#"{{"home_team_id":"{}","away_team_id":"{}","date":"2025-09-07"}}"#,
                team_ids[0], team_ids[1]
            ),
        )
        .await;
        let match_id = m["id"].as_str().unwrap().to_string();

        let away_id = team_ids.pop().unwrap();
        let home_id = team_ids.pop().unwrap();
        (season_id, round_id, match_id, home_id, away_id)
    }

    /// Member id of the `index`th roster entry of a team.
    pub async fn member_id(state: &AppState, team_id: &str, index: usize) -> String {
        let (_, team) = get_json(build_router(state.clone()), &format!("/api/teams/{}", team_id)).await;
        team["members"][index]["id"].as_str().unwrap().to_string()
    }
}
