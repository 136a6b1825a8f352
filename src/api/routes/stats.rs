use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::{load_season, ApiError};
use crate::calculate::{compute_standings, compute_top_assisters, compute_top_scorers};
use crate::models::{FormResult, PlayerStat, SeasonId, Standing};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/seasons/:season_id/standings", get(standings))
        .route("/api/seasons/:season_id/top-scorers", get(top_scorers))
        .route("/api/seasons/:season_id/top-assisters", get(top_assisters))
}

#[derive(Debug, Serialize)]
pub struct StandingRow {
    #[serde(flatten)]
    pub standing: Standing,
    pub recent_form: Vec<FormResult>,
}

#[derive(Debug, Serialize)]
pub struct StandingsResponse {
    pub season_id: SeasonId,
    pub season_name: String,
    pub standings: Vec<StandingRow>,
}

pub async fn standings(
    State(state): State<AppState>,
    Path(season_id): Path<SeasonId>,
) -> Result<Json<StandingsResponse>, ApiError> {
    let season = load_season(&state.store, &season_id)?;
    let teams = state.store.teams_in(&season.id)?;
    let form_length = state.config.league.form_length;

    let standings = compute_standings(&season, &teams)
        .into_iter()
        .map(|standing| StandingRow {
            recent_form: standing.recent_form(form_length).to_vec(),
            standing,
        })
        .collect();

    Ok(Json(StandingsResponse {
        season_id: season.id,
        season_name: season.name,
        standings,
    }))
}

#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardResponse {
    pub season_id: SeasonId,
    pub players: Vec<PlayerStat>,
}

fn resolve_limit(params: &LeaderboardParams, default: usize) -> Result<usize, ApiError> {
    match params.limit {
        Some(0) => Err(ApiError::BadRequest(
            "limit must be greater than 0".to_string(),
        )),
        Some(limit) => Ok(limit),
        None => Ok(default),
    }
}

pub async fn top_scorers(
    State(state): State<AppState>,
    Path(season_id): Path<SeasonId>,
    Query(params): Query<LeaderboardParams>,
) -> Result<Json<LeaderboardResponse>, ApiError> {
    let limit = resolve_limit(&params, state.config.league.leaderboard_size)?;
    let season = load_season(&state.store, &season_id)?;
    let teams = state.store.teams_in(&season.id)?;

    let mut players = compute_top_scorers(&season, &teams);
    players.truncate(limit);
    Ok(Json(LeaderboardResponse {
        season_id: season.id,
        players,
    }))
}

pub async fn top_assisters(
    State(state): State<AppState>,
    Path(season_id): Path<SeasonId>,
    Query(params): Query<LeaderboardParams>,
) -> Result<Json<LeaderboardResponse>, ApiError> {
    let limit = resolve_limit(&params, state.config.league.leaderboard_size)?;
    let season = load_season(&state.store, &season_id)?;
    let teams = state.store.teams_in(&season.id)?;

    let mut players = compute_top_assisters(&season, &teams);
    players.truncate(limit);
    Ok(Json(LeaderboardResponse {
        season_id: season.id,
        players,
    }))
}
