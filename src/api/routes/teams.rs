use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use crate::api::state::AppState;
use crate::api::{load_team, persist, ApiError};
use crate::models::{LeagueError, Member, Team, TeamId};
use crate::storage::WriteBatch;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/teams", get(list_teams).post(create_team))
        .route("/api/teams/:team_id", get(get_team))
        .route("/api/teams/:team_id/members", post(add_member))
}

pub async fn list_teams(State(state): State<AppState>) -> Result<Json<Vec<Team>>, ApiError> {
    let mut teams = state.store.teams()?;
    teams.sort_by_key(|t| t.name.to_lowercase());
    Ok(Json(teams))
}

#[derive(Debug, Deserialize)]
pub struct CreateTeamRequest {
    pub name: String,
    pub logo: Option<String>,
}

pub async fn create_team(
    State(state): State<AppState>,
    Json(req): Json<CreateTeamRequest>,
) -> Result<(StatusCode, Json<Team>), ApiError> {
    if req.name.trim().is_empty() {
        return Err(LeagueError::Validation("team name must not be empty".to_string()).into());
    }

    let _guard = state.write_lock.lock().await;
    let team = Team::new(req.name, req.logo);
    if state.store.team(&team.id)?.is_some() {
        return Err(ApiError::Conflict(format!(
            "team {} already exists",
            team.name
        )));
    }

    persist(&state.store, WriteBatch::new().put_team(team.clone())).await?;
    info!("Created team {} ({})", team.name, team.id);
    Ok((StatusCode::CREATED, Json(team)))
}

pub async fn get_team(
    State(state): State<AppState>,
    Path(team_id): Path<TeamId>,
) -> Result<Json<Team>, ApiError> {
    Ok(Json(load_team(&state.store, &team_id)?))
}

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub name: String,
    pub number: u32,
}

pub async fn add_member(
    State(state): State<AppState>,
    Path(team_id): Path<TeamId>,
    Json(req): Json<AddMemberRequest>,
) -> Result<(StatusCode, Json<Member>), ApiError> {
    let _guard = state.write_lock.lock().await;
    let mut team = load_team(&state.store, &team_id)?;
    let member = team.add_member(Member::new(req.name, req.number))?.clone();

    persist(&state.store, WriteBatch::new().put_team(team)).await?;
    Ok((StatusCode::CREATED, Json(member)))
}
