use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::state::AppState;
use crate::api::{load_season, load_team, persist, today, ApiError};
use crate::calculate::{rebuild_roster_stats, reset_match_result};
use crate::models::{
    LeagueError, Match, MatchId, MatchStatus, PointsSystem, Round, RoundId, Season, SeasonId,
    SeasonStatus, SeasonUpdate, Team, TeamId,
};
use crate::storage::WriteBatch;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/seasons", get(list_seasons).post(create_season))
        .route(
            "/api/seasons/:season_id",
            get(get_season).patch(update_season).delete(delete_season),
        )
        .route("/api/seasons/:season_id/teams", post(register_team))
        .route("/api/seasons/:season_id/rounds", post(add_round))
        .route(
            "/api/seasons/:season_id/rounds/:round_id",
            delete(remove_round),
        )
        .route(
            "/api/seasons/:season_id/rounds/:round_id/matches",
            post(add_match),
        )
        .route(
            "/api/seasons/:season_id/matches/:match_id",
            patch(update_match).delete(remove_match),
        )
}

#[derive(Debug, Serialize)]
pub struct SeasonSummary {
    pub id: SeasonId,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: SeasonStatus,
    pub rounds: usize,
    pub matches: usize,
    pub completed_matches: usize,
}

impl From<&Season> for SeasonSummary {
    fn from(season: &Season) -> Self {
        Self {
            id: season.id.clone(),
            name: season.name.clone(),
            start_date: season.start_date,
            end_date: season.end_date,
            status: season.status,
            rounds: season.rounds.len(),
            matches: season.matches().count(),
            completed_matches: season
                .matches()
                .filter(|m| m.status == MatchStatus::Completed)
                .count(),
        }
    }
}

pub async fn list_seasons(
    State(state): State<AppState>,
) -> Result<Json<Vec<SeasonSummary>>, ApiError> {
    let mut seasons = state.store.seasons()?;
    seasons.sort_by(|a, b| {
        b.start_date
            .cmp(&a.start_date)
            .then_with(|| a.name.cmp(&b.name))
    });
    Ok(Json(seasons.iter().map(SeasonSummary::from).collect()))
}

#[derive(Debug, Deserialize)]
pub struct CreateSeasonRequest {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub points_system: Option<PointsSystem>,
}

pub async fn create_season(
    State(state): State<AppState>,
    Json(req): Json<CreateSeasonRequest>,
) -> Result<(StatusCode, Json<Season>), ApiError> {
    let _guard = state.write_lock.lock().await;
    let points = req
        .points_system
        .unwrap_or(state.config.league.points_system);
    let season = Season::new(req.name, req.start_date, req.end_date, points, today())?;

    if state.store.season(&season.id)?.is_some() {
        return Err(ApiError::Conflict(format!(
            "season {} starting {} already exists",
            season.name, season.start_date
        )));
    }

    persist(&state.store, WriteBatch::new().put_season(season.clone())).await?;
    info!("Created season {} ({})", season.name, season.id);
    Ok((StatusCode::CREATED, Json(season)))
}

pub async fn get_season(
    State(state): State<AppState>,
    Path(season_id): Path<SeasonId>,
) -> Result<Json<Season>, ApiError> {
    Ok(Json(load_season(&state.store, &season_id)?))
}

pub async fn update_season(
    State(state): State<AppState>,
    Path(season_id): Path<SeasonId>,
    Json(update): Json<SeasonUpdate>,
) -> Result<Json<Season>, ApiError> {
    let _guard = state.write_lock.lock().await;
    let mut season = load_season(&state.store, &season_id)?;
    season.update_details(update, today())?;

    persist(&state.store, WriteBatch::new().put_season(season.clone())).await?;
    Ok(Json(season))
}

/// Delete a season, unregister its teams and rebuild roster counters from
/// the seasons that remain.
pub async fn delete_season(
    State(state): State<AppState>,
    Path(season_id): Path<SeasonId>,
) -> Result<StatusCode, ApiError> {
    let _guard = state.write_lock.lock().await;
    let (mut seasons, mut teams) = state.store.snapshot()?;
    let before = seasons.len();
    seasons.retain(|s| s.id != season_id);
    if seasons.len() == before {
        return Err(LeagueError::not_found("Season", &season_id).into());
    }

    for team in &mut teams {
        team.seasons.retain(|s| s != &season_id);
    }
    let teams = rebuild_roster_stats(&seasons, &teams);

    persist(
        &state.store,
        WriteBatch::new()
            .delete_season(season_id.clone())
            .put_teams(teams),
    )
    .await?;
    info!("Deleted season {}", season_id);
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct RegisterTeamRequest {
    pub team_id: TeamId,
}

pub async fn register_team(
    State(state): State<AppState>,
    Path(season_id): Path<SeasonId>,
    Json(req): Json<RegisterTeamRequest>,
) -> Result<(StatusCode, Json<Team>), ApiError> {
    let _guard = state.write_lock.lock().await;
    let season = load_season(&state.store, &season_id)?;
    let mut team = load_team(&state.store, &req.team_id)?;

    if !team.register_for(season.id.clone()) {
        return Ok((StatusCode::OK, Json(team)));
    }
    persist(&state.store, WriteBatch::new().put_team(team.clone())).await?;
    info!("Registered {} for {}", team.name, season.name);
    Ok((StatusCode::CREATED, Json(team)))
}

#[derive(Debug, Deserialize)]
pub struct AddRoundRequest {
    pub number: u32,
}

pub async fn add_round(
    State(state): State<AppState>,
    Path(season_id): Path<SeasonId>,
    Json(req): Json<AddRoundRequest>,
) -> Result<(StatusCode, Json<Round>), ApiError> {
    let _guard = state.write_lock.lock().await;
    let mut season = load_season(&state.store, &season_id)?;
    let round = season.add_round(req.number)?.clone();

    persist(&state.store, WriteBatch::new().put_season(season)).await?;
    Ok((StatusCode::CREATED, Json(round)))
}

/// Remove a round and its matches. Completed matches are reset first so
/// their goals leave the roster counters.
pub async fn remove_round(
    State(state): State<AppState>,
    Path((season_id, round_id)): Path<(SeasonId, RoundId)>,
) -> Result<StatusCode, ApiError> {
    let _guard = state.write_lock.lock().await;
    let season = load_season(&state.store, &season_id)?;
    let completed: Vec<MatchId> = season
        .round(&round_id)
        .ok_or_else(|| LeagueError::not_found("Round", &round_id))?
        .matches
        .iter()
        .filter(|m| m.status == MatchStatus::Completed)
        .map(|m| m.id.clone())
        .collect();

    let (mut season, teams) = reset_results(season, state.store.teams()?, &completed)?;
    let removed = season.remove_round(&round_id)?;

    persist(
        &state.store,
        WriteBatch::new().put_season(season).put_teams(teams),
    )
    .await?;
    info!(
        "Removed round {} with {} matches ({} results reset)",
        removed.number,
        removed.matches.len(),
        completed.len()
    );
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct AddMatchRequest {
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    pub date: NaiveDate,
}

pub async fn add_match(
    State(state): State<AppState>,
    Path((season_id, round_id)): Path<(SeasonId, RoundId)>,
    Json(req): Json<AddMatchRequest>,
) -> Result<(StatusCode, Json<Match>), ApiError> {
    let _guard = state.write_lock.lock().await;
    let mut season = load_season(&state.store, &season_id)?;
    let teams = state.store.teams()?;
    let added = season
        .add_match(
            &round_id,
            req.home_team_id,
            req.away_team_id,
            req.date,
            &teams,
        )?
        .clone();

    persist(&state.store, WriteBatch::new().put_season(season)).await?;
    Ok((StatusCode::CREATED, Json(added)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateMatchRequest {
    pub date: Option<NaiveDate>,
    pub status: Option<MatchStatus>,
}

pub async fn update_match(
    State(state): State<AppState>,
    Path((season_id, match_id)): Path<(SeasonId, MatchId)>,
    Json(req): Json<UpdateMatchRequest>,
) -> Result<Json<Match>, ApiError> {
    let _guard = state.write_lock.lock().await;
    let mut season = load_season(&state.store, &season_id)?;
    let updated = season.update_match(&match_id, req.date, req.status)?.clone();

    persist(&state.store, WriteBatch::new().put_season(season)).await?;
    Ok(Json(updated))
}

pub async fn remove_match(
    State(state): State<AppState>,
    Path((season_id, match_id)): Path<(SeasonId, MatchId)>,
) -> Result<StatusCode, ApiError> {
    let _guard = state.write_lock.lock().await;
    let season = load_season(&state.store, &season_id)?;
    let (_, m) = season
        .find_match(&match_id)
        .ok_or_else(|| LeagueError::not_found("Match", &match_id))?;
    let completed = if m.status == MatchStatus::Completed {
        vec![match_id.clone()]
    } else {
        Vec::new()
    };

    let (mut season, teams) = reset_results(season, state.store.teams()?, &completed)?;
    season.remove_match(&match_id)?;

    persist(
        &state.store,
        WriteBatch::new().put_season(season).put_teams(teams),
    )
    .await?;
    info!("Removed match {}", match_id);
    Ok(StatusCode::NO_CONTENT)
}

/// Reset each listed match in turn, threading the updated season and teams
/// through. Returns the season and only the teams that changed.
fn reset_results(
    mut season: Season,
    mut teams: Vec<Team>,
    match_ids: &[MatchId],
) -> Result<(Season, Vec<Team>), LeagueError> {
    let mut touched: Vec<TeamId> = Vec::new();
    for match_id in match_ids {
        let reconciliation = reset_match_result(&season, &teams, match_id)?;
        for team in [reconciliation.home_team, reconciliation.away_team] {
            if !touched.contains(&team.id) {
                touched.push(team.id.clone());
            }
            if let Some(slot) = teams.iter_mut().find(|t| t.id == team.id) {
                *slot = team;
            }
        }
        season = reconciliation.season;
    }
    teams.retain(|t| touched.contains(&t.id));
    Ok((season, teams))
}
