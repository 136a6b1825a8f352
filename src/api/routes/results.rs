use axum::extract::{Path, State};
use axum::routing::put;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::state::AppState;
use crate::api::{load_season, load_team, persist, ApiError};
use crate::calculate::{apply_match_result, reset_match_result, SkippedReference};
use crate::models::{LeagueError, Match, MatchGoals, MatchId, MatchResult, SeasonId};
use crate::storage::WriteBatch;

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/api/seasons/:season_id/matches/:match_id/result",
        put(put_result).delete(delete_result),
    )
}

/// Result submission. Scores are optional; when given they must agree with
/// the goal log.
#[derive(Debug, Deserialize)]
pub struct ResultRequest {
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    #[serde(default)]
    pub goals: MatchGoals,
}

impl ResultRequest {
    fn into_result(self) -> MatchResult {
        let mut result = MatchResult::from_goals(self.goals);
        if let Some(score) = self.home_score {
            result.home_score = score;
        }
        if let Some(score) = self.away_score {
            result.away_score = score;
        }
        result
    }
}

#[derive(Debug, Serialize)]
pub struct ResultResponse {
    #[serde(rename = "match")]
    pub updated_match: Match,
    pub skipped: Vec<SkippedReference>,
}

pub async fn put_result(
    State(state): State<AppState>,
    Path((season_id, match_id)): Path<(SeasonId, MatchId)>,
    Json(req): Json<ResultRequest>,
) -> Result<Json<ResultResponse>, ApiError> {
    let _guard = state.write_lock.lock().await;
    let season = load_season(&state.store, &season_id)?;
    let (_, m) = season
        .find_match(&match_id)
        .ok_or_else(|| LeagueError::not_found("Match", &match_id))?;
    let home = load_team(&state.store, &m.home_team_id)?;
    let away = load_team(&state.store, &m.away_team_id)?;

    let result = req.into_result();
    result.check_scores()?;
    result.validate_against(&home, &away)?;

    let reconciliation = apply_match_result(&season, &[home, away], &match_id, result)?;
    let response = ResultResponse {
        updated_match: reconciliation.updated_match.clone(),
        skipped: reconciliation.skipped.clone(),
    };
    persist(&state.store, WriteBatch::from(reconciliation)).await?;
    Ok(Json(response))
}

pub async fn delete_result(
    State(state): State<AppState>,
    Path((season_id, match_id)): Path<(SeasonId, MatchId)>,
) -> Result<Json<ResultResponse>, ApiError> {
    let _guard = state.write_lock.lock().await;
    let season = load_season(&state.store, &season_id)?;
    let (_, m) = season
        .find_match(&match_id)
        .ok_or_else(|| LeagueError::not_found("Match", &match_id))?;
    if m.result.is_none() {
        warn!("Reset requested for match {} which has no result", match_id);
    }
    let teams = [
        load_team(&state.store, &m.home_team_id)?,
        load_team(&state.store, &m.away_team_id)?,
    ];

    let reconciliation = reset_match_result(&season, &teams, &match_id)?;
    let response = ResultResponse {
        updated_match: reconciliation.updated_match.clone(),
        skipped: reconciliation.skipped.clone(),
    };
    persist(&state.store, WriteBatch::from(reconciliation)).await?;
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use crate::api::build_router;
    use crate::api::test_support::{get_json, member_id, seed_fixture, send_json, setup_test_state};
    use axum::http::StatusCode;
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    fn stats_of(team: &Value, index: usize) -> (u64, u64) {
        let stats = &team["members"][index]["stats"];
        (
            stats["goals"].as_u64().unwrap(),
            stats["assists"].as_u64().unwrap(),
        )
    }

    async fn team(state: &crate::api::AppState, id: &str) -> Value {
        get_json(build_router(state.clone()), &format!("/api/teams/{}", id))
            .await
            .1
    }

    #[tokio::test]
    async fn test_put_result_completes_match_and_credits_players() {
        let tmp = tempfile::tempdir().unwrap();
        let state = setup_test_state(tmp.path());
        let (season_id, _, match_id, home_id, away_id) = seed_fixture(&state).await;
        let ann = member_id(&state, &home_id, 0).await;
        let bea = member_id(&state, &home_id, 1).await;
        let cal = member_id(&state, &away_id, 0).await;

        let body = format!(
            r#"{{"goals":{{
                "home":[{{"type":"regular","scorer_id":"{ann}","assist_id":"{bea}"}},{{"type":"regular","scorer_id":"{bea}"}}],
                "away":[{{"type":"regular","scorer_id":"{cal}"}}]}}}}"#
        );
        let (status, json) = send_json(
            build_router(state.clone()),
            "PUT",
            &format!("/api/seasons/{}/matches/{}/result", season_id, match_id),
            Some(&body),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["match"]["status"], "completed");
        assert_eq!(json["match"]["result"]["home_score"], 2);
        assert_eq!(json["match"]["result"]["away_score"], 1);
        assert!(json["skipped"].as_array().unwrap().is_empty());

        let home = team(&state, &home_id).await;
        // Ann scored once; Bea scored once and assisted Ann.
        assert_eq!(stats_of(&home, 0), (1, 0));
        assert_eq!(stats_of(&home, 1), (1, 1));
        let away = team(&state, &away_id).await;
        assert_eq!(stats_of(&away, 0), (1, 0));
    }

    #[tokio::test]
    async fn test_replacing_result_moves_credits() {
        let tmp = tempfile::tempdir().unwrap();
        let state = setup_test_state(tmp.path());
        let (season_id, _, match_id, home_id, _) = seed_fixture(&state).await;
        let ann = member_id(&state, &home_id, 0).await;
        let bea = member_id(&state, &home_id, 1).await;
        let uri = format!("/api/seasons/{}/matches/{}/result", season_id, match_id);

        let first = format!(
            r#"{{"goals":{{"home":[{{"type":"regular","scorer_id":"{}"}}]}}}}"#,
            ann
        );
        send_json(build_router(state.clone()), "PUT", &uri, Some(&first)).await;
        let second = format!(
            r#"{{"goals":{{"home":[{{"type":"regular","scorer_id":"{}"}}]}}}}"#,
            bea
        );
        let (status, _) = send_json(build_router(state.clone()), "PUT", &uri, Some(&second)).await;
        assert_eq!(status, StatusCode::OK);

        let home = team(&state, &home_id).await;
        assert_eq!(stats_of(&home, 0), (0, 0));
        assert_eq!(stats_of(&home, 1), (1, 0));
    }

    #[tokio::test]
    async fn test_delete_result_restores_counters() {
        let tmp = tempfile::tempdir().unwrap();
        let state = setup_test_state(tmp.path());
        let (season_id, _, match_id, home_id, _) = seed_fixture(&state).await;
        let ann = member_id(&state, &home_id, 0).await;
        let uri = format!("/api/seasons/{}/matches/{}/result", season_id, match_id);

        let body = format!(
            r#"{{"goals":{{"home":[{{"type":"regular","scorer_id":"{}"}}]}}}}"#,
            ann
        );
        send_json(build_router(state.clone()), "PUT", &uri, Some(&body)).await;

        let (status, json) = send_json(build_router(state.clone()), "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["match"]["status"], "scheduled");
        assert!(json["match"].get("result").is_none());

        let home = team(&state, &home_id).await;
        assert_eq!(stats_of(&home, 0), (0, 0));
    }

    #[tokio::test]
    async fn test_scorer_from_other_roster_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let state = setup_test_state(tmp.path());
        let (season_id, _, match_id, home_id, away_id) = seed_fixture(&state).await;
        let cal = member_id(&state, &away_id, 0).await;

        let body = format!(
            r#"{{"goals":{{"home":[{{"type":"regular","scorer_id":"{}"}}]}}}}"#,
            cal
        );
        let (status, json) = send_json(
            build_router(state.clone()),
            "PUT",
            &format!("/api/seasons/{}/matches/{}/result", season_id, match_id),
            Some(&body),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("Invalid reference"));

        let away = team(&state, &away_id).await;
        assert_eq!(stats_of(&away, 0), (0, 0));
        let home = team(&state, &home_id).await;
        assert_eq!(stats_of(&home, 0), (0, 0));
    }

    #[tokio::test]
    async fn test_inconsistent_scores_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let state = setup_test_state(tmp.path());
        let (season_id, _, match_id, ..) = seed_fixture(&state).await;
        let uri = format!("/api/seasons/{}/matches/{}/result", season_id, match_id);

        let (status, _) = send_json(
            build_router(state.clone()),
            "PUT",
            &uri,
            Some(r#"{"home_score":2,"away_score":0,"goals":{"home":[{"type":"own"}]}}"#),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (_, season) =
            get_json(build_router(state), &format!("/api/seasons/{}", season_id)).await;
        assert_eq!(season["rounds"][0]["matches"][0]["status"], "scheduled");
    }

    #[tokio::test]
    async fn test_result_for_unknown_match_is_404() {
        let tmp = tempfile::tempdir().unwrap();
        let state = setup_test_state(tmp.path());
        let (season_id, ..) = seed_fixture(&state).await;

        let (status, _) = send_json(
            build_router(state),
            "PUT",
            &format!("/api/seasons/{}/matches/nope/result", season_id),
            Some(r#"{"goals":{}}"#),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
