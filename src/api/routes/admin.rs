use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tracing::info;

use crate::api::state::AppState;
use crate::api::{persist, ApiError};
use crate::calculate::{audit_roster_stats, rebuild_roster_stats, StatDiscrepancy};
use crate::storage::WriteBatch;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/stats-audit", get(stats_audit))
        .route("/api/admin/rebuild-stats", post(rebuild_stats))
}

#[derive(Debug, Serialize)]
pub struct AuditResponse {
    pub discrepancies: Vec<StatDiscrepancy>,
}

pub async fn stats_audit(State(state): State<AppState>) -> Result<Json<AuditResponse>, ApiError> {
    let seasons = state.store.seasons()?;
    let teams = state.store.teams()?;
    Ok(Json(AuditResponse {
        discrepancies: audit_roster_stats(&seasons, &teams),
    }))
}

#[derive(Debug, Serialize)]
pub struct RebuildResponse {
    pub teams: usize,
    /// Members whose counters were wrong before the rebuild
    pub corrected: Vec<StatDiscrepancy>,
}

/// Recompute every roster counter from the completed matches of all seasons.
pub async fn rebuild_stats(
    State(state): State<AppState>,
) -> Result<Json<RebuildResponse>, ApiError> {
    let _guard = state.write_lock.lock().await;
    let (seasons, teams) = state.store.snapshot()?;

    let corrected = audit_roster_stats(&seasons, &teams);
    let rebuilt = rebuild_roster_stats(&seasons, &teams);
    let count = rebuilt.len();
    if !corrected.is_empty() {
        persist(&state.store, WriteBatch::new().put_teams(rebuilt)).await?;
    }

    info!(
        "Rebuilt roster stats: {} teams, {} members corrected",
        count,
        corrected.len()
    );
    Ok(Json(RebuildResponse {
        teams: count,
        corrected,
    }))
}
