pub mod admin;
pub mod results;
pub mod seasons;
pub mod stats;
pub mod teams;

use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::api::state::AppState;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health))
        .merge(seasons::routes())
        .merge(results::routes())
        .merge(stats::routes())
        .merge(teams::routes())
        .merge(admin::routes())
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
