use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use rusqlite::params;
use serde_json::json;

use crate::db::fmt_ts;
use crate::error::{AppError, AppResult};
use crate::extractors::Principal;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/courts/{id}/home-court-count", get(home_court_count))
        .route("/courts/{id}/home-court", put(set_home_court))
}

/// How many players call this court home. Pure read over profiles.
async fn home_court_count(
    State(state): State<AppState>,
    Path(court_id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    if court_id.is_empty() {
        return Err(AppError::BadRequest("court id is required".into()));
    }

    let conn = state.db.get()?;
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM profiles WHERE home_court_id = ?1",
        params![court_id],
        |row| row.get(0),
    )?;

    Ok(Json(json!({ "ok": true, "count": count })))
}

/// Designate this court as the caller's home court (one per user).
async fn set_home_court(
    State(state): State<AppState>,
    principal: Principal,
    Path(court_id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    if court_id.is_empty() {
        return Err(AppError::BadRequest("court id is required".into()));
    }

    let conn = state.db.get()?;
    conn.execute(
        "INSERT INTO profiles (user_id, home_court_id, updated_at) VALUES (?1, ?2, ?3)
         ON CONFLICT (user_id) DO UPDATE SET home_court_id = ?2, updated_at = ?3",
        params![principal.user_id, court_id, fmt_ts(chrono::Utc::now())],
    )?;

    Ok(Json(json!({ "ok": true })))
}
