use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, AppResult};
use crate::extractors::{JsonBody, Principal};
use crate::geo::{distance_meters, Coord};
use crate::presence;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckinBody {
    pub court_id: String,
    pub court_name: String,
    pub court_lat: f64,
    pub court_lon: f64,
    pub lat: f64,
    pub lon: f64,
    pub accuracy: Option<f64>,
    pub source: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/checkins", post(create_checkin))
        .route("/checkins/active", get(active_courts))
}

async fn create_checkin(
    State(state): State<AppState>,
    principal: Principal,
    JsonBody(body): JsonBody<CheckinBody>,
) -> AppResult<Json<serde_json::Value>> {
    if body.court_id.is_empty() || body.court_name.is_empty() {
        return Err(AppError::BadRequest("invalid body".into()));
    }
    if !matches!(body.source.as_str(), "gps" | "map_center") {
        return Err(AppError::BadRequest("invalid body".into()));
    }

    let court = Coord::new(body.court_lat, body.court_lon);
    let user = Coord::new(body.lat, body.lon);
    if !court.is_valid() || !user.is_valid() {
        return Err(AppError::BadRequest("invalid body".into()));
    }

    // Coarse bound between the submitted point and the court the client
    // claims to be at: a device more than this far out is sending nonsense,
    // long before the in-person fence even matters.
    let limits = &state.config.limits;
    let dist = distance_meters(user, court);
    if dist > limits.sanity_max_dist_m {
        return Err(AppError::OutOfRange {
            distance_m: dist,
            max_m: limits.sanity_max_dist_m,
        });
    }

    let now = Utc::now();
    let conn = state.db.get()?;
    let outcome = presence::check_in(
        &conn,
        limits,
        &state.notifier,
        &principal.user_id,
        &body.court_id,
        &body.court_name,
        court,
        user,
        body.accuracy,
        &body.source,
        now,
    )?;

    let recent = presence::list_recent(&conn, &body.court_id, now - limits.recent_window())?;

    Ok(Json(json!({
        "ok": true,
        "checkins": recent,
        "dist": outcome.distance_m,
    })))
}

async fn active_courts(State(state): State<AppState>) -> AppResult<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    let court_ids = presence::active_court_ids(&conn, Utc::now())?;
    Ok(Json(json!({ "ok": true, "courtIds": court_ids })))
}
