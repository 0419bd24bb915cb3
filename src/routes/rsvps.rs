use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Timelike, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::db::parse_ts;
use crate::error::{AppError, AppResult};
use crate::extractors::{ClientKey, JsonBody, Principal};
use crate::ledger;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRsvpBody {
    pub court_id: String,
    pub court_name: String,
    pub starts_at: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotQuery {
    pub court_id: Option<String>,
    pub starts_at: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourtQuery {
    pub court_id: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rsvps", get(slot_count).post(create_rsvp).delete(delete_rsvp))
        .route("/rsvps/upcoming", get(upcoming))
}

/// Reservation slots are minute-granular; anything finer is dropped.
fn parse_slot_start(raw: &str) -> AppResult<DateTime<Utc>> {
    parse_ts(raw)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .ok_or_else(|| AppError::BadRequest("invalid body".into()))
}

fn require_slot_params(query: &SlotQuery) -> AppResult<(String, DateTime<Utc>)> {
    match (&query.court_id, &query.starts_at) {
        (Some(court_id), Some(starts_at)) if !court_id.is_empty() && !starts_at.is_empty() => {
            Ok((court_id.clone(), parse_slot_start(starts_at)?))
        }
        _ => Err(AppError::BadRequest("missing params".into())),
    }
}

async fn slot_count(
    State(state): State<AppState>,
    Query(query): Query<SlotQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let (court_id, starts_at) = require_slot_params(&query)?;

    let conn = state.db.get()?;
    let count = ledger::count_for_slot(&conn, &court_id, starts_at)?;

    Ok(Json(json!({ "ok": true, "count": count })))
}

async fn upcoming(
    State(state): State<AppState>,
    Query(query): Query<CourtQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let court_id = query
        .court_id
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("missing params".into()))?;

    let conn = state.db.get()?;
    let rsvps = ledger::list_reservations(&conn, &court_id, Utc::now())?;

    Ok(Json(json!({ "ok": true, "rsvps": rsvps })))
}

async fn create_rsvp(
    State(state): State<AppState>,
    key: ClientKey,
    principal: Principal,
    JsonBody(body): JsonBody<CreateRsvpBody>,
) -> AppResult<Json<serde_json::Value>> {
    if !state.limiter.allow(&key.0) {
        return Err(AppError::RateLimited);
    }
    if body.court_id.is_empty() || body.court_name.is_empty() {
        return Err(AppError::BadRequest("invalid body".into()));
    }
    let starts_at = parse_slot_start(&body.starts_at)?;

    let mut conn = state.db.get()?;
    let outcome = ledger::book(
        &mut conn,
        &state.config.limits,
        &state.notifier,
        &principal.user_id,
        &body.court_id,
        &body.court_name,
        starts_at,
        Utc::now(),
    )?;

    Ok(Json(json!({
        "ok": true,
        "rsvp": outcome.reservation,
        "count": outcome.slot_count,
        "created": outcome.created,
    })))
}

async fn delete_rsvp(
    State(state): State<AppState>,
    key: ClientKey,
    principal: Principal,
    Query(query): Query<SlotQuery>,
) -> AppResult<Json<serde_json::Value>> {
    if !state.limiter.allow(&key.0) {
        return Err(AppError::RateLimited);
    }
    let (court_id, starts_at) = require_slot_params(&query)?;

    let conn = state.db.get()?;
    ledger::cancel(
        &conn,
        &state.notifier,
        &principal.user_id,
        &court_id,
        starts_at,
    )?;

    Ok(Json(json!({ "ok": true })))
}
