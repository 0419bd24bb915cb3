//! Geofenced check-ins and the derived "who is live where" view.
//!
//! Check-ins are append-only. A row is active while `expires_at` is in the
//! future; there is no stored flag and no sweeper, every reader filters by
//! time. Creating one requires holding a reservation for the court that
//! covers the current instant, plus physical proximity to the court.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::config::LimitsConfig;
use crate::db::fmt_ts;
use crate::db::models::Checkin;
use crate::error::{AppError, AppResult};
use crate::geo::{distance_meters, Coord};
use crate::notify::{ChangeNotifier, Entity, Op};

const CHECKIN_COLUMNS: &str =
    "id, user_id, court_id, court_name, lat, lon, accuracy_m, source, checked_in_at, expires_at";

#[derive(Debug)]
pub struct CheckinOutcome {
    pub checkin: Checkin,
    pub distance_m: f64,
}

/// Non-expired check-ins for a court, newest first.
pub fn list_active(
    conn: &Connection,
    court_id: &str,
    now: DateTime<Utc>,
) -> AppResult<Vec<Checkin>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CHECKIN_COLUMNS} FROM checkins
         WHERE court_id = ?1 AND expires_at > ?2
         ORDER BY checked_in_at DESC"
    ))?;
    let rows = stmt
        .query_map(params![court_id, fmt_ts(now)], Checkin::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Check-ins recorded since `since`, newest first. Expired rows included;
/// this is the recent-history view shown after a new check-in.
pub fn list_recent(
    conn: &Connection,
    court_id: &str,
    since: DateTime<Utc>,
) -> AppResult<Vec<Checkin>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CHECKIN_COLUMNS} FROM checkins
         WHERE court_id = ?1 AND checked_in_at >= ?2
         ORDER BY checked_in_at DESC"
    ))?;
    let rows = stmt
        .query_map(params![court_id, fmt_ts(since)], Checkin::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Record presence at a court.
///
/// Admitted only when the user holds a reservation for this court whose
/// interval contains `now`, and the submitted position lies within the
/// in-person fence of the court's registered coordinates. The rejection for
/// a failed fence carries the measured distance so the client can tell the
/// user how far off they are.
#[allow(clippy::too_many_arguments)]
pub fn check_in(
    conn: &Connection,
    limits: &LimitsConfig,
    notifier: &ChangeNotifier,
    user_id: &str,
    court_id: &str,
    court_name: &str,
    court_coord: Coord,
    user_coord: Coord,
    accuracy_m: Option<f64>,
    source: &str,
    now: DateTime<Utc>,
) -> AppResult<CheckinOutcome> {
    let now_s = fmt_ts(now);

    let covered: i64 = conn.query_row(
        "SELECT COUNT(*) FROM reservations
         WHERE user_id = ?1 AND court_id = ?2 AND starts_at <= ?3 AND ends_at >= ?3",
        params![user_id, court_id, now_s],
        |row| row.get(0),
    )?;
    if covered == 0 {
        return Err(AppError::NoActiveReservation);
    }

    let distance_m = distance_meters(user_coord, court_coord);
    if distance_m > limits.checkin_max_dist_m {
        return Err(AppError::OutOfRange {
            distance_m,
            max_m: limits.checkin_max_dist_m,
        });
    }

    let id = uuid::Uuid::now_v7().to_string();
    let expires = fmt_ts(now + limits.checkin_ttl());
    conn.execute(
        "INSERT INTO checkins (id, user_id, court_id, court_name, lat, lon, accuracy_m, source, checked_in_at, expires_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            id,
            user_id,
            court_id,
            court_name,
            user_coord.lat,
            user_coord.lon,
            accuracy_m,
            source,
            now_s,
            expires
        ],
    )?;

    let checkin = conn.query_row(
        &format!("SELECT {CHECKIN_COLUMNS} FROM checkins WHERE id = ?1"),
        params![id],
        Checkin::from_row,
    )?;

    notifier.publish(Entity::Checkin, court_id, Op::Insert);
    tracing::info!(user_id, court_id, distance_m, "checked in");

    Ok(CheckinOutcome {
        checkin,
        distance_m,
    })
}

/// Distinct courts with at least one non-expired check-in. Recomputed on
/// demand; nothing is materialized.
pub fn active_court_ids(conn: &Connection, now: DateTime<Utc>) -> AppResult<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT DISTINCT court_id FROM checkins WHERE expires_at > ?1")?;
    let ids = stmt
        .query_map(params![fmt_ts(now)], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(ids)
}
