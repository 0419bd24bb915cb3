//! Slot booking ledger.
//!
//! Owns the `reservations` table. Booking enforces the per-user active
//! quota and the per-slot capacity inside a single IMMEDIATE transaction,
//! so concurrent bookings for the same slot cannot jointly slip past the
//! capacity check; the unique index on (user_id, court_id, starts_at)
//! backstops duplicate keys at the storage layer.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use crate::config::LimitsConfig;
use crate::db::models::Reservation;
use crate::db::fmt_ts;
use crate::error::{AppError, AppResult};
use crate::notify::{ChangeNotifier, Entity, Op};

/// What a successful `book` call hands back: the stored row, the slot's
/// post-write occupancy, and whether this call inserted a new row.
#[derive(Debug)]
pub struct BookOutcome {
    pub reservation: Reservation,
    pub slot_count: i64,
    pub created: bool,
}

/// Reservations for a court that are still relevant: `ends_at >= from`,
/// ascending by start.
pub fn list_reservations(
    conn: &Connection,
    court_id: &str,
    from: DateTime<Utc>,
) -> AppResult<Vec<Reservation>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, court_id, court_name, starts_at, ends_at, created_at
         FROM reservations
         WHERE court_id = ?1 AND ends_at >= ?2
         ORDER BY starts_at ASC",
    )?;
    let rows = stmt
        .query_map(params![court_id, fmt_ts(from)], Reservation::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Count of reservations the user holds whose end is still in the future.
pub fn count_active_for_user(
    conn: &Connection,
    user_id: &str,
    now: DateTime<Utc>,
) -> AppResult<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM reservations WHERE user_id = ?1 AND ends_at > ?2",
        params![user_id, fmt_ts(now)],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Occupancy of one exact slot. Counts expired rows too: whether a slot was
/// ever full stays meaningful after it passes.
pub fn count_for_slot(
    conn: &Connection,
    court_id: &str,
    starts_at: DateTime<Utc>,
) -> AppResult<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM reservations WHERE court_id = ?1 AND starts_at = ?2",
        params![court_id, fmt_ts(starts_at)],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Book one slot for one user.
///
/// Re-submitting an already-held slot is an idempotent success (the stored
/// row is refreshed, `created` is false, and neither quota nor capacity is
/// re-checked). A new booking is admitted only while the user is under
/// quota and the slot under capacity, both evaluated inside the same
/// transaction as the insert.
#[allow(clippy::too_many_arguments)]
pub fn book(
    conn: &mut Connection,
    limits: &LimitsConfig,
    notifier: &ChangeNotifier,
    user_id: &str,
    court_id: &str,
    court_name: &str,
    starts_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> AppResult<BookOutcome> {
    let starts = fmt_ts(starts_at);
    let ends = fmt_ts(starts_at + limits.slot_duration());

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let existing: Option<String> = tx
        .query_row(
            "SELECT id FROM reservations
             WHERE user_id = ?1 AND court_id = ?2 AND starts_at = ?3",
            params![user_id, court_id, starts],
            |row| row.get(0),
        )
        .optional()?;

    let created = existing.is_none();
    let id = match existing {
        Some(id) => {
            // Upsert path: refresh the denormalized display name only.
            tx.execute(
                "UPDATE reservations SET court_name = ?2 WHERE id = ?1",
                params![id, court_name],
            )?;
            id
        }
        None => {
            let held: i64 = tx.query_row(
                "SELECT COUNT(*) FROM reservations WHERE user_id = ?1 AND ends_at > ?2",
                params![user_id, fmt_ts(now)],
                |row| row.get(0),
            )?;
            if held >= limits.max_user_active_reservations {
                return Err(AppError::QuotaExceeded { held });
            }

            let occupied: i64 = tx.query_row(
                "SELECT COUNT(*) FROM reservations WHERE court_id = ?1 AND starts_at = ?2",
                params![court_id, starts],
                |row| row.get(0),
            )?;
            if occupied >= limits.max_slot_capacity {
                return Err(AppError::SlotFull {
                    capacity: limits.max_slot_capacity,
                });
            }

            let id = uuid::Uuid::now_v7().to_string();
            tx.execute(
                "INSERT INTO reservations (id, user_id, court_id, court_name, starts_at, ends_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![id, user_id, court_id, court_name, starts, ends, fmt_ts(now)],
            )?;
            id
        }
    };

    let reservation = tx.query_row(
        "SELECT id, user_id, court_id, court_name, starts_at, ends_at, created_at
         FROM reservations WHERE id = ?1",
        params![id],
        Reservation::from_row,
    )?;
    let slot_count: i64 = tx.query_row(
        "SELECT COUNT(*) FROM reservations WHERE court_id = ?1 AND starts_at = ?2",
        params![court_id, starts],
        |row| row.get(0),
    )?;

    tx.commit()?;

    notifier.publish(
        Entity::Reservation,
        court_id,
        if created { Op::Insert } else { Op::Update },
    );
    tracing::info!(user_id, court_id, starts_at = %starts, created, "slot booked");

    Ok(BookOutcome {
        reservation,
        slot_count,
        created,
    })
}

/// Cancel the caller's own reservation at the exact slot key. Rows held by
/// other users at the same slot are untouchable: attempting to target a
/// slot where only others hold rows is Forbidden, an empty slot is NotFound.
pub fn cancel(
    conn: &Connection,
    notifier: &ChangeNotifier,
    user_id: &str,
    court_id: &str,
    starts_at: DateTime<Utc>,
) -> AppResult<()> {
    let starts = fmt_ts(starts_at);

    let deleted = conn.execute(
        "DELETE FROM reservations
         WHERE user_id = ?1 AND court_id = ?2 AND starts_at = ?3",
        params![user_id, court_id, starts],
    )?;

    if deleted == 0 {
        let others: i64 = conn.query_row(
            "SELECT COUNT(*) FROM reservations WHERE court_id = ?1 AND starts_at = ?2",
            params![court_id, starts],
            |row| row.get(0),
        )?;
        return if others > 0 {
            Err(AppError::Forbidden)
        } else {
            Err(AppError::NotFound)
        };
    }

    notifier.publish(Entity::Reservation, court_id, Op::Delete);
    tracing::info!(user_id, court_id, starts_at = %starts, "reservation cancelled");
    Ok(())
}
