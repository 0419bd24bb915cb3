use rusqlite::Row;
use serde::{Deserialize, Serialize};

/// A slot booking: one user holding one fixed-length slot at one court.
/// `ends_at` is always derived from `starts_at` plus the configured slot
/// length; it is stored denormalized for cheap relevance filtering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: String,
    pub user_id: String,
    pub court_id: String,
    pub court_name: String,
    pub starts_at: String,
    pub ends_at: String,
    pub created_at: String,
}

impl Reservation {
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            court_id: row.get(2)?,
            court_name: row.get(3)?,
            starts_at: row.get(4)?,
            ends_at: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}

/// A presence record. Immutable once written; considered active while
/// `expires_at` lies in the future.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkin {
    pub id: String,
    pub user_id: String,
    pub court_id: String,
    pub court_name: String,
    pub lat: f64,
    pub lon: f64,
    pub accuracy_m: Option<f64>,
    pub source: String,
    pub checked_in_at: String,
    pub expires_at: String,
}

impl Checkin {
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            court_id: row.get(2)?,
            court_name: row.get(3)?,
            lat: row.get(4)?,
            lon: row.get(5)?,
            accuracy_m: row.get(6)?,
            source: row.get(7)?,
            checked_in_at: row.get(8)?,
            expires_at: row.get(9)?,
        })
    }
}
