use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Active reservation quota reached ({held} held)")]
    QuotaExceeded { held: i64 },

    #[error("Slot is full ({capacity} reservations)")]
    SlotFull { capacity: i64 },

    #[error("Too far from court: {distance_m:.0}m (max {max_m:.0}m)")]
    OutOfRange { distance_m: f64, max_m: f64 },

    #[error("No active reservation for this court")]
    NoActiveReservation,

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                json!({ "ok": false, "error": "not found" }),
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "ok": false, "error": "no user id" }),
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                json!({ "ok": false, "error": "forbidden" }),
            ),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "ok": false, "error": msg }),
            ),
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                json!({ "ok": false, "error": "rate limit" }),
            ),
            AppError::QuotaExceeded { held } => (
                StatusCode::CONFLICT,
                json!({ "ok": false, "error": "reservation quota reached", "held": held }),
            ),
            AppError::SlotFull { capacity } => (
                StatusCode::CONFLICT,
                json!({ "ok": false, "error": "slot full", "capacity": capacity }),
            ),
            AppError::OutOfRange { distance_m, max_m } => (
                StatusCode::BAD_REQUEST,
                json!({ "ok": false, "error": "too far", "dist": distance_m, "max": max_m }),
            ),
            AppError::NoActiveReservation => (
                StatusCode::CONFLICT,
                json!({ "ok": false, "error": "no active reservation" }),
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "ok": false, "error": "internal server error" }),
                )
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "ok": false, "error": "internal server error" }),
                )
            }
            AppError::Json(e) => {
                tracing::error!("JSON error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "ok": false, "error": "internal server error" }),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "ok": false, "error": "internal server error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
