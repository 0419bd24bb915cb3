use axum::extract::{ConnectInfo, FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::{header, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use axum::Json;
use serde::de::DeserializeOwned;
use std::net::SocketAddr;

use crate::error::AppError;
use crate::state::AppState;

pub const UID_COOKIE: &str = "uid";

/// The requesting principal: the opaque per-browser `uid` cookie. Nothing
/// about it is verified beyond presence; it identifies, it does not
/// authenticate.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: String,
}

impl FromRequestParts<AppState> for Principal {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        cookie_value(parts, UID_COOKIE)
            .map(|v| Principal {
                user_id: v.to_string(),
            })
            .ok_or(AppError::Unauthorized)
    }
}

/// Key the rate limiter buckets on: the first `x-forwarded-for` entry when
/// present (we sit behind a proxy in production), else the peer address,
/// else a shared local bucket.
#[derive(Debug, Clone)]
pub struct ClientKey(pub String);

impl FromRequestParts<AppState> for ClientKey {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(forwarded) = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.split(',').next())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
        {
            return Ok(ClientKey(forwarded));
        }

        let key = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.ip().to_string())
            .unwrap_or_else(|| "local".to_string());
        Ok(ClientKey(key))
    }
}

/// JSON request body. Any deserialization failure, missing field included,
/// answers with the 400 invalid-body envelope rather than axum's default
/// 422 rejection.
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|_| AppError::BadRequest("invalid body".into()))?;
        Ok(JsonBody(value))
    }
}

/// Middleware: mint a `uid` cookie for browsers that arrive without one.
/// The cookie lands on the response, so the assigning request itself is
/// still anonymous; every later request carries a stable principal.
pub async fn assign_uid_cookie(request: Request, next: Next) -> Response {
    let has_uid = request
        .headers()
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .any(|c| c.trim().starts_with("uid="));

    let mut response = next.run(request).await;

    if !has_uid {
        let uid = uuid::Uuid::now_v7().to_string();
        let cookie = format!(
            "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age=31536000",
            UID_COOKIE, uid
        );
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }

    response
}

fn cookie_value<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let mut split = cookie.splitn(2, '=');
            let key = split.next()?.trim();
            let val = split.next()?.trim();
            if key == name {
                Some(val)
            } else {
                None
            }
        })
}
