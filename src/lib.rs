// Library exports for Courtkeeper
// This allows integration tests and external code to use Courtkeeper modules

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod geo;
pub mod ledger;
pub mod notify;
pub mod presence;
pub mod rate_limit;
pub mod routes;
pub mod state;

use axum::middleware;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the full application router over the given state.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .merge(routes::checkins::router())
        .merge(routes::rsvps::router())
        .merge(routes::courts::router())
        .layer(middleware::from_fn(extractors::assign_uid_cookie))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
