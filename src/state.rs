use std::sync::Arc;
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::config::Config;
use crate::notify::ChangeNotifier;
use crate::rate_limit::RateLimiter;

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub limiter: Arc<RateLimiter>,
    pub notifier: ChangeNotifier,
}

impl AppState {
    pub fn new(db: DbPool, config: Config) -> Self {
        let limiter = RateLimiter::new(
            Duration::from_secs(config.limits.rate_window_secs),
            config.limits.rate_limit,
        );
        Self {
            db,
            config,
            limiter: Arc::new(limiter),
            notifier: ChangeNotifier::default(),
        }
    }
}
