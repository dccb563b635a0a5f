use std::sync::Arc;

use leadbook_core::ratelimit::RateLimiter;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: leadbook_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Per-principal fixed-window rate limiter for mutating operations.
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Build the application state from a pool and configuration, wiring the
    /// rate limiter with the configured window and budget.
    pub fn new(pool: leadbook_db::DbPool, config: ServerConfig) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(
            config.rate_limit_max_ops,
            config.rate_limit_window(),
        ));
        Self {
            pool,
            config: Arc::new(config),
            rate_limiter,
        }
    }
}
