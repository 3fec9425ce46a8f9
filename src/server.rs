//! HTTP transport for the analytics routes.
//!
//! Callers are assumed to be authenticated admins already; mount [`router`]
//! behind whatever gate the host application uses.

pub mod routes;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::routing::get;
use chrono::{DateTime, Utc};

use crate::chdb::{DataAccess, SqliteStore};
use crate::config::{Config, DayBoundary};
use crate::error::AnalyticsResult;
use crate::metrics::ReferenceTime;
use crate::metrics::consistency::ConsistencyPolicy;

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn DataAccess>,
    day_boundary: DayBoundary,
    consistency: ConsistencyPolicy,
    measured_attempts: bool,
    clock: fn() -> DateTime<Utc>,
}

impl AppState {
    pub fn new(store: Arc<dyn DataAccess>, config: &Config) -> Self {
        Self {
            store,
            day_boundary: config.day_boundary,
            consistency: config.consistency,
            measured_attempts: config.measured_attempts,
            clock: Utc::now,
        }
    }

    /// Replaces the wall clock, e.g. with a fixed instant in tests.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// The instant this request's metrics are anchored at. Read once per
    /// request, never cached.
    pub fn reference_time(&self) -> ReferenceTime {
        let instant = (self.clock)();
        instant.with_timezone(&self.day_boundary.offset_at(instant))
    }

    /// Runs synchronous store work on the blocking pool.
    async fn blocking<T, F>(&self, f: F) -> AnalyticsResult<T>
    where
        F: FnOnce(&dyn DataAccess) -> AnalyticsResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || f(store.as_ref())).await?
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/overview", get(routes::overview))
        .route("/user-engagement", get(routes::user_engagement))
        .route("/challenge-stats", get(routes::challenge_stats))
        .route("/traffic", get(routes::traffic))
        .route("/leaderboard-stats", get(routes::leaderboard_stats))
        .route("/submissions", get(routes::submissions))
        .with_state(state)
}

pub async fn run_server(config: Config) -> Result<()> {
    let store = SqliteStore::open(&config.database_path)
        .with_context(|| format!("Could not open database at {:?}", config.database_path))?;

    let app = router(AppState::new(Arc::new(store), &config));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Could not bind to {}", config.bind_addr))?;

    log::info!("Serving analytics on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
