//! Application state management.
//!
//! Defines the AppState struct that holds all shared application state: the
//! use case service over its storage backend, the JWT service and the rate
//! limiter.

use crate::config::AppConfig;
use crate::middleware::rate_limit::{RateLimiterState, create_rate_limiter_with_quota};
use crate::services::{JwtService, SharedJwtService, UseCaseService};
use crate::storage::{
    InMemoryStorageBackend, PostgresStorageBackend, StorageBackend, StorageError,
};
use axum::extract::FromRef;
use std::sync::Arc;
use tracing::info;

/// Application state shared across all route handlers.
#[derive(Clone)]
pub struct AppState {
    /// Use case operations over the configured storage backend
    pub use_cases: UseCaseService,
    /// Token validation for mutating routes
    pub jwt: SharedJwtService,
    /// Global request quota
    pub rate_limiter: RateLimiterState,
    /// `postgres` or `memory`, reported by the health check
    pub storage_kind: &'static str,
}

impl AppState {
    /// Create state over an explicit storage backend.
    pub fn new(
        storage: Arc<dyn StorageBackend>,
        storage_kind: &'static str,
        config: &AppConfig,
    ) -> Self {
        Self {
            use_cases: UseCaseService::new(storage),
            jwt: Arc::new(JwtService::new(&config.jwt_secret)),
            rate_limiter: create_rate_limiter_with_quota(config.rate_limit_per_minute),
            storage_kind,
        }
    }

    /// Create state over a fresh in-memory backend.
    pub fn in_memory(config: &AppConfig) -> Self {
        Self::with_memory_storage(InMemoryStorageBackend::new(), config)
    }

    /// Create state over a caller-held in-memory backend.
    pub fn with_memory_storage(storage: InMemoryStorageBackend, config: &AppConfig) -> Self {
        Self::new(Arc::new(storage), "memory", config)
    }

    /// Initialize storage from configuration.
    ///
    /// Connects to PostgreSQL and runs migrations when `DATABASE_URL` is set,
    /// otherwise falls back to in-memory storage.
    pub async fn from_config(config: &AppConfig) -> Result<Self, StorageError> {
        match &config.database_url {
            Some(database_url) => {
                let pool = sqlx::PgPool::connect(database_url).await.map_err(|e| {
                    StorageError::ConnectionError(format!("Failed to connect to database: {}", e))
                })?;
                let backend = PostgresStorageBackend::new(pool);
                backend.migrate().await?;
                info!("Using PostgreSQL storage");
                Ok(Self::new(Arc::new(backend), "postgres", config))
            }
            None => {
                info!("DATABASE_URL not set, using in-memory storage");
                Ok(Self::in_memory(config))
            }
        }
    }
}

// Allow AppState parts to be extracted by reference (for Axum)
impl FromRef<AppState> for UseCaseService {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.use_cases.clone()
    }
}

impl FromRef<AppState> for RateLimiterState {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.rate_limiter.clone()
    }
}
