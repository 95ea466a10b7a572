//! API routes module - organizes all route handlers.
//!
//! Use case operations live under /use-cases; the whole router is nested at
//! /api/v1 by [`create_app`].

pub mod app_state;
pub mod auth_context;
pub mod error;
pub mod openapi;
pub mod use_cases;

use axum::{Json, Router, extract::State, middleware::from_fn_with_state, routing::get};
use serde_json::{Value, json};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::middleware::{create_custom_cors_layer, rate_limit_middleware};
pub use app_state::AppState;
pub use auth_context::AuthContext;
pub use error::ApiError;

/// Create the API router combining all route modules, with state applied.
pub fn create_api_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(use_cases::use_cases_router())
        // OpenAPI documentation endpoints
        .merge(openapi::openapi_router())
        .layer(from_fn_with_state(
            app_state.rate_limiter.clone(),
            rate_limit_middleware,
        ))
        .with_state(app_state)
}

/// Create the full application: root health check plus the API under /api/v1,
/// wrapped in request tracing and CORS.
pub fn create_app(app_state: AppState, config: &AppConfig) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .with_state(app_state.clone())
        .nest("/api/v1", create_api_router(app_state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_custom_cors_layer(&config.cors_allowed_origins)),
        )
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "use-case-api",
        "version": env!("CARGO_PKG_VERSION"),
        "storage": state.storage_kind,
    }))
}
