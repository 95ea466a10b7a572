// Middleware module - contains observability, CORS and rate limiting middleware

pub mod cors;
pub mod observability;
pub mod rate_limit;

// Re-export for convenience
pub use cors::{create_cors_layer, create_custom_cors_layer};
pub use observability::init_tracing;
pub use rate_limit::{RateLimiterState, create_rate_limiter_with_quota, rate_limit_middleware};
