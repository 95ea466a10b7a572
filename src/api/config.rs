//! Environment configuration for the API server.

use std::env;

use thiserror::Error;
use tracing::warn;

const DEV_JWT_SECRET: &str = "dev-secret-do-not-use-in-production-change-me-now";
const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("JWT_SECRET environment variable is required in production")]
    MissingJwtSecret,
    #[error("JWT_SECRET must be at least 32 characters in production")]
    WeakJwtSecret,
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    /// Absent means the in-memory backend
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub app_env: String,
    /// Empty means permissive CORS
    pub cors_allowed_origins: Vec<String>,
    pub rate_limit_per_minute: u32,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8081,
            database_url: None,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            app_env: "development".to_string(),
            cors_allowed_origins: Vec::new(),
            rate_limit_per_minute: 600,
            log_format: LogFormat::Text,
        }
    }
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match non_empty(name) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            value: raw,
        }),
        None => Ok(default),
    }
}

impl AppConfig {
    pub fn is_development(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("development")
    }

    /// Read the configuration from the process environment.
    ///
    /// Outside `APP_ENV=development` a missing or short `JWT_SECRET` is an error;
    /// in development it only warns and falls back to a fixed secret.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let app_env = non_empty("APP_ENV").unwrap_or_else(|| "production".to_string());
        let is_development = app_env.eq_ignore_ascii_case("development");

        let jwt_secret = match non_empty("JWT_SECRET") {
            Some(secret) => secret,
            None if is_development => {
                warn!(
                    "JWT_SECRET not set! Using default secret for development. DO NOT USE IN PRODUCTION!"
                );
                DEV_JWT_SECRET.to_string()
            }
            None => return Err(ConfigError::MissingJwtSecret),
        };
        if jwt_secret.len() < MIN_SECRET_LEN {
            if is_development {
                warn!("JWT_SECRET is less than 32 characters. Consider using a longer secret.");
            } else {
                return Err(ConfigError::WeakJwtSecret);
            }
        }

        let log_format = match non_empty("LOG_FORMAT").map(|v| v.to_lowercase()).as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "LOG_FORMAT",
                    value: other.to_string(),
                });
            }
        };

        let rate_limit_per_minute = parsed("RATE_LIMIT_PER_MINUTE", defaults.rate_limit_per_minute)?;
        if rate_limit_per_minute == 0 {
            return Err(ConfigError::Invalid {
                name: "RATE_LIMIT_PER_MINUTE",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            port: parsed("PORT", defaults.port)?,
            database_url: non_empty("DATABASE_URL"),
            jwt_secret,
            app_env,
            cors_allowed_origins: non_empty("CORS_ALLOWED_ORIGINS")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|o| !o.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            rate_limit_per_minute,
            log_format,
        })
    }
}
