//! Unit tests for environment configuration
//!
//! Every test rewrites the process environment, so they run serially.

use serial_test::serial;
use use_case_api::config::{AppConfig, ConfigError, LogFormat};

const VARS: [&str; 7] = [
    "APP_ENV",
    "JWT_SECRET",
    "PORT",
    "DATABASE_URL",
    "CORS_ALLOWED_ORIGINS",
    "RATE_LIMIT_PER_MINUTE",
    "LOG_FORMAT",
];

const STRONG_SECRET: &str = "0123456789abcdef0123456789abcdef-strong";

fn with_env(vars: &[(&str, &str)], check: impl FnOnce(Result<AppConfig, ConfigError>)) {
    // SAFETY: tests touching the environment are serialized with #[serial].
    unsafe {
        for name in VARS {
            std::env::remove_var(name);
        }
        for (name, value) in vars {
            std::env::set_var(name, value);
        }
    }
    check(AppConfig::from_env());
    unsafe {
        for name in VARS {
            std::env::remove_var(name);
        }
    }
}

#[test]
#[serial]
fn test_production_requires_a_secret() {
    with_env(&[], |config| {
        assert_eq!(config, Err(ConfigError::MissingJwtSecret));
    });
    with_env(&[("JWT_SECRET", "short")], |config| {
        assert_eq!(config, Err(ConfigError::WeakJwtSecret));
    });
}

#[test]
#[serial]
fn test_development_falls_back_to_defaults() {
    with_env(&[("APP_ENV", "development")], |config| {
        let config = config.unwrap();
        assert!(config.is_development());
        assert_eq!(config.port, 8081);
        assert_eq!(config.database_url, None);
        assert!(config.cors_allowed_origins.is_empty());
        assert_eq!(config.rate_limit_per_minute, 600);
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.jwt_secret.len() >= 32);
    });
    with_env(&[("APP_ENV", "development"), ("JWT_SECRET", "short")], |config| {
        assert_eq!(config.unwrap().jwt_secret, "short");
    });
}

#[test]
#[serial]
fn test_values_are_read_from_the_environment() {
    with_env(
        &[
            ("JWT_SECRET", STRONG_SECRET),
            ("PORT", "9090"),
            ("DATABASE_URL", "postgres://localhost/use_cases"),
            ("CORS_ALLOWED_ORIGINS", "http://a.example, ,http://b.example"),
            ("RATE_LIMIT_PER_MINUTE", "120"),
            ("LOG_FORMAT", "JSON"),
        ],
        |config| {
            let config = config.unwrap();
            assert!(!config.is_development());
            assert_eq!(config.port, 9090);
            assert_eq!(
                config.database_url.as_deref(),
                Some("postgres://localhost/use_cases")
            );
            assert_eq!(
                config.cors_allowed_origins,
                vec!["http://a.example", "http://b.example"]
            );
            assert_eq!(config.rate_limit_per_minute, 120);
            assert_eq!(config.log_format, LogFormat::Json);
        },
    );
}

#[test]
#[serial]
fn test_malformed_values_are_rejected() {
    with_env(&[("JWT_SECRET", STRONG_SECRET), ("PORT", "eighty")], |config| {
        assert_eq!(
            config,
            Err(ConfigError::Invalid {
                name: "PORT",
                value: "eighty".to_string()
            })
        );
    });
    with_env(
        &[("JWT_SECRET", STRONG_SECRET), ("RATE_LIMIT_PER_MINUTE", "0")],
        |config| {
            assert!(matches!(
                config,
                Err(ConfigError::Invalid {
                    name: "RATE_LIMIT_PER_MINUTE",
                    ..
                })
            ));
        },
    );
    with_env(&[("JWT_SECRET", STRONG_SECRET), ("LOG_FORMAT", "xml")], |config| {
        assert!(matches!(config, Err(ConfigError::Invalid { name: "LOG_FORMAT", .. })));
    });
}
