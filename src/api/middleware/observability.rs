//! Observability middleware.
//!
//! Sets up the tracing subscriber: `RUST_LOG` filter (default `info`), output
//! to stderr, text or JSON lines.

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber; later calls are ignored.
pub fn init_tracing(format: LogFormat) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_ansi(false);

    let installed = match format {
        LogFormat::Text => builder.try_init().is_ok(),
        LogFormat::Json => builder.json().try_init().is_ok(),
    };

    if installed {
        info!("Tracing initialized ({:?} output)", format);
    }
}
