//! Tracing initialization.

use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

/// Environment variable consulted for the log filter before `RUST_LOG`.
pub const LOG_ENV: &str = "RULEBOOK_LOG";

static INIT: Once = Once::new();

fn filter(default: tracing::Level) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default.as_str()))
}

/// Initialize tracing on stderr, leaving stdout to the MCP transport.
/// Safe to call multiple times; only the first call takes effect.
pub fn init(json: bool) {
    INIT.call_once(|| {
        let is_test =
            std::env::var("NEXTEST").is_ok() || std::env::var("CARGO_TARGET_TMPDIR").is_ok();
        let level = if is_test {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        };

        let result = if is_test {
            tracing_subscriber::fmt()
                .with_env_filter(filter(level))
                .with_test_writer()
                .try_init()
        } else if json {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter(level))
                .with_writer(std::io::stderr)
                .try_init()
        } else {
            tracing_subscriber::fmt()
                .with_env_filter(filter(level))
                .with_ansi(false)
                .with_target(true)
                .with_span_events(FmtSpan::NONE)
                .compact()
                .with_writer(std::io::stderr)
                .try_init()
        };

        if let Err(e) = result {
            eprintln!("Failed to initialize tracing: {}", e);
        }
    });
}
