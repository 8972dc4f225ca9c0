//! Logging and tracing infrastructure for hidewatch.
//!
//! Structured logging through the tracing crate. Output goes to stderr so the
//! CLI's report on stdout stays machine readable.

use std::sync::Once;
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Initialize the global tracing subscriber.
///
/// `default_level` applies when `RUST_LOG` is unset. Subsequent calls are
/// ignored.
pub fn init_tracing(default_level: &str) {
    INIT.call_once(|| {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        let _ = tracing_subscriber::registry()
            .with(env_filter(default_level))
            .with(fmt_layer)
            .try_init();

        debug!(pid = std::process::id(), "hidewatch tracing initialized");
    });
}

/// Initialize tracing with JSON output for structured logging.
pub fn init_tracing_json(default_level: &str) {
    INIT.call_once(|| {
        let fmt_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_current_span(true);

        let _ = tracing_subscriber::registry()
            .with(env_filter(default_level))
            .with(fmt_layer)
            .try_init();

        debug!(pid = std::process::id(), "hidewatch tracing initialized (JSON mode)");
    });
}
