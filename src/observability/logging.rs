//! Structured logging.
//!
//! Uses the `tracing` ecosystem. `RUST_LOG` wins over the configured level so
//! operators can turn up a single module without editing the config file.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter used by [`init_logging`].
pub fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("humanwork_engine={level},humanwork={level},tower_http=info"))
    })
}

/// Install the global subscriber. Calling it again is a no-op.
pub fn init_logging(level: &str) {
    let result = tracing_subscriber::registry()
        .with(build_filter(level))
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    if result.is_ok() {
        tracing::debug!(level = %level, "Logging initialized");
    }
}
