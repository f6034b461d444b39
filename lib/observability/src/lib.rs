//! Logging setup for the indexer binary.

use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber. `RUST_LOG` wins over the
/// configured default directive.
pub fn init_logging(default_directive: Option<String>) -> anyhow::Result<()> {
    let filter = if std::env::var(EnvFilter::DEFAULT_ENV).is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(default_directive.unwrap_or_else(|| "info".to_owned()))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
    Ok(())
}
