//! Structured logging.
//!
//! The library only emits `tracing` events. Applications embedding it can
//! use [`try_init_logging`] to install a fmt subscriber, or
//! [`try_init_logging_from`] to take the filter from the `[observability]`
//! section of a loaded configuration.

use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::schema::ObservabilityConfig;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] ParseError),

    #[error("failed to install subscriber: {0}")]
    Init(#[from] TryInitError),
}

/// Install a global fmt subscriber using `filter` (e.g. "info" or
/// "traced_http_client=debug").
pub fn try_init_logging(filter: &str) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_new(filter)?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;
    Ok(())
}

/// Install a global fmt subscriber filtered by `config.log_level`.
pub fn try_init_logging_from(config: &ObservabilityConfig) -> Result<(), LoggingError> {
    try_init_logging(&config.log_level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_filter() {
        assert!(matches!(
            try_init_logging("traced_http_client=loud"),
            Err(LoggingError::Filter(_))
        ));
    }

    #[test]
    fn level_comes_from_config() {
        let bad = ObservabilityConfig {
            log_level: "traced_http_client=loud".to_string(),
        };
        assert!(matches!(
            try_init_logging_from(&bad),
            Err(LoggingError::Filter(_))
        ));

        // Another test in this binary may already own the global subscriber.
        let good = ObservabilityConfig::default();
        assert!(matches!(
            try_init_logging_from(&good),
            Ok(()) | Err(LoggingError::Init(_))
        ));
    }
}
