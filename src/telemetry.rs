//! Structured logging setup.

use std::sync::Arc;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Errors raised while installing the tracing subscriber.
#[derive(Debug, Clone, Error)]
pub enum TelemetryError {
    /// The fallback filter directive is malformed.
    #[error("invalid log filter '{filter}': {source}")]
    Filter {
        /// Directive that failed to parse.
        filter: String,
        /// Parser error.
        source: Arc<tracing_subscriber::filter::ParseError>,
    },

    /// A global subscriber is already installed.
    #[error("tracing subscriber could not be installed: {0}")]
    Install(Arc<dyn std::error::Error + Send + Sync>),
}

/// Installs a global `fmt` subscriber writing to stderr.
///
/// `RUST_LOG` takes precedence; `fallback_filter` applies when it is unset
/// or invalid. Standard output is left untouched for event output.
///
/// # Errors
///
/// Returns [`TelemetryError`] when the fallback filter is malformed or a
/// subscriber is already installed.
pub fn init_tracing(fallback_filter: &str) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback_filter))
        .map_err(|err| TelemetryError::Filter {
            filter: fallback_filter.to_owned(),
            source: Arc::new(err),
        })?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| TelemetryError::Install(Arc::from(err)))
}
