//! Diagnostic logging setup.

use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{BenchError, Result};

/// Installs the global `tracing` subscriber, writing to stderr.
///
/// `level` is an [`EnvFilter`] directive such as `warn` or `dsbench=debug`.
pub fn init_logging(level: &str) -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_new(level)
                .map_err(|e| BenchError::Logging(format!("invalid log level: {e}")))?,
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|_| BenchError::Logging("logging already initialized".into()))
}
