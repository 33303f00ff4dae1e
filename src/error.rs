//! Errors that abort a campaign.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, BenchError>;

/// Errors that abort a benchmark campaign.
///
/// A non-2xx answer from the benchmark service is not an error; it is
/// reported through [`crate::client::IterationResult`] instead.
#[derive(Debug, Error)]
pub enum BenchError {
    /// The request never produced an HTTP response.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// A successful response carried a body we could not decode.
    #[error("failed to decode benchmark response: {0}")]
    Decode(#[from] serde_json::Error),
    /// I/O error from the report file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// CSV serialization error from the report writer.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Averages need at least one measured run.
    #[error("at least one measured run is required")]
    NoMeasuredRuns,
    /// Logging could not be installed.
    #[error("logging setup failed: {0}")]
    Logging(String),
}
