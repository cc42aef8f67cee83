//! Error types for CLI utilities.

use std::io;
use thiserror::Error;

/// Error type for prometheus server initialization.
#[derive(Debug, Error)]
pub enum PrometheusError {
    /// Failed to bind to the specified address.
    #[error("failed to bind to address: {0}")]
    Bind(#[from] io::Error),
    /// Failed to build or install the exporter.
    #[error("failed to install prometheus exporter: {0}")]
    Install(#[from] metrics_exporter_prometheus::BuildError),
}

/// Errors that can occur in CLI operations.
#[derive(Error, Debug)]
pub enum CliError {
    /// The tracing subscriber could not be installed.
    #[error("Failed to initialize tracing: {0}")]
    TracingInitialization(String),

    /// Error initializing metrics.
    #[error("Failed to initialize metrics: {0}")]
    MetricsInitialization(#[from] PrometheusError),
}

/// Type alias for CLI results.
pub type CliResult<T> = Result<T, CliError>;
