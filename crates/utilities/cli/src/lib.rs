//! Shared CLI utilities: tracing and metrics setup, common flags, and help styles.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

pub mod backtrace;

mod error;
pub use error::{CliError, CliResult, PrometheusError};

pub mod log;
pub use log::{LogArgs, init_tracing_subscriber};

pub mod metrics_args;
pub use metrics_args::MetricsArgs;

mod prometheus;
pub use prometheus::init_prometheus_server;

mod styles;
pub use styles::cli_styles;
