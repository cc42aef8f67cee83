//! Prometheus metrics CLI arguments.

use crate::{CliResult, init_prometheus_server};
use clap::Args;
use std::net::{IpAddr, Ipv4Addr};

/// Configuration for the Prometheus exporter.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct MetricsArgs {
    /// Controls whether Prometheus metrics are enabled.
    #[arg(long = "metrics.enabled", global = true, default_value_t = false, env = "HASHPRICE_METRICS_ENABLED")]
    pub enabled: bool,

    /// The address the metrics server listens on.
    #[arg(
        long = "metrics.addr",
        global = true,
        default_value = "0.0.0.0",
        env = "HASHPRICE_METRICS_ADDR"
    )]
    pub addr: IpAddr,

    /// The port the metrics server listens on.
    #[arg(long = "metrics.port", global = true, default_value_t = 9090, env = "HASHPRICE_METRICS_PORT")]
    pub port: u16,
}

impl Default for MetricsArgs {
    fn default() -> Self {
        Self { enabled: false, addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED), port: 9090 }
    }
}

impl MetricsArgs {
    /// Starts the Prometheus server if metrics are enabled. Returns whether it was started.
    pub fn init_metrics(&self) -> CliResult<bool> {
        if !self.enabled {
            return Ok(false);
        }
        init_prometheus_server(self.addr, self.port)?;
        Ok(true)
    }
}
