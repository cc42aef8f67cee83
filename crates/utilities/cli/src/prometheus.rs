//! Utilities for spinning up a prometheus metrics server.

use crate::PrometheusError;
use metrics_exporter_prometheus::PrometheusBuilder;
use metrics_process::Collector;
use std::{
    net::{IpAddr, SocketAddr, TcpListener},
    thread::{self, sleep},
    time::Duration,
};
use tracing::info;

/// Interval between two collections of process metrics.
const PROCESS_COLLECTION_INTERVAL: Duration = Duration::from_secs(60);

/// Starts a Prometheus metrics server on the given address and port.
///
/// A port of `0` lets the OS pick a free port. Returns the address the server listens on.
pub fn init_prometheus_server(addr: IpAddr, metrics_port: u16) -> Result<SocketAddr, PrometheusError> {
    let actual_addr = if metrics_port == 0 {
        // PrometheusBuilder binds its own listener, so only the port is kept.
        let listener = TcpListener::bind((addr, 0))?;
        listener.local_addr()?
    } else {
        SocketAddr::from((addr, metrics_port))
    };

    PrometheusBuilder::new().with_http_listener(actual_addr).install()?;

    let collector = Collector::default();
    collector.describe();
    thread::spawn(move || {
        loop {
            collector.collect();
            sleep(PROCESS_COLLECTION_INTERVAL);
        }
    });

    info!(target: "prometheus", "Serving metrics at: http://{}", actual_addr);

    Ok(actual_addr)
}
