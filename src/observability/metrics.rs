//! Metrics collection and exposition.
//!
//! # Metrics
//! - `sysconf_reloads_total` (counter): reloads by outcome
//! - `sysconf_reload_duration_seconds` (histogram): parse + swap time
//! - `sysconf_entries` (gauge): live entries in the table
//! - `sysconf_signals_total` (counter): reload/dump signals received
//! - `sysconf_method_calls_total` (counter): bus calls by member and handling
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Prometheus exporter serves its own HTTP listener

use std::net::SocketAddr;
use std::time::Instant;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_reload(outcome: &'static str, started: Instant) {
    counter!("sysconf_reloads_total", "outcome" => outcome).increment(1);
    histogram!("sysconf_reload_duration_seconds").record(started.elapsed().as_secs_f64());
}

pub fn record_entries(count: usize) {
    gauge!("sysconf_entries").set(count as f64);
}

pub fn record_signal(signal: &'static str) {
    counter!("sysconf_signals_total", "signal" => signal).increment(1);
}

pub fn record_dispatch(member: &'static str, handled: bool) {
    let handled = if handled { "true" } else { "false" };
    counter!("sysconf_method_calls_total", "member" => member, "handled" => handled).increment(1);
}
