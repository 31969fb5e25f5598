//! Settings validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (bucket count, poll timeout, queue depth)
//! - Check bus identity shape (dotted name, absolute object path)
//! - Check socket addresses of enabled listeners
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DaemonConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::DaemonConfig;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("bucket_count must be greater than zero")]
    ZeroBuckets,

    #[error("bus.poll_timeout_ms must be greater than zero")]
    ZeroPollTimeout,

    #[error("bus.queue_depth must be greater than zero")]
    ZeroQueueDepth,

    #[error("bus.service_name {0:?} is not a dotted bus name")]
    ServiceName(String),

    #[error("bus.object_path {0:?} must start with '/'")]
    ObjectPath(String),

    #[error("{field} {value:?} is not a socket address")]
    Address { field: &'static str, value: String },

    #[error("watch.poll_interval_secs must be greater than zero")]
    ZeroWatchInterval,
}

/// Check every semantic rule, collecting all failures.
pub fn validate_config(config: &DaemonConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.bucket_count == 0 {
        errors.push(ValidationError::ZeroBuckets);
    }
    if config.bus.poll_timeout_ms == 0 {
        errors.push(ValidationError::ZeroPollTimeout);
    }
    if config.bus.queue_depth == 0 {
        errors.push(ValidationError::ZeroQueueDepth);
    }
    if !is_bus_name(&config.bus.service_name) {
        errors.push(ValidationError::ServiceName(config.bus.service_name.clone()));
    }
    if !config.bus.object_path.starts_with('/') {
        errors.push(ValidationError::ObjectPath(config.bus.object_path.clone()));
    }
    if config.gateway.enabled && config.gateway.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::Address {
            field: "gateway.bind_address",
            value: config.gateway.bind_address.clone(),
        });
    }
    if config.metrics.enabled && config.metrics.address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::Address {
            field: "metrics.address",
            value: config.metrics.address.clone(),
        });
    }
    if config.watch.enabled && config.watch.poll_interval_secs == 0 {
        errors.push(ValidationError::ZeroWatchInterval);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_bus_name(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    parts.len() >= 2
        && parts.iter().all(|p| {
            !p.is_empty()
                && !p.starts_with(|c: char| c.is_ascii_digit())
                && p.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        })
}
