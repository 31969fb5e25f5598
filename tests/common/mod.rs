//! Shared utilities for integration testing.

use std::fs;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

use sysconf_daemon::config::DaemonConfig;

pub const SAMPLE: &str = "[General]\nname=demo\n; comment\n[Network]\nport=8080\n";

/// Write `contents` as `daemon.conf` in a fresh directory.
pub fn write_config(contents: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("daemon.conf");
    fs::write(&path, contents).unwrap();
    (dir, path)
}

/// Settings pointing at `path` with a short poll interval.
#[allow(dead_code)]
pub fn daemon_config(path: PathBuf, service_name: &str) -> DaemonConfig {
    let mut config = DaemonConfig::default();
    config.config_path = path;
    config.bus.service_name = service_name.to_string();
    config.bus.poll_timeout_ms = 50;
    config
}

/// Poll `check` until it returns true or `timeout` passes.
#[allow(dead_code)]
pub async fn eventually<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
