//! INI file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::time::Duration;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::lifecycle::SignalBridge;

/// Watches the served INI file and records reload requests on the bridge.
///
/// The callback runs on notify's thread, so it only flags the request; the
/// reload itself happens in the dispatch loop like a SIGHUP-triggered one.
pub struct ConfigWatcher {
    path: PathBuf,
    bridge: SignalBridge,
    poll_interval: Duration,
}

impl ConfigWatcher {
    pub fn new(path: &Path, bridge: SignalBridge, poll_interval: Duration) -> Self {
        Self {
            path: path.to_path_buf(),
            bridge,
            poll_interval,
        }
    }

    /// Start watching. The returned watcher must be kept alive.
    ///
    /// The parent directory is watched so replace-by-rename saves are seen.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let bridge = self.bridge.clone();
        let target = self.path.clone();
        let file_name = self.path.file_name().map(|n| n.to_os_string());

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let touches_target = event
                        .paths
                        .iter()
                        .any(|p| p.file_name() == file_name.as_deref());
                    if touches_target && (event.kind.is_modify() || event.kind.is_create()) {
                        tracing::info!(path = %target.display(), "Config file change detected, requesting reload");
                        bridge.request_reload();
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(self.poll_interval),
        )?;

        let watched = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        watcher.watch(watched, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %self.path.display(), "Config watcher started");
        Ok(watcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn write_requests_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daemon.conf");
        fs::write(&path, "k=1\n").unwrap();

        let bridge = SignalBridge::new();
        let _watcher = ConfigWatcher::new(&path, bridge.clone(), Duration::from_millis(100))
            .run()
            .unwrap();

        fs::write(&path, "k=2\n").unwrap();
        tokio::time::timeout(Duration::from_secs(10), bridge.notified())
            .await
            .unwrap();
        assert!(bridge.has_pending());
    }
}
