//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal listeners (SIGHUP, SIGUSR1, SIGTERM, SIGINT)
//! - Record reload/dump requests as pending flags
//! - Run the pending requests later, from the dispatch loop
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - The notification side only flips an atomic and wakes the loop; it never
//!   allocates, logs, or touches the file
//! - Requests arriving before the loop gets to them coalesce into one
//! - SIGTERM/SIGINT trigger shutdown, not reload

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::signal::unix::{signal, Signal, SignalKind};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::lifecycle::shutdown::Shutdown;
use crate::observability::metrics;
use crate::reload::Coordinator;

/// Error type for signal subscription.
#[derive(Debug, Error)]
#[error("cannot subscribe to {name}: {source}")]
pub struct SignalError {
    pub name: &'static str,
    #[source]
    pub source: std::io::Error,
}

#[derive(Default)]
struct Pending {
    reload: AtomicBool,
    dump: AtomicBool,
    wake: Notify,
}

/// What a call to [`SignalBridge::service`] ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Serviced {
    pub reload: bool,
    pub dump: bool,
}

/// Deferred hand-off between signal delivery and the dispatch loop.
#[derive(Clone, Default)]
pub struct SignalBridge {
    pending: Arc<Pending>,
}

impl SignalBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a reload as pending.
    pub fn request_reload(&self) {
        self.pending.reload.store(true, Ordering::Release);
        self.pending.wake.notify_one();
    }

    /// Mark a dump as pending.
    pub fn request_dump(&self) {
        self.pending.dump.store(true, Ordering::Release);
        self.pending.wake.notify_one();
    }

    pub fn has_pending(&self) -> bool {
        self.pending.reload.load(Ordering::Acquire) || self.pending.dump.load(Ordering::Acquire)
    }

    /// Resolves once a request has been recorded since the last wakeup.
    pub async fn notified(&self) {
        self.pending.wake.notified().await;
    }

    /// Run whatever is pending. Reload goes first so a dump requested in the
    /// same window reports the fresh table.
    pub fn service(&self, coordinator: &Coordinator) -> Serviced {
        let mut serviced = Serviced::default();

        if self.pending.reload.swap(false, Ordering::AcqRel) {
            tracing::info!("Servicing deferred reload request");
            // Failure is logged by the coordinator; the old table stays.
            let _ = coordinator.reload();
            serviced.reload = true;
        }
        if self.pending.dump.swap(false, Ordering::AcqRel) {
            tracing::info!("Servicing deferred dump request");
            coordinator.snapshot_for_logging();
            serviced.dump = true;
        }

        serviced
    }

    /// Subscribe to the process signals and spawn the listener task.
    ///
    /// Subscription happens before this returns, so a failure can abort
    /// startup.
    pub fn install(&self, shutdown: &Shutdown) -> Result<JoinHandle<()>, SignalError> {
        let mut hangup = subscribe(SignalKind::hangup(), "SIGHUP")?;
        let mut user1 = subscribe(SignalKind::user_defined1(), "SIGUSR1")?;
        let mut terminate = subscribe(SignalKind::terminate(), "SIGTERM")?;
        let mut interrupt = subscribe(SignalKind::interrupt(), "SIGINT")?;

        let bridge = self.clone();
        let shutdown = shutdown.clone();
        let mut stop = shutdown.subscribe();

        tracing::info!("Signal handlers installed");
        Ok(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = hangup.recv() => {
                        bridge.request_reload();
                        metrics::record_signal("SIGHUP");
                    }
                    _ = user1.recv() => {
                        bridge.request_dump();
                        metrics::record_signal("SIGUSR1");
                    }
                    _ = terminate.recv() => {
                        tracing::info!(signal = "SIGTERM", "Shutdown signal received");
                        shutdown.trigger();
                        break;
                    }
                    _ = interrupt.recv() => {
                        tracing::info!(signal = "SIGINT", "Shutdown signal received");
                        shutdown.trigger();
                        break;
                    }
                    _ = stop.recv() => break,
                }
            }
        }))
    }
}

fn subscribe(kind: SignalKind, name: &'static str) -> Result<Signal, SignalError> {
    signal(kind).map_err(|source| SignalError { name, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReloadMode;
    use crate::store::{parse_file, Store};
    use std::fs;
    use std::time::Duration;

    fn coordinator(dir: &tempfile::TempDir, contents: &str) -> Coordinator {
        let path = dir.path().join("daemon.conf");
        fs::write(&path, contents).unwrap();
        let mut store = Store::default();
        parse_file(&path, &mut store).unwrap();
        Coordinator::new(path, ReloadMode::Merge, store)
    }

    #[test]
    fn nothing_pending_does_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator(&dir, "k=1\n");
        let bridge = SignalBridge::new();
        assert_eq!(bridge.service(&coordinator), Serviced::default());
    }

    #[test]
    fn requests_coalesce() {
        let dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator(&dir, "k=1\n");
        let bridge = SignalBridge::new();

        bridge.request_reload();
        bridge.request_reload();
        bridge.request_dump();
        assert!(bridge.has_pending());

        fs::write(coordinator.path(), "k=2\n").unwrap();
        assert_eq!(bridge.service(&coordinator), Serviced { reload: true, dump: true });
        assert_eq!(coordinator.lookup("k").unwrap().value, "2");

        assert!(!bridge.has_pending());
        assert_eq!(bridge.service(&coordinator), Serviced::default());
    }

    #[tokio::test]
    async fn request_wakes_waiter() {
        let bridge = SignalBridge::new();
        let waiter = {
            let bridge = bridge.clone();
            tokio::spawn(async move { bridge.notified().await })
        };

        bridge.request_dump();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn sighup_sets_reload_flag() {
        let bridge = SignalBridge::new();
        let shutdown = Shutdown::new();
        let task = bridge.install(&shutdown).unwrap();

        // The listener above has replaced the default disposition.
        let pid = std::process::id();
        std::process::Command::new("kill")
            .args(["-HUP", &pid.to_string()])
            .status()
            .unwrap();

        tokio::time::timeout(Duration::from_secs(5), bridge.notified())
            .await
            .unwrap();
        assert!(bridge.has_pending());

        shutdown.trigger();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn sigusr1_sets_dump_flag() {
        let dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator(&dir, "[S]\nk=1\n");
        let bridge = SignalBridge::new();
        let shutdown = Shutdown::new();
        let task = bridge.install(&shutdown).unwrap();

        let pid = std::process::id();
        std::process::Command::new("kill")
            .args(["-USR1", &pid.to_string()])
            .status()
            .unwrap();

        // A SIGHUP sent by another test may wake the bridge first.
        let serviced = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                bridge.notified().await;
                let serviced = bridge.service(&coordinator);
                if serviced.dump {
                    break serviced;
                }
            }
        })
        .await
        .unwrap();
        assert!(serviced.dump);
        assert_eq!(coordinator.lookup("k").unwrap().value, "1");

        shutdown.trigger();
        task.await.unwrap();
    }
}
