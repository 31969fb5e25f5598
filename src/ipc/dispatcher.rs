//! Service loop answering method calls on the configuration object.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time;

use crate::config::BusConfig;
use crate::ipc::bus::Endpoint;
use crate::ipc::message::{Handling, Method, MethodCall, Reply, INTROSPECTION_XML};
use crate::lifecycle::SignalBridge;
use crate::observability::metrics;
use crate::reload::Coordinator;

pub struct Dispatcher {
    coordinator: Arc<Coordinator>,
    bridge: SignalBridge,
    object_path: String,
    poll_timeout: Duration,
}

impl Dispatcher {
    pub fn new(coordinator: Arc<Coordinator>, bridge: SignalBridge, config: &BusConfig) -> Self {
        Self {
            coordinator,
            bridge,
            object_path: config.object_path.clone(),
            poll_timeout: Duration::from_millis(config.poll_timeout_ms),
        }
    }

    /// Route one call. Runs the coordinator operation to completion before
    /// returning.
    pub fn handle(&self, call: &MethodCall) -> Handling {
        let method = if call.path == self.object_path {
            Method::resolve(&call.interface, &call.member)
        } else {
            None
        };

        let Some(method) = method else {
            tracing::debug!(
                path = %call.path,
                interface = %call.interface,
                member = %call.member,
                "Call not handled"
            );
            metrics::record_dispatch("unknown", false);
            return Handling::NotHandled;
        };

        tracing::debug!(member = method.member(), "Dispatching method call");
        metrics::record_dispatch(method.member(), true);

        match method {
            Method::Introspect => Handling::Handled(Reply::Text(INTROSPECTION_XML.to_string())),
            Method::ReloadConfig => {
                // The method return carries no payload; failures only reach the log.
                let _ = self.coordinator.reload();
                Handling::Handled(Reply::Empty)
            }
            Method::LogConfig => {
                self.coordinator.snapshot_for_logging();
                Handling::Handled(Reply::Empty)
            }
        }
    }

    /// Serve calls until shutdown.
    ///
    /// Each wait is bounded by the poll timeout; pending signal requests are
    /// serviced after every wakeup, whatever caused it.
    pub async fn run(self, mut endpoint: Endpoint, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            name = endpoint.name(),
            path = %self.object_path,
            poll_timeout_ms = self.poll_timeout.as_millis() as u64,
            "Dispatcher starting"
        );

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Dispatcher received shutdown signal, exiting loop");
                    break;
                }
                _ = self.bridge.notified() => {}
                incoming = time::timeout(self.poll_timeout, endpoint.recv()) => match incoming {
                    Ok(Some(incoming)) => {
                        let handling = self.handle(&incoming.call);
                        incoming.respond(handling);
                    }
                    Ok(None) => {
                        tracing::warn!("Bus connection closed, exiting loop");
                        break;
                    }
                    Err(_) => {}
                },
            }

            self.bridge.service(&self.coordinator);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReloadMode;
    use crate::ipc::message::{INTROSPECTABLE_INTERFACE, SERVICE_INTERFACE};
    use crate::store::{parse_file, Store};
    use std::fs;

    const NAME: &str = "com.redhat.SystemService";
    const PATH: &str = "/com/redhat/SystemService";

    fn dispatcher(dir: &tempfile::TempDir) -> Dispatcher {
        let path = dir.path().join("daemon.conf");
        fs::write(&path, "[General]\nname=demo\n").unwrap();
        let mut store = Store::default();
        parse_file(&path, &mut store).unwrap();
        let coordinator = Arc::new(Coordinator::new(path, ReloadMode::Merge, store));
        Dispatcher::new(coordinator, SignalBridge::new(), &BusConfig::default())
    }

    #[test]
    fn introspect_returns_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let handling = dispatcher(&dir).handle(&MethodCall::new(NAME, PATH, INTROSPECTABLE_INTERFACE, "Introspect"));
        assert_eq!(handling, Handling::Handled(Reply::Text(INTROSPECTION_XML.to_string())));
    }

    #[test]
    fn reload_config_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let dispatcher = dispatcher(&dir);
        fs::write(dir.path().join("daemon.conf"), "[General]\nname=changed\n").unwrap();

        let handling = dispatcher.handle(&MethodCall::new(NAME, PATH, SERVICE_INTERFACE, "ReloadConfig"));
        assert_eq!(handling, Handling::Handled(Reply::Empty));
        assert_eq!(dispatcher.coordinator.lookup("name").unwrap().value, "changed");
    }

    #[test]
    fn failed_reload_still_replies_empty() {
        let dir = tempfile::tempdir().unwrap();
        let dispatcher = dispatcher(&dir);
        fs::write(dir.path().join("daemon.conf"), "[General\n").unwrap();

        let handling = dispatcher.handle(&MethodCall::new(NAME, PATH, SERVICE_INTERFACE, "ReloadConfig"));
        assert_eq!(handling, Handling::Handled(Reply::Empty));
        assert_eq!(dispatcher.coordinator.lookup("name").unwrap().value, "demo");
    }

    #[test]
    fn log_config_replies_empty() {
        let dir = tempfile::tempdir().unwrap();
        let handling = dispatcher(&dir).handle(&MethodCall::new(NAME, PATH, SERVICE_INTERFACE, "LogConfig"));
        assert_eq!(handling, Handling::Handled(Reply::Empty));
    }

    #[test]
    fn other_calls_not_handled() {
        let dir = tempfile::tempdir().unwrap();
        let dispatcher = dispatcher(&dir);
        for call in [
            MethodCall::new(NAME, PATH, SERVICE_INTERFACE, "Restart"),
            MethodCall::new(NAME, PATH, "org.freedesktop.DBus.Properties", "GetAll"),
            MethodCall::new(NAME, "/other", SERVICE_INTERFACE, "ReloadConfig"),
        ] {
            assert_eq!(dispatcher.handle(&call), Handling::NotHandled, "{call:?}");
        }
    }
}
