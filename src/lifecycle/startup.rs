//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the table from the INI file
//! - Acquire the bus name and subscribe to signals
//! - Start optional helpers (watcher, metrics, gateway)
//! - Run the dispatch loop until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - The gateway starts last (traffic only when ready)
//! - Settings and the first parse happen in `Daemon::load`, before any task

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use notify::RecommendedWatcher;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::admin::{self, GatewayState};
use crate::config::watcher::ConfigWatcher;
use crate::config::{validate_config, ConfigError, DaemonConfig};
use crate::ipc::{Bus, BusError, Dispatcher};
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::{SignalBridge, SignalError};
use crate::observability::metrics;
use crate::reload::Coordinator;
use crate::store::{parse_file, ParseError, Store, StoreError};

/// Unrecoverable startup failure. Maps to a non-zero exit status.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid settings: {0}")]
    Config(#[from] ConfigError),

    #[error("cannot create configuration table: {0}")]
    Store(#[from] StoreError),

    #[error("initial configuration load failed: {0}")]
    InitialLoad(#[from] ParseError),

    #[error("cannot register on the bus: {0}")]
    Bus(#[from] BusError),

    #[error(transparent)]
    Signals(#[from] SignalError),

    #[error("cannot watch {path}: {source}")]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("cannot start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("gateway on {address} failed: {source}")]
    Gateway {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Parse the INI file into a fresh table. Failure here is fatal.
pub fn load_initial(config: &DaemonConfig) -> Result<Coordinator, StartupError> {
    let mut store = Store::new(config.bucket_count)?;
    let summary = parse_file(&config.config_path, &mut store)?;

    tracing::info!(
        path = %config.config_path.display(),
        entries = store.len(),
        sections = summary.sections,
        buckets = store.bucket_count(),
        "Configuration loaded"
    );
    Ok(Coordinator::new(&config.config_path, config.reload_mode, store))
}

/// A loaded, not yet running, daemon.
pub struct Daemon {
    config: DaemonConfig,
    coordinator: Arc<Coordinator>,
    bus: Bus,
    shutdown: Shutdown,
    bridge: SignalBridge,
}

/// Helpers started after the signal task; dropped when the daemon stops.
struct Helpers {
    _watcher: Option<RecommendedWatcher>,
    gateway: Option<(String, JoinHandle<std::io::Result<()>>)>,
}

impl Daemon {
    /// Validate settings and build the table from the INI file.
    pub fn load(config: DaemonConfig) -> Result<Self, StartupError> {
        validate_config(&config).map_err(ConfigError::Validation)?;
        let coordinator = Arc::new(load_initial(&config)?);

        Ok(Self {
            config,
            coordinator,
            bus: Bus::new(),
            shutdown: Shutdown::new(),
            bridge: SignalBridge::new(),
        })
    }

    /// Register on an existing bus instead of a private one.
    pub fn with_bus(mut self, bus: Bus) -> Self {
        self.bus = bus;
        self
    }

    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    pub fn signal_bridge(&self) -> SignalBridge {
        self.bridge.clone()
    }

    pub fn coordinator(&self) -> Arc<Coordinator> {
        self.coordinator.clone()
    }

    /// Start every subsystem in order, then serve until shutdown.
    ///
    /// A failure after the signal task is up stops that task before
    /// returning, so nothing outlives the error.
    pub async fn run(self) -> Result<(), StartupError> {
        let Daemon { config, coordinator, bus, shutdown, bridge } = self;

        let endpoint = bus.request_name(&config.bus.service_name, config.bus.queue_depth)?;
        let signals = bridge.install(&shutdown)?;

        let helpers = match start_helpers(&config, &coordinator, &bus, &bridge, &shutdown).await {
            Ok(helpers) => helpers,
            Err(e) => {
                shutdown.trigger();
                let _ = signals.await;
                return Err(e);
            }
        };

        let dispatcher = Dispatcher::new(coordinator, bridge, &config.bus);
        dispatcher.run(endpoint, shutdown.subscribe()).await;

        // The dispatcher may have exited on its own; make sure helpers follow.
        shutdown.trigger();
        let _ = signals.await;
        if let Some((address, task)) = helpers.gateway {
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(source)) => return Err(StartupError::Gateway { address, source }),
                Err(e) => tracing::error!(error = %e, "Gateway task panicked"),
            }
        }

        tracing::info!("Daemon stopped");
        Ok(())
    }
}

async fn start_helpers(
    config: &DaemonConfig,
    coordinator: &Arc<Coordinator>,
    bus: &Bus,
    bridge: &SignalBridge,
    shutdown: &Shutdown,
) -> Result<Helpers, StartupError> {
    let watcher = if config.watch.enabled {
        let watcher = ConfigWatcher::new(
            &config.config_path,
            bridge.clone(),
            Duration::from_secs(config.watch.poll_interval_secs),
        );
        Some(watcher.run().map_err(|source| StartupError::Watch {
            path: config.config_path.clone(),
            source,
        })?)
    } else {
        None
    };

    if config.metrics.enabled {
        // Checked by validation.
        if let Ok(addr) = config.metrics.address.parse::<SocketAddr>() {
            metrics::init_metrics(addr)?;
        }
    }

    let gateway = if config.gateway.enabled {
        let address = config.gateway.bind_address.clone();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| StartupError::Gateway { address: address.clone(), source })?;
        let state = GatewayState {
            bus: bus.clone(),
            coordinator: coordinator.clone(),
            service_name: config.bus.service_name.clone(),
            object_path: config.bus.object_path.clone(),
            api_key: config.gateway.api_key.as_deref().map(Arc::from),
        };
        Some((address, tokio::spawn(admin::serve(listener, state, shutdown.subscribe()))))
    } else {
        None
    };

    Ok(Helpers { _watcher: watcher, gateway })
}
