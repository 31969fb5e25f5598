//! Daemon settings subsystem.
//!
//! # Data Flow
//! ```text
//! sysconf.toml (optional)
//!     → loader.rs (parse & deserialize)
//!     → CLI overrides (main.rs)
//!     → validation.rs (semantic checks)
//!     → DaemonConfig (immutable for the process lifetime)
//!
//! With watch.enabled:
//!     watcher.rs detects a change of the served INI file
//!     → records a reload request on the signal bridge
//! ```
//!
//! # Design Decisions
//! - Settings are read once; only the served INI file is reloadable
//! - All fields have defaults to allow minimal files
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{BusConfig, DaemonConfig, GatewayConfig, LoggingConfig, MetricsConfig, ReloadMode, WatchConfig};
pub use validation::{validate_config, ValidationError};
