//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validate settings → Load INI → Acquire bus name → Install signals
//!     → Optional watcher/metrics/gateway → Dispatch loop
//!
//! Shutdown (shutdown.rs):
//!     SIGTERM/SIGINT → broadcast → dispatcher, gateway, signal task exit
//!
//! Signals (signals.rs):
//!     SIGHUP  → pending reload → serviced by the dispatch loop
//!     SIGUSR1 → pending dump   → serviced by the dispatch loop
//! ```
//!
//! # Design Decisions
//! - Ordered startup: settings first, then table, then bus, then listeners
//! - Signal delivery never runs reload or dump directly
//! - Any startup failure is fatal and maps to exit status 1

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::{Serviced, SignalBridge, SignalError};
pub use startup::{load_initial, Daemon, StartupError};
