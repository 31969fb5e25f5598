//! System configuration daemon library.
//!
//! Loads an INI-style file into a shared table, serves it over a bus, and
//! reloads or dumps it on SIGHUP/SIGUSR1 or on bus method calls.

pub mod admin;
pub mod config;
pub mod ipc;
pub mod lifecycle;
pub mod observability;
pub mod reload;
pub mod store;

pub use config::DaemonConfig;
pub use lifecycle::{Daemon, Shutdown};
pub use reload::Coordinator;
pub use store::Store;
