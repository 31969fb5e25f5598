//! Reload coordination subsystem.
//!
//! # Data Flow
//! ```text
//! SIGHUP / ReloadConfig / file watch
//!     → coordinator.reload()
//!     → parse into staging table (clone for merge, empty for replace)
//!     → swap into place on success, keep old table on error
//!
//! SIGUSR1 / LogConfig
//!     → coordinator.snapshot_for_logging()
//!     → one `key=value in [section]` line per entry
//! ```
//!
//! # Design Decisions
//! - One mutex around the table; reload and snapshot never overlap
//! - Lock hold time is bounded by a single parse of the file
//! - Reload failures are reported, never fatal

pub mod coordinator;

pub use coordinator::{Coordinator, CoordinatorState, ReloadError, ReloadOutcome, SINK_TARGET};
