//! Serialized reload and snapshot of the configuration table.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use thiserror::Error;

use crate::config::ReloadMode;
use crate::observability::metrics;
use crate::store::{parse_file, Entry, ParseError, ParseSummary, Store};

/// Tracing target the snapshot lines are written under.
pub const SINK_TARGET: &str = "sysconf::config";

/// Error type for a live reload. Never fatal.
#[derive(Debug, Error)]
pub enum ReloadError {
    #[error("reload of {path} failed: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
}

/// Observable coordinator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Idle,
    Reloading,
}

/// Result of a successful reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadOutcome {
    pub summary: ParseSummary,
    pub entries: usize,
}

/// Owner of the configuration table.
///
/// Every operation takes the same lock, so a reload never overlaps another
/// reload or a snapshot, whichever trigger started it. `state` and
/// `entry_count` read atomics and never wait on the lock.
pub struct Coordinator {
    path: PathBuf,
    mode: ReloadMode,
    store: Mutex<Store>,
    reloading: AtomicBool,
    entries: AtomicUsize,
}

impl Coordinator {
    /// Wrap an already populated table.
    pub fn new(path: impl Into<PathBuf>, mode: ReloadMode, store: Store) -> Self {
        metrics::record_entries(store.len());
        Self {
            path: path.into(),
            mode,
            entries: AtomicUsize::new(store.len()),
            store: Mutex::new(store),
            reloading: AtomicBool::new(false),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> ReloadMode {
        self.mode
    }

    pub fn state(&self) -> CoordinatorState {
        if self.reloading.load(Ordering::Acquire) {
            CoordinatorState::Reloading
        } else {
            CoordinatorState::Idle
        }
    }

    /// Re-read the file and install the result.
    ///
    /// The parse runs against a staging table; the live table is replaced
    /// only once the whole file parsed, so a failure leaves it untouched.
    pub fn reload(&self) -> Result<ReloadOutcome, ReloadError> {
        let mut store = self.lock();
        let _state = StateGuard::enter(&self.reloading);
        let started = Instant::now();

        let mut staging = match self.mode {
            ReloadMode::Merge => store.clone(),
            ReloadMode::Replace => store.empty_like(),
        };

        match parse_file(&self.path, &mut staging) {
            Ok(summary) => {
                let previous = store.len();
                *store = staging;
                let entries = store.len();
                self.entries.store(entries, Ordering::Release);

                metrics::record_reload("success", started);
                metrics::record_entries(entries);
                tracing::info!(
                    path = %self.path.display(),
                    mode = ?self.mode,
                    previous,
                    entries,
                    assignments = summary.assignments,
                    "Configuration reloaded"
                );
                Ok(ReloadOutcome { summary, entries })
            }
            Err(source) => {
                metrics::record_reload("failure", started);
                tracing::error!(
                    path = %self.path.display(),
                    error = %source,
                    "Reload failed, keeping current configuration"
                );
                Err(ReloadError::Parse {
                    path: self.path.clone(),
                    source,
                })
            }
        }
    }

    /// Write every entry to the log sink as `key=value in [section]`.
    ///
    /// Returns the emitted lines.
    pub fn snapshot_for_logging(&self) -> Vec<String> {
        let mut lines = Vec::new();
        self.lock().for_each(|entry| lines.push(entry.to_string()));

        for line in &lines {
            tracing::info!(target: SINK_TARGET, "{}", line);
        }
        tracing::debug!(entries = lines.len(), "Configuration logged");
        lines
    }

    /// Consistent copy of every entry, in iteration order.
    pub fn snapshot(&self) -> Vec<Entry> {
        self.lock().iter().cloned().collect()
    }

    pub fn lookup(&self, key: &str) -> Option<Entry> {
        self.lock().lookup(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Entry count as of the last installed table, without taking the lock.
    pub fn entry_count(&self) -> usize {
        self.entries.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // The table is only ever replaced wholesale after a successful parse, so
    // a panic while holding the lock cannot leave it half-written.
    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct StateGuard<'a>(&'a AtomicBool);

impl<'a> StateGuard<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for StateGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
