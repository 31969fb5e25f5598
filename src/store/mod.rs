//! Configuration store subsystem.
//!
//! # Data Flow
//! ```text
//! daemon.conf
//!     → parser.rs (line by line, section cursor)
//!     → table.rs (key → value + section)
//! ```
//!
//! # Design Decisions
//! - Flat string values only, grouped by section name
//! - A key is unique across the whole file, not per section
//! - The table has no locking of its own

pub mod parser;
pub mod table;

pub use parser::{parse_file, parse_reader, parse_str, ParseError, ParseSummary};
pub use table::{Entry, Store, StoreError, DEFAULT_BUCKET_COUNT};
