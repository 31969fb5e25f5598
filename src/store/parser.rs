//! Line-oriented INI parser.
//!
//! # Grammar (one directive per line)
//! ```text
//! ; comment        # comment
//! <blank line>
//! [section]        exactly one '[' and one ']', ']' closes the line
//! key=value        exactly one '='
//! ```
//!
//! # Design Decisions
//! - Fail fast: the first malformed line aborts the pass
//! - Assignments before any header carry no section
//! - Lines are read as bytes; invalid UTF-8 is stored lossily, not rejected
//! - The parser writes straight into the table it is given; callers that
//!   need all-or-nothing semantics hand it a staging copy

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::store::table::Store;

/// Error type for a parse pass.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("read failed at line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed section header at line {line}: {content:?}")]
    MalformedSection { line: usize, content: String },

    #[error("malformed assignment at line {line}: {content:?}")]
    MalformedAssignment { line: usize, content: String },
}

impl ParseError {
    /// Line number the error refers to, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::Open { .. } => None,
            ParseError::Read { line, .. }
            | ParseError::MalformedSection { line, .. }
            | ParseError::MalformedAssignment { line, .. } => Some(*line),
        }
    }
}

/// Counters for a completed pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseSummary {
    pub lines: usize,
    pub assignments: usize,
    pub sections: usize,
}

enum Directive<'a> {
    Skip,
    Section(&'a str),
    Assignment { key: &'a str, value: &'a str },
}

enum Malformed {
    Section,
    Assignment,
}

/// Parse the file at `path` into `store`.
pub fn parse_file(path: &Path, store: &mut Store) -> Result<ParseSummary, ParseError> {
    let file = File::open(path).map_err(|source| ParseError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    parse_reader(BufReader::new(file), store)
}

/// Parse an in-memory document into `store`.
pub fn parse_str(input: &str, store: &mut Store) -> Result<ParseSummary, ParseError> {
    parse_reader(input.as_bytes(), store)
}

/// Parse any buffered reader into `store`.
pub fn parse_reader<R: BufRead>(mut reader: R, store: &mut Store) -> Result<ParseSummary, ParseError> {
    let mut summary = ParseSummary::default();
    let mut section: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let read = reader.read_until(b'\n', &mut buf).map_err(|source| ParseError::Read {
            line: summary.lines + 1,
            source,
        })?;
        if read == 0 {
            break;
        }
        summary.lines += 1;

        // Invalid UTF-8 becomes U+FFFD; the ASCII delimiters are never affected.
        let line = String::from_utf8_lossy(&buf);
        match classify(&line) {
            Ok(Directive::Skip) => {}
            Ok(Directive::Section(name)) => {
                section = Some(name.to_string());
                summary.sections += 1;
            }
            Ok(Directive::Assignment { key, value }) => {
                store.insert_or_update(key, value, section.as_deref());
                summary.assignments += 1;
            }
            Err(kind) => {
                let content = strip_terminator(&line).to_string();
                return Err(match kind {
                    Malformed::Section => ParseError::MalformedSection {
                        line: summary.lines,
                        content,
                    },
                    Malformed::Assignment => ParseError::MalformedAssignment {
                        line: summary.lines,
                        content,
                    },
                });
            }
        }
    }

    Ok(summary)
}

fn classify(line: &str) -> Result<Directive<'_>, Malformed> {
    if line.starts_with(';') || line.starts_with('#') {
        return Ok(Directive::Skip);
    }

    let body = strip_terminator(line);
    if body.is_empty() {
        return Ok(Directive::Skip);
    }

    if body.starts_with('[') {
        let opens = body.matches('[').count();
        let closes = body.matches(']').count();
        if opens == 1 && closes == 1 && body.ends_with(']') {
            return Ok(Directive::Section(&body[1..body.len() - 1]));
        }
        return Err(Malformed::Section);
    }

    if body.matches('=').count() != 1 {
        return Err(Malformed::Assignment);
    }
    match body.split_once('=') {
        Some((key, value)) => Ok(Directive::Assignment { key, value }),
        None => Err(Malformed::Assignment),
    }
}

fn strip_terminator(line: &str) -> &str {
    match line.strip_suffix('\n') {
        Some(rest) => rest.strip_suffix('\r').unwrap_or(rest),
        None => line,
    }
}
