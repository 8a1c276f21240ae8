//! Thread grouping for `perf c2c` reports.
//!
//! `perf c2c report --stdio` prints a "Shared Cache Line Distribution Pareto"
//! section listing, for every contended cache line, the threads seen
//! accessing it. This crate pulls that section out of the report and joins
//! the per-line thread sets into disjoint groups: threads in the same group
//! are transitively connected through at least one shared cache line.
//!
//! # Modules
//!
//! - [`extract`] - Locate the Pareto section in the raw report text
//! - [`groups`] - Parse per-cache-line thread sets and merge them into groups
//! - [`report`] - Run the whole pipeline and write text or NDJSON output
//!
//! # Example
//!
//! ```no_run
//! use c2c_groups::GroupReport;
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! let input = BufReader::new(File::open("c2c_report.txt").unwrap());
//!
//! let mut report = GroupReport::new().unwrap();
//! report.parse(input).unwrap();
//! report.write_text(std::io::stdout()).unwrap();
//! ```

pub mod extract;
pub mod groups;
pub mod report;

use thiserror::Error;

pub use groups::{ThreadGroup, ThreadId, ThreadSet};
pub use report::GroupReport;

/// Errors that can occur while reading a report or writing groups.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid thread line pattern: {0}")]
    Pattern(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
