//! Run extraction and grouping over a whole report and write the result.
//!
//! # Example
//!
//! ```
//! use c2c_groups::GroupReport;
//!
//! let mut report = GroupReport::new().unwrap();
//! report.parse_text("no c2c data here");
//!
//! let mut output = Vec::new();
//! report.write_text(&mut output).unwrap();
//! assert_eq!(output, format!("{}\n", c2c_groups::report::BANNER).into_bytes());
//! ```

use crate::Result;
use crate::extract::extract_section;
use crate::groups::{RecordParser, ThreadGroup, ThreadSet, build_groups};
use serde::Serialize;
use std::io::{Read, Write};

/// First line of the text output.
pub const BANNER: &str = "===== Final Thread Groups (Threads in the same group may share data, no sharing between groups) =====";

/// Thread groups computed from one `perf c2c` report.
pub struct GroupReport {
    parser: RecordParser,
    cache_lines: Vec<ThreadSet>,
    groups: Vec<ThreadGroup>,
}

impl GroupReport {
    /// Create an empty report.
    pub fn new() -> Result<Self> {
        Ok(Self {
            parser: RecordParser::new()?,
            cache_lines: Vec::new(),
            groups: Vec::new(),
        })
    }

    /// Read a complete report from `reader` and compute its groups.
    pub fn parse<R: Read>(&mut self, mut reader: R) -> Result<()> {
        let mut contents = String::new();
        reader.read_to_string(&mut contents)?;
        self.parse_text(&contents);
        Ok(())
    }

    /// Compute groups from report text already in memory.
    ///
    /// Replaces anything computed by an earlier call. A report without the
    /// Pareto section simply produces no groups.
    pub fn parse_text(&mut self, text: &str) {
        let block = extract_section(text);
        self.cache_lines = self.parser.parse_records(block);
        self.groups = build_groups(&self.cache_lines);
    }

    /// Thread sets of the individual cache line records, in report order.
    pub fn cache_lines(&self) -> &[ThreadSet] {
        &self.cache_lines
    }

    /// Final disjoint groups in output order.
    pub fn groups(&self) -> &[ThreadGroup] {
        &self.groups
    }

    /// Number of distinct threads across all groups.
    pub fn thread_count(&self) -> usize {
        self.groups.iter().map(ThreadGroup::len).sum()
    }

    /// Write the banner and one `g<n>: {tid, ...}` line per group.
    pub fn write_text<W: Write>(&self, mut writer: W) -> Result<()> {
        writeln!(writer, "{}", BANNER)?;
        for (idx, group) in self.groups.iter().enumerate() {
            let tids: Vec<String> = group.iter().map(ToString::to_string).collect();
            writeln!(writer, "{}: {{{}}}", group_name(idx), tids.join(", "))?;
        }
        Ok(())
    }

    /// Write a summary record followed by one record per group, one JSON
    /// object per line.
    pub fn write_ndjson<W: Write>(&self, mut writer: W) -> Result<()> {
        let summary = Record::Summary {
            cache_lines: self.cache_lines.len(),
            threads: self.thread_count(),
            groups: self.groups.len(),
        };
        write_record(&mut writer, &summary)?;

        for (idx, group) in self.groups.iter().enumerate() {
            let record = Record::Group {
                name: group_name(idx),
                tids: group,
            };
            write_record(&mut writer, &record)?;
        }
        Ok(())
    }
}

fn group_name(idx: usize) -> String {
    format!("g{}", idx + 1)
}

fn write_record<W: Write>(writer: &mut W, record: &Record<'_>) -> Result<()> {
    writeln!(writer, "{}", serde_json::to_string(record)?)?;
    Ok(())
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Record<'a> {
    Summary {
        cache_lines: usize,
        threads: usize,
        groups: usize,
    },
    Group {
        name: String,
        tids: &'a ThreadGroup,
    },
}
