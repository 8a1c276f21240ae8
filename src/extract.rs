//! Locate the "Shared Cache Line Distribution Pareto" section of a
//! `perf c2c report --stdio` dump.
//!
//! The section opens with a three-line banner and runs until the next
//! `=`-rule that starts another section:
//!
//! ```text
//! =================================================
//!       Shared Cache Line Distribution Pareto
//! =================================================
//! ...cache line records...
//! =================================================
//!       Shared Cache Line Distribution Pareto (next section)
//! ```
//!
//! # Example
//!
//! ```
//! use c2c_groups::extract::extract_section;
//!
//! let report = "preamble\n\
//! =================================================\n\
//! \x20     Shared Cache Line Distribution Pareto\n\
//! =================================================\n\
//! line one\n\
//! line two\n\
//! =================================================\n\
//! trailer\n";
//!
//! assert_eq!(extract_section(report), vec!["line one", "line two"]);
//! ```

use log::debug;
use std::collections::VecDeque;

/// Rule line used above and below every section title.
pub const SECTION_RULE: &str = "=================================================";

/// The three-line banner that opens the Pareto section.
pub const START_MARKER: &str = "=================================================\n      Shared Cache Line Distribution Pareto\n=================================================";

/// Prefix of the dashed line that closes each cache line record.
pub const RECORD_DIVIDER: &str = "----------------------------------------";

const MARKER_LINES: usize = 3;

/// Return the lines strictly between the start marker and the next section
/// rule.
///
/// A section rule only terminates the block once at least one line has been
/// collected. If the rule never shows up the block runs to the end of the
/// input. If the marker is missing the result is empty. Only the first
/// occurrence of the marker is used.
pub fn extract_section(text: &str) -> Vec<&str> {
    let mut lines = text.lines();
    let mut window: VecDeque<&str> = VecDeque::with_capacity(MARKER_LINES + 1);
    let mut found = false;

    for line in lines.by_ref() {
        window.push_back(line);
        if window.len() > MARKER_LINES {
            window.pop_front();
        }
        if window.len() == MARKER_LINES && window.make_contiguous().join("\n").contains(START_MARKER)
        {
            found = true;
            break;
        }
    }

    if !found {
        debug!("start marker not found, no section to extract");
        return Vec::new();
    }

    let mut block = Vec::new();
    for line in lines {
        if line.trim().starts_with(SECTION_RULE) && !block.is_empty() {
            break;
        }
        block.push(line);
    }

    debug!("extracted {} lines from the Pareto section", block.len());
    block
}

/// Whether `line` is the dashed divider that closes a cache line record.
pub fn is_record_divider(line: &str) -> bool {
    line.trim().starts_with(RECORD_DIVIDER)
}
