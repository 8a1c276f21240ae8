//! Per-cache-line thread sets and their merge into disjoint thread groups.

use crate::Result;
use crate::extract::is_record_divider;
use log::debug;
use regex::Regex;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

/// A thread id as printed by `perf c2c` in its `tid:comm` column.
///
/// The digits are kept as printed, so `0123` and `123` stay distinct ids.
/// Ids order by numeric value with no width limit, so `9` sorts before `10`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ThreadId(String);

impl ThreadId {
    /// The digits as they appeared in the report.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn significant_digits(&self) -> &str {
        self.0.trim_start_matches('0')
    }
}

impl From<&str> for ThreadId {
    fn from(digits: &str) -> Self {
        Self(digits.to_string())
    }
}

impl From<u64> for ThreadId {
    fn from(tid: u64) -> Self {
        Self(tid.to_string())
    }
}

impl Ord for ThreadId {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = (self.significant_digits(), other.significant_digits());
        a.len()
            .cmp(&b.len())
            .then_with(|| a.cmp(b))
            .then_with(|| self.0.len().cmp(&other.0.len()))
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for ThreadId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Threads observed on a single cache line.
pub type ThreadSet = BTreeSet<ThreadId>;

/// Threads transitively connected through shared cache lines.
pub type ThreadGroup = BTreeSet<ThreadId>;

/// Matches report rows of the shape `  <n>  <tid>:<comm> ...` and captures
/// the tid.
pub const TID_PATTERN: &str = r"\s+\d+\s+(\d+):[a-zA-Z_]+\s+";

/// Splits an extracted Pareto block into per-cache-line thread sets.
pub struct RecordParser {
    tid_pattern: Regex,
}

impl RecordParser {
    /// Create a parser with the thread line pattern compiled.
    pub fn new() -> Result<Self> {
        Ok(Self {
            tid_pattern: Regex::new(TID_PATTERN)?,
        })
    }

    /// Extract the thread id from a report row, if the row has one.
    pub fn thread_id(&self, line: &str) -> Option<ThreadId> {
        let caps = self.tid_pattern.captures(line)?;
        caps.get(1).map(|digits| ThreadId::from(digits.as_str()))
    }

    /// Collect one thread set per cache line record.
    ///
    /// Records are closed by dashed dividers or by the end of the block.
    /// Records without any thread rows are dropped.
    pub fn parse_records<'a, I>(&self, lines: I) -> Vec<ThreadSet>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut records = Vec::new();
        let mut current = ThreadSet::new();

        for line in lines {
            if is_record_divider(line) {
                if !current.is_empty() {
                    records.push(std::mem::take(&mut current));
                }
                continue;
            }

            if let Some(tid) = self.thread_id(line) {
                current.insert(tid);
            }
        }

        if !current.is_empty() {
            records.push(current);
        }

        debug!("parsed {} cache line records", records.len());
        records
    }
}

/// Fold one thread set into the existing groups.
///
/// Every group that shares a thread with `set` is pulled out and unioned
/// with it; the union goes to the end. Untouched groups keep their relative
/// order. An empty set leaves the groups as they are.
pub fn merge_one(groups: Vec<ThreadGroup>, set: &ThreadSet) -> Vec<ThreadGroup> {
    if set.is_empty() {
        return groups;
    }

    let (merged, mut kept): (Vec<_>, Vec<_>) =
        groups.into_iter().partition(|group| !group.is_disjoint(set));

    let mut union = set.clone();
    for group in merged {
        union.extend(group);
    }
    kept.push(union);
    kept
}

/// Merge thread sets, in order, into disjoint groups.
pub fn build_groups(sets: &[ThreadSet]) -> Vec<ThreadGroup> {
    let groups = sets.iter().fold(Vec::new(), merge_one);
    debug!("merged {} thread sets into {} groups", sets.len(), groups.len());
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[u64]) -> ThreadSet {
        ids.iter().copied().map(ThreadId::from).collect()
    }

    fn divider() -> String {
        format!("  {}", "-".repeat(70))
    }

    fn row(tid: u64, comm: &str) -> String {
        row_str(&tid.to_string(), comm)
    }

    fn row_str(tid: &str, comm: &str) -> String {
        format!("     0.00%   52.34%    0x0     0      1    {}:{}   [.] reader", tid, comm)
    }

    #[test]
    fn thread_id_from_report_row() {
        let parser = RecordParser::new().unwrap();

        assert_eq!(parser.thread_id(&row(1001, "stress_hitm")), Some(ThreadId::from(1001)));
        assert_eq!(parser.thread_id("   7   42:foo  "), Some(ThreadId::from(42)));
    }

    #[test]
    fn thread_id_rejects_other_shapes() {
        let parser = RecordParser::new().unwrap();

        // no whitespace after the command name
        assert_eq!(parser.thread_id("   7   42:foo"), None);
        // command must be letters or underscore
        assert_eq!(parser.thread_id("   7   42:foo-bar  "), None);
        // needs a number column before the tid
        assert_eq!(parser.thread_id("42:foo  "), None);
        assert_eq!(parser.thread_id("      0        0     1217        0  0x55d5e1c5a040"), None);
        assert_eq!(parser.thread_id("  [.] reader  stress_hitm  stress_hitm.c:45   0{1,3}"), None);
    }

    #[test]
    fn thread_id_keeps_leading_zeros() {
        let parser = RecordParser::new().unwrap();

        let tid = parser.thread_id("   7   0123:foo  ").unwrap();

        assert_eq!(tid.as_str(), "0123");
        assert_ne!(tid, ThreadId::from(123));
    }

    #[test]
    fn thread_id_wider_than_u64() {
        let parser = RecordParser::new().unwrap();

        let tid = parser.thread_id("  1  9999999999999999999999999:foo  ").unwrap();

        assert_eq!(tid.as_str(), "9999999999999999999999999");
        assert!(tid > ThreadId::from(u64::MAX));
    }

    #[test]
    fn thread_id_orders_numerically() {
        let wide = ThreadId::from("10000000000000000000000000");

        assert!(ThreadId::from(9) < ThreadId::from(10));
        assert!(ThreadId::from("0009") < ThreadId::from(10));
        assert!(ThreadId::from(123) < ThreadId::from("0123"));
        assert!(ThreadId::from("0") < ThreadId::from("00"));
        assert!(ThreadId::from(u64::MAX) < wide);
    }

    #[test]
    fn leading_zero_ids_are_separate_threads() {
        let parser = RecordParser::new().unwrap();
        let lines = vec![row_str("0123", "foo"), divider(), row_str("123", "bar")];

        let records = parser.parse_records(lines.iter().map(String::as_str));

        assert_eq!(records.len(), 2);
        assert!(build_groups(&records).iter().all(|g| g.len() == 1));
    }

    #[test]
    fn records_split_on_dividers() {
        let parser = RecordParser::new().unwrap();
        let lines = vec![
            divider(),
            "      0        0     1217        0        0        0  0x55d5e1c5a040".to_string(),
            divider(),
            row(1001, "foo"),
            row(1002, "bar"),
            row(1001, "foo"),
            divider(),
            row(2000, "qux"),
        ];

        let records = parser.parse_records(lines.iter().map(String::as_str));

        assert_eq!(records, vec![set(&[1001, 1002]), set(&[2000])]);
    }

    #[test]
    fn empty_records_are_dropped() {
        let parser = RecordParser::new().unwrap();
        let lines = vec![divider(), divider(), "# header".to_string(), divider()];

        assert!(parser.parse_records(lines.iter().map(String::as_str)).is_empty());
    }

    #[test]
    fn merge_into_empty_list() {
        assert_eq!(merge_one(Vec::new(), &set(&[3, 1])), vec![set(&[1, 3])]);
    }

    #[test]
    fn merge_disjoint_appends() {
        let groups = merge_one(vec![set(&[1, 2])], &set(&[3, 4]));

        assert_eq!(groups, vec![set(&[1, 2]), set(&[3, 4])]);
    }

    #[test]
    fn merge_bridges_groups_and_moves_union_to_end() {
        let groups = vec![set(&[1, 2]), set(&[5]), set(&[3, 4]), set(&[9])];

        let merged = merge_one(groups, &set(&[2, 3, 7]));

        assert_eq!(merged, vec![set(&[5]), set(&[9]), set(&[1, 2, 3, 4, 7])]);
    }

    #[test]
    fn merge_empty_set_is_noop() {
        let groups = vec![set(&[1])];

        assert_eq!(merge_one(groups.clone(), &ThreadSet::new()), groups);
    }

    #[test]
    fn build_groups_is_transitive() {
        let sets = vec![set(&[1, 2]), set(&[10, 11]), set(&[3]), set(&[2, 10])];

        assert_eq!(build_groups(&sets), vec![set(&[3]), set(&[1, 2, 10, 11])]);
    }

    #[test]
    fn build_groups_of_nothing() {
        assert!(build_groups(&[]).is_empty());
    }

    #[test]
    fn thread_ids_sort_numerically() {
        let ids: Vec<String> = set(&[10, 9, 100]).iter().map(ToString::to_string).collect();

        assert_eq!(ids, vec!["9", "10", "100"]);
    }
}
