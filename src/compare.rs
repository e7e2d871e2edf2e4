//! Accuracy evaluation against ground truth.
//!
//! A debug build of the target interpreter can log every bytecode fetch it
//! performs. Comparing that log with the detector's output shows how many real
//! bytecode loads the detector missed and how many of its confirmations have no
//! counterpart.
//!
//! Both inputs are line-oriented; the address is the second whitespace
//! separated token, in hexadecimal with or without a `0x` prefix. Lines without
//! a parsable second token (headers, summaries) are skipped.

use std::{
    collections::BTreeSet,
    fmt, fs,
    io::{BufRead, BufReader},
    path::Path,
};

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::{output::parse_hex, Error, Result};

/// Outcome of comparing a detector log with a ground-truth log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    /// Addresses in the ground-truth log.
    pub debug_total: usize,
    /// Addresses in the detector log.
    pub tool_total: usize,
    /// Ground-truth occurrences without a matching detector occurrence.
    pub missed: usize,
    /// Detector occurrences without a matching ground-truth occurrence.
    pub spurious: usize,
    /// Ground-truth entries matched by walking both logs in execution order.
    pub aligned: usize,
    /// Distinct addresses that only appear in the ground-truth log, ascending.
    pub debug_only_addresses: Vec<u64>,
}

impl ComparisonReport {
    /// Percentage of ground-truth occurrences the detector missed.
    pub fn missed_percent(&self) -> f64 {
        percent(self.missed, self.debug_total)
    }

    /// Percentage of detector occurrences absent from the ground truth.
    pub fn spurious_percent(&self) -> f64 {
        percent(self.spurious, self.tool_total)
    }

    /// Ground-truth entries not matched by the in-order walk.
    pub fn unaligned(&self) -> usize {
        self.debug_total - self.aligned
    }
}

impl fmt::Display for ComparisonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Percentage of Addresses in 'debugOutput' not found in 'toolOutput': {:.2}",
            self.missed_percent()
        )?;
        writeln!(
            f,
            "Percentage of Addresses in 'toolOutput' not found in 'debugOutput': {:.2}",
            self.spurious_percent()
        )?;
        writeln!(
            f,
            "Found in both (in order): {}, only in debug: {}",
            self.aligned,
            self.unaligned()
        )?;
        writeln!(
            f,
            "Distinct addresses only in 'debugOutput': {}",
            self.debug_only_addresses.len()
        )
    }
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

/// Reads the address column (second token) of every parsable line.
///
/// # Errors
///
/// Returns [`crate::Error::FileError`] if reading fails.
pub fn read_address_column<R: BufRead>(reader: R) -> Result<Vec<u64>> {
    let mut addresses = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if let Some(address) = line.split_whitespace().nth(1).and_then(parse_hex) {
            addresses.push(address);
        }
    }
    Ok(addresses)
}

/// Reads the address column of the file at `path`.
///
/// # Errors
///
/// Returns [`crate::Error::FileError`] if the file cannot be read, or
/// [`crate::Error::Empty`] if it holds no address at all.
pub fn read_address_column_from_path(path: &Path) -> Result<Vec<u64>> {
    let file = fs::File::open(path)?;
    let addresses = read_address_column(BufReader::new(file))?;
    if addresses.is_empty() {
        return Err(Error::Empty);
    }
    Ok(addresses)
}

/// Compares the ground-truth log `debug` with the detector log `tool`.
///
/// `missed` and `spurious` are multiset differences: an address fetched five
/// times but confirmed three times counts two misses. `aligned` walks `debug`
/// in order and advances through `tool` only on an exact match, so it also
/// reflects ordering.
///
/// # Examples
///
/// ```rust
/// use dispatchscope::compare::compare;
///
/// let report = compare(&[0x10, 0x11, 0x12, 0x10], &[0x10, 0x12, 0x99]);
/// assert_eq!(report.missed, 2);
/// assert_eq!(report.spurious, 1);
/// assert_eq!(report.aligned, 2);
/// assert_eq!(report.debug_only_addresses, vec![0x11]);
/// ```
pub fn compare(debug: &[u64], tool: &[u64]) -> ComparisonReport {
    let debug_counts = count(debug);
    let tool_counts = count(tool);

    let missed = excess(&debug_counts, &tool_counts);
    let spurious = excess(&tool_counts, &debug_counts);

    let mut aligned = 0;
    let mut j = 0;
    for address in debug {
        if tool.get(j) == Some(address) {
            aligned += 1;
            j += 1;
        }
    }

    let debug_only_addresses: BTreeSet<u64> = debug_counts
        .keys()
        .filter(|address| !tool_counts.contains_key(*address))
        .copied()
        .collect();

    ComparisonReport {
        debug_total: debug.len(),
        tool_total: tool.len(),
        missed,
        spurious,
        aligned,
        debug_only_addresses: debug_only_addresses.into_iter().collect(),
    }
}

fn count(addresses: &[u64]) -> FxHashMap<u64, usize> {
    let mut counts = FxHashMap::default();
    for address in addresses {
        *counts.entry(*address).or_insert(0) += 1;
    }
    counts
}

/// Sum over `left` of the occurrences not covered by `right`.
fn excess(left: &FxHashMap<u64, usize>, right: &FxHashMap<u64, usize>) -> usize {
    left.iter()
        .map(|(address, n)| n.saturating_sub(right.get(address).copied().unwrap_or(0)))
        .sum()
}
