//! Disassembly context around confirmed instruction offsets.
//!
//! Once the detector has produced instruction offsets, the natural next step is
//! to look at the code around them in a disassembly listing of the same image
//! (e.g. `objdump -d --no-show-raw-insn`). Instruction lines start with the
//! address in hexadecimal followed by a colon; symbol headers and other lines
//! are never matched:
//!
//! ```text
//!   1d4a3f:	movzx  ecx,BYTE PTR [rbx+0x1]
//! ```

use std::collections::BTreeSet;

use serde::Serialize;

use crate::output::parse_hex;

/// Number of listing lines to include around a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextWindow {
    /// Lines before the matching line (default: 5).
    pub above: usize,
    /// Lines after the matching line (default: 10).
    pub below: usize,
}

impl Default for ContextWindow {
    fn default() -> Self {
        Self {
            above: 5,
            below: 10,
        }
    }
}

/// Listing excerpt around one matching instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingContext {
    /// Instruction offset that matched.
    pub address: u64,
    /// 1-based line number of the matching line.
    pub line: usize,
    /// The excerpt, matching line included.
    pub lines: Vec<String>,
}

/// Extracts the context around every listing line whose address is in `addresses`.
///
/// Results follow listing order. An address listed more than once (e.g. in
/// overlapping sections) yields one excerpt per occurrence.
///
/// # Examples
///
/// ```rust
/// use std::collections::BTreeSet;
/// use dispatchscope::context::{extract_context, ContextWindow};
///
/// let listing = "  10:\tpush rbx\n  11:\tmovzx ecx,BYTE PTR [rbx]\n  15:\tret\n";
/// let addresses = BTreeSet::from([0x11]);
/// let window = ContextWindow { above: 1, below: 0 };
///
/// let found = extract_context(listing, &addresses, window);
/// assert_eq!(found.len(), 1);
/// assert_eq!(found[0].line, 2);
/// assert_eq!(found[0].lines.len(), 2);
/// ```
pub fn extract_context(
    listing: &str,
    addresses: &BTreeSet<u64>,
    window: ContextWindow,
) -> Vec<ListingContext> {
    let lines: Vec<&str> = listing.lines().collect();
    let mut found = Vec::new();

    for (index, line) in lines.iter().enumerate() {
        let Some(address) = line_address(line) else {
            continue;
        };
        if !addresses.contains(&address) {
            continue;
        }

        let start = index.saturating_sub(window.above);
        let end = (index + window.below + 1).min(lines.len());
        found.push(ListingContext {
            address,
            line: index + 1,
            lines: lines[start..end].iter().map(|l| (*l).to_string()).collect(),
        });
    }

    found
}

fn line_address(line: &str) -> Option<u64> {
    let token = line.split_whitespace().next()?;
    parse_hex(token.strip_suffix(':')?)
}
