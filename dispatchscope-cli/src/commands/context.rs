use std::{collections::BTreeSet, fs, path::Path};

use anyhow::Context;
use dispatchscope::context::{extract_context, ContextWindow};

use crate::{app::GlobalOptions, commands::common::load_reads, output::emit};

pub fn run(
    tool: &Path,
    listing: &Path,
    above: usize,
    below: usize,
    opts: &GlobalOptions,
) -> anyhow::Result<()> {
    let offsets: BTreeSet<u64> = load_reads(tool)?
        .iter()
        .map(|read| read.instruction_offset)
        .collect();
    let text = fs::read_to_string(listing)
        .with_context(|| format!("failed to read listing: {}", listing.display()))?;

    let found = extract_context(&text, &offsets, ContextWindow { above, below });
    log::debug!(
        "{} of {} distinct offsets found in listing",
        found.len(),
        offsets.len()
    );

    emit(&found, opts, |found| {
        if found.is_empty() {
            println!("No confirmed instruction offsets found in listing.");
            return;
        }
        for (i, ctx) in found.iter().enumerate() {
            if i > 0 {
                println!();
            }
            println!("{:#x} (line {}):", ctx.address, ctx.line);
            for line in &ctx.lines {
                println!("  {line}");
            }
        }
    })
}
