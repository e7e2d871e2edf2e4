use std::{fs, path::Path};

use anyhow::Context;
use dispatchscope::compare::{compare, read_address_column_from_path};

use crate::{
    app::GlobalOptions,
    commands::common::load_reads,
    output::{emit, print_addresses},
};

/// Number of debug-only addresses listed in the human-readable report.
const MAX_LISTED: usize = 20;

pub fn run(
    tool: &Path,
    debug: &Path,
    report: Option<&Path>,
    opts: &GlobalOptions,
) -> anyhow::Result<()> {
    let tool_addresses: Vec<u64> = load_reads(tool)?
        .iter()
        .map(|read| read.load_address)
        .collect();
    let debug_addresses = read_address_column_from_path(debug)
        .with_context(|| format!("failed to read ground truth: {}", debug.display()))?;

    let result = compare(&debug_addresses, &tool_addresses);

    if let Some(report_path) = report {
        fs::write(report_path, result.to_string())
            .with_context(|| format!("failed to write report: {}", report_path.display()))?;
        log::info!("Wrote comparison report to {}", report_path.display());
    }

    emit(&result, opts, |r| {
        print!("{r}");

        if !r.debug_only_addresses.is_empty() {
            println!("\nDebug-only addresses:");
            print_addresses(&r.debug_only_addresses, MAX_LISTED);
        }
    })
}
