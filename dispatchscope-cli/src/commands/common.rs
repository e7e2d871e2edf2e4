use std::path::Path;

use anyhow::Context;
use dispatchscope::{detector::ConfirmedRead, output, x86::X86Register, DetectorConfig};

/// Build a detector configuration from CLI register names, keeping defaults for omitted roles.
pub fn build_config(
    output: &Path,
    accumulators: &[String],
    index: Option<&str>,
) -> anyhow::Result<DetectorConfig> {
    let mut config = DetectorConfig::default().with_output(output);

    if !accumulators.is_empty() {
        let regs = accumulators
            .iter()
            .map(|name| X86Register::from_name(name))
            .collect::<dispatchscope::Result<Vec<_>>>()
            .context("invalid --accumulator")?;
        config = config.with_accumulators(regs);
    }

    if let Some(name) = index {
        let reg = X86Register::from_name(name).context("invalid --index")?;
        config = config.with_index(reg);
    }

    config.validate()?;
    Ok(config)
}

/// Load the result lines of a detector output file, ignoring any other lines.
pub fn load_reads(path: &Path) -> anyhow::Result<Vec<ConfirmedRead>> {
    output::scan_confirmed_reads_from_path(path)
        .with_context(|| format!("failed to read detector output: {}", path.display()))
}

/// Extract a display-friendly filename from a path.
pub fn file_display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    )
}
