use comfy_table::{presets, CellAlignment, ContentArrangement, Table};
use serde::Serialize;

use crate::app::GlobalOptions;

const INDENT: &str = "  ";

/// Emit `data` as pretty JSON under `--json`, otherwise hand it to `render`.
pub fn emit<T: Serialize>(
    data: &T,
    opts: &GlobalOptions,
    render: impl FnOnce(&T),
) -> anyhow::Result<()> {
    if !opts.json {
        render(data);
        return Ok(());
    }
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

/// Event counters of a replay, names left and counts right-aligned.
pub fn print_counts(rows: &[(&str, u64)]) {
    print!("{}", render_counts(rows));
}

/// Numbered address list, cut off after `limit` rows.
pub fn print_addresses(addresses: &[u64], limit: usize) {
    print!("{}", render_addresses(addresses, limit));
}

fn render_counts(rows: &[(&str, u64)]) -> String {
    let mut table = bare_table(["Event", "Count"]);
    for (name, count) in rows {
        table.add_row(vec![(*name).to_string(), count.to_string()]);
    }
    align(&mut table, 1, CellAlignment::Right);
    indented(&table)
}

fn render_addresses(addresses: &[u64], limit: usize) -> String {
    let mut table = bare_table(["#", "Address"]);
    for (i, address) in addresses.iter().take(limit).enumerate() {
        table.add_row(vec![(i + 1).to_string(), format!("{address:#x}")]);
    }
    align(&mut table, 0, CellAlignment::Right);

    let mut text = indented(&table);
    if let Some(rest) = addresses.len().checked_sub(limit).filter(|n| *n > 0) {
        text.push_str(&format!("{INDENT}... and {rest} more\n"));
    }
    text
}

fn bare_table(header: [&str; 2]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_content_arrangement(ContentArrangement::Disabled)
        .set_header(header.to_vec());
    table
}

fn align(table: &mut Table, column: usize, alignment: CellAlignment) {
    if let Some(col) = table.column_mut(column) {
        col.set_cell_alignment(alignment);
    }
}

fn indented(table: &Table) -> String {
    table
        .to_string()
        .lines()
        .map(|line| format!("{INDENT}{}\n", line.trim_end()))
        .collect()
}
