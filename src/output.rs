//! Persistence of the confirmed-read log.
//!
//! The log is written once, at finalization, as one line per
//! [`ConfirmedRead`] in execution order:
//!
//! ```text
//! MemoryAddress: 0x7f3a1c2b4e12 InsAddress: 0x1d4a3f
//! ```
//!
//! Both values are hexadecimal with a `0x` prefix, including zero (`0x0`).
//! Readers accept the prefix as optional, so files where zero is rendered as a
//! bare `0` parse the same way.
//!
//! [`read_confirmed_reads`] reads a file back strictly and rejects any other
//! line. [`scan_confirmed_reads`] keeps only the result lines, for tool output
//! that carries headers or summary lines around the log.

use std::{
    fs,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use crate::{detector::ConfirmedRead, Result};

const MEMORY_KEY: &str = "MemoryAddress:";
const INSTRUCTION_KEY: &str = "InsAddress:";

/// Writes `reads` to `writer`, one line each, and flushes.
///
/// # Errors
///
/// Returns [`crate::Error::FileError`] if writing fails.
pub fn write_confirmed_reads<W: Write>(reads: &[ConfirmedRead], writer: W) -> Result<()> {
    let mut writer = BufWriter::new(writer);
    for read in reads {
        writeln!(writer, "{read}")?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes `reads` to the file at `path`, replacing any previous content.
///
/// # Errors
///
/// Returns [`crate::Error::FileError`] if the file cannot be created or written.
pub fn write_confirmed_reads_to_path(reads: &[ConfirmedRead], path: &Path) -> Result<()> {
    let file = fs::File::create(path)?;
    write_confirmed_reads(reads, file)
}

/// Parses a single result line.
///
/// Returns `None` for anything that is not a well-formed result line.
pub fn parse_line(line: &str) -> Option<ConfirmedRead> {
    let mut tokens = line.split_whitespace();
    if tokens.next()? != MEMORY_KEY {
        return None;
    }
    let load_address = parse_hex(tokens.next()?)?;
    if tokens.next()? != INSTRUCTION_KEY {
        return None;
    }
    let instruction_offset = parse_hex(tokens.next()?)?;
    if tokens.next().is_some() {
        return None;
    }

    Some(ConfirmedRead {
        load_address,
        instruction_offset,
    })
}

/// Reads a result file back, in file order.
///
/// # Errors
///
/// Returns [`crate::Error::Malformed`] for a non-empty line that is not a result
/// line, or [`crate::Error::FileError`] if reading fails.
pub fn read_confirmed_reads<R: BufRead>(reader: R) -> Result<Vec<ConfirmedRead>> {
    let mut reads = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(&line) {
            Some(read) => reads.push(read),
            None => {
                return Err(malformed_error!(
                    "Invalid result line {}: {}",
                    index + 1,
                    line
                ))
            }
        }
    }
    Ok(reads)
}

/// Reads the result file at `path`.
///
/// # Errors
///
/// See [`read_confirmed_reads`].
pub fn read_confirmed_reads_from_path(path: &Path) -> Result<Vec<ConfirmedRead>> {
    let file = fs::File::open(path)?;
    read_confirmed_reads(BufReader::new(file))
}

/// Collects the result lines of `reader`, skipping every other line.
///
/// # Errors
///
/// Returns [`crate::Error::FileError`] if reading fails.
pub fn scan_confirmed_reads<R: BufRead>(reader: R) -> Result<Vec<ConfirmedRead>> {
    let mut reads = Vec::new();
    for line in reader.lines() {
        if let Some(read) = parse_line(&line?) {
            reads.push(read);
        }
    }
    Ok(reads)
}

/// Collects the result lines of the file at `path`.
///
/// # Errors
///
/// Returns [`crate::Error::FileError`] if the file cannot be read.
pub fn scan_confirmed_reads_from_path(path: &Path) -> Result<Vec<ConfirmedRead>> {
    let file = fs::File::open(path)?;
    scan_confirmed_reads(BufReader::new(file))
}

/// Parses a hexadecimal number with an optional `0x` prefix.
pub(crate) fn parse_hex(token: &str) -> Option<u64> {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    u64::from_str_radix(digits, 16).ok()
}
