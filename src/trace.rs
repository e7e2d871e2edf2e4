//! Recorded instruction streams.
//!
//! A trace is a JSON-lines file capturing what an instrumentation engine would
//! deliver live: the main-image notification, the executed instructions in
//! program execution order, and the process-exit notification. Replaying a
//! trace through a [`TraceSession`] yields the same confirmed reads as running
//! the detector inside the engine.
//!
//! ```text
//! {"kind":"image","low":93824992231424,"high":93824996425727}
//! {"kind":"ins","address":93824992235520,"opcode":"movzx","operands":["register","memory"],"writes":["ecx"],"memory_read":140737488346640}
//! {"kind":"ins","address":93824992235524,"opcode":"or","operands":["register","register"],"reads":["r13d","ecx"],"writes":["r13d"]}
//! {"kind":"fini"}
//! ```
//!
//! Blank lines and lines starting with `#` are ignored. Records after `fini`
//! are not delivered.
//!
//! Trace files can be large, so [`TraceFile`] memory-maps them.

use std::{fs, path::Path};

use log::warn;
use memmap2::Mmap;
use serde::{Deserialize, Serialize};

use crate::{
    session::{ImageBounds, TraceSession},
    x86::InstructionFacts,
    Error, Result,
};

/// One line of a trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TraceRecord {
    /// The main executable image was mapped.
    Image {
        /// Lowest mapped address
        low: u64,
        /// Highest mapped address
        high: u64,
    },
    /// An instruction was executed.
    Ins(InstructionFacts),
    /// The process exited.
    Fini,
}

/// Iterator over the records of a trace buffer.
///
/// Yields [`Error::TraceFormat`] for a line that is not a valid record and
/// continues with the next line afterwards.
pub struct TraceRecords<'a> {
    lines: std::slice::Split<'a, u8, fn(&u8) -> bool>,
    line: usize,
}

impl<'a> TraceRecords<'a> {
    /// Iterates over the records in `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            lines: data.split(is_newline as fn(&u8) -> bool),
            line: 0,
        }
    }
}

fn is_newline(byte: &u8) -> bool {
    *byte == b'\n'
}

impl Iterator for TraceRecords<'_> {
    type Item = Result<TraceRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let raw = self.lines.next()?;
            self.line += 1;

            let trimmed = raw.trim_ascii();
            if trimmed.is_empty() || trimmed.starts_with(b"#") {
                continue;
            }

            return Some(
                serde_json::from_slice(trimmed).map_err(|source| Error::TraceFormat {
                    line: self.line,
                    source,
                }),
            );
        }
    }
}

/// A memory-mapped trace file.
#[derive(Debug)]
pub struct TraceFile {
    data: Option<Mmap>,
}

impl TraceFile {
    /// Opens and maps the trace at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileError`] if the file cannot be opened or mapped.
    pub fn open(path: impl AsRef<Path>) -> Result<TraceFile> {
        let file = fs::File::open(path)?;

        // Mapping a zero-length file fails on some platforms.
        if file.metadata()?.len() == 0 {
            return Ok(TraceFile { data: None });
        }

        let mmap = unsafe { Mmap::map(&file) }?;
        Ok(TraceFile { data: Some(mmap) })
    }

    /// Returns the raw trace bytes.
    pub fn data(&self) -> &[u8] {
        self.data.as_deref().unwrap_or(&[])
    }

    /// Iterates over the records of this trace.
    pub fn records(&self) -> TraceRecords<'_> {
        TraceRecords::new(self.data())
    }
}

/// Drives `session` through every record in `data`.
///
/// Stops at the first `fini` record or at the end of the data and returns
/// whether `fini` was seen. Finalizing the session is left to the caller; a
/// trace that ends without `fini` is treated as if the process had exited.
///
/// # Errors
///
/// Returns [`Error::TraceFormat`] on the first malformed record.
pub fn replay(data: &[u8], session: &mut TraceSession) -> Result<bool> {
    for record in TraceRecords::new(data) {
        match record? {
            TraceRecord::Image { low, high } => {
                session.on_image_load(ImageBounds::new(low, high));
            }
            TraceRecord::Ins(facts) => session.on_instruction(&facts),
            TraceRecord::Fini => return Ok(true),
        }
    }

    warn!("Trace ended without a fini record");
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{detector::ConfirmedRead, x86::X86Register, DetectorConfig};

    const TRACE: &str = r#"
# recorded dispatch loop
{"kind":"image","low":4096,"high":8191}
{"kind":"ins","address":4352,"opcode":"movzx","operands":["register","memory"],"writes":["ecx"],"memory_read":43690}
{"kind":"ins","address":4356,"opcode":"or","operands":["register","register"],"reads":["r13d","ecx"],"writes":["r13d"]}
{"kind":"ins","address":4360,"opcode":"movzx","operands":["register","register"],"reads":["r13b"],"writes":["edx"]}
{"kind":"fini"}
{"kind":"ins","address":4352,"opcode":"movzx","operands":["register","memory"],"writes":["ecx"],"memory_read":1}
"#;

    #[test]
    fn test_records() {
        let records: Vec<_> = TraceRecords::new(TRACE.as_bytes())
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(records.len(), 6);
        assert_eq!(
            records[0],
            TraceRecord::Image {
                low: 4096,
                high: 8191
            }
        );
        assert_eq!(
            records[2],
            TraceRecord::Ins(InstructionFacts::or_reg(
                4356,
                X86Register::R13d,
                X86Register::Ecx
            ))
        );
        assert_eq!(records[4], TraceRecord::Fini);
    }

    #[test]
    fn test_replay_stops_at_fini() {
        let mut session = TraceSession::new(DetectorConfig::default()).unwrap();
        assert!(replay(TRACE.as_bytes(), &mut session).unwrap());
        assert_eq!(session.stats().instructions, 3);
        assert_eq!(
            session.finalize(),
            vec![ConfirmedRead {
                load_address: 43690,
                instruction_offset: 256
            }]
        );
    }

    #[test]
    fn test_malformed_line_number() {
        let data = b"{\"kind\":\"fini\"}\n\n{\"kind\":\"bogus\"}\n";
        let mut records = TraceRecords::new(data);
        assert!(matches!(records.next(), Some(Ok(TraceRecord::Fini))));
        match records.next() {
            Some(Err(Error::TraceFormat { line, .. })) => assert_eq!(line, 3),
            other => panic!("unexpected record: {other:?}"),
        }
        assert!(records.next().is_none());
    }

    #[test]
    fn test_record_serialization() {
        let record = TraceRecord::Image { low: 1, high: 2 };
        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"kind":"image","low":1,"high":2}"#
        );
    }

    #[test]
    fn test_open_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let trace = TraceFile::open(file.path()).unwrap();
        assert!(trace.data().is_empty());
        assert_eq!(trace.records().count(), 0);
    }

    #[test]
    fn test_open_mapped_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), TRACE).unwrap();
        let trace = TraceFile::open(file.path()).unwrap();
        assert_eq!(trace.records().count(), 6);
    }
}
