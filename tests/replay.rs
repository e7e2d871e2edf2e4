//! End-to-end tests: recorded trace in, confirmed-read file out, compared
//! against a ground-truth log.

use std::{fs, io::Write};

use dispatchscope::{
    compare::{compare, read_address_column_from_path},
    output::{read_confirmed_reads_from_path, scan_confirmed_reads_from_path},
    prelude::*,
    trace::replay,
    DEFAULT_OUTPUT,
};

const LOW: u64 = 0x5555_5555_4000;
const HIGH: u64 = 0x5555_5595_3fff;

fn record(facts: &InstructionFacts) -> String {
    serde_json::to_string(&TraceRecord::Ins(facts.clone())).unwrap()
}

/// One dispatch iteration loading `value` from `ea` at image offset `offset`.
fn dispatch(out: &mut Vec<String>, offset: u64, ea: u64) {
    let at = LOW + offset;
    out.push(record(&InstructionFacts::movzx_load(at, X86Register::Ecx, ea)));
    out.push(record(&InstructionFacts::or_reg(
        at + 4,
        X86Register::R13d,
        X86Register::Ecx,
    )));
    out.push(record(&InstructionFacts::movzx_reg(
        at + 7,
        X86Register::Edx,
        X86Register::R13b,
    )));
}

fn write_trace(lines: &[String]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file.flush().unwrap();
    file
}

#[test]
fn test_replay_to_file() -> Result<()> {
    let mut lines = vec![serde_json::to_string(&TraceRecord::Image {
        low: LOW,
        high: HIGH,
    })
    .unwrap()];
    // Library code outside the image never reaches the detector.
    lines.push(record(&InstructionFacts::movzx_load(
        0x7fff_f7a0_0000,
        X86Register::Ecx,
        0x1,
    )));
    dispatch(&mut lines, 0x1000, 0x7fff_0010);
    lines.push(record(&InstructionFacts::other(LOW + 0x2000, &[X86Register::Ecx])));
    dispatch(&mut lines, 0x1000, 0x7fff_0011);
    lines.push(serde_json::to_string(&TraceRecord::Fini).unwrap());

    let trace_file = write_trace(&lines);
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join(DEFAULT_OUTPUT);

    let config = DetectorConfig::default().with_output(&output);
    let mut session = TraceSession::new(config)?;
    let trace = TraceFile::open(trace_file.path())?;
    assert!(replay(trace.data(), &mut session)?);

    let stats = session.stats();
    assert_eq!(stats.instructions, 8);
    assert_eq!(stats.out_of_bounds, 1);
    assert_eq!(stats.offset_uses, 2);
    assert_eq!(session.finalize_to_file()?, 2);

    let text = fs::read_to_string(&output)?;
    assert_eq!(
        text,
        "MemoryAddress: 0x7fff0010 InsAddress: 0x1000\n\
         MemoryAddress: 0x7fff0011 InsAddress: 0x1000\n"
    );

    let reads = read_confirmed_reads_from_path(&output)?;
    assert_eq!(reads.len(), 2);
    assert_eq!(reads[1].load_address, 0x7fff_0011);
    Ok(())
}

#[test]
fn test_instructions_before_image_ignored() -> Result<()> {
    let mut lines = Vec::new();
    dispatch(&mut lines, 0x1000, 0x10);
    lines.push(
        serde_json::to_string(&TraceRecord::Image {
            low: LOW,
            high: HIGH,
        })
        .unwrap(),
    );

    let trace_file = write_trace(&lines);
    let mut session = TraceSession::new(DetectorConfig::default())?;
    let trace = TraceFile::open(trace_file.path())?;
    assert!(!replay(trace.data(), &mut session)?);

    assert_eq!(session.stats().out_of_bounds, 3);
    assert!(session.finalize().is_empty());
    Ok(())
}

#[test]
fn test_image_bounds_inclusive() -> Result<()> {
    let mut session = TraceSession::new(DetectorConfig::default())?;
    session.on_image_load(ImageBounds::new(LOW, HIGH));

    session.on_instruction(&InstructionFacts::movzx_load(HIGH, X86Register::Ecx, 0x99));
    session.on_instruction(&InstructionFacts::or_reg(
        HIGH + 1,
        X86Register::R13d,
        X86Register::Ecx,
    ));
    assert_eq!(session.stats().loads, 1);
    assert_eq!(session.stats().out_of_bounds, 1);
    assert!(session.detector().candidate(X86Register::Ecx).is_some());
    Ok(())
}

#[test]
fn test_malformed_trace_reports_line() {
    let trace_file = write_trace(&[
        r#"{"kind":"image","low":0,"high":100}"#.to_string(),
        "not json".to_string(),
    ]);
    let mut session = TraceSession::new(DetectorConfig::default()).unwrap();
    let trace = TraceFile::open(trace_file.path()).unwrap();

    match replay(trace.data(), &mut session) {
        Err(Error::TraceFormat { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected a trace format error, got {other:?}"),
    }
}

#[test]
fn test_compare_against_ground_truth() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let debug = dir.path().join("debug.out");
    fs::write(&debug, "LOAD 0x10\nLOAD 0x11\nLOAD 0x12\nLOAD 0x10\n")?;
    let tool = vec![0x10, 0x12, 0x99];

    let report = compare(&read_address_column_from_path(&debug)?, &tool);
    assert_eq!(report.debug_total, 4);
    assert_eq!(report.tool_total, 3);
    assert_eq!(report.missed, 2);
    assert_eq!(report.spurious, 1);
    assert_eq!(report.debug_only_addresses, vec![0x11]);
    Ok(())
}

#[test]
fn test_compare_tool_output_with_summary_line() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let tool = dir.path().join(DEFAULT_OUTPUT);
    let debug = dir.path().join("debug.out");
    fs::write(
        &tool,
        "Number of bytecode founds: 2\n\
         MemoryAddress: 0x10 InsAddress: 0x20\n\
         MemoryAddress: 0x11 InsAddress: 0x20\n",
    )?;
    fs::write(&debug, "LOAD 0x10\nLOAD 0x11\n")?;

    assert!(read_confirmed_reads_from_path(&tool).is_err());
    let tool_addresses: Vec<u64> = scan_confirmed_reads_from_path(&tool)?
        .iter()
        .map(|read| read.load_address)
        .collect();
    assert_eq!(tool_addresses, vec![0x10, 0x11]);

    let report = compare(&read_address_column_from_path(&debug)?, &tool_addresses);
    assert_eq!(report.missed, 0);
    assert_eq!(report.spurious, 0);
    assert_eq!(report.aligned, 2);
    Ok(())
}
