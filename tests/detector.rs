//! Integration tests for the bytecode-load detector.
//!
//! Drives the detector through the dispatch-loop shapes it has to recognize,
//! both directly through events and through classified instruction facts.

use dispatchscope::prelude::*;

const BASE: u64 = 0x5555_5555_4000;
const R1: X86Register = X86Register::Ecx;
const R2: X86Register = X86Register::Eax;

fn detector() -> BytecodeLoadDetector {
    BytecodeLoadDetector::new(BASE)
}

#[test]
fn test_full_chain_confirms() {
    let mut d = detector();
    d.on_load(BASE + 0x1000, 0xAAAA, R1);
    d.on_or(R1);
    d.on_offset_use();

    assert_eq!(
        d.confirmed(),
        &[ConfirmedRead {
            load_address: 0xAAAA,
            instruction_offset: 0x1000,
        }]
    );
    assert!(d.candidates().is_empty());
    assert_eq!(d.state(), DetectorState::Idle);
}

#[test]
fn test_clobber_breaks_chain() {
    let mut d = detector();
    d.on_load(BASE + 0x1000, 0xAAAA, R1);
    d.on_clobber(R1);
    d.on_or(R1);
    d.on_offset_use();

    assert!(d.confirmed().is_empty());
    assert!(d.candidates().is_empty());
}

#[test]
fn test_later_load_supersedes() {
    let mut d = detector();
    d.on_load(BASE + 0x1000, 0x1111, R1);
    d.on_load(BASE + 0x1010, 0x2222, R1);
    assert_eq!(d.candidates().len(), 1);

    d.on_or(R1);
    d.on_offset_use();
    assert_eq!(
        d.finalize(),
        vec![ConfirmedRead {
            load_address: 0x2222,
            instruction_offset: 0x1010,
        }]
    );
}

#[test]
fn test_offset_use_on_empty_table() {
    let mut d = detector();
    d.on_offset_use();
    d.on_offset_use();

    assert!(d.confirmed().is_empty());
    assert!(d.candidates().is_empty());
    assert_eq!(d.state(), DetectorState::Idle);
}

#[test]
fn test_consecutive_cycles() {
    let mut d = detector();
    for (i, value) in [0x10u64, 0x20].into_iter().enumerate() {
        let addr = BASE + 0x2000 + (i as u64) * 0x40;
        d.on_load(addr, value, R1);
        d.on_or(R1);
        d.on_offset_use();
    }

    let reads = d.finalize();
    assert_eq!(reads.len(), 2);
    assert_eq!(reads[0].load_address, 0x10);
    assert_eq!(reads[0].instruction_offset, 0x2000);
    assert_eq!(reads[1].load_address, 0x20);
    assert_eq!(reads[1].instruction_offset, 0x2040);
}

#[test]
fn test_one_candidate_per_register() {
    let mut d = detector();
    for i in 0..8 {
        d.on_load(BASE + i, i, R1);
        d.on_load(BASE + i, i, R2);
    }
    assert_eq!(d.candidates().len(), 2);
    assert_eq!(d.candidate(R1).map(|c| c.load_address), Some(7));
    assert_eq!(d.candidate(R2).map(|c| c.load_address), Some(7));
}

#[test]
fn test_intervening_load_resets_tag() {
    let mut d = detector();
    d.on_load(BASE + 0x10, 0xA, R1);
    d.on_or(R1);
    d.on_load(BASE + 0x20, 0xB, R2);
    assert_eq!(d.state(), DetectorState::Idle);

    d.on_offset_use();
    assert!(d.confirmed().is_empty());
}

#[test]
fn test_clobber_between_or_and_offset_use() {
    let mut d = detector();
    d.on_load(BASE + 0x10, 0xA, R1);
    d.on_or(R1);
    d.on_clobber(R2);
    assert_eq!(d.state(), DetectorState::Idle);

    d.on_offset_use();
    assert!(d.confirmed().is_empty());
    assert!(d.candidates().is_empty());
}

#[test]
fn test_aliased_write_breaks_chain() {
    let mut session = TraceSession::new(DetectorConfig::default()).unwrap();
    session.on_image_load(ImageBounds::new(BASE, BASE + 0xffff));

    // movzx ecx, [m] ; mov rcx, rax ; or r13d, ecx ; movzx edx, r13b
    session.on_instruction(&InstructionFacts::movzx_load(BASE, X86Register::Ecx, 0xaaaa));
    session.on_instruction(&InstructionFacts::other(BASE + 0x4, &[X86Register::Rcx]));
    assert!(session.detector().candidates().is_empty());

    session.on_instruction(&InstructionFacts::or_reg(
        BASE + 0x8,
        X86Register::R13d,
        X86Register::Ecx,
    ));
    session.on_instruction(&InstructionFacts::movzx_reg(
        BASE + 0xb,
        X86Register::Edx,
        X86Register::R13b,
    ));
    assert!(session.finalize().is_empty());
}

#[test]
fn test_narrow_write_breaks_chain() {
    let config = DetectorConfig::default();
    let mut d = detector();

    let stream = [
        InstructionFacts::movzx_load(BASE + 0x104, X86Register::Ecx, 0x42),
        InstructionFacts::other(BASE + 0x106, &[X86Register::Cl]),
        InstructionFacts::or_reg(BASE + 0x108, X86Register::R13d, X86Register::Ecx),
        InstructionFacts::movzx_reg(BASE + 0x10b, X86Register::Edx, X86Register::R13b),
    ];
    for facts in &stream {
        if let Some(event) = classify(facts, &config) {
            event.apply(&mut d);
        }
    }

    assert!(d.finalize().is_empty());
}

#[test]
fn test_most_recent_tag_wins() {
    let mut d = detector();
    d.on_load(BASE + 0x10, 0xA, R1);
    d.on_load(BASE + 0x20, 0xB, R2);
    d.on_or(R1);
    d.on_or(R2);
    d.on_offset_use();

    assert_eq!(d.confirmed().len(), 1);
    assert_eq!(d.confirmed()[0].load_address, 0xB);
}

#[test]
fn test_classified_dispatch_loop() {
    let config = DetectorConfig::default();
    let mut d = detector();

    let stream = [
        InstructionFacts::other(BASE + 0x100, &[X86Register::Rbx]),
        InstructionFacts::movzx_load(BASE + 0x104, X86Register::Ecx, 0x7fff_0000),
        InstructionFacts::or_reg(BASE + 0x108, X86Register::R13d, X86Register::Ecx),
        InstructionFacts::movzx_reg(BASE + 0x10b, X86Register::Edx, X86Register::R13b),
        InstructionFacts::other(BASE + 0x10f, &[]),
    ];
    for facts in &stream {
        if let Some(event) = classify(facts, &config) {
            event.apply(&mut d);
        }
    }

    assert_eq!(
        d.finalize(),
        vec![ConfirmedRead {
            load_address: 0x7fff_0000,
            instruction_offset: 0x104,
        }]
    );
}

#[test]
fn test_or_into_non_accumulator_ignored() {
    let config = DetectorConfig::default();
    let mut d = detector();

    let stream = [
        InstructionFacts::movzx_load(BASE + 0x104, X86Register::Ecx, 0x42),
        InstructionFacts::or_reg(BASE + 0x108, X86Register::Eax, X86Register::Ecx),
        InstructionFacts::movzx_reg(BASE + 0x10b, X86Register::Edx, X86Register::R13b),
    ];
    for facts in &stream {
        if let Some(event) = classify(facts, &config) {
            event.apply(&mut d);
        }
    }

    assert!(d.finalize().is_empty());
}
