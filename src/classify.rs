//! Classification of executed instructions into detector events.
//!
//! This is the thin adapter between the instrumentation engine's decode facts
//! and [`BytecodeLoadDetector`]. Each instruction maps to at most one [`Event`];
//! anything that fits none of the recognised shapes and writes no register is
//! ignored.
//!
//! | Shape | Event |
//! |-------|-------|
//! | `movzx index, acc_low_byte` | [`Event::OffsetUse`] |
//! | `movzx reg, [mem]` | [`Event::Load`] |
//! | `or accumulator, reg` | [`Event::Or`] |
//! | any other register write | [`Event::Clobber`] |

use crate::{
    detector::BytecodeLoadDetector,
    x86::{InstructionFacts, Opcode, X86Register},
    DetectorConfig,
};

/// A detector event derived from one executed instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A zero-extending load into `dest` from `load_address`.
    Load {
        /// Absolute address of the load instruction.
        instr_address: u64,
        /// Effective address of the memory read.
        load_address: u64,
        /// Register receiving the loaded byte.
        dest: X86Register,
    },
    /// Writes to registers that are not one of the recognised shapes.
    Clobber {
        /// Every register the instruction writes.
        registers: Vec<X86Register>,
    },
    /// An OR into an accumulator whose source register is `src`.
    Or {
        /// Source register of the OR.
        src: X86Register,
    },
    /// The terminal zero-extend of an accumulator's low byte into the index register.
    OffsetUse,
}

impl Event {
    /// Feeds this event into `detector`.
    ///
    /// A register write also overwrites every sub-register and super-register
    /// of the written register, so candidates held under any alias are dropped
    /// along with the exact register's own candidate.
    pub fn apply(self, detector: &mut BytecodeLoadDetector<X86Register>) {
        match self {
            Event::Load {
                instr_address,
                load_address,
                dest,
            } => {
                clobber_aliases(detector, dest);
                detector.on_load(instr_address, load_address, dest);
            }
            Event::Clobber { registers } => {
                for reg in registers {
                    detector.on_clobber(reg);
                    clobber_aliases(detector, reg);
                }
            }
            Event::Or { src } => detector.on_or(src),
            Event::OffsetUse => detector.on_offset_use(),
        }
    }
}

/// Classifies one executed instruction.
///
/// The caller is responsible for the image-bounds check; this function only
/// looks at the instruction shape.
///
/// # Examples
///
/// ```rust
/// use dispatchscope::{classify::{classify, Event}, x86::{InstructionFacts, X86Register}, DetectorConfig};
///
/// let config = DetectorConfig::default();
/// let ext = InstructionFacts::movzx_reg(0x401008, X86Register::Edx, X86Register::R13b);
/// assert_eq!(classify(&ext, &config), Some(Event::OffsetUse));
/// ```
pub fn classify(facts: &InstructionFacts, config: &DetectorConfig) -> Option<Event> {
    match facts.opcode {
        Opcode::Movzx => {
            let dest = facts.destination()?;
            if is_offset_use(facts, dest, config) {
                return Some(Event::OffsetUse);
            }
            if let Some(load_address) = facts.memory_read {
                return Some(Event::Load {
                    instr_address: facts.address,
                    load_address,
                    dest,
                });
            }
        }
        Opcode::Or if facts.is_reg_reg() => {
            let is_accumulator = facts
                .destination()
                .is_some_and(|dest| config.is_accumulator(dest));
            if is_accumulator {
                if let Some(src) = facts.source_register() {
                    return Some(Event::Or { src });
                }
            }
        }
        _ => {}
    }

    clobber(facts)
}

/// `movzx index, acc_low_byte` - the accumulator's own output must never be
/// mistaken for a fresh bytecode load.
fn is_offset_use(facts: &InstructionFacts, dest: X86Register, config: &DetectorConfig) -> bool {
    dest == config.index
        && facts
            .source_register()
            .is_some_and(|src| config.is_accumulator_low_byte(src))
}

/// Clobbers the live candidates held under a different name for `reg`'s storage.
fn clobber_aliases(detector: &mut BytecodeLoadDetector<X86Register>, reg: X86Register) {
    let aliased: Vec<X86Register> = detector
        .candidates()
        .iter()
        .map(|candidate| candidate.register)
        .filter(|held| *held != reg && held.aliases(reg))
        .collect();
    for held in aliased {
        detector.on_clobber(held);
    }
}

fn clobber(facts: &InstructionFacts) -> Option<Event> {
    if facts.writes.is_empty() {
        None
    } else {
        Some(Event::Clobber {
            registers: facts.writes.clone(),
        })
    }
}
