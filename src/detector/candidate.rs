//! Records tracked by the pattern detector.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A provisional link between a register and a memory load that might feed the
/// dispatch offset.
///
/// Candidates are treated as values: tagging one replaces it with a tagged copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate<R> {
    /// Register currently holding the loaded value.
    pub register: R,
    /// Absolute memory address the value was loaded from.
    pub load_address: u64,
    /// Address of the loading instruction relative to the image base.
    pub instruction_offset: u64,
    /// Set once an OR into the accumulator consumed this register.
    pub or_tagged: bool,
}

impl<R: Copy> Candidate<R> {
    /// Creates an untagged candidate.
    pub fn new(register: R, load_address: u64, instruction_offset: u64) -> Self {
        Self {
            register,
            load_address,
            instruction_offset,
            or_tagged: false,
        }
    }

    /// Returns a copy of this candidate carrying the OR tag.
    #[must_use]
    pub fn tagged(self) -> Self {
        Self {
            or_tagged: true,
            ..self
        }
    }
}

/// A bytecode load confirmed to feed the dispatch offset computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfirmedRead {
    /// Absolute memory address of the bytecode load.
    pub load_address: u64,
    /// Address of the loading instruction relative to the image base.
    pub instruction_offset: u64,
}

impl fmt::Display for ConfirmedRead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MemoryAddress: {:#x} InsAddress: {:#x}",
            self.load_address, self.instruction_offset
        )
    }
}

impl<R> From<&Candidate<R>> for ConfirmedRead {
    fn from(candidate: &Candidate<R>) -> Self {
        Self {
            load_address: candidate.load_address,
            instruction_offset: candidate.instruction_offset,
        }
    }
}

/// Mode gating whether a terminal zero-extend may confirm a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DetectorState {
    /// No qualifying OR is pending.
    #[default]
    Idle,
    /// The previous event was an OR that tagged a live candidate.
    AccumulatorTagged,
}
