//! Configuration for the bytecode-load detector.
//!
//! The dispatch pattern is tuned to one interpreter build: which registers the
//! compiler chose for the OR accumulator and for the handler-table index. Those
//! identities are configuration, not discovery, so the detector can be
//! retargeted to other interpreters without code changes.

use std::path::PathBuf;

use log::warn;

use crate::{x86::X86Register, Error, Result};

/// Default destination of the drained confirmed-read log.
pub const DEFAULT_OUTPUT: &str = "first_tool.out";

/// Configuration for the bytecode-load detector and its classification adapter.
///
/// The defaults describe the CPython 3.11 x86-64 dispatch loop, where the opcode
/// and oparg are combined in `r13d` or `r12d` and the low byte is moved into
/// `edx` before the computed jump.
///
/// # Examples
///
/// ```rust
/// use dispatchscope::{x86::X86Register, DetectorConfig};
///
/// let config = DetectorConfig::default()
///     .with_accumulators(vec![X86Register::R14d])
///     .with_index(X86Register::Eax)
///     .with_output("bytecode.out");
/// config.validate()?;
/// assert!(config.is_accumulator(X86Register::R14d));
/// assert!(config.is_accumulator_low_byte(X86Register::R14b));
/// # Ok::<(), dispatchscope::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectorConfig {
    /// Registers an OR may target to tag a candidate (default: `r13d`, `r12d`).
    pub accumulators: Vec<X86Register>,

    /// Register the accumulator's low byte is zero-extended into (default: `edx`).
    pub index: X86Register,

    /// Destination of the confirmed-read log (default: `first_tool.out`).
    pub output: PathBuf,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            accumulators: vec![X86Register::R13d, X86Register::R12d],
            index: X86Register::Edx,
            output: PathBuf::from(DEFAULT_OUTPUT),
        }
    }
}

impl DetectorConfig {
    /// Replaces the accumulator registers.
    #[must_use]
    pub fn with_accumulators(mut self, accumulators: Vec<X86Register>) -> Self {
        self.accumulators = accumulators;
        self
    }

    /// Replaces the index register.
    #[must_use]
    pub fn with_index(mut self, index: X86Register) -> Self {
        self.index = index;
        self
    }

    /// Replaces the output path.
    #[must_use]
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    /// Returns true if `reg` is one of the configured accumulators.
    #[inline]
    pub fn is_accumulator(&self, reg: X86Register) -> bool {
        self.accumulators.contains(&reg)
    }

    /// Returns true if `reg` is the low-byte alias of a configured accumulator.
    #[inline]
    pub fn is_accumulator_low_byte(&self, reg: X86Register) -> bool {
        self.accumulators.iter().any(|acc| acc.low_byte() == reg)
    }

    /// Checks that the register roles are consistent.
    ///
    /// Unusual but workable choices, such as the stack pointer in a register
    /// role or a repeated accumulator, are logged as warnings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if no accumulator is configured or if the
    /// index register shares a full-width register with an accumulator.
    pub fn validate(&self) -> Result<()> {
        if self.accumulators.is_empty() {
            return Err(Error::InvalidConfig(
                "at least one accumulator register is required".to_string(),
            ));
        }

        if let Some(acc) = self
            .accumulators
            .iter()
            .find(|acc| acc.aliases(self.index))
        {
            return Err(Error::InvalidConfig(format!(
                "index register {} aliases accumulator {}",
                self.index, acc
            )));
        }

        for (i, acc) in self.accumulators.iter().enumerate() {
            if self.accumulators[..i].contains(acc) {
                warn!("Accumulator {acc} is configured more than once");
            }
            if acc.is_stack_pointer() {
                warn!("Accumulator {acc} is the stack pointer");
            }
            if acc.is_high_byte() {
                warn!(
                    "Accumulator {acc} is a high-byte register, offset use is matched on {}",
                    acc.low_byte()
                );
            }
        }
        if self.index.is_stack_pointer() {
            warn!("Index register {} is the stack pointer", self.index);
        }

        Ok(())
    }
}
