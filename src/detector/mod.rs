//! Streaming bytecode-load pattern detector.
//!
//! The target interpreter's dispatch loop runs a four-step register relay:
//!
//! ```text
//! movzx ecx, byte ptr [rbx+1]   ; load a bytecode byte        -> on_load
//! or    r13d, ecx               ; fold it into the accumulator -> on_or
//! movzx edx, r13b               ; move the low byte to index   -> on_offset_use
//! jmp   [table + rdx*8]
//! ```
//!
//! [`BytecodeLoadDetector`] recognises that relay from the executed instruction
//! stream, one event at a time, without basic-block knowledge. It keeps one
//! [`Candidate`] per register, tags the candidate an OR consumes, and on the
//! terminal zero-extend either confirms the tagged load or discards the window.
//! The candidate table is cleared wholesale on every terminal step, so stale
//! registers never survive into the next dispatch iteration.
//!
//! None of the operations can fail. Events that do not fit the pattern are
//! no-ops, and an empty result log is a valid outcome.
//!
//! # Example
//!
//! ```rust
//! use dispatchscope::{detector::{BytecodeLoadDetector, ConfirmedRead}, x86::X86Register};
//!
//! let mut detector = BytecodeLoadDetector::new(0x400000);
//! detector.on_load(0x401000, 0x7f00_aaaa, X86Register::Ecx);
//! detector.on_or(X86Register::Ecx);
//! detector.on_offset_use();
//!
//! assert_eq!(
//!     detector.confirmed(),
//!     &[ConfirmedRead { load_address: 0x7f00_aaaa, instruction_offset: 0x1000 }]
//! );
//! ```

mod candidate;

pub use candidate::{Candidate, ConfirmedRead, DetectorState};

use log::{debug, trace};

use crate::x86::X86Register;

/// Finite state machine keyed by register identity.
///
/// `R` is an opaque register identifier; equality is the only operation the
/// detector needs from it. The candidate table is a small vector in tagging
/// order, since at most one entry exists per register.
#[derive(Debug, Clone)]
pub struct BytecodeLoadDetector<R = X86Register> {
    image_base: u64,
    candidates: Vec<Candidate<R>>,
    confirmed: Vec<ConfirmedRead>,
    state: DetectorState,
}

impl<R: Copy + Eq> BytecodeLoadDetector<R> {
    /// Creates a detector for an image mapped at `image_base`.
    pub fn new(image_base: u64) -> Self {
        Self {
            image_base,
            candidates: Vec::new(),
            confirmed: Vec::new(),
            state: DetectorState::Idle,
        }
    }

    /// Returns the image base instruction offsets are computed against.
    #[inline]
    pub fn image_base(&self) -> u64 {
        self.image_base
    }

    /// Rebases subsequent instruction offsets, e.g. after the image notification.
    ///
    /// Live candidates keep the offsets they were created with.
    pub fn set_image_base(&mut self, image_base: u64) {
        self.image_base = image_base;
    }

    /// A zero-extending load into `dest` from `load_address`, executed at `instr_address`.
    ///
    /// Supersedes any candidate already held for `dest`.
    pub fn on_load(&mut self, instr_address: u64, load_address: u64, dest: R) {
        self.remove(dest);
        let offset = instr_address.wrapping_sub(self.image_base);
        self.candidates.push(Candidate::new(dest, load_address, offset));
        self.state = DetectorState::Idle;
    }

    /// Any other write to `dest`. Drops its candidate without replacement.
    ///
    /// The accumulator tag only survives the instruction directly after the OR,
    /// so every clobber returns the detector to [`DetectorState::Idle`], whether
    /// or not `dest` held a candidate.
    pub fn on_clobber(&mut self, dest: R) {
        self.remove(dest);
        self.state = DetectorState::Idle;
    }

    /// An OR into the accumulator whose source is `src`.
    ///
    /// Tags the candidate held for `src`. A later OR in the same window retags
    /// its own source; the most recently tagged candidate wins at confirmation.
    pub fn on_or(&mut self, src: R) {
        if let Some(candidate) = self.remove(src) {
            self.candidates.push(candidate.tagged());
            self.state = DetectorState::AccumulatorTagged;
        }
    }

    /// The terminal zero-extend of the accumulator's low byte into the index register.
    ///
    /// Confirms the tagged candidate when the immediately preceding event was a
    /// qualifying OR. The candidate table is cleared either way.
    pub fn on_offset_use(&mut self) {
        if self.state == DetectorState::AccumulatorTagged {
            if let Some(candidate) = self.candidates.iter().rev().find(|c| c.or_tagged) {
                let read = ConfirmedRead::from(candidate);
                debug!(
                    "Confirmed bytecode read {:#x} from instruction {:#x}",
                    read.load_address, read.instruction_offset
                );
                self.confirmed.push(read);
            }
        } else if !self.candidates.is_empty() {
            trace!(
                "Discarding {} stale candidate(s) at untagged offset use",
                self.candidates.len()
            );
        }

        self.candidates.clear();
        self.state = DetectorState::Idle;
    }

    /// Returns the live candidate for `register`, if any.
    pub fn candidate(&self, register: R) -> Option<&Candidate<R>> {
        self.candidates.iter().find(|c| c.register == register)
    }

    /// Returns all live candidates in tagging order.
    #[inline]
    pub fn candidates(&self) -> &[Candidate<R>] {
        &self.candidates
    }

    /// Returns the current detector mode.
    #[inline]
    pub fn state(&self) -> DetectorState {
        self.state
    }

    /// Returns the confirmed reads in execution order.
    #[inline]
    pub fn confirmed(&self) -> &[ConfirmedRead] {
        &self.confirmed
    }

    /// Consumes the detector and returns the confirmed-read log.
    pub fn finalize(self) -> Vec<ConfirmedRead> {
        self.confirmed
    }

    fn remove(&mut self, register: R) -> Option<Candidate<R>> {
        let pos = self.candidates.iter().position(|c| c.register == register)?;
        Some(self.candidates.remove(pos))
    }
}
