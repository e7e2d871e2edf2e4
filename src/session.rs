//! Host-side glue between an instrumentation engine and the detector.
//!
//! A [`TraceSession`] lives for the whole monitored process. The engine calls
//! [`TraceSession::on_image_load`] when the main executable is mapped,
//! [`TraceSession::on_instruction`] for every executed instruction, and
//! [`TraceSession::finalize`] once at process exit. Instructions outside the
//! image bounds, or arriving before the image is known, are skipped before
//! classification and never touch detector state.
//!
//! # Example
//!
//! ```rust
//! use dispatchscope::{
//!     session::{ImageBounds, TraceSession},
//!     x86::{InstructionFacts, X86Register},
//!     DetectorConfig,
//! };
//!
//! let mut session = TraceSession::new(DetectorConfig::default())?;
//! session.on_image_load(ImageBounds::new(0x400000, 0x4fffff));
//!
//! session.on_instruction(&InstructionFacts::movzx_load(0x401000, X86Register::Ecx, 0x7f00_0010));
//! session.on_instruction(&InstructionFacts::or_reg(0x401004, X86Register::R13d, X86Register::Ecx));
//! session.on_instruction(&InstructionFacts::movzx_reg(0x401008, X86Register::Edx, X86Register::R13b));
//!
//! let reads = session.finalize();
//! assert_eq!(reads.len(), 1);
//! assert_eq!(reads[0].instruction_offset, 0x1000);
//! # Ok::<(), dispatchscope::Error>(())
//! ```

use std::io::Write;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    classify::{classify, Event},
    detector::{BytecodeLoadDetector, ConfirmedRead},
    output,
    x86::InstructionFacts,
    DetectorConfig, Result,
};

/// Address range of the main executable image, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageBounds {
    /// Lowest mapped address, used as the image base.
    pub low: u64,
    /// Highest mapped address.
    pub high: u64,
}

impl ImageBounds {
    /// Creates bounds for `[low, high]`.
    pub fn new(low: u64, high: u64) -> Self {
        Self { low, high }
    }

    /// Returns true if `address` lies within `[low, high]`.
    #[inline]
    pub fn contains(&self, address: u64) -> bool {
        address >= self.low && address <= self.high
    }
}

/// Counters describing what a session has seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    /// Instructions delivered to the session.
    pub instructions: u64,
    /// Instructions skipped because they were outside the image.
    pub out_of_bounds: u64,
    /// Load events.
    pub loads: u64,
    /// Clobber events.
    pub clobbers: u64,
    /// OR events.
    pub ors: u64,
    /// Offset-use events.
    pub offset_uses: u64,
}

/// One monitored-process session: configuration, image bounds and exactly one detector.
#[derive(Debug)]
pub struct TraceSession {
    config: DetectorConfig,
    bounds: Option<ImageBounds>,
    detector: BytecodeLoadDetector,
    stats: SessionStats,
}

impl TraceSession {
    /// Creates a session with a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidConfig`] if the configuration is inconsistent.
    pub fn new(config: DetectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            bounds: None,
            detector: BytecodeLoadDetector::new(0),
            stats: SessionStats::default(),
        })
    }

    /// Records the main image's address range. A later notification replaces it.
    pub fn on_image_load(&mut self, bounds: ImageBounds) {
        info!("Main image mapped at {:#x}-{:#x}", bounds.low, bounds.high);
        self.bounds = Some(bounds);
        self.detector.set_image_base(bounds.low);
    }

    /// Processes one executed instruction.
    pub fn on_instruction(&mut self, facts: &InstructionFacts) {
        self.stats.instructions += 1;

        let in_image = self
            .bounds
            .is_some_and(|bounds| bounds.contains(facts.address));
        if !in_image {
            self.stats.out_of_bounds += 1;
            return;
        }

        let Some(event) = classify(facts, &self.config) else {
            return;
        };

        match &event {
            Event::Load { .. } => self.stats.loads += 1,
            Event::Clobber { .. } => self.stats.clobbers += 1,
            Event::Or { .. } => self.stats.ors += 1,
            Event::OffsetUse => self.stats.offset_uses += 1,
        }
        event.apply(&mut self.detector);
    }

    /// Returns the session configuration.
    #[inline]
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Returns the image bounds, once known.
    #[inline]
    pub fn bounds(&self) -> Option<ImageBounds> {
        self.bounds
    }

    /// Returns the detector, for inspection.
    #[inline]
    pub fn detector(&self) -> &BytecodeLoadDetector {
        &self.detector
    }

    /// Returns the session counters.
    #[inline]
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Ends the session and drains the confirmed-read log.
    pub fn finalize(self) -> Vec<ConfirmedRead> {
        debug!("Session stats: {:?}", self.stats);
        let reads = self.detector.finalize();
        info!("Number of bytecode reads found: {}", reads.len());
        reads
    }

    /// Ends the session and writes the log to `writer`, returning the number of reads.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FileError`] if writing fails.
    pub fn finalize_to<W: Write>(self, writer: W) -> Result<usize> {
        let reads = self.finalize();
        output::write_confirmed_reads(&reads, writer)?;
        Ok(reads.len())
    }

    /// Ends the session and writes the log to the configured output path.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FileError`] if the output file cannot be written.
    pub fn finalize_to_file(self) -> Result<usize> {
        let path = self.config.output.clone();
        let reads = self.finalize();
        output::write_confirmed_reads_to_path(&reads, &path)?;
        info!("Wrote confirmed reads to {}", path.display());
        Ok(reads.len())
    }
}
