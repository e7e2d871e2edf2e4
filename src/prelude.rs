//! # dispatchscope Prelude
//!
//! The types needed to drive a detection session, for glob import.
//!
//! ```rust
//! use dispatchscope::prelude::*;
//!
//! let config = DetectorConfig::default();
//! let session = TraceSession::new(config)?;
//! assert!(session.bounds().is_none());
//! # Ok::<(), dispatchscope::Error>(())
//! ```

pub use crate::{
    classify::{classify, Event},
    detector::{BytecodeLoadDetector, Candidate, ConfirmedRead, DetectorState},
    session::{ImageBounds, SessionStats, TraceSession},
    trace::{TraceFile, TraceRecord},
    x86::{InstructionFacts, Opcode, OperandKind, X86Register},
    DetectorConfig, Error, Result,
};
