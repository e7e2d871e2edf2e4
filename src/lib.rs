// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]

//! # dispatchscope
//!
//! Finds the memory loads that feed an interpreter's bytecode dispatch, from
//! nothing but the live instruction stream of the running process.
//!
//! A dynamic binary-instrumentation engine reports every executed instruction of
//! the interpreter's main image. `dispatchscope` watches that stream for the
//! dispatch loop's register relay (load a bytecode byte, OR it into an
//! accumulator, zero-extend the accumulator's low byte into the jump-table
//! index) and reports each confirmed bytecode load as a
//! `(load address, image-relative instruction offset)` pair. No symbols, source
//! or basic-block structure are needed.
//!
//! ## Quick Start
//!
//! ```rust
//! use dispatchscope::prelude::*;
//!
//! let mut session = TraceSession::new(DetectorConfig::default())?;
//! session.on_image_load(ImageBounds::new(0x5555_0000_0000, 0x5555_00ff_ffff));
//!
//! // movzx ecx, byte ptr [rbx+1] ; or r13d, ecx ; movzx edx, r13b
//! session.on_instruction(&InstructionFacts::movzx_load(0x5555_0000_1000, X86Register::Ecx, 0x7f00_0011));
//! session.on_instruction(&InstructionFacts::or_reg(0x5555_0000_1004, X86Register::R13d, X86Register::Ecx));
//! session.on_instruction(&InstructionFacts::movzx_reg(0x5555_0000_1008, X86Register::Edx, X86Register::R13b));
//!
//! let reads = session.finalize();
//! assert_eq!(reads[0].to_string(), "MemoryAddress: 0x7f000011 InsAddress: 0x1000");
//! # Ok::<(), dispatchscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`detector`] - The register-keyed state machine. Infallible, host-agnostic,
//!   testable with synthetic event sequences.
//! - [`classify`] - Maps decoded instruction facts to detector events.
//! - [`session`] - Per-process glue: image bounds, classification, finalization.
//! - [`x86`] - Register identity and instruction facts.
//! - [`trace`] - Recorded instruction streams for offline replay.
//! - [`output`] - The result file format.
//! - [`compare`] / [`context`] - Evaluation against ground truth and listing excerpts.
//! - [`DetectorConfig`] - Accumulator/index register roles and output path.
//!
//! ## Error Handling
//!
//! The detector never fails. Fallible operations at the edges (trace reading,
//! result files, configuration) return [`Result<T, Error>`](Result).

#[macro_use]
pub(crate) mod error;

/// Convenient re-exports of the most commonly used types.
pub mod prelude;

/// Streaming bytecode-load pattern detector.
pub mod detector;

/// Classification of executed instructions into detector events.
pub mod classify;

/// Session glue between an instrumentation engine and the detector.
pub mod session;

/// x86 register identity and per-instruction facts.
pub mod x86;

/// Recorded instruction streams.
pub mod trace;

/// Result file format.
pub mod output;

/// Accuracy evaluation against a ground-truth log.
pub mod compare;

/// Disassembly listing excerpts around instruction offsets.
pub mod context;

mod config;

/// `dispatchscope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `dispatchscope` Error type
pub use error::Error;

/// Detector configuration and its default output path.
pub use config::{DetectorConfig, DEFAULT_OUTPUT};
