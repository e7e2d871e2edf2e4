//! x86/x64 vocabulary shared by the classifier and the trace format.
//!
//! # Components
//!
//! - [`X86Register`] - General-purpose register identity (8/16/32/64-bit)
//! - [`InstructionFacts`] - Decoded facts for one executed instruction
//! - [`Opcode`] / [`OperandKind`] - The opcode classes and operand shapes the
//!   dispatch pattern is recognised from
//!
//! # Example
//!
//! ```rust
//! use dispatchscope::x86::{InstructionFacts, X86Register};
//!
//! let reg: X86Register = "r13d".parse()?;
//! assert_eq!(reg.low_byte(), X86Register::R13b);
//!
//! let or = InstructionFacts::or_reg(0x401000, reg, X86Register::Ecx);
//! assert!(or.is_reg_reg());
//! # Ok::<(), strum::ParseError>(())
//! ```

mod facts;
mod register;

pub use facts::{InstructionFacts, Opcode, OperandKind};
pub use register::X86Register;
