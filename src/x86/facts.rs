//! Decoded per-instruction facts delivered by the instrumentation engine.
//!
//! The detector does not decode machine code itself. For every executed
//! instruction inside the monitored image, the host engine supplies the opcode
//! class, the shape of its operands, the registers it reads and writes, and the
//! effective address of any memory read. [`InstructionFacts`] is that bundle.
//!
//! Only general-purpose registers are represented; flag and vector registers
//! are irrelevant to the dispatch pattern and are dropped by the host.

use serde::{Deserialize, Serialize};

use super::X86Register;

/// Opcode class of an executed instruction.
///
/// Only the two classes the dispatch pattern is built from are distinguished.
/// Every other mnemonic deserializes to [`Opcode::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Opcode {
    /// Move with zero extension: `movzx dst, src`
    Movzx,
    /// Bitwise OR: `or dst, src`
    Or,
    /// Any other instruction
    #[serde(other)]
    Other,
}

/// Kind of an explicit instruction operand, in operand order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperandKind {
    /// Register operand (e.g., `eax`, `r13d`)
    Register,
    /// Memory operand (e.g., `[rbx+2]`)
    Memory,
    /// Immediate constant value
    Immediate,
}

/// Facts about one executed instruction.
///
/// `reads` and `writes` follow the engine's operand order, so for two-operand
/// instructions `writes[0]` is the destination and `reads[0]` the first
/// register source.
///
/// # Examples
///
/// ```rust
/// use dispatchscope::x86::{InstructionFacts, Opcode, X86Register};
///
/// // movzx ecx, byte ptr [rbx+1]
/// let load = InstructionFacts::movzx_load(0x5000, X86Register::Ecx, 0x7f00_0001);
/// assert_eq!(load.opcode, Opcode::Movzx);
/// assert_eq!(load.memory_read, Some(0x7f00_0001));
/// assert_eq!(load.destination(), Some(X86Register::Ecx));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionFacts {
    /// Absolute address of the instruction.
    pub address: u64,
    /// Opcode class.
    pub opcode: Opcode,
    /// Explicit operand kinds, destination first.
    #[serde(default)]
    pub operands: Vec<OperandKind>,
    /// General-purpose registers read by the instruction.
    #[serde(default)]
    pub reads: Vec<X86Register>,
    /// General-purpose registers written by the instruction.
    #[serde(default)]
    pub writes: Vec<X86Register>,
    /// Effective address of the memory read, if the instruction reads memory.
    #[serde(default)]
    pub memory_read: Option<u64>,
}

impl InstructionFacts {
    /// `movzx dst, byte ptr [ea]` executed at `address`.
    pub fn movzx_load(address: u64, dst: X86Register, ea: u64) -> Self {
        Self {
            address,
            opcode: Opcode::Movzx,
            operands: vec![OperandKind::Register, OperandKind::Memory],
            reads: Vec::new(),
            writes: vec![dst],
            memory_read: Some(ea),
        }
    }

    /// `movzx dst, src` between two registers.
    pub fn movzx_reg(address: u64, dst: X86Register, src: X86Register) -> Self {
        Self {
            address,
            opcode: Opcode::Movzx,
            operands: vec![OperandKind::Register, OperandKind::Register],
            reads: vec![src],
            writes: vec![dst],
            memory_read: None,
        }
    }

    /// `or dst, src` between two registers.
    pub fn or_reg(address: u64, dst: X86Register, src: X86Register) -> Self {
        Self {
            address,
            opcode: Opcode::Or,
            operands: vec![OperandKind::Register, OperandKind::Register],
            reads: vec![dst, src],
            writes: vec![dst],
            memory_read: None,
        }
    }

    /// Any other instruction writing `writes`.
    pub fn other(address: u64, writes: &[X86Register]) -> Self {
        Self {
            address,
            opcode: Opcode::Other,
            operands: Vec::new(),
            reads: Vec::new(),
            writes: writes.to_vec(),
            memory_read: None,
        }
    }

    /// Sets the memory read effective address.
    #[must_use]
    pub fn with_memory_read(mut self, ea: u64) -> Self {
        self.memory_read = Some(ea);
        self
    }

    /// Returns the first written register, if any.
    #[inline]
    pub fn destination(&self) -> Option<X86Register> {
        self.writes.first().copied()
    }

    /// Returns true if the first two explicit operands are both registers.
    pub fn is_reg_reg(&self) -> bool {
        matches!(
            self.operands.as_slice(),
            [OperandKind::Register, OperandKind::Register, ..]
        )
    }

    /// Returns the register read as the second explicit operand.
    ///
    /// For `or dst, src` the engine reports `dst` as the first read register,
    /// so the source is the second one. For `movzx dst, src` the destination is
    /// not read and the source is the only read register.
    pub fn source_register(&self) -> Option<X86Register> {
        match self.opcode {
            Opcode::Or => self.reads.get(1).copied(),
            _ => self.reads.first().copied(),
        }
    }

    /// Returns true if the instruction reads memory.
    #[inline]
    pub fn reads_memory(&self) -> bool {
        self.memory_read.is_some()
    }
}
