//! x86/x64 general-purpose register identity.
//!
//! Registers are identified by their exact architectural name: `r13d` and `r13`
//! are distinct identities even though they share storage. The pattern detector
//! keys its candidate table by this exact identity, while the classification
//! adapter uses [`X86Register::base_index`] and [`X86Register::low_byte`] to
//! reason about sub-register aliases.
//!
//! Names parse and render in lowercase short form, matching what instrumentation
//! engines print for registers (`eax`, `r13d`, `r12b`, `sil`).

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::{Error, Result};

/// x86/x64 general-purpose register.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum X86Register {
    /// 64-bit accumulator register (RAX)
    Rax,
    /// 64-bit counter register (RCX)
    Rcx,
    /// 64-bit data register (RDX)
    Rdx,
    /// 64-bit base register (RBX)
    Rbx,
    /// 64-bit stack pointer (RSP)
    Rsp,
    /// 64-bit base pointer (RBP)
    Rbp,
    /// 64-bit source index (RSI)
    Rsi,
    /// 64-bit destination index (RDI)
    Rdi,
    /// 64-bit extended register R8
    R8,
    /// 64-bit extended register R9
    R9,
    /// 64-bit extended register R10
    R10,
    /// 64-bit extended register R11
    R11,
    /// 64-bit extended register R12
    R12,
    /// 64-bit extended register R13
    R13,
    /// 64-bit extended register R14
    R14,
    /// 64-bit extended register R15
    R15,

    /// 32-bit accumulator register (EAX)
    Eax,
    /// 32-bit counter register (ECX)
    Ecx,
    /// 32-bit data register (EDX)
    Edx,
    /// 32-bit base register (EBX)
    Ebx,
    /// 32-bit stack pointer (ESP)
    Esp,
    /// 32-bit base pointer (EBP)
    Ebp,
    /// 32-bit source index (ESI)
    Esi,
    /// 32-bit destination index (EDI)
    Edi,
    /// Low 32 bits of R8
    R8d,
    /// Low 32 bits of R9
    R9d,
    /// Low 32 bits of R10
    R10d,
    /// Low 32 bits of R11
    R11d,
    /// Low 32 bits of R12
    R12d,
    /// Low 32 bits of R13
    R13d,
    /// Low 32 bits of R14
    R14d,
    /// Low 32 bits of R15
    R15d,

    /// 16-bit accumulator register (AX)
    Ax,
    /// 16-bit counter register (CX)
    Cx,
    /// 16-bit data register (DX)
    Dx,
    /// 16-bit base register (BX)
    Bx,
    /// 16-bit stack pointer (SP)
    Sp,
    /// 16-bit base pointer (BP)
    Bp,
    /// 16-bit source index (SI)
    Si,
    /// 16-bit destination index (DI)
    Di,
    /// Low 16 bits of R8
    R8w,
    /// Low 16 bits of R9
    R9w,
    /// Low 16 bits of R10
    R10w,
    /// Low 16 bits of R11
    R11w,
    /// Low 16 bits of R12
    R12w,
    /// Low 16 bits of R13
    R13w,
    /// Low 16 bits of R14
    R14w,
    /// Low 16 bits of R15
    R15w,

    /// 8-bit low accumulator (AL)
    Al,
    /// 8-bit low counter (CL)
    Cl,
    /// 8-bit low data (DL)
    Dl,
    /// 8-bit low base (BL)
    Bl,
    /// 8-bit low stack pointer (SPL)
    Spl,
    /// 8-bit low base pointer (BPL)
    Bpl,
    /// 8-bit low source index (SIL)
    Sil,
    /// 8-bit low destination index (DIL)
    Dil,
    /// Low 8 bits of R8
    R8b,
    /// Low 8 bits of R9
    R9b,
    /// Low 8 bits of R10
    R10b,
    /// Low 8 bits of R11
    R11b,
    /// Low 8 bits of R12
    R12b,
    /// Low 8 bits of R13
    R13b,
    /// Low 8 bits of R14
    R14b,
    /// Low 8 bits of R15
    R15b,
    /// 8-bit high accumulator (AH)
    Ah,
    /// 8-bit high counter (CH)
    Ch,
    /// 8-bit high data (DH)
    Dh,
    /// 8-bit high base (BH)
    Bh,
}

/// Low-byte alias of each full-width register, indexed by [`X86Register::base_index`].
const LOW_BYTES: [X86Register; 16] = [
    X86Register::Al,
    X86Register::Cl,
    X86Register::Dl,
    X86Register::Bl,
    X86Register::Spl,
    X86Register::Bpl,
    X86Register::Sil,
    X86Register::Dil,
    X86Register::R8b,
    X86Register::R9b,
    X86Register::R10b,
    X86Register::R11b,
    X86Register::R12b,
    X86Register::R13b,
    X86Register::R14b,
    X86Register::R15b,
];

impl X86Register {
    /// Parses a short register name such as `r13d` or `EDX`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRegister`] if the name is not a general-purpose register.
    pub fn from_name(name: &str) -> Result<Self> {
        name.trim()
            .parse()
            .map_err(|_| Error::InvalidRegister(name.to_string()))
    }

    /// Returns the lowercase short name of this register.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// Returns the size of this register in bytes.
    #[inline]
    pub fn size(&self) -> u8 {
        use X86Register::*;
        match self {
            Al | Cl | Dl | Bl | Spl | Bpl | Sil | Dil | R8b | R9b | R10b | R11b | R12b
            | R13b | R14b | R15b | Ah | Ch | Dh | Bh => 1,
            Ax | Cx | Dx | Bx | Sp | Bp | Si | Di | R8w | R9w | R10w | R11w | R12w | R13w
            | R14w | R15w => 2,
            Eax | Ecx | Edx | Ebx | Esp | Ebp | Esi | Edi | R8d | R9d | R10d | R11d | R12d
            | R13d | R14d | R15d => 4,
            Rax | Rcx | Rdx | Rbx | Rsp | Rbp | Rsi | Rdi | R8 | R9 | R10 | R11 | R12 | R13
            | R14 | R15 => 8,
        }
    }

    /// Returns the index of the full-width register this is part of.
    /// E.g., AL/AH/AX/EAX/RAX all map to 0, R13B/R13W/R13D/R13 map to 13.
    #[inline]
    pub fn base_index(&self) -> u8 {
        use X86Register::*;
        match self {
            Al | Ah | Ax | Eax | Rax => 0,
            Cl | Ch | Cx | Ecx | Rcx => 1,
            Dl | Dh | Dx | Edx | Rdx => 2,
            Bl | Bh | Bx | Ebx | Rbx => 3,
            Spl | Sp | Esp | Rsp => 4,
            Bpl | Bp | Ebp | Rbp => 5,
            Sil | Si | Esi | Rsi => 6,
            Dil | Di | Edi | Rdi => 7,
            R8b | R8w | R8d | R8 => 8,
            R9b | R9w | R9d | R9 => 9,
            R10b | R10w | R10d | R10 => 10,
            R11b | R11w | R11d | R11 => 11,
            R12b | R12w | R12d | R12 => 12,
            R13b | R13w | R13d | R13 => 13,
            R14b | R14w | R14d | R14 => 14,
            R15b | R15w | R15d | R15 => 15,
        }
    }

    /// Returns the low-byte alias of this register (`r13d` -> `r13b`, `eax` -> `al`).
    #[inline]
    pub fn low_byte(&self) -> X86Register {
        LOW_BYTES[usize::from(self.base_index())]
    }

    /// Returns true if both registers share the same full-width register.
    #[inline]
    pub fn aliases(&self, other: X86Register) -> bool {
        self.base_index() == other.base_index()
    }

    /// Returns true if this is an 8-bit high register (AH, CH, DH, BH).
    #[inline]
    pub fn is_high_byte(&self) -> bool {
        matches!(
            self,
            X86Register::Ah | X86Register::Ch | X86Register::Dh | X86Register::Bh
        )
    }

    /// Returns true if this is the stack pointer register.
    #[inline]
    pub fn is_stack_pointer(&self) -> bool {
        self.base_index() == 4
    }
}
