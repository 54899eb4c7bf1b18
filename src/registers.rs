//! Architectural register identifiers and the descriptor lookup every
//! encoding selector consults to choose narrow vs. wide forms.

use std::fmt::{self, Display};

/// A Thumb/Thumb-2 general-purpose register.
///
/// `Sp`, `Lr` and `Pc` are aliases for `R13`, `R14` and `R15` kept as
/// separate variants because most selectors branch on them by role, not by
/// raw index (e.g. the SP-relative forms of `add`/`ldr`/`str`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    R0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
    R8,
    R9,
    R10,
    R11,
    R12,
    Sp,
    Lr,
    Pc,
}

/// The classification of a register that narrow/wide selection branches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterMeta {
    /// `R0`-`R7`, addressable by every narrow 3-bit register field.
    Low,
    /// `R8`-`R12`, only addressable by 4-bit register fields.
    High,
    Sp,
    Lr,
    Pc,
}

/// `{index, meta}` descriptor for a [`Register`], per spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegisterInfo {
    /// 0-15, the raw field value used in every encoding.
    pub index: u8,
    pub meta: RegisterMeta,
}

impl RegisterInfo {
    /// Whether this register is addressable by a narrow 3-bit register
    /// field without a high-register flag.
    pub const fn is_low(self) -> bool {
        matches!(self.meta, RegisterMeta::Low)
    }
}

/// Pure lookup from architectural register to its `{index, meta}` descriptor.
/// No failure mode: every [`Register`] variant is a valid input.
pub const fn describe(reg: Register) -> RegisterInfo {
    use RegisterMeta::{High, Low, Lr, Pc, Sp};
    let (index, meta) = match reg {
        Register::R0 => (0, Low),
        Register::R1 => (1, Low),
        Register::R2 => (2, Low),
        Register::R3 => (3, Low),
        Register::R4 => (4, Low),
        Register::R5 => (5, Low),
        Register::R6 => (6, Low),
        Register::R7 => (7, Low),
        Register::R8 => (8, High),
        Register::R9 => (9, High),
        Register::R10 => (10, High),
        Register::R11 => (11, High),
        Register::R12 => (12, High),
        Register::Sp => (13, Sp),
        Register::Lr => (14, Lr),
        Register::Pc => (15, Pc),
    };
    RegisterInfo { index, meta }
}

impl Register {
    /// Shorthand for `describe(self).index`.
    pub const fn index(self) -> u8 {
        describe(self).index
    }

    /// Shorthand for `describe(self).is_low()`.
    pub const fn is_low(self) -> bool {
        describe(self).is_low()
    }
}

impl Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Register::Sp => write!(f, "sp"),
            Register::Lr => write!(f, "lr"),
            Register::Pc => write!(f, "pc"),
            other => write!(f, "r{}", other.index()),
        }
    }
}
