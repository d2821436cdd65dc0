//! Raw instruction words and register indices.

// Field extraction truncates and sign-extends on purpose.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap
)]

/// Printable names of the 32 general-purpose registers, by index.
pub const REGISTER_NAMES: [&str; 32] = [
    "zero", "at", "v0", "v1", "a0", "a1", "a2", "a3", "t0", "t1", "t2", "t3", "t4", "t5", "t6",
    "t7", "s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7", "t8", "t9", "k0", "k1", "gp", "sp", "fp",
    "ra",
];

/// A general-purpose register index in `0..32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reg(pub u8);

impl Reg {
    /// `$zero`, hardwired to zero.
    pub const ZERO: Self = Self(0);
    /// `$ra`, the link register written by call instructions.
    pub const RA: Self = Self(31);

    /// The register's index into the register file.
    #[must_use]
    pub const fn index(self) -> usize {
        (self.0 & 0x1F) as usize
    }

    /// Conventional assembler name of the register.
    #[must_use]
    pub const fn name(self) -> &'static str {
        REGISTER_NAMES[self.index()]
    }
}

impl Default for Reg {
    fn default() -> Self {
        Self::ZERO
    }
}

impl std::fmt::Display for Reg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${}", self.name())
    }
}

/// A raw 32-bit instruction word with pure field accessors.
///
/// Decoding never fails here; which fields are meaningful depends on the
/// primary (and possibly secondary) opcode the executor dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Opcode(pub u32);

impl Opcode {
    /// Primary opcode, bits 31:26.
    #[must_use]
    pub const fn primary(self) -> u32 {
        self.0 >> 26
    }

    /// Secondary (function) opcode, bits 5:0.
    #[must_use]
    pub const fn secondary(self) -> u32 {
        self.0 & 0x3F
    }

    /// Source register, bits 25:21.
    #[must_use]
    pub const fn rs(self) -> Reg {
        Reg(((self.0 >> 21) & 0x1F) as u8)
    }

    /// Target register, bits 20:16.
    #[must_use]
    pub const fn rt(self) -> Reg {
        Reg(((self.0 >> 16) & 0x1F) as u8)
    }

    /// Destination register, bits 15:11.
    #[must_use]
    pub const fn rd(self) -> Reg {
        Reg(((self.0 >> 11) & 0x1F) as u8)
    }

    /// Shift amount, bits 10:6.
    #[must_use]
    pub const fn shamt(self) -> u32 {
        (self.0 >> 6) & 0x1F
    }

    /// Zero-extended 16-bit immediate.
    #[must_use]
    pub const fn imm16(self) -> u32 {
        self.0 & 0xFFFF
    }

    /// Sign-extended 16-bit immediate.
    #[must_use]
    pub const fn imm16_se(self) -> u32 {
        self.0 as u16 as i16 as u32
    }

    /// 26-bit jump target, bits 25:0.
    #[must_use]
    pub const fn target26(self) -> u32 {
        self.0 & 0x03FF_FFFF
    }

    /// Condition selector of the `BcondZ` group (the `rt` field bits).
    #[must_use]
    pub const fn bcond(self) -> u32 {
        (self.0 >> 16) & 0x1F
    }

    /// Coprocessor sub-opcode (the `rs` field bits).
    #[must_use]
    pub const fn cop_sub(self) -> u32 {
        (self.0 >> 21) & 0x1F
    }
}
