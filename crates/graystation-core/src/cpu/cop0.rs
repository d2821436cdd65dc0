//! System control coprocessor (COP0) register bank and exception plumbing.

/// Number of COP0 registers.
pub const COP0_REGISTER_COUNT: usize = 32;

/// Breakpoint-on-execute address register.
pub const COP0_BPC: usize = 3;
/// Breakpoint-on-data-access address register.
pub const COP0_BDA: usize = 5;
/// Most recent jump destination (read-only).
pub const COP0_JUMPDEST: usize = 6;
/// Breakpoint control register.
pub const COP0_DCIC: usize = 7;
/// Faulting virtual address (read-only).
pub const COP0_BADVADDR: usize = 8;
/// Data-access breakpoint mask register.
pub const COP0_BDAM: usize = 9;
/// Execute breakpoint mask register.
pub const COP0_BPCM: usize = 11;
/// Status register.
pub const COP0_SR: usize = 12;
/// Exception cause register.
pub const COP0_CAUSE: usize = 13;
/// Exception return address (read-only).
pub const COP0_EPC: usize = 14;
/// Processor revision identifier (read-only).
pub const COP0_PRID: usize = 15;

/// SR bit isolating the data cache; stores bypass memory while set.
pub const SR_ISOLATE_CACHE: u32 = 1 << 16;
/// SR bit selecting the ROM exception vector.
pub const SR_BOOT_EXCEPTION_VECTORS: u32 = 1 << 22;

/// CAUSE bit flagging an exception taken in a branch delay slot.
pub const CAUSE_BRANCH_DELAY: u32 = 1 << 31;
/// CAUSE bits 6:2 holding the exception code.
pub const CAUSE_CODE_MASK: u32 = 0x7C;

/// Exception vector used while `SR` bit 22 (BEV) is set.
pub const VECTOR_ROM: u32 = 0xBFC0_0180;
/// Exception vector used once the BIOS has installed its RAM handler.
pub const VECTOR_RAM: u32 = 0x8000_0080;

/// Per-register masks restricting which bits `MTC0` may change.
///
/// Registers 16..32 are unimplemented and fully read-only, like the
/// read-only registers in the table (mask zero).
const WRITE_MASKS: [u32; 16] = [
    0x0000_0000, // 0
    0x0000_0000, // 1
    0x0000_0000, // 2
    0xFFFF_FFFF, // 3  BPC
    0x0000_0000, // 4
    0xFFFF_FFFF, // 5  BDA
    0x0000_0000, // 6  JUMPDEST
    0xFFC0_F03F, // 7  DCIC
    0x0000_0000, // 8  BADVADDR
    0xFFFF_FFFF, // 9  BDAM
    0x0000_0000, // 10
    0xFFFF_FFFF, // 11 BPCM
    0xFFFF_FFFF, // 12 SR
    0x0000_0300, // 13 CAUSE (software interrupt bits only)
    0x0000_0000, // 14 EPC
    0x0000_0000, // 15 PRID
];

/// Returns the `MTC0` write mask for a register index.
#[must_use]
pub const fn write_mask(index: usize) -> u32 {
    if index < WRITE_MASKS.len() {
        WRITE_MASKS[index]
    } else {
        0
    }
}

/// CPU exception causes, with their CAUSE register codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Exception {
    /// Misaligned or otherwise bad address on a load or instruction fetch.
    AddressErrorLoad,
    /// Misaligned address on a store.
    AddressErrorStore,
    /// `SYSCALL` instruction.
    Syscall,
    /// `BREAK` instruction.
    Breakpoint,
    /// Signed arithmetic overflow.
    Overflow,
}

impl Exception {
    /// CAUSE register code for this exception.
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::AddressErrorLoad => 0x4,
            Self::AddressErrorStore => 0x5,
            Self::Syscall => 0x8,
            Self::Breakpoint => 0x9,
            Self::Overflow => 0xC,
        }
    }
}

/// COP0 register bank.
///
/// `MTC0` traffic goes through [`Cop0::write`], which applies the per-register
/// write masks. Exception entry uses the internal setters, which are not
/// subject to masking.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cop0 {
    regs: [u32; COP0_REGISTER_COUNT],
}

impl Default for Cop0 {
    fn default() -> Self {
        Self {
            regs: [0; COP0_REGISTER_COUNT],
        }
    }
}

impl Cop0 {
    /// Creates a zeroed register bank.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a register, as `MFC0` sees it.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below [`COP0_REGISTER_COUNT`].
    #[must_use]
    pub fn read(&self, index: usize) -> u32 {
        self.regs[index]
    }

    /// Writes a register through its `MTC0` write mask.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below [`COP0_REGISTER_COUNT`].
    pub fn write(&mut self, index: usize, value: u32) {
        let mask = write_mask(index);
        let reg = &mut self.regs[index];
        *reg &= !mask;
        *reg |= value & mask;
    }

    /// True while SR bit 16 isolates the data cache.
    #[must_use]
    pub const fn cache_isolated(&self) -> bool {
        self.regs[COP0_SR] & SR_ISOLATE_CACHE != 0
    }

    /// The exception vector selected by SR bit 22 (BEV).
    #[must_use]
    pub const fn exception_vector(&self) -> u32 {
        if self.regs[COP0_SR] & SR_BOOT_EXCEPTION_VECTORS != 0 {
            VECTOR_ROM
        } else {
            VECTOR_RAM
        }
    }

    /// Latches the faulting address into `BADVADDR`.
    pub(crate) fn set_bad_vaddr(&mut self, addr: u32) {
        self.regs[COP0_BADVADDR] = addr;
    }

    /// Records an exception: code and BD flag into `CAUSE`, return address
    /// into `EPC`. Software interrupt bits in `CAUSE` are preserved.
    pub(crate) fn record_exception(&mut self, exception: Exception, epc: u32, in_delay_slot: bool) {
        let mut cause = self.regs[COP0_CAUSE] & !(CAUSE_CODE_MASK | CAUSE_BRANCH_DELAY);
        cause |= exception.code() << 2;
        if in_delay_slot {
            cause |= CAUSE_BRANCH_DELAY;
        }
        self.regs[COP0_CAUSE] = cause;
        self.regs[COP0_EPC] = epc;
    }
}
