//! R3000 CPU core: architectural state, the tick pipeline, and the
//! branch-delay and load-delay machinery.

pub mod cop0;
mod execute;
pub mod opcode;

use crate::bus::Bus;
use crate::machine::{TraceEvent, TraceSink};
use crate::memory::mask_region;
use cop0::{Cop0, Exception};
use opcode::{Opcode, Reg};

/// Program counter value at reset (BIOS entry point).
pub const RESET_PC: u32 = 0xBFC0_0000;

/// Masked fetch address of the A-function BIOS dispatch stub.
const BIOS_CALL_A: u32 = 0xA0;
/// Masked fetch address of the B-function BIOS dispatch stub.
const BIOS_CALL_B: u32 = 0xB0;
/// A-function number of `putchar`.
const PUTCHAR_A: u32 = 0x3C;
/// B-function number of `putchar`.
const PUTCHAR_B: u32 = 0x3D;

/// One slot of the load-delay FIFO.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
struct DelayedLoad {
    reg: Reg,
    value: u32,
    pending: bool,
    /// PC of the instruction that issued the load, used to squash
    /// back-to-back loads of the same register.
    pc: u32,
}

/// The CPU core.
///
/// Drive it through [`crate::Machine`]; the core itself only exposes state
/// inspection and mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cpu {
    regs: [u32; 32],
    hi: u32,
    lo: u32,
    pc: u32,
    cop0: Cop0,
    branch: bool,
    branch_delay: bool,
    branch_address: u32,
    load_queue: [DelayedLoad; 2],
    tty: Vec<u8>,
    #[cfg_attr(feature = "serde", serde(skip))]
    exception_event: Option<(Exception, u32)>,
}

impl Default for Cpu {
    fn default() -> Self {
        Self {
            regs: [0; 32],
            hi: 0,
            lo: 0,
            pc: RESET_PC,
            cop0: Cop0::new(),
            branch: false,
            branch_delay: true,
            branch_address: 0,
            load_queue: [DelayedLoad::default(); 2],
            tty: Vec::new(),
            exception_event: None,
        }
    }
}

impl Cpu {
    /// Creates a CPU in its reset state, with `pc` at the BIOS entry point.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a general-purpose register. Register 0 always reads zero.
    #[must_use]
    pub const fn reg(&self, reg: Reg) -> u32 {
        self.regs[reg.index()]
    }

    /// Writes a general-purpose register directly.
    ///
    /// A direct write beats an in-flight load of the same register: any
    /// pending commit to `reg` in the final FIFO slot is cancelled. Writes
    /// to register 0 are discarded.
    pub fn set_reg(&mut self, reg: Reg, value: u32) {
        self.regs[reg.index()] = value;
        self.regs[0] = 0;
        if self.load_queue[1].pending && self.load_queue[1].reg == reg {
            self.load_queue[1].pending = false;
        }
    }

    /// Current program counter.
    #[must_use]
    pub const fn pc(&self) -> u32 {
        self.pc
    }

    /// Overwrites the program counter. Also clears any armed branch, since
    /// redirecting past a pending branch target would be meaningless.
    pub fn set_pc(&mut self, pc: u32) {
        self.pc = pc;
        self.branch = false;
        self.branch_delay = true;
    }

    /// Multiply/divide result register `hi`.
    #[must_use]
    pub const fn hi(&self) -> u32 {
        self.hi
    }

    /// Multiply/divide result register `lo`.
    #[must_use]
    pub const fn lo(&self) -> u32 {
        self.lo
    }

    /// Borrows the system control coprocessor.
    #[must_use]
    pub const fn cop0(&self) -> &Cop0 {
        &self.cop0
    }

    /// Bytes captured from the BIOS `putchar` hook since the last drain.
    #[must_use]
    pub fn tty_output(&self) -> &[u8] {
        &self.tty
    }

    /// Drains the captured TTY bytes.
    pub fn take_tty_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.tty)
    }

    /// Discards any captured TTY bytes.
    pub fn clear_tty_output(&mut self) {
        self.tty.clear();
    }

    /// Executes one instruction, advancing all pipeline state.
    pub(crate) fn tick(&mut self, bus: &mut Bus, trace: &mut dyn TraceSink) {
        self.exception_event = None;
        self.tty_hook();
        self.commit_delayed_loads();

        if self.pc & 0x3 == 0 {
            let op = Opcode(bus.read_word(self.pc));
            trace.on_event(TraceEvent::Instruction {
                pc: self.pc,
                word: op.0,
            });
            self.execute(op, bus);
        } else {
            self.cop0.set_bad_vaddr(self.pc);
            self.enter_exception(Exception::AddressErrorLoad);
        }

        self.pc = self.pc.wrapping_add(4);
        self.settle_branch();
        self.regs[0] = 0;

        if let Some((exception, pc)) = self.exception_event.take() {
            trace.on_event(TraceEvent::Exception { exception, pc });
        }
    }

    /// Captures TTY output by watching for the BIOS `putchar` dispatch
    /// stubs: a fetch from `0xA0` with function `0x3C` in `$t1`, or from
    /// `0xB0` with `0x3D`. The byte is in `$a0`.
    fn tty_hook(&mut self) {
        let function = self.regs[9];
        let hit = match mask_region(self.pc) {
            BIOS_CALL_A => function == PUTCHAR_A,
            BIOS_CALL_B => function == PUTCHAR_B,
            _ => false,
        };
        if hit {
            self.tty.push(self.regs[4].to_le_bytes()[0]);
        }
    }

    /// Advances the two-slot load-delay FIFO: slot 1 commits to the
    /// register file, slot 0 moves up behind it.
    ///
    /// When the instruction right after a load targets the same register
    /// with another load, the newer value is squashed; the adjacency check
    /// uses the issuing PCs.
    fn commit_delayed_loads(&mut self) {
        if self.load_queue[1].pending {
            let slot = self.load_queue[1];
            self.regs[slot.reg.index()] = slot.value;
            self.regs[0] = 0;
            self.load_queue[1].pending = false;
        }
        if self.load_queue[0].pending {
            let adjacent_same_reg = self.load_queue[0].reg == self.load_queue[1].reg
                && self.load_queue[0].pc == self.load_queue[1].pc.wrapping_add(4);
            if !adjacent_same_reg {
                self.load_queue[1] = self.load_queue[0];
            }
            self.load_queue[0] = DelayedLoad::default();
        }
    }

    /// Queues a load result into slot 0 of the delay FIFO.
    fn push_delayed_load(&mut self, reg: Reg, value: u32) {
        self.load_queue[0] = DelayedLoad {
            reg,
            value,
            pending: true,
            pc: self.pc,
        };
    }

    /// Arms a branch. The redirect happens after the delay-slot
    /// instruction; a newer branch overwrites the armed target.
    fn schedule_branch(&mut self, target: u32) {
        self.branch = true;
        self.branch_address = target;
    }

    /// Advances the branch state machine at the end of a tick: the first
    /// tick after arming burns the delay slot, the second redirects.
    fn settle_branch(&mut self) {
        if self.branch {
            if self.branch_delay {
                self.branch_delay = false;
            } else {
                self.branch = false;
                self.branch_delay = true;
                self.pc = self.branch_address;
            }
        }
    }

    /// True while the current instruction sits in a branch delay slot.
    const fn in_delay_slot(&self) -> bool {
        self.branch && !self.branch_delay
    }

    /// Redirects into the exception handler: records CAUSE/EPC, clears any
    /// armed branch, and points `pc` at the vector.
    ///
    /// The pipeline unconditionally adds 4 after execution, so `pc` is
    /// biased back by one instruction here.
    fn enter_exception(&mut self, exception: Exception) {
        let in_delay_slot = self.in_delay_slot();
        let epc = if in_delay_slot {
            self.pc.wrapping_sub(4)
        } else {
            self.pc
        };
        self.cop0.record_exception(exception, epc, in_delay_slot);
        self.branch = false;
        self.branch_delay = true;
        self.exception_event = Some((exception, self.pc));
        self.pc = self.cop0.exception_vector().wrapping_sub(4);
    }
}

#[cfg(test)]
mod tests {
    use super::{Cpu, Reg, RESET_PC};

    #[test]
    fn reset_state_points_at_the_bios() {
        let cpu = Cpu::new();
        assert_eq!(cpu.pc(), RESET_PC);
        assert_eq!(cpu.reg(Reg::RA), 0);
        assert_eq!(cpu.hi(), 0);
        assert_eq!(cpu.lo(), 0);
    }

    #[test]
    fn register_zero_ignores_writes() {
        let mut cpu = Cpu::new();
        cpu.set_reg(Reg::ZERO, 0xFFFF_FFFF);
        assert_eq!(cpu.reg(Reg::ZERO), 0);
        cpu.set_reg(Reg(5), 7);
        assert_eq!(cpu.reg(Reg(5)), 7);
    }

    #[test]
    fn tty_drain_empties_the_buffer() {
        let mut cpu = Cpu::new();
        cpu.tty.extend_from_slice(b"hi");
        assert_eq!(cpu.take_tty_output(), b"hi");
        assert!(cpu.tty_output().is_empty());
    }
}
