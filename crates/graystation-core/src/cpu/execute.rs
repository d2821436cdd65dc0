//! Instruction execution.
//!
//! One method per instruction, dispatched from [`Cpu::execute`] on the
//! primary and secondary opcode fields. Unrecognized encodings are logged
//! and retired as no-ops.

// Arithmetic deliberately reinterprets between signed and unsigned views.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap
)]

use super::cop0::{self, Exception};
use super::opcode::{Opcode, Reg};
use super::Cpu;
use crate::bus::Bus;
use tracing::warn;

impl Cpu {
    /// Dispatches one decoded instruction word.
    pub(crate) fn execute(&mut self, op: Opcode, bus: &mut Bus) {
        match op.primary() {
            0x00 => match op.secondary() {
                0x00 => self.op_sll(op),
                0x02 => self.op_srl(op),
                0x03 => self.op_sra(op),
                0x04 => self.op_sllv(op),
                0x06 => self.op_srlv(op),
                0x07 => self.op_srav(op),
                0x08 => self.op_jr(op),
                0x09 => self.op_jalr(op),
                0x0C => self.op_syscall(),
                0x0D => self.op_break(),
                0x10 => self.op_mfhi(op),
                0x11 => self.op_mthi(op),
                0x12 => self.op_mflo(op),
                0x13 => self.op_mtlo(op),
                0x18 => self.op_mult(op),
                0x19 => self.op_multu(op),
                0x1A => self.op_div(op),
                0x1B => self.op_divu(op),
                0x20 => self.op_add(op),
                0x21 => self.op_addu(op),
                0x22 => self.op_sub(op),
                0x23 => self.op_subu(op),
                0x24 => self.op_and(op),
                0x25 => self.op_or(op),
                0x26 => self.op_xor(op),
                0x27 => self.op_nor(op),
                0x2A => self.op_slt(op),
                0x2B => self.op_sltu(op),
                _ => self.op_unrecognized(op),
            },
            0x01 => self.op_bcond(op),
            0x02 => self.op_j(op),
            0x03 => self.op_jal(op),
            0x04 => self.op_beq(op),
            0x05 => self.op_bne(op),
            0x06 => self.op_blez(op),
            0x07 => self.op_bgtz(op),
            0x08 => self.op_addi(op),
            0x09 => self.op_addiu(op),
            0x0A => self.op_slti(op),
            0x0B => self.op_sltiu(op),
            0x0C => self.op_andi(op),
            0x0D => self.op_ori(op),
            0x0E => self.op_xori(op),
            0x0F => self.op_lui(op),
            0x10 => match op.cop_sub() {
                0x00 => self.op_mfc0(op),
                0x04 => self.op_mtc0(op, bus),
                _ => self.op_unrecognized(op),
            },
            0x20 => self.op_lb(op, bus),
            0x21 => self.op_lh(op, bus),
            0x22 => self.op_lwl(op, bus),
            0x23 => self.op_lw(op, bus),
            0x24 => self.op_lbu(op, bus),
            0x25 => self.op_lhu(op, bus),
            0x26 => self.op_lwr(op, bus),
            0x28 => self.op_sb(op, bus),
            0x29 => self.op_sh(op, bus),
            0x2A => self.op_swl(op, bus),
            0x2B => self.op_sw(op, bus),
            0x2E => self.op_swr(op, bus),
            _ => self.op_unrecognized(op),
        }
    }

    fn op_unrecognized(&mut self, op: Opcode) {
        warn!(
            pc = format_args!("0x{:08X}", self.pc),
            word = format_args!("0x{:08X}", op.0),
            "unrecognized instruction"
        );
    }

    /// Effective address of a load or store.
    fn effective_address(&self, op: Opcode) -> u32 {
        self.reg(op.rs()).wrapping_add(op.imm16_se())
    }

    /// PC-relative branch target, measured from the delay slot.
    fn branch_target(&self, op: Opcode) -> u32 {
        self.pc.wrapping_add(4).wrapping_add(op.imm16_se() << 2)
    }

    // --- shifts ---

    fn op_sll(&mut self, op: Opcode) {
        let value = self.reg(op.rt()) << op.shamt();
        self.set_reg(op.rd(), value);
    }

    fn op_srl(&mut self, op: Opcode) {
        let value = self.reg(op.rt()) >> op.shamt();
        self.set_reg(op.rd(), value);
    }

    fn op_sra(&mut self, op: Opcode) {
        let value = (self.reg(op.rt()) as i32) >> op.shamt();
        self.set_reg(op.rd(), value as u32);
    }

    fn op_sllv(&mut self, op: Opcode) {
        let value = self.reg(op.rt()) << (self.reg(op.rs()) & 0x1F);
        self.set_reg(op.rd(), value);
    }

    fn op_srlv(&mut self, op: Opcode) {
        let value = self.reg(op.rt()) >> (self.reg(op.rs()) & 0x1F);
        self.set_reg(op.rd(), value);
    }

    fn op_srav(&mut self, op: Opcode) {
        let value = (self.reg(op.rt()) as i32) >> (self.reg(op.rs()) & 0x1F);
        self.set_reg(op.rd(), value as u32);
    }

    // --- jumps and branches ---

    fn op_j(&mut self, op: Opcode) {
        let target = (self.pc.wrapping_add(4) & 0xF000_0000) | (op.target26() << 2);
        self.schedule_branch(target);
    }

    fn op_jal(&mut self, op: Opcode) {
        self.set_reg(Reg::RA, self.pc.wrapping_add(8));
        self.op_j(op);
    }

    fn op_jr(&mut self, op: Opcode) {
        // A misaligned target faults at the next fetch, not here.
        self.schedule_branch(self.reg(op.rs()));
    }

    fn op_jalr(&mut self, op: Opcode) {
        let return_pc = self.pc.wrapping_add(8);
        self.schedule_branch(self.reg(op.rs()));
        self.set_reg(op.rd(), return_pc);
    }

    fn op_beq(&mut self, op: Opcode) {
        if self.reg(op.rs()) == self.reg(op.rt()) {
            let target = self.branch_target(op);
            self.schedule_branch(target);
        }
    }

    fn op_bne(&mut self, op: Opcode) {
        if self.reg(op.rs()) != self.reg(op.rt()) {
            let target = self.branch_target(op);
            self.schedule_branch(target);
        }
    }

    fn op_blez(&mut self, op: Opcode) {
        if self.reg(op.rs()) as i32 <= 0 {
            let target = self.branch_target(op);
            self.schedule_branch(target);
        }
    }

    fn op_bgtz(&mut self, op: Opcode) {
        if self.reg(op.rs()) as i32 > 0 {
            let target = self.branch_target(op);
            self.schedule_branch(target);
        }
    }

    /// `BcondZ` group: BLTZ, BGEZ, BLTZAL, BGEZAL on the `rt` field bits.
    /// The link variants write `$ra` whether or not the branch is taken.
    fn op_bcond(&mut self, op: Opcode) {
        let negative = (self.reg(op.rs()) as i32) < 0;
        match op.bcond() {
            0x00 => {
                if negative {
                    let target = self.branch_target(op);
                    self.schedule_branch(target);
                }
            }
            0x01 => {
                if !negative {
                    let target = self.branch_target(op);
                    self.schedule_branch(target);
                }
            }
            0x10 => {
                self.set_reg(Reg::RA, self.pc.wrapping_add(8));
                if negative {
                    let target = self.branch_target(op);
                    self.schedule_branch(target);
                }
            }
            0x11 => {
                self.set_reg(Reg::RA, self.pc.wrapping_add(8));
                if !negative {
                    let target = self.branch_target(op);
                    self.schedule_branch(target);
                }
            }
            _ => self.op_unrecognized(op),
        }
    }

    // --- arithmetic ---

    fn op_add(&mut self, op: Opcode) {
        let lhs = self.reg(op.rs()) as i32;
        let rhs = self.reg(op.rt()) as i32;
        match lhs.checked_add(rhs) {
            Some(value) => self.set_reg(op.rd(), value as u32),
            None => self.enter_exception(Exception::Overflow),
        }
    }

    fn op_addu(&mut self, op: Opcode) {
        let value = self.reg(op.rs()).wrapping_add(self.reg(op.rt()));
        self.set_reg(op.rd(), value);
    }

    fn op_sub(&mut self, op: Opcode) {
        let lhs = self.reg(op.rs()) as i32;
        let rhs = self.reg(op.rt()) as i32;
        match lhs.checked_sub(rhs) {
            Some(value) => self.set_reg(op.rd(), value as u32),
            None => self.enter_exception(Exception::Overflow),
        }
    }

    fn op_subu(&mut self, op: Opcode) {
        let value = self.reg(op.rs()).wrapping_sub(self.reg(op.rt()));
        self.set_reg(op.rd(), value);
    }

    fn op_addi(&mut self, op: Opcode) {
        let lhs = self.reg(op.rs()) as i32;
        let rhs = op.imm16_se() as i32;
        match lhs.checked_add(rhs) {
            Some(value) => self.set_reg(op.rt(), value as u32),
            None => self.enter_exception(Exception::Overflow),
        }
    }

    fn op_addiu(&mut self, op: Opcode) {
        let value = self.reg(op.rs()).wrapping_add(op.imm16_se());
        self.set_reg(op.rt(), value);
    }

    fn op_slt(&mut self, op: Opcode) {
        let value = (self.reg(op.rs()) as i32) < (self.reg(op.rt()) as i32);
        self.set_reg(op.rd(), u32::from(value));
    }

    fn op_sltu(&mut self, op: Opcode) {
        let value = self.reg(op.rs()) < self.reg(op.rt());
        self.set_reg(op.rd(), u32::from(value));
    }

    fn op_slti(&mut self, op: Opcode) {
        let value = (self.reg(op.rs()) as i32) < (op.imm16_se() as i32);
        self.set_reg(op.rt(), u32::from(value));
    }

    fn op_sltiu(&mut self, op: Opcode) {
        // Unsigned compare, but against the sign-extended immediate.
        let value = self.reg(op.rs()) < op.imm16_se();
        self.set_reg(op.rt(), u32::from(value));
    }

    // --- bitwise ---

    fn op_and(&mut self, op: Opcode) {
        let value = self.reg(op.rs()) & self.reg(op.rt());
        self.set_reg(op.rd(), value);
    }

    fn op_or(&mut self, op: Opcode) {
        let value = self.reg(op.rs()) | self.reg(op.rt());
        self.set_reg(op.rd(), value);
    }

    fn op_xor(&mut self, op: Opcode) {
        let value = self.reg(op.rs()) ^ self.reg(op.rt());
        self.set_reg(op.rd(), value);
    }

    fn op_nor(&mut self, op: Opcode) {
        let value = !(self.reg(op.rs()) | self.reg(op.rt()));
        self.set_reg(op.rd(), value);
    }

    fn op_andi(&mut self, op: Opcode) {
        let value = self.reg(op.rs()) & op.imm16();
        self.set_reg(op.rt(), value);
    }

    fn op_ori(&mut self, op: Opcode) {
        let value = self.reg(op.rs()) | op.imm16();
        self.set_reg(op.rt(), value);
    }

    fn op_xori(&mut self, op: Opcode) {
        let value = self.reg(op.rs()) ^ op.imm16();
        self.set_reg(op.rt(), value);
    }

    fn op_lui(&mut self, op: Opcode) {
        self.set_reg(op.rt(), op.imm16() << 16);
    }

    // --- multiply / divide ---

    fn op_mult(&mut self, op: Opcode) {
        let lhs = i64::from(self.reg(op.rs()) as i32);
        let rhs = i64::from(self.reg(op.rt()) as i32);
        let product = (lhs * rhs) as u64;
        self.lo = product as u32;
        self.hi = (product >> 32) as u32;
    }

    fn op_multu(&mut self, op: Opcode) {
        let product = u64::from(self.reg(op.rs())) * u64::from(self.reg(op.rt()));
        self.lo = product as u32;
        self.hi = (product >> 32) as u32;
    }

    fn op_div(&mut self, op: Opcode) {
        let dividend = self.reg(op.rs()) as i32;
        let divisor = self.reg(op.rt()) as i32;
        if divisor == 0 {
            self.hi = dividend as u32;
            self.lo = if dividend >= 0 { 0xFFFF_FFFF } else { 1 };
        } else if dividend == i32::MIN && divisor == -1 {
            self.hi = 0;
            self.lo = 0x8000_0000;
        } else {
            self.lo = (dividend / divisor) as u32;
            self.hi = (dividend % divisor) as u32;
        }
    }

    fn op_divu(&mut self, op: Opcode) {
        let dividend = self.reg(op.rs());
        let divisor = self.reg(op.rt());
        if divisor == 0 {
            self.hi = dividend;
            self.lo = 0xFFFF_FFFF;
        } else {
            self.lo = dividend / divisor;
            self.hi = dividend % divisor;
        }
    }

    fn op_mfhi(&mut self, op: Opcode) {
        self.set_reg(op.rd(), self.hi);
    }

    fn op_mthi(&mut self, op: Opcode) {
        self.hi = self.reg(op.rs());
    }

    fn op_mflo(&mut self, op: Opcode) {
        self.set_reg(op.rd(), self.lo);
    }

    fn op_mtlo(&mut self, op: Opcode) {
        self.lo = self.reg(op.rs());
    }

    // --- traps ---

    fn op_syscall(&mut self) {
        self.enter_exception(Exception::Syscall);
    }

    fn op_break(&mut self) {
        self.enter_exception(Exception::Breakpoint);
    }

    // --- coprocessor 0 ---

    fn op_mfc0(&mut self, op: Opcode) {
        // COP0 reads bypass the load-delay FIFO.
        let value = self.cop0.read(op.rd().index());
        self.set_reg(op.rt(), value);
    }

    fn op_mtc0(&mut self, op: Opcode, bus: &mut Bus) {
        let index = op.rd().index();
        self.cop0.write(index, self.reg(op.rt()));
        if index == cop0::COP0_SR {
            bus.set_cache_isolation(self.cop0.cache_isolated());
        }
    }

    // --- loads ---

    fn op_lb(&mut self, op: Opcode, bus: &mut Bus) {
        let addr = self.effective_address(op);
        let value = i32::from(bus.read_byte(addr) as i8) as u32;
        self.push_delayed_load(op.rt(), value);
    }

    fn op_lbu(&mut self, op: Opcode, bus: &mut Bus) {
        let addr = self.effective_address(op);
        let value = u32::from(bus.read_byte(addr));
        self.push_delayed_load(op.rt(), value);
    }

    fn op_lh(&mut self, op: Opcode, bus: &mut Bus) {
        let addr = self.effective_address(op);
        if addr & 0x1 != 0 {
            self.cop0.set_bad_vaddr(addr);
            self.enter_exception(Exception::AddressErrorLoad);
            return;
        }
        let value = i32::from(bus.read_halfword(addr) as i16) as u32;
        self.push_delayed_load(op.rt(), value);
    }

    fn op_lhu(&mut self, op: Opcode, bus: &mut Bus) {
        let addr = self.effective_address(op);
        if addr & 0x1 != 0 {
            self.cop0.set_bad_vaddr(addr);
            self.enter_exception(Exception::AddressErrorLoad);
            return;
        }
        let value = u32::from(bus.read_halfword(addr));
        self.push_delayed_load(op.rt(), value);
    }

    fn op_lw(&mut self, op: Opcode, bus: &mut Bus) {
        let addr = self.effective_address(op);
        if addr & 0x3 != 0 {
            self.cop0.set_bad_vaddr(addr);
            self.enter_exception(Exception::AddressErrorLoad);
            return;
        }
        let value = bus.read_word(addr);
        self.push_delayed_load(op.rt(), value);
    }

    /// Unaligned load, left part: merges the high bytes of the register
    /// with memory. No alignment fault by design.
    fn op_lwl(&mut self, op: Opcode, bus: &mut Bus) {
        let addr = self.effective_address(op);
        let word = bus.read_word(addr & !0x3);
        let current = self.reg(op.rt());
        let value = match addr & 0x3 {
            0 => (current & 0x00FF_FFFF) | (word << 24),
            1 => (current & 0x0000_FFFF) | (word << 16),
            2 => (current & 0x0000_00FF) | (word << 8),
            _ => word,
        };
        self.push_delayed_load(op.rt(), value);
    }

    /// Unaligned load, right part.
    fn op_lwr(&mut self, op: Opcode, bus: &mut Bus) {
        let addr = self.effective_address(op);
        let word = bus.read_word(addr & !0x3);
        let current = self.reg(op.rt());
        let value = match addr & 0x3 {
            0 => word,
            1 => (current & 0xFF00_0000) | (word >> 8),
            2 => (current & 0xFFFF_0000) | (word >> 16),
            _ => (current & 0xFFFF_FF00) | (word >> 24),
        };
        self.push_delayed_load(op.rt(), value);
    }

    // --- stores ---

    fn op_sb(&mut self, op: Opcode, bus: &mut Bus) {
        let addr = self.effective_address(op);
        bus.store_byte(addr, self.reg(op.rt()).to_le_bytes()[0]);
    }

    fn op_sh(&mut self, op: Opcode, bus: &mut Bus) {
        let addr = self.effective_address(op);
        if addr & 0x1 != 0 {
            self.cop0.set_bad_vaddr(addr);
            self.enter_exception(Exception::AddressErrorStore);
            return;
        }
        bus.store_halfword(addr, self.reg(op.rt()) as u16);
    }

    fn op_sw(&mut self, op: Opcode, bus: &mut Bus) {
        let addr = self.effective_address(op);
        if addr & 0x3 != 0 {
            self.cop0.set_bad_vaddr(addr);
            self.enter_exception(Exception::AddressErrorStore);
            return;
        }
        bus.store_word(addr, self.reg(op.rt()));
    }

    /// Unaligned store, left part: read-modify-write of the aligned word.
    fn op_swl(&mut self, op: Opcode, bus: &mut Bus) {
        let addr = self.effective_address(op);
        let aligned = addr & !0x3;
        let current = bus.read_word(aligned);
        let rt = self.reg(op.rt());
        let value = match addr & 0x3 {
            0 => (current & 0xFFFF_FF00) | (rt >> 24),
            1 => (current & 0xFFFF_0000) | (rt >> 16),
            2 => (current & 0xFF00_0000) | (rt >> 8),
            _ => rt,
        };
        bus.store_word(aligned, value);
    }

    /// Unaligned store, right part.
    fn op_swr(&mut self, op: Opcode, bus: &mut Bus) {
        let addr = self.effective_address(op);
        let aligned = addr & !0x3;
        let current = bus.read_word(aligned);
        let rt = self.reg(op.rt());
        let value = match addr & 0x3 {
            0 => rt,
            1 => (current & 0x0000_00FF) | (rt << 8),
            2 => (current & 0x0000_FFFF) | (rt << 16),
            _ => (current & 0x00FF_FFFF) | (rt << 24),
        };
        bus.store_word(aligned, value);
    }
}
