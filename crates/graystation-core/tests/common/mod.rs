//! Shared harness: a zeroed BIOS with a test program at the reset vector,
//! plus instruction encoders.

#![allow(dead_code)]

use graystation_core::{Bios, Machine, BIOS_SIZE};

/// Builds a machine whose BIOS starts with `words` at the reset vector.
/// The rest of the ROM is zero, which executes as `sll $zero` no-ops.
pub fn machine_with_program(words: &[u32]) -> Machine {
    let mut image = vec![0_u8; BIOS_SIZE];
    for (index, word) in words.iter().enumerate() {
        let offset = index * 4;
        image[offset..offset + 4].copy_from_slice(&word.to_le_bytes());
    }
    Machine::new(Bios::from_image(image).expect("image has the right size"))
}

pub const fn nop() -> u32 {
    0
}

pub const fn rtype(funct: u32, rd: u32, rs: u32, rt: u32) -> u32 {
    (rs << 21) | (rt << 16) | (rd << 11) | funct
}

pub const fn itype(op: u32, rt: u32, rs: u32, imm: u32) -> u32 {
    (op << 26) | (rs << 21) | (rt << 16) | (imm & 0xFFFF)
}

/// Jump encoding from an absolute target address.
pub const fn jump(op: u32, target: u32) -> u32 {
    (op << 26) | ((target >> 2) & 0x03FF_FFFF)
}

pub const fn sll(rd: u32, rt: u32, shamt: u32) -> u32 {
    (rt << 16) | (rd << 11) | (shamt << 6)
}

pub const fn lui(rt: u32, imm: u32) -> u32 {
    itype(0x0F, rt, 0, imm)
}

pub const fn ori(rt: u32, rs: u32, imm: u32) -> u32 {
    itype(0x0D, rt, rs, imm)
}

pub const fn addiu(rt: u32, rs: u32, imm: u32) -> u32 {
    itype(0x09, rt, rs, imm)
}

pub const fn addi(rt: u32, rs: u32, imm: u32) -> u32 {
    itype(0x08, rt, rs, imm)
}

pub const fn sltiu(rt: u32, rs: u32, imm: u32) -> u32 {
    itype(0x0B, rt, rs, imm)
}

pub const fn add(rd: u32, rs: u32, rt: u32) -> u32 {
    rtype(0x20, rd, rs, rt)
}

pub const fn addu(rd: u32, rs: u32, rt: u32) -> u32 {
    rtype(0x21, rd, rs, rt)
}

pub const fn sub(rd: u32, rs: u32, rt: u32) -> u32 {
    rtype(0x22, rd, rs, rt)
}

pub const fn sltu(rd: u32, rs: u32, rt: u32) -> u32 {
    rtype(0x2B, rd, rs, rt)
}

pub const fn or(rd: u32, rs: u32, rt: u32) -> u32 {
    rtype(0x25, rd, rs, rt)
}

pub const fn div(rs: u32, rt: u32) -> u32 {
    rtype(0x1A, 0, rs, rt)
}

pub const fn divu(rs: u32, rt: u32) -> u32 {
    rtype(0x1B, 0, rs, rt)
}

pub const fn mult(rs: u32, rt: u32) -> u32 {
    rtype(0x18, 0, rs, rt)
}

pub const fn jr(rs: u32) -> u32 {
    rtype(0x08, 0, rs, 0)
}

pub const fn jalr(rd: u32, rs: u32) -> u32 {
    rtype(0x09, rd, rs, 0)
}

pub const fn syscall() -> u32 {
    0x0C
}

pub const fn brk() -> u32 {
    0x0D
}

pub const fn beq(rs: u32, rt: u32, imm: u32) -> u32 {
    itype(0x04, rt, rs, imm)
}

pub const fn bne(rs: u32, rt: u32, imm: u32) -> u32 {
    itype(0x05, rt, rs, imm)
}

pub const fn bgtz(rs: u32, imm: u32) -> u32 {
    itype(0x07, 0, rs, imm)
}

pub const fn bcond(code: u32, rs: u32, imm: u32) -> u32 {
    itype(0x01, code, rs, imm)
}

pub const fn lb(rt: u32, base: u32, imm: u32) -> u32 {
    itype(0x20, rt, base, imm)
}

pub const fn lh(rt: u32, base: u32, imm: u32) -> u32 {
    itype(0x21, rt, base, imm)
}

pub const fn lwl(rt: u32, base: u32, imm: u32) -> u32 {
    itype(0x22, rt, base, imm)
}

pub const fn lw(rt: u32, base: u32, imm: u32) -> u32 {
    itype(0x23, rt, base, imm)
}

pub const fn lbu(rt: u32, base: u32, imm: u32) -> u32 {
    itype(0x24, rt, base, imm)
}

pub const fn lhu(rt: u32, base: u32, imm: u32) -> u32 {
    itype(0x25, rt, base, imm)
}

pub const fn lwr(rt: u32, base: u32, imm: u32) -> u32 {
    itype(0x26, rt, base, imm)
}

pub const fn sb(rt: u32, base: u32, imm: u32) -> u32 {
    itype(0x28, rt, base, imm)
}

pub const fn sh(rt: u32, base: u32, imm: u32) -> u32 {
    itype(0x29, rt, base, imm)
}

pub const fn swl(rt: u32, base: u32, imm: u32) -> u32 {
    itype(0x2A, rt, base, imm)
}

pub const fn sw(rt: u32, base: u32, imm: u32) -> u32 {
    itype(0x2B, rt, base, imm)
}

pub const fn swr(rt: u32, base: u32, imm: u32) -> u32 {
    itype(0x2E, rt, base, imm)
}

pub const fn mfc0(rt: u32, cop_reg: u32) -> u32 {
    (0x10 << 26) | (rt << 16) | (cop_reg << 11)
}

pub const fn mtc0(rt: u32, cop_reg: u32) -> u32 {
    (0x10 << 26) | (0x04 << 21) | (rt << 16) | (cop_reg << 11)
}
