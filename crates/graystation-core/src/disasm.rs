//! Instruction disassembly for trace output.

use crate::cpu::opcode::Opcode;

/// A disassembled instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disassembly {
    /// Instruction mnemonic, or `.word` for unrecognized encodings.
    pub mnemonic: &'static str,
    /// Rendered operand list, empty for operand-free instructions.
    pub operands: String,
}

impl std::fmt::Display for Disassembly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.operands.is_empty() {
            f.write_str(self.mnemonic)
        } else {
            write!(f, "{} {}", self.mnemonic, self.operands)
        }
    }
}

fn plain(mnemonic: &'static str) -> Disassembly {
    Disassembly {
        mnemonic,
        operands: String::new(),
    }
}

fn rtype(mnemonic: &'static str, op: Opcode) -> Disassembly {
    Disassembly {
        mnemonic,
        operands: format!("{}, {}, {}", op.rd(), op.rs(), op.rt()),
    }
}

fn shift(mnemonic: &'static str, op: Opcode) -> Disassembly {
    Disassembly {
        mnemonic,
        operands: format!("{}, {}, {}", op.rd(), op.rt(), op.shamt()),
    }
}

fn shift_variable(mnemonic: &'static str, op: Opcode) -> Disassembly {
    Disassembly {
        mnemonic,
        operands: format!("{}, {}, {}", op.rd(), op.rt(), op.rs()),
    }
}

fn itype(mnemonic: &'static str, op: Opcode) -> Disassembly {
    Disassembly {
        mnemonic,
        operands: format!("{}, {}, 0x{:X}", op.rt(), op.rs(), op.imm16()),
    }
}

fn mem(mnemonic: &'static str, op: Opcode) -> Disassembly {
    Disassembly {
        mnemonic,
        operands: format!("{}, 0x{:X}({})", op.rt(), op.imm16(), op.rs()),
    }
}

fn branch2(mnemonic: &'static str, op: Opcode) -> Disassembly {
    Disassembly {
        mnemonic,
        operands: format!("{}, {}, 0x{:X}", op.rs(), op.rt(), op.imm16()),
    }
}

fn branch1(mnemonic: &'static str, op: Opcode) -> Disassembly {
    Disassembly {
        mnemonic,
        operands: format!("{}, 0x{:X}", op.rs(), op.imm16()),
    }
}

fn hilo_read(mnemonic: &'static str, op: Opcode) -> Disassembly {
    Disassembly {
        mnemonic,
        operands: op.rd().to_string(),
    }
}

fn hilo_write(mnemonic: &'static str, op: Opcode) -> Disassembly {
    Disassembly {
        mnemonic,
        operands: op.rs().to_string(),
    }
}

fn muldiv(mnemonic: &'static str, op: Opcode) -> Disassembly {
    Disassembly {
        mnemonic,
        operands: format!("{}, {}", op.rs(), op.rt()),
    }
}

fn unknown(op: Opcode) -> Disassembly {
    Disassembly {
        mnemonic: ".word",
        operands: format!("0x{:08X}", op.0),
    }
}

/// Disassembles a single instruction word.
#[must_use]
pub fn disassemble(op: Opcode) -> Disassembly {
    match op.primary() {
        0x00 => match op.secondary() {
            0x00 if op.0 == 0 => plain("nop"),
            0x00 => shift("sll", op),
            0x02 => shift("srl", op),
            0x03 => shift("sra", op),
            0x04 => shift_variable("sllv", op),
            0x06 => shift_variable("srlv", op),
            0x07 => shift_variable("srav", op),
            0x08 => Disassembly {
                mnemonic: "jr",
                operands: op.rs().to_string(),
            },
            0x09 => Disassembly {
                mnemonic: "jalr",
                operands: format!("{}, {}", op.rd(), op.rs()),
            },
            0x0C => plain("syscall"),
            0x0D => plain("break"),
            0x10 => hilo_read("mfhi", op),
            0x11 => hilo_write("mthi", op),
            0x12 => hilo_read("mflo", op),
            0x13 => hilo_write("mtlo", op),
            0x18 => muldiv("mult", op),
            0x19 => muldiv("multu", op),
            0x1A => muldiv("div", op),
            0x1B => muldiv("divu", op),
            0x20 => rtype("add", op),
            0x21 => rtype("addu", op),
            0x22 => rtype("sub", op),
            0x23 => rtype("subu", op),
            0x24 => rtype("and", op),
            0x25 => rtype("or", op),
            0x26 => rtype("xor", op),
            0x27 => rtype("nor", op),
            0x2A => rtype("slt", op),
            0x2B => rtype("sltu", op),
            _ => unknown(op),
        },
        0x01 => match op.bcond() {
            0x00 => branch1("bltz", op),
            0x01 => branch1("bgez", op),
            0x10 => branch1("bltzal", op),
            0x11 => branch1("bgezal", op),
            _ => unknown(op),
        },
        0x02 => Disassembly {
            mnemonic: "j",
            operands: format!("0x{:07X}", op.target26() << 2),
        },
        0x03 => Disassembly {
            mnemonic: "jal",
            operands: format!("0x{:07X}", op.target26() << 2),
        },
        0x04 => branch2("beq", op),
        0x05 => branch2("bne", op),
        0x06 => branch1("blez", op),
        0x07 => branch1("bgtz", op),
        0x08 => itype("addi", op),
        0x09 => itype("addiu", op),
        0x0A => itype("slti", op),
        0x0B => itype("sltiu", op),
        0x0C => itype("andi", op),
        0x0D => itype("ori", op),
        0x0E => itype("xori", op),
        0x0F => Disassembly {
            mnemonic: "lui",
            operands: format!("{}, 0x{:X}", op.rt(), op.imm16()),
        },
        0x10 => match op.cop_sub() {
            0x00 => Disassembly {
                mnemonic: "mfc0",
                operands: format!("{}, ${}", op.rt(), op.rd().index()),
            },
            0x04 => Disassembly {
                mnemonic: "mtc0",
                operands: format!("{}, ${}", op.rt(), op.rd().index()),
            },
            _ => unknown(op),
        },
        0x20 => mem("lb", op),
        0x21 => mem("lh", op),
        0x22 => mem("lwl", op),
        0x23 => mem("lw", op),
        0x24 => mem("lbu", op),
        0x25 => mem("lhu", op),
        0x26 => mem("lwr", op),
        0x28 => mem("sb", op),
        0x29 => mem("sh", op),
        0x2A => mem("swl", op),
        0x2B => mem("sw", op),
        0x2E => mem("swr", op),
        _ => unknown(op),
    }
}
