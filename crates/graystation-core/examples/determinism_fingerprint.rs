//! Deterministic replay fingerprint generator used by CI cross-host comparison.

use graystation_core::{Bios, Machine, Reg, TraceEvent, BIOS_SIZE};
use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

const fn itype(op: u32, rt: u32, rs: u32, imm: u32) -> u32 {
    (op << 26) | (rs << 21) | (rt << 16) | (imm & 0xFFFF)
}

fn hash_bytes(hash: &mut u64, bytes: &[u8]) {
    for byte in bytes {
        *hash ^= u64::from(*byte);
        *hash = hash.wrapping_mul(0x1000_0000_01B3);
    }
}

fn fingerprint() -> String {
    let mut image = vec![0_u8; BIOS_SIZE];
    let program = [
        itype(0x0F, 1, 0, 0x8001), // lui $at, 0x8001
        itype(0x0D, 1, 1, 0x2345), // ori $at, $at, 0x2345
        itype(0x2B, 1, 0, 0x0100), // sw  $at, 0x100($zero)
        itype(0x23, 2, 0, 0x0100), // lw  $v0, 0x100($zero)
        itype(0x09, 3, 2, 0x0001), // addiu $v1, $v0, 1
        itype(0x04, 0, 0, 0xFFFA), // beq $zero, $zero, back to the top
        0,
    ];
    for (index, word) in program.iter().enumerate() {
        image[index * 4..index * 4 + 4].copy_from_slice(&word.to_le_bytes());
    }

    let bios = Bios::from_image(image).expect("image has the right size");
    let mut machine = Machine::new(bios);
    let mut events: Vec<TraceEvent> = Vec::new();
    for _ in 0..64 {
        machine.tick_traced(&mut events);
    }

    let mut hash = 0xcbf2_9ce4_8422_2325_u64;
    for event in &events {
        match *event {
            TraceEvent::Instruction { pc, word } => {
                hash_bytes(&mut hash, &[0x01]);
                hash_bytes(&mut hash, &pc.to_le_bytes());
                hash_bytes(&mut hash, &word.to_le_bytes());
            }
            TraceEvent::Exception { exception, pc } => {
                hash_bytes(&mut hash, &[0x02]);
                hash_bytes(&mut hash, &exception.code().to_le_bytes());
                hash_bytes(&mut hash, &pc.to_le_bytes());
            }
        }
    }
    hash_bytes(&mut hash, &machine.cpu().pc().to_le_bytes());
    for index in 0..32 {
        hash_bytes(&mut hash, &machine.cpu().reg(Reg(index)).to_le_bytes());
    }
    hash_bytes(&mut hash, &machine.cpu().hi().to_le_bytes());
    hash_bytes(&mut hash, &machine.cpu().lo().to_le_bytes());
    hash_bytes(&mut hash, &machine.bus().ram().read_word(0x100).to_le_bytes());

    format!("{hash:016x}")
}

fn main() {
    println!("{}", fingerprint());
}
