//! Byte-addressable memory devices and the physical region map.
//!
//! All devices are little-endian and power-of-two sized. Offsets are masked
//! to the device size before indexing, so accesses past the end wrap around
//! instead of faulting.

pub mod bios;
pub mod map;
pub mod ram;
pub mod scratchpad;

pub use bios::{Bios, BiosError, BIOS_SIZE};
pub use map::{decode_region, mask_region, Region, REGION_MASK};
pub use ram::{Ram, RAM_SIZE};
pub use scratchpad::{Scratchpad, SCRATCHPAD_SIZE};

/// Reads a byte at `addr` masked to the (power-of-two) buffer size.
pub(crate) fn read_byte_wrapping(data: &[u8], addr: u32) -> u8 {
    let mask = data.len() - 1;
    data[addr as usize & mask]
}

/// Reads a little-endian halfword, masking each byte index individually.
pub(crate) fn read_halfword_wrapping(data: &[u8], addr: u32) -> u16 {
    let lo = u16::from(read_byte_wrapping(data, addr));
    let hi = u16::from(read_byte_wrapping(data, addr.wrapping_add(1)));
    (hi << 8) | lo
}

/// Reads a little-endian word, masking each byte index individually.
pub(crate) fn read_word_wrapping(data: &[u8], addr: u32) -> u32 {
    let lo = u32::from(read_halfword_wrapping(data, addr));
    let hi = u32::from(read_halfword_wrapping(data, addr.wrapping_add(2)));
    (hi << 16) | lo
}

/// Writes a byte at `addr` masked to the (power-of-two) buffer size.
pub(crate) fn write_byte_wrapping(data: &mut [u8], addr: u32, value: u8) {
    let mask = data.len() - 1;
    data[addr as usize & mask] = value;
}

/// Writes a little-endian halfword, masking each byte index individually.
pub(crate) fn write_halfword_wrapping(data: &mut [u8], addr: u32, value: u16) {
    let [lo, hi] = value.to_le_bytes();
    write_byte_wrapping(data, addr, lo);
    write_byte_wrapping(data, addr.wrapping_add(1), hi);
}

/// Writes a little-endian word, masking each byte index individually.
pub(crate) fn write_word_wrapping(data: &mut [u8], addr: u32, value: u32) {
    let [b0, b1, b2, b3] = value.to_le_bytes();
    write_byte_wrapping(data, addr, b0);
    write_byte_wrapping(data, addr.wrapping_add(1), b1);
    write_byte_wrapping(data, addr.wrapping_add(2), b2);
    write_byte_wrapping(data, addr.wrapping_add(3), b3);
}
