//! Scratchpad (fast data cache used as RAM) device.

use super::{
    read_byte_wrapping, read_halfword_wrapping, read_word_wrapping, write_byte_wrapping,
    write_halfword_wrapping, write_word_wrapping,
};

/// Scratchpad size in bytes (1 KiB).
pub const SCRATCHPAD_SIZE: usize = 1024;

/// 1 KiB of fast on-chip RAM mapped at `0x1F80_0000`.
///
/// The bus passes the full masked physical address through; the low ten bits
/// select the byte, so no base subtraction is needed here.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Scratchpad {
    data: Box<[u8]>,
}

impl Default for Scratchpad {
    fn default() -> Self {
        Self {
            data: vec![0; SCRATCHPAD_SIZE].into_boxed_slice(),
        }
    }
}

impl Scratchpad {
    /// Creates a zero-filled scratchpad.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the byte at `addr`, wrapping at the device size.
    #[must_use]
    pub fn read_byte(&self, addr: u32) -> u8 {
        read_byte_wrapping(&self.data, addr)
    }

    /// Reads the little-endian halfword at `addr`.
    #[must_use]
    pub fn read_halfword(&self, addr: u32) -> u16 {
        read_halfword_wrapping(&self.data, addr)
    }

    /// Reads the little-endian word at `addr`.
    #[must_use]
    pub fn read_word(&self, addr: u32) -> u32 {
        read_word_wrapping(&self.data, addr)
    }

    /// Stores a byte at `addr`, wrapping at the device size.
    pub fn store_byte(&mut self, addr: u32, value: u8) {
        write_byte_wrapping(&mut self.data, addr, value);
    }

    /// Stores a little-endian halfword at `addr`.
    pub fn store_halfword(&mut self, addr: u32, value: u16) {
        write_halfword_wrapping(&mut self.data, addr, value);
    }

    /// Stores a little-endian word at `addr`.
    pub fn store_word(&mut self, addr: u32, value: u32) {
        write_word_wrapping(&mut self.data, addr, value);
    }
}
