//! Main RAM device.

use super::{
    read_byte_wrapping, read_halfword_wrapping, read_word_wrapping, write_byte_wrapping,
    write_halfword_wrapping, write_word_wrapping,
};

/// Main RAM size in bytes (2 MiB).
pub const RAM_SIZE: usize = 2 * 1024 * 1024;

/// 2 MiB of main RAM, zero-filled at power-on.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ram {
    data: Box<[u8]>,
}

impl Default for Ram {
    fn default() -> Self {
        Self {
            data: vec![0; RAM_SIZE].into_boxed_slice(),
        }
    }
}

impl Ram {
    /// Creates a zero-filled RAM device.
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

    /// Copies `bytes` into RAM starting at `addr`, wrapping at the device
    /// size. Used by executable sideloading.
    pub fn store_bytes(&mut self, addr: u32, bytes: &[u8]) {
        let mut cursor = addr;
        for byte in bytes {
            write_byte_wrapping(&mut self.data, cursor, *byte);
            cursor = cursor.wrapping_add(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Ram;

    const RAM_BYTES: u32 = 0x0020_0000;

    #[test]
    fn power_on_contents_are_zero() {
        let ram = Ram::new();
        assert_eq!(ram.read_word(0), 0);
        assert_eq!(ram.read_word(RAM_BYTES - 4), 0);
    }

    #[test]
    fn stores_are_readable_back_in_all_widths() {
        let mut ram = Ram::new();
        ram.store_word(0x100, 0xDEAD_BEEF);
        assert_eq!(ram.read_word(0x100), 0xDEAD_BEEF);
        assert_eq!(ram.read_halfword(0x100), 0xBEEF);
        assert_eq!(ram.read_halfword(0x102), 0xDEAD);
        assert_eq!(ram.read_byte(0x103), 0xDE);

        ram.store_halfword(0x100, 0x1234);
        assert_eq!(ram.read_word(0x100), 0xDEAD_1234);
        ram.store_byte(0x103, 0x00);
        assert_eq!(ram.read_word(0x100), 0x00AD_1234);
    }

    #[test]
    fn addresses_wrap_at_two_mebibytes() {
        let mut ram = Ram::new();
        ram.store_byte(0, 0x42);
        assert_eq!(ram.read_byte(RAM_BYTES), 0x42);
    }

    #[test]
    fn store_bytes_copies_a_block() {
        let mut ram = Ram::new();
        ram.store_bytes(0x2000, &[1, 2, 3, 4]);
        assert_eq!(ram.read_word(0x2000), 0x0403_0201);
    }
}
