//! BIOS ROM device.

use super::{read_byte_wrapping, read_halfword_wrapping, read_word_wrapping};

/// Required BIOS image size in bytes (512 KiB).
pub const BIOS_SIZE: usize = 512 * 1024;

/// Error raised when a BIOS image cannot be loaded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BiosError {
    /// The image is not exactly [`BIOS_SIZE`] bytes long.
    #[error("BIOS image must be exactly {BIOS_SIZE} bytes, got {0}")]
    InvalidImageSize(usize),
}

/// 512 KiB of read-only BIOS ROM mapped at `0x1FC0_0000`.
///
/// Writes never reach this device: the bus drops them before routing.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bios {
    data: Box<[u8]>,
}

impl Bios {
    /// Wraps a raw ROM image, rejecting anything but an exact 512 KiB dump.
    ///
    /// # Errors
    ///
    /// Returns [`BiosError::InvalidImageSize`] when `image` is not exactly
    /// [`BIOS_SIZE`] bytes long.
    pub fn from_image(image: Vec<u8>) -> Result<Self, BiosError> {
        if image.len() != BIOS_SIZE {
            return Err(BiosError::InvalidImageSize(image.len()));
        }
        Ok(Self {
            data: image.into_boxed_slice(),
        })
    }

    /// Reads the byte at `addr`, wrapping at the ROM size.
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
}

#[cfg(test)]
mod tests {
    use super::{Bios, BiosError, BIOS_SIZE};

    #[test]
    fn rejects_images_of_the_wrong_size() {
        assert_eq!(
            Bios::from_image(vec![0; 1024]),
            Err(BiosError::InvalidImageSize(1024))
        );
        assert_eq!(
            Bios::from_image(Vec::new()),
            Err(BiosError::InvalidImageSize(0))
        );
    }

    #[test]
    fn reads_are_little_endian_and_offset_by_the_low_bits() {
        let mut image = vec![0_u8; BIOS_SIZE];
        image[0x40] = 0x01;
        image[0x41] = 0x02;
        image[0x42] = 0x03;
        image[0x43] = 0x04;
        let bios = Bios::from_image(image).expect("image has the right size");
        assert_eq!(bios.read_word(0x1FC0_0040), 0x0403_0201);
        assert_eq!(bios.read_halfword(0x1FC0_0042), 0x0403);
        assert_eq!(bios.read_byte(0x1FC0_0043), 0x04);
    }

    #[test]
    fn reads_wrap_at_the_rom_size() {
        let mut image = vec![0_u8; BIOS_SIZE];
        image[0] = 0xEE;
        let bios = Bios::from_image(image).expect("image has the right size");
        assert_eq!(bios.read_byte(0x0008_0000), 0xEE);
    }
}
