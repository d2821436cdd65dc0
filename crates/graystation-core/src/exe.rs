//! PS-X EXE image parsing.
//!
//! Executables carry a 2 KiB header followed by the payload. Only the
//! fields the loader acts on are parsed; the rest of the header (marker
//! string, region text) is ignored.

use crate::memory::mask_region;

/// Size of the header preceding the payload.
pub const EXE_HEADER_SIZE: usize = 0x800;

const ENTRY_PC_OFFSET: usize = 0x10;
const INITIAL_GP_OFFSET: usize = 0x14;
const LOAD_ADDRESS_OFFSET: usize = 0x18;
const PAYLOAD_WORDS_OFFSET: usize = 0x1C;
const INITIAL_SP_OFFSET: usize = 0x30;

/// Error raised when an executable image cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExeError {
    /// The image ends before the header does.
    #[error("EXE image of {0} bytes is shorter than the {EXE_HEADER_SIZE}-byte header")]
    TruncatedHeader(usize),
    /// The header promises more payload than the image contains.
    #[error("EXE header declares {declared} payload bytes but only {present} follow the header")]
    TruncatedPayload {
        /// Payload size the header declares.
        declared: usize,
        /// Bytes actually present after the header.
        present: usize,
    },
}

/// A parsed executable, ready to sideload.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExeImage {
    entry_pc: u32,
    initial_gp: u32,
    load_address: u32,
    initial_sp: u32,
    payload: Vec<u8>,
}

impl ExeImage {
    /// Parses an executable image.
    ///
    /// # Errors
    ///
    /// Returns [`ExeError::TruncatedHeader`] if `image` is shorter than the
    /// header, or [`ExeError::TruncatedPayload`] if the declared payload
    /// size overruns the image.
    pub fn parse(image: &[u8]) -> Result<Self, ExeError> {
        if image.len() < EXE_HEADER_SIZE {
            return Err(ExeError::TruncatedHeader(image.len()));
        }
        let declared = header_word(image, PAYLOAD_WORDS_OFFSET) as usize * 4;
        let present = image.len() - EXE_HEADER_SIZE;
        if declared > present {
            return Err(ExeError::TruncatedPayload { declared, present });
        }
        Ok(Self {
            entry_pc: header_word(image, ENTRY_PC_OFFSET),
            initial_gp: header_word(image, INITIAL_GP_OFFSET),
            load_address: mask_region(header_word(image, LOAD_ADDRESS_OFFSET)),
            initial_sp: header_word(image, INITIAL_SP_OFFSET),
            payload: image[EXE_HEADER_SIZE..EXE_HEADER_SIZE + declared].to_vec(),
        })
    }

    /// Entry point loaded into `pc`.
    #[must_use]
    pub const fn entry_pc(&self) -> u32 {
        self.entry_pc
    }

    /// Value loaded into `$gp`.
    #[must_use]
    pub const fn initial_gp(&self) -> u32 {
        self.initial_gp
    }

    /// Physical RAM address the payload is copied to.
    #[must_use]
    pub const fn load_address(&self) -> u32 {
        self.load_address
    }

    /// Value loaded into `$sp` and `$fp`, or zero to leave them alone.
    #[must_use]
    pub const fn initial_sp(&self) -> u32 {
        self.initial_sp
    }

    /// The payload bytes following the header.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

fn header_word(image: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        image[offset],
        image[offset + 1],
        image[offset + 2],
        image[offset + 3],
    ])
}
