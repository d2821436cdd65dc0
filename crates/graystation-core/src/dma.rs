//! DMA controller register file.
//!
//! Seven channels of `MADR`/`BCR`/`CHCR` plus the shared `DPCR`/`DICR`
//! pair. This module only latches register state; the transfers themselves
//! (ordering-table clear and the GPU linked-list walk) are driven by the
//! bus, which owns both the channel state and the memories it touches.

use tracing::warn;

/// Number of DMA channels.
pub const DMA_CHANNEL_COUNT: usize = 7;
/// Channel wired to the GPU.
pub const GPU_CHANNEL: usize = 2;
/// Channel wired to the ordering-table clear engine.
pub const OTC_CHANNEL: usize = 6;

/// Physical address of the DMA priority control register.
pub const DPCR_ADDRESS: u32 = 0x1F80_10F0;
/// Physical address of the DMA interrupt control register.
pub const DICR_ADDRESS: u32 = 0x1F80_10F4;

/// Reset value of `DPCR` (priorities 1..7, all channels disabled).
pub const DPCR_RESET: u32 = 0x0765_4321;

/// `CHCR` value that kicks off an ordering-table clear on channel 6.
pub const CHCR_OTC_CLEAR: u32 = 0x1100_0002;
/// `CHCR` value that kicks off a GPU linked-list transfer on channel 2.
pub const CHCR_GPU_LINKED_LIST: u32 = 0x0100_0401;
/// `CHCR` value written back once a transfer completes (start and trigger
/// bits cleared).
pub const CHCR_TRANSFER_DONE: u32 = !((1 << 24) | (1 << 28));

/// Per-channel register triple.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Channel {
    /// Base memory address of the transfer.
    pub madr: u32,
    /// Block control: transfer length, layout depends on the sync mode.
    pub bcr: u32,
    /// Channel control: direction, step, sync mode, start/trigger bits.
    pub chcr: u32,
}

/// DMA controller state.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dma {
    channels: [Channel; DMA_CHANNEL_COUNT],
    dpcr: u32,
    dicr: u32,
}

impl Default for Dma {
    fn default() -> Self {
        Self {
            channels: [Channel::default(); DMA_CHANNEL_COUNT],
            dpcr: DPCR_RESET,
            dicr: 0,
        }
    }
}

impl Dma {
    /// Creates a DMA controller in its reset state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrows a channel's register triple.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below [`DMA_CHANNEL_COUNT`].
    #[must_use]
    pub fn channel(&self, index: usize) -> &Channel {
        &self.channels[index]
    }

    /// Mutably borrows a channel's register triple.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below [`DMA_CHANNEL_COUNT`].
    pub fn channel_mut(&mut self, index: usize) -> &mut Channel {
        &mut self.channels[index]
    }

    /// Current `DPCR` value.
    #[must_use]
    pub const fn dpcr(&self) -> u32 {
        self.dpcr
    }

    /// Current `DICR` value.
    #[must_use]
    pub const fn dicr(&self) -> u32 {
        self.dicr
    }

    /// Handles a word read from the DMA register block.
    #[must_use]
    pub fn read_word(&self, addr: u32) -> u32 {
        match (addr, Self::channel_index(addr), addr & 0xF) {
            (DPCR_ADDRESS, ..) => self.dpcr,
            (DICR_ADDRESS, ..) => self.dicr,
            (_, Some(channel), 0x0) => self.channels[channel].madr,
            (_, Some(channel), 0x4) => self.channels[channel].bcr,
            (_, Some(channel), 0x8 | 0xC) => self.channels[channel].chcr,
            _ => {
                warn!(addr = format_args!("0x{addr:08X}"), "unhandled DMA read");
                0
            }
        }
    }

    /// Handles a word store to the DMA register block.
    pub fn store_word(&mut self, addr: u32, value: u32) {
        match (addr, Self::channel_index(addr), addr & 0xF) {
            (DPCR_ADDRESS, ..) => self.dpcr = value,
            (DICR_ADDRESS, ..) => self.dicr = value,
            (_, Some(channel), 0x0) => self.channels[channel].madr = value,
            (_, Some(channel), 0x4) => self.channels[channel].bcr = value,
            (_, Some(channel), 0x8 | 0xC) => self.channels[channel].chcr = value,
            _ => {
                warn!(
                    addr = format_args!("0x{addr:08X}"),
                    value = format_args!("0x{value:08X}"),
                    "unhandled DMA write"
                );
            }
        }
    }

    /// Handles a halfword store; the full word latch is written.
    pub fn store_halfword(&mut self, addr: u32, value: u16) {
        self.store_word(addr, u32::from(value));
    }

    /// Handles a byte store; the full word latch is written.
    pub fn store_byte(&mut self, addr: u32, value: u8) {
        self.store_word(addr, u32::from(value));
    }

    /// Handles a byte read. Narrow reads are not decoded.
    #[must_use]
    pub fn read_byte(&self, addr: u32) -> u8 {
        warn!(addr = format_args!("0x{addr:08X}"), "narrow DMA read");
        0xFF
    }

    /// Handles a halfword read. Narrow reads are not decoded.
    #[must_use]
    pub fn read_halfword(&self, addr: u32) -> u16 {
        warn!(addr = format_args!("0x{addr:08X}"), "narrow DMA read");
        0xFFFF
    }

    /// Maps a register address to its channel, or `None` for the control
    /// block above the last channel.
    const fn channel_index(addr: u32) -> Option<usize> {
        let index = ((addr >> 4) & 0x7) as usize;
        if index < DMA_CHANNEL_COUNT {
            Some(index)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Dma, CHCR_TRANSFER_DONE, DICR_ADDRESS, DPCR_ADDRESS, DPCR_RESET, GPU_CHANNEL, OTC_CHANNEL,
    };
    use rstest::rstest;

    #[test]
    fn dpcr_resets_to_the_documented_priority_ladder() {
        let dma = Dma::new();
        assert_eq!(dma.read_word(DPCR_ADDRESS), DPCR_RESET);
        assert_eq!(dma.read_word(DICR_ADDRESS), 0);
    }

    #[rstest]
    #[case(0x1F80_1080, 0)]
    #[case(0x1F80_10A0, GPU_CHANNEL)]
    #[case(0x1F80_10E0, OTC_CHANNEL)]
    fn channel_registers_decode_by_address_nibbles(#[case] base: u32, #[case] channel: usize) {
        let mut dma = Dma::new();
        dma.store_word(base, 0x001F_FFC0);
        dma.store_word(base + 4, 0x0000_0400);
        dma.store_word(base + 8, 0x1100_0002);

        assert_eq!(dma.channel(channel).madr, 0x001F_FFC0);
        assert_eq!(dma.channel(channel).bcr, 0x0000_0400);
        assert_eq!(dma.channel(channel).chcr, 0x1100_0002);

        assert_eq!(dma.read_word(base), 0x001F_FFC0);
        assert_eq!(dma.read_word(base + 4), 0x0000_0400);
        assert_eq!(dma.read_word(base + 8), 0x1100_0002);
        // CHCR mirrors at offset 0xC.
        assert_eq!(dma.read_word(base + 0xC), 0x1100_0002);
    }

    #[test]
    fn control_registers_are_plain_latches() {
        let mut dma = Dma::new();
        dma.store_word(DPCR_ADDRESS, 0x0123_4567);
        dma.store_word(DICR_ADDRESS, 0x0080_0000);
        assert_eq!(dma.dpcr(), 0x0123_4567);
        assert_eq!(dma.dicr(), 0x0080_0000);
    }

    #[test]
    fn narrow_stores_write_the_full_word_latch() {
        let mut dma = Dma::new();
        dma.store_halfword(0x1F80_10A0, 0x1234);
        assert_eq!(dma.channel(GPU_CHANNEL).madr, 0x0000_1234);
        dma.store_byte(0x1F80_10A0, 0x56);
        assert_eq!(dma.channel(GPU_CHANNEL).madr, 0x0000_0056);
    }

    #[test]
    fn narrow_reads_return_the_fill_pattern() {
        let dma = Dma::new();
        assert_eq!(dma.read_byte(0x1F80_1080), 0xFF);
        assert_eq!(dma.read_halfword(0x1F80_1080), 0xFFFF);
    }

    #[test]
    fn done_sentinel_clears_start_and_trigger_bits() {
        assert_eq!(CHCR_TRANSFER_DONE, 0xEEFF_FFFF);
    }
}
