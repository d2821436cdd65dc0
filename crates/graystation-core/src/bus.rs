//! Address-space router connecting the CPU to every memory-mapped device.
//!
//! The bus owns the devices. Each access strips the KSEG segment bits,
//! decodes the physical region, and forwards to the device at that region.
//! Stores are additionally gated by the cache-isolation latch mirrored from
//! COP0 SR bit 16.

use crate::dma::{
    Dma, CHCR_GPU_LINKED_LIST, CHCR_OTC_CLEAR, CHCR_TRANSFER_DONE, GPU_CHANNEL, OTC_CHANNEL,
};
use crate::gpu::Gpu;
use crate::memory::{decode_region, mask_region, Bios, Ram, Region, Scratchpad};
use tracing::{debug, warn};

/// Addresses at or above this limit ignore the cache-isolation store gate.
const ISOLATION_EXEMPT_START: u32 = 0xFFFE_0000;

/// Fill byte returned by reads from unmapped space.
const OPEN_BUS_BYTE: u8 = 0xFF;

/// Saturating counters for accesses the bus could not route normally.
///
/// These are diagnostics only; no emulated behavior reads them back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BusDiagnostics {
    /// Reads from unmapped address space.
    pub unmapped_reads: u64,
    /// Writes to unmapped address space or to the BIOS ROM window.
    pub unmapped_writes: u64,
    /// Stores suppressed by the cache-isolation latch.
    pub isolated_writes: u64,
    /// Most recent unmapped address, unmasked as the CPU issued it.
    pub last_unmapped_address: Option<u32>,
}

impl BusDiagnostics {
    fn record_unmapped_read(&mut self, addr: u32) {
        self.unmapped_reads = self.unmapped_reads.saturating_add(1);
        self.last_unmapped_address = Some(addr);
    }

    fn record_unmapped_write(&mut self, addr: u32) {
        self.unmapped_writes = self.unmapped_writes.saturating_add(1);
        self.last_unmapped_address = Some(addr);
    }

    fn record_isolated_write(&mut self) {
        self.isolated_writes = self.isolated_writes.saturating_add(1);
    }
}

/// The system bus: devices plus routing state.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bus {
    ram: Ram,
    scratchpad: Scratchpad,
    bios: Bios,
    dma: Dma,
    gpu: Gpu,
    cache_isolated: bool,
    diagnostics: BusDiagnostics,
}

impl Bus {
    /// Creates a bus with power-on device state around the given BIOS image.
    #[must_use]
    pub fn new(bios: Bios) -> Self {
        Self {
            ram: Ram::new(),
            scratchpad: Scratchpad::new(),
            bios,
            dma: Dma::new(),
            gpu: Gpu::new(),
            cache_isolated: false,
            diagnostics: BusDiagnostics::default(),
        }
    }

    /// Borrows main RAM.
    #[must_use]
    pub const fn ram(&self) -> &Ram {
        &self.ram
    }

    /// Mutably borrows main RAM. Used by executable sideloading.
    pub fn ram_mut(&mut self) -> &mut Ram {
        &mut self.ram
    }

    /// Borrows the DMA controller.
    #[must_use]
    pub const fn dma(&self) -> &Dma {
        &self.dma
    }

    /// Borrows the GPU.
    #[must_use]
    pub const fn gpu(&self) -> &Gpu {
        &self.gpu
    }

    /// Counters for accesses the bus could not route.
    #[must_use]
    pub const fn diagnostics(&self) -> &BusDiagnostics {
        &self.diagnostics
    }

    /// True while stores below `0xFFFE_0000` are being suppressed.
    #[must_use]
    pub const fn cache_isolated(&self) -> bool {
        self.cache_isolated
    }

    /// Updates the cache-isolation latch. The CPU calls this whenever an
    /// `MTC0` touches the status register.
    pub fn set_cache_isolation(&mut self, isolated: bool) {
        self.cache_isolated = isolated;
    }

    /// Reads a byte from `addr`. Loads are never affected by isolation.
    #[must_use]
    pub fn read_byte(&mut self, addr: u32) -> u8 {
        let masked = mask_region(addr);
        match decode_region(masked) {
            Region::Ram => self.ram.read_byte(masked),
            Region::Scratchpad => self.scratchpad.read_byte(masked),
            Region::DmaRegisters => self.dma.read_byte(masked),
            Region::Bios => self.bios.read_byte(masked),
            Region::IoPorts | Region::GpuRegisters => {
                debug!(addr = format_args!("0x{addr:08X}"), "stubbed byte read");
                0
            }
            Region::Unmapped => {
                self.diagnostics.record_unmapped_read(addr);
                warn!(addr = format_args!("0x{addr:08X}"), "unmapped byte read");
                OPEN_BUS_BYTE
            }
        }
    }

    /// Reads a little-endian halfword from `addr`.
    #[must_use]
    pub fn read_halfword(&mut self, addr: u32) -> u16 {
        let masked = mask_region(addr);
        match decode_region(masked) {
            Region::Ram => self.ram.read_halfword(masked),
            Region::Scratchpad => self.scratchpad.read_halfword(masked),
            Region::DmaRegisters => self.dma.read_halfword(masked),
            Region::Bios => self.bios.read_halfword(masked),
            Region::IoPorts | Region::GpuRegisters => {
                debug!(addr = format_args!("0x{addr:08X}"), "stubbed halfword read");
                0
            }
            Region::Unmapped => {
                self.diagnostics.record_unmapped_read(addr);
                warn!(addr = format_args!("0x{addr:08X}"), "unmapped halfword read");
                u16::from_le_bytes([OPEN_BUS_BYTE; 2])
            }
        }
    }

    /// Reads a little-endian word from `addr`.
    #[must_use]
    pub fn read_word(&mut self, addr: u32) -> u32 {
        let masked = mask_region(addr);
        match decode_region(masked) {
            Region::Ram => self.ram.read_word(masked),
            Region::Scratchpad => self.scratchpad.read_word(masked),
            Region::DmaRegisters => self.dma.read_word(masked),
            Region::GpuRegisters => self.gpu.read_word(masked),
            Region::Bios => self.bios.read_word(masked),
            Region::IoPorts => {
                debug!(addr = format_args!("0x{addr:08X}"), "stubbed word read");
                0
            }
            Region::Unmapped => {
                self.diagnostics.record_unmapped_read(addr);
                warn!(addr = format_args!("0x{addr:08X}"), "unmapped word read");
                u32::from_le_bytes([OPEN_BUS_BYTE; 4])
            }
        }
    }

    /// Stores a byte to `addr`, subject to the isolation gate.
    pub fn store_byte(&mut self, addr: u32, value: u8) {
        if self.isolation_suppresses(addr) {
            return;
        }
        let masked = mask_region(addr);
        match decode_region(masked) {
            Region::Ram => self.ram.store_byte(masked, value),
            Region::Scratchpad => self.scratchpad.store_byte(masked, value),
            Region::DmaRegisters => self.dma.store_byte(masked, value),
            Region::IoPorts | Region::GpuRegisters => {
                debug!(addr = format_args!("0x{addr:08X}"), "stubbed byte write");
            }
            Region::Bios | Region::Unmapped => self.drop_write(addr),
        }
    }

    /// Stores a little-endian halfword to `addr`, subject to the isolation
    /// gate.
    pub fn store_halfword(&mut self, addr: u32, value: u16) {
        if self.isolation_suppresses(addr) {
            return;
        }
        let masked = mask_region(addr);
        match decode_region(masked) {
            Region::Ram => self.ram.store_halfword(masked, value),
            Region::Scratchpad => self.scratchpad.store_halfword(masked, value),
            Region::DmaRegisters => self.dma.store_halfword(masked, value),
            Region::IoPorts | Region::GpuRegisters => {
                debug!(addr = format_args!("0x{addr:08X}"), "stubbed halfword write");
            }
            Region::Bios | Region::Unmapped => self.drop_write(addr),
        }
    }

    /// Stores a little-endian word to `addr`, subject to the isolation gate.
    pub fn store_word(&mut self, addr: u32, value: u32) {
        if self.isolation_suppresses(addr) {
            return;
        }
        let masked = mask_region(addr);
        match decode_region(masked) {
            Region::Ram => self.ram.store_word(masked, value),
            Region::Scratchpad => self.scratchpad.store_word(masked, value),
            Region::DmaRegisters => self.dma.store_word(masked, value),
            Region::GpuRegisters => self.gpu.store_word(masked, value),
            Region::IoPorts => {
                debug!(addr = format_args!("0x{addr:08X}"), "stubbed word write");
            }
            Region::Bios | Region::Unmapped => self.drop_write(addr),
        }
    }

    /// Runs any DMA transfer whose trigger pattern is latched in a channel's
    /// `CHCR`. Called once per machine tick, after the CPU step.
    pub fn run_dma(&mut self) {
        if self.dma.channel(OTC_CHANNEL).chcr == CHCR_OTC_CLEAR {
            self.run_otc_clear();
        }
        if self.dma.channel(GPU_CHANNEL).chcr == CHCR_GPU_LINKED_LIST {
            self.run_gpu_linked_list();
        }
    }

    /// Ordering-table clear: writes a reverse-linked list of 24-bit entries
    /// into RAM, walking backwards from `MADR` for `BCR` words. The final
    /// entry is the terminator `0x00FF_FFFF`.
    fn run_otc_clear(&mut self) {
        let channel = *self.dma.channel(OTC_CHANNEL);
        let step: u32 = if channel.chcr & 0x2 == 0 { 4 } else { 4_u32.wrapping_neg() };
        let count = channel.bcr;
        debug!(
            madr = format_args!("0x{:08X}", channel.madr),
            count, "OTC clear"
        );

        let mut offset = 0_u32;
        for index in 0..count {
            let address = channel.madr.wrapping_add(offset);
            offset = offset.wrapping_add(step);
            let entry = if index + 1 == count {
                0x00FF_FFFF
            } else {
                address.wrapping_add(step) & 0x00FF_FFFF
            };
            self.store_word(address, entry);
        }

        self.dma.channel_mut(OTC_CHANNEL).chcr = CHCR_TRANSFER_DONE;
    }

    /// GPU linked-list stub: walks nothing, moves nothing, just logs the
    /// request and marks the channel done. The packet count rides in the
    /// top byte of `MADR`.
    fn run_gpu_linked_list(&mut self) {
        let channel = *self.dma.channel(GPU_CHANNEL);
        debug!(
            madr = format_args!("0x{:08X}", channel.madr & 0x00FF_FFFF),
            packets = channel.madr >> 24,
            "GPU linked-list transfer dropped"
        );
        self.dma.channel_mut(GPU_CHANNEL).chcr = CHCR_TRANSFER_DONE;
    }

    fn isolation_suppresses(&mut self, addr: u32) -> bool {
        if self.cache_isolated && addr < ISOLATION_EXEMPT_START {
            self.diagnostics.record_isolated_write();
            return true;
        }
        false
    }

    fn drop_write(&mut self, addr: u32) {
        self.diagnostics.record_unmapped_write(addr);
        warn!(addr = format_args!("0x{addr:08X}"), "dropped write");
    }
}
