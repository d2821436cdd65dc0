//! Physical address map and region decoding for the 512 MiB bus window.
//!
//! Every bus access first strips the KSEG0/KSEG1 segment bits, then routes
//! the resulting physical address through the fixed region table below.

/// Mask stripping the cached/uncached segment bits from a 32-bit address.
pub const REGION_MASK: u32 = 0x1FFF_FFFF;

/// Exclusive end of main RAM in physical space.
pub const RAM_END: u32 = 0x0020_0000;
/// Inclusive start of the scratchpad window.
pub const SCRATCHPAD_START: u32 = 0x1F80_0000;
/// Exclusive end of the scratchpad window.
pub const SCRATCHPAD_END: u32 = 0x1F80_1000;
/// Inclusive start of the miscellaneous I/O port block.
pub const IO_PORTS_START: u32 = 0x1F80_1000;
/// Exclusive end of the miscellaneous I/O port block.
pub const IO_PORTS_END: u32 = 0x1F80_1080;
/// Inclusive start of the DMA register block.
pub const DMA_REGISTERS_START: u32 = 0x1F80_1080;
/// Exclusive end of the DMA register block.
pub const DMA_REGISTERS_END: u32 = 0x1F80_1100;
/// Inclusive start of the GPU register pair.
pub const GPU_REGISTERS_START: u32 = 0x1F80_1810;
/// Exclusive end of the GPU register pair.
pub const GPU_REGISTERS_END: u32 = 0x1F80_1818;
/// Inclusive start of the BIOS ROM window.
pub const BIOS_START: u32 = 0x1FC0_0000;
/// Exclusive end of the BIOS ROM window.
pub const BIOS_END: u32 = 0x2000_0000;

/// Region classification for a masked physical address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// Main RAM (`0x0000_0000..0x0020_0000`).
    Ram,
    /// 1 KiB fast scratchpad RAM.
    Scratchpad,
    /// Miscellaneous I/O ports with no device behind them yet.
    IoPorts,
    /// DMA channel and control registers.
    DmaRegisters,
    /// GPU register pair (`GP0`/`GPUSTAT`).
    GpuRegisters,
    /// BIOS ROM window.
    Bios,
    /// Open bus: reads return a fill value, writes are dropped.
    Unmapped,
}

/// Strips the KSEG segment bits from `addr`, producing a physical address.
#[must_use]
pub const fn mask_region(addr: u32) -> u32 {
    addr & REGION_MASK
}

/// Decodes a masked physical address into its bus region.
#[must_use]
pub const fn decode_region(masked: u32) -> Region {
    if masked < RAM_END {
        Region::Ram
    } else if masked >= SCRATCHPAD_START && masked < SCRATCHPAD_END {
        Region::Scratchpad
    } else if masked >= IO_PORTS_START && masked < IO_PORTS_END {
        Region::IoPorts
    } else if masked >= DMA_REGISTERS_START && masked < DMA_REGISTERS_END {
        Region::DmaRegisters
    } else if masked >= GPU_REGISTERS_START && masked < GPU_REGISTERS_END {
        Region::GpuRegisters
    } else if masked >= BIOS_START && masked < BIOS_END {
        Region::Bios
    } else {
        Region::Unmapped
    }
}
