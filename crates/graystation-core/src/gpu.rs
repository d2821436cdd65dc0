//! GPU register stub.
//!
//! Only the register-level surface exists: `GP0` command words are logged
//! and dropped, `GPUSTAT` is a writable latch read back verbatim. No
//! rasterisation, VRAM, or command FIFO.

use tracing::debug;

/// Physical address of the `GP0` command port.
pub const GP0_ADDRESS: u32 = 0x1F80_1810;
/// Physical address of the `GPUSTAT` status register.
pub const GPUSTAT_ADDRESS: u32 = 0x1F80_1814;

/// Stubbed GPU exposing the `GP0`/`GPUSTAT` register pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Gpu {
    gpustat: u32,
}

impl Gpu {
    /// Creates a GPU with `GPUSTAT` cleared.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current `GPUSTAT` value.
    #[must_use]
    pub const fn gpustat(&self) -> u32 {
        self.gpustat
    }

    /// Handles a word read from the GPU register block.
    #[must_use]
    pub fn read_word(&self, addr: u32) -> u32 {
        match addr {
            GPUSTAT_ADDRESS => self.gpustat,
            _ => {
                debug!(addr = format_args!("0x{addr:08X}"), "unhandled GPU read");
                0
            }
        }
    }

    /// Handles a word store to the GPU register block.
    pub fn store_word(&mut self, addr: u32, value: u32) {
        match addr {
            GP0_ADDRESS => {
                debug!(
                    command = format_args!("0x{value:08X}"),
                    "GP0 command dropped"
                );
            }
            GPUSTAT_ADDRESS => self.gpustat = value,
            _ => {
                debug!(addr = format_args!("0x{addr:08X}"), "unhandled GPU write");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Gpu, GP0_ADDRESS, GPUSTAT_ADDRESS};

    #[test]
    fn gpustat_reads_back_what_was_stored() {
        let mut gpu = Gpu::new();
        assert_eq!(gpu.read_word(GPUSTAT_ADDRESS), 0);
        gpu.store_word(GPUSTAT_ADDRESS, 0x1480_2000);
        assert_eq!(gpu.read_word(GPUSTAT_ADDRESS), 0x1480_2000);
        assert_eq!(gpu.gpustat(), 0x1480_2000);
    }

    #[test]
    fn gp0_commands_are_dropped() {
        let mut gpu = Gpu::new();
        gpu.store_word(GP0_ADDRESS, 0xA000_0000);
        assert_eq!(gpu.read_word(GP0_ADDRESS), 0);
        assert_eq!(gpu.gpustat(), 0);
    }
}
