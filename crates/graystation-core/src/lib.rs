//! Graystation core: a deterministic PSX (R3000 + bus) emulator.
//!
//! The crate is organized around two halves. [`Cpu`] holds the
//! architectural state and the branch/load delay machinery; [`Bus`] owns
//! every memory-mapped device and routes physical addresses to them.
//! [`Machine`] glues the halves together and is the intended entry point:
//!
//! ```
//! use graystation_core::{Bios, Machine, BIOS_SIZE};
//!
//! let bios = Bios::from_image(vec![0; BIOS_SIZE])?;
//! let mut machine = Machine::new(bios);
//! machine.run(16);
//! # Ok::<(), graystation_core::BiosError>(())
//! ```

pub mod bus;
pub mod cpu;
pub mod disasm;
pub mod dma;
pub mod exe;
pub mod gpu;
pub mod machine;
pub mod memory;

pub use bus::{Bus, BusDiagnostics};
pub use cpu::cop0::{Cop0, Exception};
pub use cpu::opcode::{Opcode, Reg};
pub use cpu::{Cpu, RESET_PC};
pub use disasm::{disassemble, Disassembly};
pub use dma::{Channel, Dma};
pub use exe::{ExeError, ExeImage, EXE_HEADER_SIZE};
pub use gpu::Gpu;
pub use machine::{
    Machine, MachineConfig, NullTrace, TraceEvent, TraceSink, SHELL_ENTRY_PC,
};
pub use memory::{Bios, BiosError, Ram, Scratchpad, BIOS_SIZE, RAM_SIZE, SCRATCHPAD_SIZE};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
