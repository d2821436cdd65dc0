//! Whole-machine facade: CPU plus bus, tick loop, tracing, and
//! executable sideloading.

use crate::bus::Bus;
use crate::cpu::cop0::Exception;
use crate::cpu::opcode::Reg;
use crate::cpu::Cpu;
use crate::exe::ExeImage;
use crate::memory::Bios;
use tracing::info;

/// PC at which the BIOS shell takes over, used to time deferred
/// sideloading.
pub const SHELL_ENTRY_PC: u32 = 0x8003_0000;

/// Machine-level configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MachineConfig {
    /// PC that triggers a deferred sideload (the BIOS shell entry).
    pub shell_entry_pc: u32,
    /// Whether bytes written through the BIOS `putchar` stubs are kept.
    pub tty_capture: bool,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            shell_entry_pc: SHELL_ENTRY_PC,
            tty_capture: true,
        }
    }
}

/// One observable pipeline event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEvent {
    /// An instruction word was fetched and dispatched.
    Instruction {
        /// Fetch address.
        pc: u32,
        /// Raw instruction word.
        word: u32,
    },
    /// An exception redirected control flow.
    Exception {
        /// The cause.
        exception: Exception,
        /// PC of the faulting instruction.
        pc: u32,
    },
}

/// Receiver for [`TraceEvent`]s, fed by [`Machine::tick_traced`].
pub trait TraceSink {
    /// Called once per event, in program order.
    fn on_event(&mut self, event: TraceEvent);
}

/// A sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTrace;

impl TraceSink for NullTrace {
    fn on_event(&mut self, _event: TraceEvent) {}
}

impl TraceSink for Vec<TraceEvent> {
    fn on_event(&mut self, event: TraceEvent) {
        self.push(event);
    }
}

/// The emulated machine.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Machine {
    cpu: Cpu,
    bus: Bus,
    config: MachineConfig,
    pending_exe: Option<ExeImage>,
}

impl Machine {
    /// Creates a machine at power-on around the given BIOS image.
    #[must_use]
    pub fn new(bios: Bios) -> Self {
        Self::with_config(bios, MachineConfig::default())
    }

    /// Creates a machine with explicit configuration.
    #[must_use]
    pub fn with_config(bios: Bios, config: MachineConfig) -> Self {
        Self {
            cpu: Cpu::new(),
            bus: Bus::new(bios),
            config,
            pending_exe: None,
        }
    }

    /// Borrows the CPU.
    #[must_use]
    pub const fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    /// Mutably borrows the CPU.
    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    /// Borrows the bus.
    #[must_use]
    pub const fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Mutably borrows the bus.
    pub fn bus_mut(&mut self) -> &mut Bus {
        &mut self.bus
    }

    /// Advances the machine by one instruction.
    pub fn tick(&mut self) {
        self.tick_traced(&mut NullTrace);
    }

    /// Advances the machine by one instruction, reporting pipeline events
    /// to `trace`.
    pub fn tick_traced(&mut self, trace: &mut dyn TraceSink) {
        if self.pending_exe.is_some() && self.cpu.pc() == self.config.shell_entry_pc {
            if let Some(exe) = self.pending_exe.take() {
                self.apply_exe(&exe);
            }
        }
        self.cpu.tick(&mut self.bus, trace);
        self.bus.run_dma();
        if !self.config.tty_capture {
            self.cpu.clear_tty_output();
        }
    }

    /// Runs `ticks` instructions.
    pub fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    /// Drains the bytes captured from the BIOS `putchar` stubs.
    pub fn take_tty_output(&mut self) -> Vec<u8> {
        self.cpu.take_tty_output()
    }

    /// Loads an executable immediately: payload into RAM, then entry
    /// point, `$gp`, and (unless zero) `$sp`/`$fp`.
    pub fn sideload_exe(&mut self, exe: &ExeImage) {
        self.apply_exe(exe);
    }

    /// Defers a sideload until the CPU reaches the BIOS shell entry, by
    /// which point the kernel is initialized enough to host the program.
    pub fn sideload_exe_at_shell(&mut self, exe: ExeImage) {
        self.pending_exe = Some(exe);
    }

    fn apply_exe(&mut self, exe: &ExeImage) {
        info!(
            entry = format_args!("0x{:08X}", exe.entry_pc()),
            load = format_args!("0x{:08X}", exe.load_address()),
            bytes = exe.payload().len(),
            "sideloading executable"
        );
        self.bus
            .ram_mut()
            .store_bytes(exe.load_address(), exe.payload());
        self.cpu.set_pc(exe.entry_pc());
        self.cpu.set_reg(Reg(28), exe.initial_gp());
        let sp = exe.initial_sp();
        if sp != 0 {
            self.cpu.set_reg(Reg(29), sp);
            self.cpu.set_reg(Reg(30), sp);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Machine, MachineConfig, SHELL_ENTRY_PC};
    use crate::cpu::opcode::Reg;
    use crate::exe::{ExeImage, EXE_HEADER_SIZE};
    use crate::memory::{Bios, BIOS_SIZE};

    fn machine() -> Machine {
        Machine::new(Bios::from_image(vec![0; BIOS_SIZE]).expect("image has the right size"))
    }

    fn exe(fields: &[(usize, u32)], payload: &[u8]) -> ExeImage {
        let mut image = vec![0_u8; EXE_HEADER_SIZE];
        for &(offset, value) in fields {
            image[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        }
        image.extend_from_slice(payload);
        ExeImage::parse(&image).expect("header is well-formed")
    }

    #[test]
    fn immediate_sideload_installs_payload_and_registers() {
        let mut machine = machine();
        let exe = exe(
            &[
                (0x10, 0x8001_0000),
                (0x14, 0x8003_4000),
                (0x18, 0x8001_0000),
                (0x1C, 1),
                (0x30, 0x801F_FF00),
            ],
            &[0x78, 0x56, 0x34, 0x12],
        );
        machine.sideload_exe(&exe);
        assert_eq!(machine.cpu().pc(), 0x8001_0000);
        assert_eq!(machine.cpu().reg(Reg(28)), 0x8003_4000);
        assert_eq!(machine.cpu().reg(Reg(29)), 0x801F_FF00);
        assert_eq!(machine.cpu().reg(Reg(30)), 0x801F_FF00);
        assert_eq!(machine.bus().ram().read_word(0x0001_0000), 0x1234_5678);
    }

    #[test]
    fn zero_sp_leaves_the_stack_registers_alone() {
        let mut machine = machine();
        machine.cpu_mut().set_reg(Reg(29), 0x1111_1111);
        machine.cpu_mut().set_reg(Reg(30), 0x2222_2222);
        let exe = exe(&[(0x10, 0x8001_0000)], &[]);
        machine.sideload_exe(&exe);
        assert_eq!(machine.cpu().reg(Reg(29)), 0x1111_1111);
        assert_eq!(machine.cpu().reg(Reg(30)), 0x2222_2222);
    }

    #[test]
    fn default_config_targets_the_shell_entry() {
        assert_eq!(MachineConfig::default().shell_entry_pc, SHELL_ENTRY_PC);
        assert!(MachineConfig::default().tty_capture);
    }
}
