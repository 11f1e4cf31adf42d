//! Composition of the core components into a steppable machine.

use crate::bus::Bus;
use crate::cpu::{Cpu, CpuError};
use crate::interrupts::InterruptController;
use crate::mmu::Mmu;
use crate::timer::Timer;

/// A borrowed view tying the memory map, timer and interrupt
/// controller together into the bus the CPU drives.
struct SystemBus<'a> {
    mmu: &'a mut Mmu,
    timer: &'a mut Timer,
    ic: &'a mut InterruptController,
}

impl Bus for SystemBus<'_> {
    fn read_mem(&mut self, addr: u16) -> u8 {
        self.mmu.read_mem(addr, self.timer, self.ic)
    }

    fn write_mem(&mut self, addr: u16, value: u8) {
        self.mmu.write_mem(addr, value, self.timer, self.ic)
    }

    fn interrupts(&mut self) -> &mut InterruptController {
        self.ic
    }
}

/// The assembled machine: CPU, interrupt controller, timer and flat
/// memory, advanced cooperatively one machine cycle at a time.
pub struct System {
    pub cpu: Cpu,
    pub ic: InterruptController,
    pub timer: Timer,
    pub mmu: Mmu,

    /// PC values `run` stops at.
    pub breakpoints: Vec<u16>,
}

impl System {
    /// Create a new `System` instance in the post-boot state.
    pub fn new() -> Self {
        Self {
            cpu: Cpu::new(),
            ic: InterruptController::new(),
            timer: Timer::new(),
            mmu: Mmu::new(),
            breakpoints: Vec::new(),
        }
    }

    /// Create a system with a ROM image loaded at 0x0000.
    pub fn with_rom(rom: &[u8]) -> Self {
        let mut system = Self::new();
        system.mmu.load(0x0000, rom);
        system
    }

    /// Re-establish the post-boot state of the CPU and timer. Memory
    /// and the interrupt controller are left as they are.
    pub fn reset(&mut self) {
        self.timer.reset();
        self.cpu.reset();
    }

    /// Advance to the next instruction boundary.
    ///
    /// Each iteration is one machine cycle: one timer tick paired with
    /// one CPU microcycle. A halted CPU still consumes cycles, so time
    /// keeps flowing until an interrupt is requested.
    pub fn step(&mut self) -> Result<(), CpuError> {
        loop {
            self.timer.step(&mut self.ic);

            let mut bus = SystemBus {
                mmu: &mut self.mmu,
                timer: &mut self.timer,
                ic: &mut self.ic,
            };

            self.cpu.step(&mut bus)?;

            if self.cpu.is_fetching() {
                return Ok(());
            }
        }
    }

    /// Step until a registered breakpoint is reached.
    pub fn run(&mut self) -> Result<(), CpuError> {
        loop {
            self.step()?;

            if self.breakpoints.contains(&self.cpu.state().pc) {
                return Ok(());
            }
        }
    }
}

impl Default for System {
    fn default() -> Self {
        Self::new()
    }
}
