//! Implementation of the Sharp LR35902 (SM83) CPU core.
//!
//! The CPU is a control-store machine: every instruction is a short
//! program of microcycle control words (see `control`), and `step`
//! executes exactly one word (one machine cycle) per call, issuing
//! at most one bus transaction.

mod alu;
mod control;
mod instructions;
mod registers;

use thiserror::Error;

use self::control::{Cond, Control, Reg8, Reg16, SysOp};
use self::instructions::InstructionSet;
use self::registers::{Flags, Registers};
use crate::bus::Bus;

/// Errors the stepper can surface. None of them are recoverable; the
/// host must stop driving the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CpuError {
    /// One of the eleven undefined opcodes was dispatched.
    #[error("unimplemented opcode {opcode:#04x} at {pc:#06x}")]
    UnimplementedOpcode { opcode: u8, pc: u16 },
}

/// A snapshot of the architectural CPU state, exchangeable only at
/// instruction boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuState {
    pub a: u8,
    pub f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub pc: u16,
    pub sp: u16,
    pub ime: bool,
}

/// Which control-word table the program pointer is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Table {
    Primary,
    Prefixed,
    Interrupt,
}

/// The program pointer: a word within one program of one table.
#[derive(Debug, Clone, Copy)]
struct ProgramPtr {
    table: Table,
    opcode: u8,
    index: usize,
}

/// Implementation of the Sharp LR35902 CPU.
pub struct Cpu {
    /// The immutable control store, built once.
    instr: InstructionSet,

    /// The architectural register file.
    reg: Registers,

    /// The Interrupt Master Enable flag.
    ime: bool,

    /// Waiting for an interrupt after HALT.
    halting: bool,

    /// The next read through PC must not advance it. Set when HALT is
    /// executed with IME clear and an interrupt already pending.
    halt_bug: bool,

    /// The bus-data latch of the current microcycle.
    data: u8,

    /// The 16-bit temporary used for immediate operands, addresses and
    /// interrupt vectors.
    temp: u16,

    /// The latched branch condition.
    cond_flag: bool,

    ptr: ProgramPtr,
}

impl Cpu {
    /// Create a new `Cpu` instance in the post-boot state.
    pub fn new() -> Self {
        let mut cpu = Self {
            instr: InstructionSet::new(),
            reg: Registers::new(),
            ime: false,
            halting: false,
            halt_bug: false,
            data: 0,
            temp: 0,
            cond_flag: false,
            ptr: ProgramPtr {
                table: Table::Primary,
                opcode: 0x00,
                index: 0,
            },
        };

        cpu.reset();
        cpu
    }

    /// Re-establish the documented post-boot state. The program pointer
    /// rests on the NOP program, so the first step fetches the first
    /// real instruction from 0x0100.
    pub fn reset(&mut self) {
        self.reg = Registers::new();
        self.reg.pc = 0x0100;

        self.ime = false;
        self.halting = false;
        self.halt_bug = false;

        self.data = 0;
        self.temp = 0;
        self.cond_flag = false;

        self.ptr = ProgramPtr {
            table: Table::Primary,
            opcode: 0x00,
            index: 0,
        };
    }

    /// Is the program pointer resting on a fetch word?
    ///
    /// This is the instruction boundary: the previous instruction has
    /// fully retired and the next opcode has not been fetched yet.
    pub fn is_fetching(&self) -> bool {
        self.current().decode
    }

    /// Snapshot the architectural state. Only valid between
    /// instructions.
    pub fn state(&self) -> CpuState {
        assert!(self.is_fetching(), "CPU state read mid-instruction");

        CpuState {
            a: self.reg.a,
            f: self.reg.f.bits(),
            b: self.reg.b,
            c: self.reg.c,
            d: self.reg.d,
            e: self.reg.e,
            h: self.reg.h,
            l: self.reg.l,
            pc: self.reg.pc,
            sp: self.reg.sp,
            ime: self.ime,
        }
    }

    /// Overwrite the architectural state. Only valid between
    /// instructions.
    pub fn set_state(&mut self, state: &CpuState) {
        assert!(self.is_fetching(), "CPU state written mid-instruction");

        self.reg.a = state.a;
        self.reg.f = Flags::from_bits_truncate(state.f);
        self.reg.b = state.b;
        self.reg.c = state.c;
        self.reg.d = state.d;
        self.reg.e = state.e;
        self.reg.h = state.h;
        self.reg.l = state.l;
        self.reg.pc = state.pc;
        self.reg.sp = state.sp;
        self.ime = state.ime;
    }

    /// Execute one microcycle.
    ///
    /// Order per cycle: bus transaction of the current word, program
    /// pointer advance (decoding the byte just read, or skipping
    /// not-taken branch words), then the condition/load/ALU/system
    /// operations of the newly current word. A word's register
    /// operations therefore run in the same call as its predecessor's
    /// bus transaction, which is what lets the final fetch word overlap
    /// the end of one instruction with the start of the next.
    pub fn step<B: Bus>(&mut self, bus: &mut B) -> Result<(), CpuError> {
        if self.halting && !bus.interrupts().interrupt_pending() {
            return Ok(());
        }

        self.halting = false;

        let mut ctrl = self.current();

        // Interrupts are only dispatched between instructions, and only
        // with IME set. The pending fetch is abandoned; PC still points
        // at the next unexecuted instruction.
        if ctrl.decode && self.ime && bus.interrupts().interrupt_pending() {
            self.temp = bus.interrupts().accept_interrupt();
            self.ptr = ProgramPtr {
                table: Table::Interrupt,
                opcode: 0,
                index: 0,
            };

            ctrl = self.current();
        }

        if ctrl.read {
            let addr = self.get16(ctrl.adr.unwrap());

            self.data = bus.read_mem(addr);
            self.set8(ctrl.mem_reg, self.data);

            if ctrl.adr == Some(Reg16::Sp) {
                self.reg.sp = self.reg.sp.wrapping_add(1);
            }
        }

        if ctrl.write {
            if ctrl.adr == Some(Reg16::Sp) {
                self.reg.sp = self.reg.sp.wrapping_sub(1);
            }

            let addr = self.get16(ctrl.adr.unwrap());
            let value = self.get8(ctrl.mem_reg);

            bus.write_mem(addr, value);
        }

        if ctrl.decode {
            if self.instr.ops[self.data as usize].is_empty() {
                return Err(CpuError::UnimplementedOpcode {
                    opcode: self.data,
                    pc: self.reg.pc.wrapping_sub(1),
                });
            }

            self.ptr = ProgramPtr {
                table: Table::Primary,
                opcode: self.data,
                index: 0,
            };
        } else if ctrl.decode_cb {
            self.ptr = ProgramPtr {
                table: Table::Prefixed,
                opcode: self.data,
                index: 0,
            };
        } else {
            self.ptr.index += 1;
        }

        let mut ctrl = self.current();

        match ctrl.cond_op {
            Some(Cond::Nz) => self.cond_flag = !self.reg.f.contains(Flags::Z),
            Some(Cond::Z) => self.cond_flag = self.reg.f.contains(Flags::Z),
            Some(Cond::Nc) => self.cond_flag = !self.reg.f.contains(Flags::C),
            Some(Cond::C) => self.cond_flag = self.reg.f.contains(Flags::C),
            Some(Cond::Always) => self.cond_flag = true,

            // A not-taken branch skips its remaining cycles.
            Some(Cond::Check) => {
                while !self.cond_flag && self.current().cond_op == Some(Cond::Check) {
                    self.ptr.index += 1;
                }

                ctrl = self.current();
            }

            None => {}
        }

        if let Some((src, dst)) = ctrl.ld {
            let value = self.get8(src);
            self.set8(dst, value);
        }

        self.execute_alu(&ctrl);

        match ctrl.sys_op {
            Some(SysOp::Ei) => self.ime = true,
            Some(SysOp::Di) => self.ime = false,

            Some(SysOp::Halt) => {
                let pending = bus.interrupts().interrupt_pending();

                if !self.ime && pending {
                    self.halt_bug = true;
                }

                self.halting = !pending;
            }

            // Acknowledged but not emulated further.
            Some(SysOp::Stop) => log::warn!("STOP executed; low-power mode is not emulated"),

            None => {}
        }

        Ok(())
    }

    fn current(&self) -> Control {
        match self.ptr.table {
            Table::Primary => self.instr.ops[self.ptr.opcode as usize][self.ptr.index],
            Table::Prefixed => self.instr.cb_ops[self.ptr.opcode as usize][self.ptr.index],
            Table::Interrupt => self.instr.interrupt[self.ptr.index],
        }
    }

    fn get8(&self, reg: Reg8) -> u8 {
        match reg {
            Reg8::A => self.reg.a,
            Reg8::F => self.reg.f.bits(),
            Reg8::B => self.reg.b,
            Reg8::C => self.reg.c,
            Reg8::D => self.reg.d,
            Reg8::E => self.reg.e,
            Reg8::H => self.reg.h,
            Reg8::L => self.reg.l,
            Reg8::PcHigh => (self.reg.pc >> 8) as u8,
            Reg8::PcLow => self.reg.pc as u8,
            Reg8::SpHigh => (self.reg.sp >> 8) as u8,
            Reg8::SpLow => self.reg.sp as u8,
            Reg8::TempHigh => (self.temp >> 8) as u8,
            Reg8::TempLow => self.temp as u8,
            Reg8::Data => self.data,
        }
    }

    fn set8(&mut self, reg: Reg8, value: u8) {
        match reg {
            Reg8::A => self.reg.a = value,
            Reg8::F => self.reg.f = Flags::from_bits_truncate(value),
            Reg8::B => self.reg.b = value,
            Reg8::C => self.reg.c = value,
            Reg8::D => self.reg.d = value,
            Reg8::E => self.reg.e = value,
            Reg8::H => self.reg.h = value,
            Reg8::L => self.reg.l = value,
            Reg8::PcHigh => self.reg.pc = (self.reg.pc & 0x00FF) | ((value as u16) << 8),
            Reg8::PcLow => self.reg.pc = (self.reg.pc & 0xFF00) | value as u16,
            Reg8::SpHigh => self.reg.sp = (self.reg.sp & 0x00FF) | ((value as u16) << 8),
            Reg8::SpLow => self.reg.sp = (self.reg.sp & 0xFF00) | value as u16,
            Reg8::TempHigh => self.temp = (self.temp & 0x00FF) | ((value as u16) << 8),
            Reg8::TempLow => self.temp = (self.temp & 0xFF00) | value as u16,
            Reg8::Data => self.data = value,
        }
    }

    fn get16(&mut self, reg: Reg16) -> u16 {
        match reg {
            Reg16::Bc => self.reg.bc(),
            Reg16::De => self.reg.de(),
            Reg16::Hl => self.reg.hl(),

            Reg16::HlIncr => {
                let value = self.reg.hl();
                self.reg.set_hl(value.wrapping_add(1));
                value
            }

            Reg16::HlDecr => {
                let value = self.reg.hl();
                self.reg.set_hl(value.wrapping_sub(1));
                value
            }

            // Reading through PC advances it, except once after the
            // halt bug has been armed.
            Reg16::Pc => {
                let value = self.reg.pc;
                self.reg.pc = self.reg.pc.wrapping_add(1);

                if self.halt_bug {
                    self.reg.pc = value;
                    self.halt_bug = false;
                }

                value
            }

            Reg16::Sp => self.reg.sp,
            Reg16::Temp => self.temp,
            Reg16::TempPlus1 => self.temp.wrapping_add(1),
            Reg16::HighTemp => 0xFF00 | (self.temp & 0x00FF),
            Reg16::HighC => 0xFF00 | self.reg.c as u16,
            Reg16::HlPlus1 => self.reg.hl().wrapping_add(1),
        }
    }

    fn set16(&mut self, reg: Reg16, value: u16) {
        match reg {
            Reg16::Bc => self.reg.set_bc(value),
            Reg16::De => self.reg.set_de(value),
            Reg16::Hl => self.reg.set_hl(value),
            Reg16::Pc => self.reg.pc = value,
            Reg16::Sp => self.reg.sp = value,
            Reg16::Temp => self.temp = value,

            _ => unreachable!("{:?} is not a writable 16-bit register", reg),
        }
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interrupts::InterruptController;

    /// Flat 64 KiB of RAM with an interrupt controller attached.
    struct RamBus {
        mem: Vec<u8>,
        ic: InterruptController,
    }

    impl RamBus {
        fn with_program(program: &[u8]) -> Self {
            let mut mem = vec![0; 0x10000];
            mem[0x0100..0x0100 + program.len()].copy_from_slice(program);

            Self {
                mem,
                ic: InterruptController::new(),
            }
        }
    }

    impl Bus for RamBus {
        fn read_mem(&mut self, addr: u16) -> u8 {
            self.mem[addr as usize]
        }

        fn write_mem(&mut self, addr: u16, value: u8) {
            self.mem[addr as usize] = value;
        }

        fn interrupts(&mut self) -> &mut InterruptController {
            &mut self.ic
        }
    }

    fn run_steps(cpu: &mut Cpu, bus: &mut RamBus, steps: u32) {
        for _ in 0..steps {
            cpu.step(bus).unwrap();
        }
    }

    #[test]
    fn reset_state() {
        let cpu = Cpu::new();
        let state = cpu.state();

        assert_eq!(state.pc, 0x0100);
        assert_eq!(state.sp, 0);
        assert_eq!(state.a, 0);
        assert_eq!(state.f, 0);
        assert!(!state.ime);
        assert!(cpu.is_fetching());
    }

    #[test]
    fn f_register_keeps_only_the_flag_nibble() {
        let mut cpu = Cpu::new();

        for value in 0..=0xFF_u16 {
            let mut state = cpu.state();
            state.f = value as u8;
            cpu.set_state(&state);

            assert_eq!(cpu.state().f, (value as u8) & 0xF0);
        }
    }

    #[test]
    fn loads_and_adds_cycle_accurately() {
        // LD A, 0x42; LD B, 0x17; ADD A, B
        let mut bus = RamBus::with_program(&[0x3E, 0x42, 0x06, 0x17, 0x80]);
        let mut cpu = Cpu::new();

        // Fetch + 2 + 2 cycles, plus the decode cycle of ADD in which
        // the addition itself retires.
        run_steps(&mut cpu, &mut bus, 5);

        let state = cpu.state();
        assert_eq!(state.a, 0x59);
        assert_eq!(state.b, 0x17);
        assert_eq!(state.f, 0x00);
        assert_eq!(state.pc, 0x0105);
    }

    #[test]
    fn unimplemented_opcode_surfaces_an_error() {
        // LD A, 1 followed by the undefined 0xD3.
        let mut bus = RamBus::with_program(&[0x3E, 0x01, 0xD3]);
        let mut cpu = Cpu::new();

        run_steps(&mut cpu, &mut bus, 2);
        assert_eq!(cpu.state().a, 0x01);

        assert_eq!(
            cpu.step(&mut bus),
            Err(CpuError::UnimplementedOpcode {
                opcode: 0xD3,
                pc: 0x0102
            })
        );
    }

    #[test]
    fn halt_bug_duplicates_the_following_byte() {
        // HALT with IME clear and a pending interrupt, then LD A, d8.
        // The operand fetch re-reads the LD opcode itself.
        let mut bus = RamBus::with_program(&[0x76, 0x3E, 0x42]);
        bus.ic.set_ie(0x04);
        bus.ic.set_if(0x04);

        let mut cpu = Cpu::new();

        // Fetch HALT, then fetch LD (arming the bug in between), then
        // the LD operand read that fails to advance PC.
        run_steps(&mut cpu, &mut bus, 3);

        let state = cpu.state();
        assert_eq!(state.a, 0x3E);
        assert_eq!(state.pc, 0x0102);
    }

    #[test]
    fn halting_waits_for_an_interrupt_request() {
        let mut bus = RamBus::with_program(&[0x76, 0x00, 0x00]);
        let mut cpu = Cpu::new();

        // Fetch and execute HALT.
        run_steps(&mut cpu, &mut bus, 1);

        // The CPU now idles; PC stays put.
        run_steps(&mut cpu, &mut bus, 10);
        assert_eq!(cpu.state().pc, 0x0101);

        // An enabled request wakes it up; with IME clear execution just
        // continues after the HALT.
        bus.ic.set_ie(0x04);
        bus.ic.set_if(0x04);
        run_steps(&mut cpu, &mut bus, 1);
        assert_eq!(cpu.state().pc, 0x0102);
    }
}
