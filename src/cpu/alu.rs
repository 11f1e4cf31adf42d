//! The ALU stage of the stepper.
//!
//! One control word carries at most one of these operations; flag
//! behaviour follows the hardware exactly, including the shared 9-bit
//! adder for the add/subtract/compare family.

use super::control::{AluOp, Control};
use super::registers::Flags;
use super::Cpu;

impl Cpu {
    /// Execute the ALU operation of a control word, if any.
    pub(super) fn execute_alu(&mut self, ctrl: &Control) {
        let Some(alu_op) = ctrl.alu_op else {
            return;
        };

        match alu_op {
            // Subtraction is carried out on the shared adder by
            // inverting the operand and complementing the carry; the
            // borrow flags fall out of the same XORs as the add flags.
            AluOp::Add | AluOp::Sub | AluOp::Cp => {
                let mut carry = ctrl.with_carry && self.reg.f.contains(Flags::C);
                let mut operand = self.get8(ctrl.alu_r8.unwrap());

                self.reg.f = Flags::empty();

                if alu_op != AluOp::Add {
                    operand = !operand;
                    carry = !carry;
                    self.reg.f.insert(Flags::N | Flags::H | Flags::C);
                }

                let result = operand as u16 + self.reg.a as u16 + carry as u16;

                if result & 0x100 != 0 {
                    self.reg.f.toggle(Flags::C);
                }

                if (result ^ operand as u16 ^ self.reg.a as u16) & 0x10 != 0 {
                    self.reg.f.toggle(Flags::H);
                }

                if result & 0xFF == 0 {
                    self.reg.f.insert(Flags::Z);
                }

                if alu_op != AluOp::Cp {
                    self.reg.a = result as u8;
                }
            }

            AluOp::And | AluOp::Xor | AluOp::Or => {
                let operand = self.get8(ctrl.alu_r8.unwrap());

                self.reg.f = Flags::empty();

                match alu_op {
                    AluOp::And => {
                        self.reg.f.insert(Flags::H);
                        self.reg.a &= operand;
                    }
                    AluOp::Xor => self.reg.a ^= operand,
                    AluOp::Or => self.reg.a |= operand,

                    _ => unreachable!(),
                }

                if self.reg.a == 0 {
                    self.reg.f.insert(Flags::Z);
                }
            }

            AluOp::Inc | AluOp::Dec => {
                let reg = ctrl.alu_r8.unwrap();
                let mut value = self.get8(reg);

                self.reg.f.remove(Flags::Z | Flags::N | Flags::H);

                if alu_op == AluOp::Inc {
                    value = value.wrapping_add(1);

                    if value & 0x0F == 0x00 {
                        self.reg.f.insert(Flags::H);
                    }
                } else {
                    self.reg.f.insert(Flags::N);
                    value = value.wrapping_sub(1);

                    if value & 0x0F == 0x0F {
                        self.reg.f.insert(Flags::H);
                    }
                }

                if value == 0 {
                    self.reg.f.insert(Flags::Z);
                }

                self.set8(reg, value);
            }

            AluOp::Daa => {
                let mut value = self.reg.a as u16;

                if self.reg.f.contains(Flags::N) {
                    if self.reg.f.contains(Flags::H) {
                        value = value.wrapping_sub(0x06);
                    }

                    if self.reg.f.contains(Flags::C) {
                        value = value.wrapping_sub(0x60);
                    }
                } else {
                    if self.reg.f.contains(Flags::H) || (value & 0x0F) > 0x09 {
                        value += 0x06;
                    }

                    if self.reg.f.contains(Flags::C) || (value & 0xFFF0) > 0x90 {
                        value += 0x60;
                    }

                    if value & 0x100 != 0 {
                        self.reg.f.insert(Flags::C);
                    }
                }

                self.reg.a = value as u8;

                self.reg.f.remove(Flags::Z | Flags::H);
                if self.reg.a == 0 {
                    self.reg.f.insert(Flags::Z);
                }
            }

            AluOp::Cpl => {
                self.reg.f.insert(Flags::N | Flags::H);
                self.reg.a = !self.reg.a;
            }

            AluOp::Scf => {
                self.reg.f.remove(Flags::N | Flags::H);
                self.reg.f.insert(Flags::C);
            }

            AluOp::Ccf => {
                self.reg.f.remove(Flags::N | Flags::H);
                self.reg.f.toggle(Flags::C);
            }

            AluOp::Rl | AluOp::Rr | AluOp::Sla | AluOp::Sra | AluOp::Srl => {
                let left = matches!(alu_op, AluOp::Rl | AluOp::Sla);
                let reg = ctrl.alu_r8.unwrap();
                let mut value = self.get8(reg);

                let carry_out = value & if left { 0x80 } else { 0x01 } != 0;

                // With `with_carry` the bit rotates straight around;
                // otherwise it rotates through the carry flag. SRA
                // duplicates the sign bit instead.
                let mut carry_in = if ctrl.with_carry {
                    carry_out
                } else {
                    self.reg.f.contains(Flags::C)
                };

                if alu_op == AluOp::Sra {
                    carry_in = value & 0x80 != 0;
                }

                value = match alu_op {
                    AluOp::Rl => (value << 1) | carry_in as u8,
                    AluOp::Rr | AluOp::Sra => (value >> 1) | ((carry_in as u8) << 7),
                    AluOp::Sla => value << 1,
                    AluOp::Srl => value >> 1,

                    _ => unreachable!(),
                };

                self.reg.f = Flags::empty();

                if !ctrl.ignore_zero && value == 0 {
                    self.reg.f.insert(Flags::Z);
                }

                if carry_out {
                    self.reg.f.insert(Flags::C);
                }

                self.set8(reg, value);
            }

            AluOp::Swap => {
                let reg = ctrl.alu_r8.unwrap();
                let value = self.get8(reg).rotate_left(4);

                self.reg.f = Flags::empty();
                if value == 0 {
                    self.reg.f.insert(Flags::Z);
                }

                self.set8(reg, value);
            }

            AluOp::Bit => {
                let value = self.get8(ctrl.alu_r8.unwrap());

                self.reg.f.remove(Flags::Z | Flags::N);
                self.reg.f.insert(Flags::H);

                if value & ctrl.mask == 0 {
                    self.reg.f.insert(Flags::Z);
                }
            }

            AluOp::Res => {
                let reg = ctrl.alu_r8.unwrap();
                let value = self.get8(reg) & !ctrl.mask;

                self.set8(reg, value);
            }

            AluOp::Set => {
                let reg = ctrl.alu_r8.unwrap();
                let value = self.get8(reg) | ctrl.mask;

                self.set8(reg, value);
            }

            AluOp::SpAdjust => {
                let adjust = self.temp as u8 as i8 as u16;

                self.reg.f = Flags::empty();

                let result = self.reg.sp.wrapping_add(adjust);

                if (result ^ adjust ^ self.reg.sp) & 0x0010 != 0 {
                    self.reg.f.insert(Flags::H);
                }

                if (result ^ adjust ^ self.reg.sp) & 0x0100 != 0 {
                    self.reg.f.insert(Flags::C);
                }

                self.set16(ctrl.alu_r16.unwrap(), result);
            }

            AluOp::PcAdjust => {
                let adjust = self.temp as u8 as i8 as u16;

                self.reg.pc = self.reg.pc.wrapping_add(adjust);
            }

            AluOp::PcSet => {
                self.reg.pc = self.get16(ctrl.alu_r16.unwrap());
            }

            AluOp::PcReset => {
                self.reg.pc = ctrl.mask as u16;
            }

            AluOp::Inc16 => {
                let reg = ctrl.alu_r16.unwrap();
                let value = self.get16(reg).wrapping_add(1);

                self.set16(reg, value);
            }

            AluOp::Dec16 => {
                let reg = ctrl.alu_r16.unwrap();
                let value = self.get16(reg).wrapping_sub(1);

                self.set16(reg, value);
            }

            AluOp::Add16 => {
                self.reg.f.remove(Flags::N | Flags::H | Flags::C);

                let operand = self.get16(ctrl.alu_r16.unwrap());
                let result = operand as u32 + self.reg.hl() as u32;

                if result & 0x1_0000 != 0 {
                    self.reg.f.insert(Flags::C);
                }

                if (result ^ operand as u32 ^ ((self.reg.h as u32) << 8)) & 0x1000 != 0 {
                    self.reg.f.insert(Flags::H);
                }

                self.reg.set_hl(result as u16);
            }
        }
    }
}
