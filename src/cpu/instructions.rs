//! The instruction table generator.
//!
//! Compiles all 256 primary and 256 CB-prefixed opcodes, plus the
//! interrupt-dispatch sequence, into immutable microcycle programs.
//! Built once at startup and validated structurally; every word of a
//! program corresponds to exactly one machine cycle.
//!
//! The stepper executes a word's register operations (cond/ld/alu/sys)
//! at the end of the step in which the program pointer arrives at the
//! word, i.e. in the same step as the previous word's bus transaction.
//! The generator therefore places an ALU operation that consumes bus
//! data on the word *after* the read that produces it, and snapshots
//! PC halves into the data latch on the push words of CALL/RST so the
//! write stage still sees the old PC after the jump has been applied.

use super::control::{AluOp, Cond, Control, Reg8, Reg16, SysOp};

/// The primary opcodes left undefined by the hardware.
pub const UNDEFINED_OPCODES: [u8; 11] = [
    0xD3, 0xDB, 0xDD, 0xE3, 0xE4, 0xEB, 0xEC, 0xED, 0xF4, 0xFC, 0xFD,
];

/// A microcycle program: one control word per machine cycle.
pub type Program = Vec<Control>;

/// The complete, immutable control store.
pub struct InstructionSet {
    /// Programs for the primary opcode map. Undefined opcodes have
    /// empty programs.
    pub ops: Vec<Program>,

    /// Programs for the CB-prefixed opcode map.
    pub cb_ops: Vec<Program>,

    /// The interrupt-dispatch program.
    pub interrupt: Program,
}

/// A bus read into the named register (and the data latch).
fn read(adr: Reg16, mem_reg: Reg8) -> Control {
    Control {
        read: true,
        adr: Some(adr),
        mem_reg,
        ..Control::default()
    }
}

/// A bus write sourced from the named register (or the data latch).
fn write(adr: Reg16, mem_reg: Reg8) -> Control {
    Control {
        write: true,
        adr: Some(adr),
        mem_reg,
        ..Control::default()
    }
}

/// An internal cycle with no bus transaction.
fn internal() -> Control {
    Control::default()
}

/// Map the register field of an opcode. The (HL) slot is handled by
/// dedicated program shapes and never reaches this.
fn reg8(bits: u8) -> Reg8 {
    match bits & 0x7 {
        0 => Reg8::B,
        1 => Reg8::C,
        2 => Reg8::D,
        3 => Reg8::E,
        4 => Reg8::H,
        5 => Reg8::L,
        7 => Reg8::A,

        _ => unreachable!("(HL) register slot has no direct register"),
    }
}

/// Low half of the register pair selected by bits 4..5 (SP group).
fn pair_lo(bits: u8) -> Reg8 {
    [Reg8::C, Reg8::E, Reg8::L, Reg8::SpLow][(bits & 0x3) as usize]
}

/// High half of the register pair selected by bits 4..5 (SP group).
fn pair_hi(bits: u8) -> Reg8 {
    [Reg8::B, Reg8::D, Reg8::H, Reg8::SpHigh][(bits & 0x3) as usize]
}

/// Low half of the register pair selected by bits 4..5 (AF group,
/// used by PUSH and POP).
fn stack_lo(bits: u8) -> Reg8 {
    [Reg8::C, Reg8::E, Reg8::L, Reg8::F][(bits & 0x3) as usize]
}

/// High half of the register pair selected by bits 4..5 (AF group).
fn stack_hi(bits: u8) -> Reg8 {
    [Reg8::B, Reg8::D, Reg8::H, Reg8::A][(bits & 0x3) as usize]
}

/// Indirect address source selected by bits 4..5: BC, DE, HL+, HL-.
fn mem16(bits: u8) -> Reg16 {
    [Reg16::Bc, Reg16::De, Reg16::HlIncr, Reg16::HlDecr][(bits & 0x3) as usize]
}

/// 16-bit arithmetic operand selected by bits 4..5: BC, DE, HL, SP.
fn arith16(bits: u8) -> Reg16 {
    [Reg16::Bc, Reg16::De, Reg16::Hl, Reg16::Sp][(bits & 0x3) as usize]
}

/// Branch condition selected by bits 3..4.
fn condition(bits: u8) -> Cond {
    [Cond::Nz, Cond::Z, Cond::Nc, Cond::C][(bits & 0x3) as usize]
}

/// The standard 8-way ALU grouping of bits 3..5, as `(op, with_carry)`.
fn alu_entry(bits: u8) -> (AluOp, bool) {
    match bits & 0x7 {
        0 => (AluOp::Add, false),
        1 => (AluOp::Add, true),
        2 => (AluOp::Sub, false),
        3 => (AluOp::Sub, true),
        4 => (AluOp::And, false),
        5 => (AluOp::Xor, false),
        6 => (AluOp::Or, false),
        7 => (AluOp::Cp, false),

        _ => unreachable!(),
    }
}

impl InstructionSet {
    /// Build and validate the control store.
    pub fn new() -> Self {
        let set = Self {
            ops: make_ops(),
            cb_ops: make_cb_ops(),
            interrupt: make_interrupt(),
        };

        set.validate();
        set
    }

    fn validate(&self) {
        let mut undefined = 0;

        for op in &self.ops {
            if op.is_empty() {
                undefined += 1;
                continue;
            }

            validate_program(op);
        }

        assert_eq!(undefined, UNDEFINED_OPCODES.len());

        for op in &self.cb_ops {
            assert!(op.len() == 1 || op.len() == 3);
            validate_program(op);

            for ctrl in op {
                // CB programs carry exactly one plain ALU operation and
                // never touch conditions, system state or re-prefixing.
                assert!(ctrl.cond_op.is_none());
                assert!(ctrl.sys_op.is_none());
                assert!(!ctrl.decode_cb);
            }

            assert!(op.iter().filter(|ctrl| ctrl.alu_op.is_some()).count() == 1);
        }

        assert_eq!(self.interrupt.len(), 5);
        validate_program(&self.interrupt);
    }
}

/// Check the program-level invariants of a single program.
fn validate_program(program: &[Control]) {
    let mut condition_set = false;
    let mut decoded = false;

    for ctrl in program {
        ctrl.validate();

        match ctrl.cond_op {
            Some(Cond::Check) => {
                // The condition must be latched before it is checked,
                // and the terminal fetch can never be skipped.
                assert!(condition_set);
                assert!(!ctrl.decode && !ctrl.decode_cb);
            }

            Some(_) => {
                // At most one word latches the condition.
                assert!(!condition_set);
                condition_set = true;
            }

            None => {}
        }

        // Nothing may follow the decode word.
        assert!(!decoded);
        decoded = ctrl.decode || ctrl.decode_cb;
    }

    assert!(decoded);
}

fn make_ops() -> Vec<Program> {
    let mut ops = Vec::with_capacity(256);

    for op_code in 0..=0xFF_u8 {
        let mut op = Program::new();

        match op_code {
            // NOP
            0x00 => {
                op.push(Control::fetch());
            }

            // CB prefix: fetch the sub-opcode and switch tables.
            0xCB => {
                op.push(Control {
                    read: true,
                    adr: Some(Reg16::Pc),
                    decode_cb: true,
                    ..Control::default()
                });
            }

            // LD (a16), SP
            0x08 => {
                op.push(read(Reg16::Pc, Reg8::TempLow));
                op.push(read(Reg16::Pc, Reg8::TempHigh));
                op.push(write(Reg16::Temp, Reg8::SpLow));
                op.push(write(Reg16::TempPlus1, Reg8::SpHigh));
                op.push(Control::fetch());
            }

            // STOP
            0x10 => {
                op.push(Control {
                    sys_op: Some(SysOp::Stop),
                    ..Control::fetch()
                });
            }

            // JR [cc], r8
            0x18 | 0x20 | 0x28 | 0x30 | 0x38 => {
                let cond = if op_code == 0x18 {
                    Cond::Always
                } else {
                    condition(op_code >> 3)
                };

                op.push(Control {
                    cond_op: Some(cond),
                    ..read(Reg16::Pc, Reg8::TempLow)
                });
                op.push(Control {
                    cond_op: Some(Cond::Check),
                    alu_op: Some(AluOp::PcAdjust),
                    ..internal()
                });
                op.push(Control::fetch());
            }

            // LD rr, d16
            0x01 | 0x11 | 0x21 | 0x31 => {
                op.push(read(Reg16::Pc, pair_lo(op_code >> 4)));
                op.push(read(Reg16::Pc, pair_hi(op_code >> 4)));
                op.push(Control::fetch());
            }

            // ADD HL, rr
            0x09 | 0x19 | 0x29 | 0x39 => {
                op.push(Control {
                    alu_op: Some(AluOp::Add16),
                    alu_r16: Some(arith16(op_code >> 4)),
                    ..internal()
                });
                op.push(Control::fetch());
            }

            // LD (rr), A with the HL+ / HL- forms
            0x02 | 0x12 | 0x22 | 0x32 => {
                op.push(write(mem16(op_code >> 4), Reg8::A));
                op.push(Control::fetch());
            }

            // LD A, (rr) with the HL+ / HL- forms
            0x0A | 0x1A | 0x2A | 0x3A => {
                op.push(read(mem16(op_code >> 4), Reg8::A));
                op.push(Control::fetch());
            }

            // INC rr / DEC rr
            0x03 | 0x13 | 0x23 | 0x33 | 0x0B | 0x1B | 0x2B | 0x3B => {
                let alu_op = if op_code & 0x08 != 0 {
                    AluOp::Dec16
                } else {
                    AluOp::Inc16
                };

                op.push(Control {
                    alu_op: Some(alu_op),
                    alu_r16: Some(arith16(op_code >> 4)),
                    ..internal()
                });
                op.push(Control::fetch());
            }

            // INC (HL) / DEC (HL)
            0x34 | 0x35 => {
                let alu_op = if op_code & 0x1 != 0 { AluOp::Dec } else { AluOp::Inc };

                op.push(read(Reg16::Hl, Reg8::Data));
                op.push(Control {
                    alu_op: Some(alu_op),
                    alu_r8: Some(Reg8::Data),
                    ..write(Reg16::Hl, Reg8::Data)
                });
                op.push(Control::fetch());
            }

            // INC r / DEC r
            0x04 | 0x05 | 0x0C | 0x0D | 0x14 | 0x15 | 0x1C | 0x1D | 0x24 | 0x25 | 0x2C
            | 0x2D | 0x3C | 0x3D => {
                let alu_op = if op_code & 0x1 != 0 { AluOp::Dec } else { AluOp::Inc };

                op.push(Control {
                    alu_op: Some(alu_op),
                    alu_r8: Some(reg8(op_code >> 3)),
                    ..Control::fetch()
                });
            }

            // LD (HL), d8
            0x36 => {
                op.push(read(Reg16::Pc, Reg8::Data));
                op.push(write(Reg16::Hl, Reg8::Data));
                op.push(Control::fetch());
            }

            // LD r, d8
            0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x3E => {
                op.push(read(Reg16::Pc, reg8(op_code >> 3)));
                op.push(Control::fetch());
            }

            // RLCA / RRCA / RLA / RRA. These never set Z.
            0x07 | 0x0F | 0x17 | 0x1F => {
                let alu_op = if op_code & 0x08 != 0 { AluOp::Rr } else { AluOp::Rl };

                op.push(Control {
                    alu_op: Some(alu_op),
                    alu_r8: Some(Reg8::A),
                    with_carry: (op_code & 0x10) == 0,
                    ignore_zero: true,
                    ..Control::fetch()
                });
            }

            // DAA
            0x27 => {
                op.push(Control {
                    alu_op: Some(AluOp::Daa),
                    ..Control::fetch()
                });
            }

            // CPL
            0x2F => {
                op.push(Control {
                    alu_op: Some(AluOp::Cpl),
                    ..Control::fetch()
                });
            }

            // SCF
            0x37 => {
                op.push(Control {
                    alu_op: Some(AluOp::Scf),
                    ..Control::fetch()
                });
            }

            // CCF
            0x3F => {
                op.push(Control {
                    alu_op: Some(AluOp::Ccf),
                    ..Control::fetch()
                });
            }

            // HALT
            0x76 => {
                op.push(Control {
                    sys_op: Some(SysOp::Halt),
                    ..Control::fetch()
                });
            }

            // LD r, (HL)
            0x46 | 0x4E | 0x56 | 0x5E | 0x66 | 0x6E | 0x7E => {
                op.push(read(Reg16::Hl, reg8(op_code >> 3)));
                op.push(Control::fetch());
            }

            // LD (HL), r
            0x70..=0x77 => {
                op.push(write(Reg16::Hl, reg8(op_code)));
                op.push(Control::fetch());
            }

            // LD r, r
            0x40..=0x7F => {
                op.push(Control {
                    ld: Some((reg8(op_code), reg8(op_code >> 3))),
                    ..Control::fetch()
                });
            }

            // ALU A, (HL)
            0x86 | 0x8E | 0x96 | 0x9E | 0xA6 | 0xAE | 0xB6 | 0xBE => {
                let (alu_op, with_carry) = alu_entry(op_code >> 3);

                op.push(read(Reg16::Hl, Reg8::Data));
                op.push(Control {
                    alu_op: Some(alu_op),
                    alu_r8: Some(Reg8::Data),
                    with_carry,
                    ..Control::fetch()
                });
            }

            // ALU A, r
            0x80..=0xBF => {
                let (alu_op, with_carry) = alu_entry(op_code >> 3);

                op.push(Control {
                    alu_op: Some(alu_op),
                    alu_r8: Some(reg8(op_code)),
                    with_carry,
                    ..Control::fetch()
                });
            }

            // ALU A, d8
            0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
                let (alu_op, with_carry) = alu_entry(op_code >> 3);

                op.push(read(Reg16::Pc, Reg8::Data));
                op.push(Control {
                    alu_op: Some(alu_op),
                    alu_r8: Some(Reg8::Data),
                    with_carry,
                    ..Control::fetch()
                });
            }

            // RET cc / RET / RETI. The condition-evaluation cycle is
            // omitted entirely for the unconditional forms.
            0xC0 | 0xC8 | 0xC9 | 0xD0 | 0xD8 | 0xD9 => {
                let conditional = (op_code & 0xF) != 0x9;
                let check = if conditional { Some(Cond::Check) } else { None };

                if conditional {
                    op.push(Control {
                        cond_op: Some(condition(op_code >> 3)),
                        ..internal()
                    });
                }

                op.push(Control {
                    cond_op: check,
                    ..read(Reg16::Sp, Reg8::PcLow)
                });
                op.push(Control {
                    cond_op: check,
                    ..read(Reg16::Sp, Reg8::PcHigh)
                });
                op.push(Control {
                    cond_op: check,
                    ..internal()
                });

                // RETI re-enables interrupts as it completes.
                op.push(Control {
                    sys_op: (op_code == 0xD9).then(|| SysOp::Ei),
                    ..Control::fetch()
                });
            }

            // POP rr
            0xC1 | 0xD1 | 0xE1 | 0xF1 => {
                op.push(read(Reg16::Sp, stack_lo(op_code >> 4)));
                op.push(read(Reg16::Sp, stack_hi(op_code >> 4)));
                op.push(Control::fetch());
            }

            // PUSH rr, with the pre-decrement modelled by a leading
            // internal cycle.
            0xC5 | 0xD5 | 0xE5 | 0xF5 => {
                op.push(internal());
                op.push(write(Reg16::Sp, stack_hi(op_code >> 4)));
                op.push(write(Reg16::Sp, stack_lo(op_code >> 4)));
                op.push(Control::fetch());
            }

            // JP [cc], a16
            0xC2 | 0xC3 | 0xCA | 0xD2 | 0xDA => {
                let cond = if op_code == 0xC3 {
                    Cond::Always
                } else {
                    condition(op_code >> 3)
                };

                op.push(read(Reg16::Pc, Reg8::TempLow));
                op.push(Control {
                    cond_op: Some(cond),
                    ..read(Reg16::Pc, Reg8::TempHigh)
                });
                op.push(Control {
                    cond_op: Some(Cond::Check),
                    alu_op: Some(AluOp::PcSet),
                    alu_r16: Some(Reg16::Temp),
                    ..internal()
                });
                op.push(Control::fetch());
            }

            // JP HL. The fetch reads the target opcode from HL itself,
            // so PC is set to HL+1 in the same microcycle.
            0xE9 => {
                op.push(Control {
                    adr: Some(Reg16::Hl),
                    alu_op: Some(AluOp::PcSet),
                    alu_r16: Some(Reg16::HlPlus1),
                    ..Control::fetch()
                });
            }

            // CALL [cc], a16. The PC pushes snapshot through the data
            // latch so the final write still sees the old PC once the
            // jump target has been applied.
            0xC4 | 0xCC | 0xCD | 0xD4 | 0xDC => {
                let cond = if op_code == 0xCD {
                    Cond::Always
                } else {
                    condition(op_code >> 3)
                };

                op.push(read(Reg16::Pc, Reg8::TempLow));
                op.push(Control {
                    cond_op: Some(cond),
                    ..read(Reg16::Pc, Reg8::TempHigh)
                });
                op.push(Control {
                    cond_op: Some(Cond::Check),
                    ..internal()
                });
                op.push(Control {
                    cond_op: Some(Cond::Check),
                    ..write(Reg16::Sp, Reg8::PcHigh)
                });
                op.push(Control {
                    cond_op: Some(Cond::Check),
                    ld: Some((Reg8::PcLow, Reg8::Data)),
                    alu_op: Some(AluOp::PcSet),
                    alu_r16: Some(Reg16::Temp),
                    ..write(Reg16::Sp, Reg8::Data)
                });
                op.push(Control::fetch());
            }

            // RST n
            0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
                op.push(internal());
                op.push(write(Reg16::Sp, Reg8::PcHigh));
                op.push(Control {
                    ld: Some((Reg8::PcLow, Reg8::Data)),
                    alu_op: Some(AluOp::PcReset),
                    mask: op_code & 0x38,
                    ..write(Reg16::Sp, Reg8::Data)
                });
                op.push(Control::fetch());
            }

            // LDH (a8), A / LDH A, (a8)
            0xE0 | 0xF0 => {
                op.push(read(Reg16::Pc, Reg8::TempLow));

                if op_code & 0x10 != 0 {
                    op.push(read(Reg16::HighTemp, Reg8::A));
                } else {
                    op.push(write(Reg16::HighTemp, Reg8::A));
                }

                op.push(Control::fetch());
            }

            // LD (C), A / LD A, (C)
            0xE2 | 0xF2 => {
                if op_code & 0x10 != 0 {
                    op.push(read(Reg16::HighC, Reg8::A));
                } else {
                    op.push(write(Reg16::HighC, Reg8::A));
                }

                op.push(Control::fetch());
            }

            // ADD SP, r8
            0xE8 => {
                op.push(read(Reg16::Pc, Reg8::TempLow));
                op.push(Control {
                    alu_op: Some(AluOp::SpAdjust),
                    alu_r16: Some(Reg16::Sp),
                    ..internal()
                });
                op.push(internal());
                op.push(Control::fetch());
            }

            // LD HL, SP+r8
            0xF8 => {
                op.push(read(Reg16::Pc, Reg8::TempLow));
                op.push(Control {
                    alu_op: Some(AluOp::SpAdjust),
                    alu_r16: Some(Reg16::Hl),
                    ..internal()
                });
                op.push(Control::fetch());
            }

            // LD (a16), A / LD A, (a16)
            0xEA | 0xFA => {
                op.push(read(Reg16::Pc, Reg8::TempLow));
                op.push(read(Reg16::Pc, Reg8::TempHigh));

                if op_code & 0x10 != 0 {
                    op.push(read(Reg16::Temp, Reg8::A));
                } else {
                    op.push(write(Reg16::Temp, Reg8::A));
                }

                op.push(Control::fetch());
            }

            // LD SP, HL
            0xF9 => {
                op.push(Control {
                    ld: Some((Reg8::L, Reg8::SpLow)),
                    ..internal()
                });
                op.push(Control {
                    ld: Some((Reg8::H, Reg8::SpHigh)),
                    ..Control::fetch()
                });
            }

            // DI
            0xF3 => {
                op.push(Control {
                    sys_op: Some(SysOp::Di),
                    ..Control::fetch()
                });
            }

            // EI
            0xFB => {
                op.push(Control {
                    sys_op: Some(SysOp::Ei),
                    ..Control::fetch()
                });
            }

            // The eleven undefined opcodes keep empty programs; the
            // stepper refuses to dispatch them.
            _ => {}
        }

        ops.push(op);
    }

    ops
}

fn make_cb_ops() -> Vec<Program> {
    let mut ops = Vec::with_capacity(256);

    for op_code in 0..=0xFF_u8 {
        let mut op = Program::new();

        let (alu_op, with_carry) = match op_code >> 3 {
            0 => (AluOp::Rl, true),
            1 => (AluOp::Rr, true),
            2 => (AluOp::Rl, false),
            3 => (AluOp::Rr, false),
            4 => (AluOp::Sla, false),
            5 => (AluOp::Sra, false),
            6 => (AluOp::Swap, false),
            7 => (AluOp::Srl, false),

            0x08..=0x0F => (AluOp::Bit, false),
            0x10..=0x17 => (AluOp::Res, false),
            _ => (AluOp::Set, false),
        };

        let mask = if op_code >= 0x40 {
            1 << ((op_code >> 3) & 0x7)
        } else {
            0
        };

        if (op_code & 0x7) == 6 {
            // (HL) target: read, write back, fetch. BIT leaves the byte
            // unmodified, but the write-back cycle still happens.
            op.push(read(Reg16::Hl, Reg8::Data));
            op.push(Control {
                alu_op: Some(alu_op),
                alu_r8: Some(Reg8::Data),
                with_carry,
                mask,
                ..write(Reg16::Hl, Reg8::Data)
            });
            op.push(Control::fetch());
        } else {
            op.push(Control {
                alu_op: Some(alu_op),
                alu_r8: Some(reg8(op_code)),
                with_carry,
                mask,
                ..Control::fetch()
            });
        }

        ops.push(op);
    }

    ops
}

/// The five-cycle interrupt-dispatch sequence. The first word is
/// consumed by the redirect itself; interrupts are masked on entry, the
/// old PC is pushed, and execution resumes at the vector held in the
/// temporary.
fn make_interrupt() -> Program {
    vec![
        internal(),
        Control {
            sys_op: Some(SysOp::Di),
            ..internal()
        },
        write(Reg16::Sp, Reg8::PcHigh),
        Control {
            ld: Some((Reg8::PcLow, Reg8::Data)),
            alu_op: Some(AluOp::PcSet),
            alu_r16: Some(Reg16::Temp),
            ..write(Reg16::Sp, Reg8::Data)
        },
        Control::fetch(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_and_validates() {
        // `new` runs the full structural validation.
        let set = InstructionSet::new();

        assert_eq!(set.ops.len(), 256);
        assert_eq!(set.cb_ops.len(), 256);
    }

    #[test]
    fn only_the_undefined_opcodes_are_empty() {
        let set = InstructionSet::new();

        for (op_code, op) in set.ops.iter().enumerate() {
            let undefined = UNDEFINED_OPCODES.contains(&(op_code as u8));

            assert_eq!(op.is_empty(), undefined, "opcode {:#04x}", op_code);
        }
    }

    #[test]
    fn every_program_ends_with_a_fetch() {
        let set = InstructionSet::new();

        for op in set.ops.iter().chain(set.cb_ops.iter()) {
            if let Some(last) = op.last() {
                assert!(last.decode || last.decode_cb);
                assert!(last.read);
            }
        }

        let last = set.interrupt.last().unwrap();
        assert!(last.decode && last.read);
    }

    #[test]
    fn cycle_counts_match_the_hardware() {
        let set = InstructionSet::new();

        let expect = [
            (0x00, 1), // NOP
            (0x06, 2), // LD B, d8
            (0x41, 1), // LD B, C
            (0x46, 2), // LD B, (HL)
            (0x70, 2), // LD (HL), B
            (0x36, 3), // LD (HL), d8
            (0x2A, 2), // LD A, (HL+)
            (0xEA, 4), // LD (a16), A
            (0xE0, 3), // LDH (a8), A
            (0xE2, 2), // LD (C), A
            (0x31, 3), // LD SP, d16
            (0xC1, 3), // POP BC
            (0xC5, 4), // PUSH BC
            (0x08, 5), // LD (a16), SP
            (0xF8, 3), // LD HL, SP+r8
            (0xF9, 2), // LD SP, HL
            (0x80, 1), // ADD A, B
            (0x86, 2), // ADD A, (HL)
            (0xC6, 2), // ADD A, d8
            (0x3C, 1), // INC A
            (0x34, 3), // INC (HL)
            (0x27, 1), // DAA
            (0x07, 1), // RLCA
            (0x03, 2), // INC BC
            (0x09, 2), // ADD HL, BC
            (0xE8, 4), // ADD SP, r8
            (0xC7, 4), // RST 00
            (0x18, 3), // JR r8
            (0xC3, 4), // JP a16
            (0xE9, 1), // JP HL
            (0xCD, 6), // CALL a16
            (0xC9, 4), // RET
            (0xD9, 4), // RETI
            (0xC0, 5), // RET NZ (when taken)
            (0x10, 1), // STOP
            (0x76, 1), // HALT
            (0xF3, 1), // DI
            (0xFB, 1), // EI
            (0xCB, 1), // prefix
        ];

        for (op_code, cycles) in expect {
            assert_eq!(
                set.ops[op_code as usize].len(),
                cycles,
                "opcode {:#04x}",
                op_code
            );
        }
    }

    #[test]
    fn cb_programs_are_one_or_three_cycles() {
        let set = InstructionSet::new();

        for (op_code, op) in set.cb_ops.iter().enumerate() {
            let expected = if (op_code & 0x7) == 6 { 3 } else { 1 };

            assert_eq!(op.len(), expected, "cb opcode {:#04x}", op_code);
        }
    }

    #[test]
    fn conditional_programs_latch_before_checking() {
        let set = InstructionSet::new();

        for op in set.ops.iter() {
            let mut latched = false;

            for ctrl in op {
                match ctrl.cond_op {
                    Some(Cond::Check) => assert!(latched),
                    Some(_) => latched = true,
                    None => {}
                }
            }
        }
    }

    #[test]
    fn rst_vectors_come_from_the_opcode() {
        let set = InstructionSet::new();

        for op_code in [0xC7, 0xCF, 0xD7, 0xDF, 0xE7, 0xEF, 0xF7, 0xFF] {
            let reset = set.ops[op_code]
                .iter()
                .find(|ctrl| ctrl.alu_op == Some(AluOp::PcReset))
                .unwrap();

            assert_eq!(reset.mask as usize, op_code & 0x38);
        }
    }
}
