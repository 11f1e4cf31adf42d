//! The microcycle control-word schema.
//!
//! Every instruction is pre-compiled into a short program of these
//! words; the stepper consumes one word per machine cycle.

/// An 8-bit register as named by a control word.
///
/// `Data` is the bus-data latch of the current microcycle, usable as a
/// virtual register by loads and ALU operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg8 {
    A,
    F,
    B,
    C,
    D,
    E,
    H,
    L,
    PcHigh,
    PcLow,
    SpHigh,
    SpLow,
    TempHigh,
    TempLow,
    Data,
}

/// A 16-bit value source, used for bus addresses and 16-bit ALU operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg16 {
    Bc,
    De,
    Hl,
    /// HL, post-incrementing it.
    HlIncr,
    /// HL, post-decrementing it.
    HlDecr,
    Pc,
    Sp,
    /// The 16-bit temporary.
    Temp,
    /// The 16-bit temporary plus one.
    TempPlus1,
    /// 0xFF00 | low byte of the temporary.
    HighTemp,
    /// 0xFF00 | C.
    HighC,
    /// HL plus one. Only used by `JP HL`, whose fetch word reads the
    /// target opcode from HL and must leave PC pointing past it.
    HlPlus1,
}

/// The ALU operation a control word may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Sub,
    And,
    Xor,
    Or,
    Cp,
    Inc,
    Dec,
    Daa,
    Cpl,
    Scf,
    Ccf,
    Rl,
    Rr,
    Sla,
    Sra,
    Swap,
    Srl,
    Bit,
    Res,
    Set,
    SpAdjust,
    PcAdjust,
    PcSet,
    PcReset,
    Inc16,
    Dec16,
    Add16,
}

/// Condition handling carried by a control word.
///
/// One word per conditional instruction latches the condition; later
/// words tagged `Check` are skipped while the latch is false.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cond {
    Nz,
    Z,
    Nc,
    C,
    Always,
    Check,
}

/// System-level side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SysOp {
    Ei,
    Di,
    Halt,
    Stop,
}

/// One microcycle worth of control signals.
#[derive(Debug, Clone, Copy)]
pub struct Control {
    /// Issue a bus read this cycle.
    pub read: bool,

    /// Issue a bus write this cycle.
    pub write: bool,

    /// Address source for a read or write.
    pub adr: Option<Reg16>,

    /// Register that sinks a read or sources a write. `Data` leaves the
    /// byte in the data latch only.
    pub mem_reg: Reg8,

    /// Treat the byte just read as the next opcode.
    pub decode: bool,

    /// Treat the byte just read as the next CB-prefixed opcode.
    pub decode_cb: bool,

    /// Register-to-register copy, as `(src, dst)`.
    pub ld: Option<(Reg8, Reg8)>,

    pub alu_op: Option<AluOp>,
    pub with_carry: bool,
    pub ignore_zero: bool,

    /// Bit mask for `Bit`/`Res`/`Set`, or the vector for `PcReset`.
    pub mask: u8,

    pub alu_r16: Option<Reg16>,
    pub alu_r8: Option<Reg8>,

    pub cond_op: Option<Cond>,
    pub sys_op: Option<SysOp>,
}

impl Default for Control {
    fn default() -> Self {
        Self {
            read: false,
            write: false,
            adr: None,
            mem_reg: Reg8::Data,
            decode: false,
            decode_cb: false,
            ld: None,
            alu_op: None,
            with_carry: false,
            ignore_zero: false,
            mask: 0,
            alu_r16: None,
            alu_r8: None,
            cond_op: None,
            sys_op: None,
        }
    }
}

impl Control {
    /// The terminal word of every program: fetch the next opcode while
    /// the current instruction finishes.
    pub fn fetch() -> Self {
        Self {
            read: true,
            adr: Some(Reg16::Pc),
            decode: true,
            ..Self::default()
        }
    }

    /// Check the structural invariants of a single word.
    ///
    /// Tripping any of these is a bug in the table generator; the word
    /// set is fixed at build time, so this runs once at startup.
    pub fn validate(&self) {
        use AluOp::*;

        // A word issues at most one bus transaction.
        assert!(!self.read || !self.write);

        // Bus transactions need an address source.
        if self.read || self.write {
            assert!(self.adr.is_some());
        }

        // Only one kind of decode at a time, and only of a byte that
        // was actually read.
        assert!(!self.decode || !self.decode_cb);
        if self.decode || self.decode_cb {
            assert!(self.read);
        }

        // A load and an 8-bit ALU operand never share a word.
        assert!(self.ld.is_none() || self.alu_r8.is_none());

        let no_modifiers = !self.with_carry && !self.ignore_zero;

        match self.alu_op {
            None => {
                assert!(no_modifiers && self.mask == 0);
                assert!(self.alu_r16.is_none() && self.alu_r8.is_none());
            }

            Some(Add | Sub) => {
                assert!(!self.ignore_zero);
                assert!(self.mask == 0 && self.alu_r16.is_none());
                assert!(self.alu_r8.is_some());
            }

            Some(Rl | Rr) => {
                assert!(self.mask == 0 && self.alu_r16.is_none());
                assert!(self.alu_r8.is_some());
            }

            Some(And | Xor | Or | Cp | Inc | Dec | Sla | Sra | Swap | Srl) => {
                assert!(no_modifiers);
                assert!(self.mask == 0 && self.alu_r16.is_none());
                assert!(self.alu_r8.is_some());
            }

            Some(Daa | Cpl | Scf | Ccf | PcAdjust) => {
                assert!(no_modifiers && self.mask == 0);
                assert!(self.alu_r16.is_none() && self.alu_r8.is_none());
            }

            Some(Bit | Res | Set) => {
                assert!(no_modifiers);
                // Exactly one bit selected.
                assert!(self.mask != 0 && (self.mask & (self.mask - 1)) == 0);
                assert!(self.alu_r16.is_none());
                assert!(self.alu_r8.is_some());
            }

            Some(PcReset) => {
                assert!(no_modifiers);
                assert!(self.alu_r16.is_none() && self.alu_r8.is_none());
            }

            Some(PcSet) => {
                assert!(no_modifiers && self.mask == 0);
                assert!(matches!(self.alu_r16, Some(Reg16::Temp) | Some(Reg16::HlPlus1)));
                assert!(self.alu_r8.is_none());
            }

            Some(SpAdjust | Inc16 | Dec16 | Add16) => {
                assert!(no_modifiers && self.mask == 0);
                assert!(self.alu_r16.is_some() && self.alu_r8.is_none());
            }
        }
    }
}
