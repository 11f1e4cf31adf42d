//! Architectural register file.

use bitflags::bitflags;

bitflags! {
    /// The F register. Only the upper nibble is backed by hardware;
    /// writes to the lower nibble are dropped by construction.
    #[derive(Default)]
    pub struct Flags: u8 {
        const Z = 0b1000_0000;
        const N = 0b0100_0000;
        const H = 0b0010_0000;
        const C = 0b0001_0000;
    }
}

/// The CPU register file.
#[derive(Debug, Default)]
pub struct Registers {
    pub a: u8,
    pub f: Flags,

    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,

    pub sp: u16,
    pub pc: u16,
}

impl Registers {
    /// Create a new `Registers` instance.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn bc(&self) -> u16 {
        u16::from_be_bytes([self.b, self.c])
    }

    #[inline]
    pub fn de(&self) -> u16 {
        u16::from_be_bytes([self.d, self.e])
    }

    #[inline]
    pub fn hl(&self) -> u16 {
        u16::from_be_bytes([self.h, self.l])
    }

    #[inline]
    pub fn set_bc(&mut self, value: u16) {
        [self.b, self.c] = value.to_be_bytes();
    }

    #[inline]
    pub fn set_de(&mut self, value: u16) {
        [self.d, self.e] = value.to_be_bytes();
    }

    #[inline]
    pub fn set_hl(&mut self, value: u16) {
        [self.h, self.l] = value.to_be_bytes();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_writes_drop_the_low_nibble() {
        for value in 0..=0xFF_u16 {
            let value = value as u8;
            let f = Flags::from_bits_truncate(value);

            assert_eq!(f.bits(), value & 0xF0);
        }
    }

    #[test]
    fn pairs_split_and_join() {
        let mut reg = Registers::new();

        reg.set_hl(0xBEEF);
        assert_eq!(reg.h, 0xBE);
        assert_eq!(reg.l, 0xEF);
        assert_eq!(reg.hl(), 0xBEEF);
    }
}
