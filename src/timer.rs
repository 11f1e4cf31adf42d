//! Implementation of the programmable timer.
//!
//! DIV, TIMA and co. The timer is stepped once per machine cycle by
//! the system and raises the timer interrupt on TIMA overflow.

use crate::interrupts::InterruptController;

/// DIV advances once every 64 ticks of the cycle counter.
const DIV_TICK_MASK: u8 = 64 - 1;

/// TIMA rates selected by TAC bits 0..1.
const TIMA_TICK_MASKS: [u8; 4] = [0xFF, 0x03, 0x0F, 0x3F];

/// TAC bit 2 starts and stops TIMA.
const TAC_START: u8 = 0x04;

/// The unused upper bits of TAC read back as one.
const TAC_UNUSED: u8 = 0xF8;

/// Implementation of the timer apparatus.
#[derive(Default)]
pub struct Timer {
    /// 0xFF04 - Divider Register.
    ///
    /// Free running; any write resets it to zero.
    div: u8,

    /// 0xFF05 - Timer Counter.
    ///
    /// Configurable timer, incremented at the rate selected in TAC.
    tima: u8,

    /// 0xFF06 - Timer Modulo.
    ///
    /// Loaded into TIMA whenever TIMA overflows.
    tma: u8,

    /// 0xFF07 - Timer Control.
    tac: u8,

    /// Free-running tick counter the DIV and TIMA rates are derived from.
    cycle: u8,
}

impl Timer {
    /// Create a new `Timer` instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-establish the post-boot state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Advance the timer by one tick.
    ///
    /// Raises the timer interrupt on the provided controller when
    /// TIMA overflows.
    pub fn step(&mut self, ic: &mut InterruptController) {
        self.cycle = self.cycle.wrapping_add(1);

        if (self.cycle & DIV_TICK_MASK) == 0 {
            self.div = self.div.wrapping_add(1);
        }

        if (self.tac & TAC_START) != 0
            && (self.cycle & TIMA_TICK_MASKS[(self.tac & 0x03) as usize]) == 0
        {
            self.tima = self.tima.wrapping_add(1);

            if self.tima == 0 {
                self.tima = self.tma;
                ic.signal_timer_irq();
            }
        }
    }

    /// Writing DIV resets it, whatever the value.
    pub fn set_div(&mut self, _value: u8) {
        self.div = 0;
    }

    pub fn set_tima(&mut self, value: u8) {
        self.tima = value;
    }

    pub fn set_tma(&mut self, value: u8) {
        self.tma = value;
    }

    pub fn set_tac(&mut self, value: u8) {
        self.tac = value;
    }

    pub fn get_div(&self) -> u8 {
        self.div
    }

    pub fn get_tima(&self) -> u8 {
        self.tima
    }

    pub fn get_tma(&self) -> u8 {
        self.tma
    }

    pub fn get_tac(&self) -> u8 {
        self.tac | TAC_UNUSED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick(timer: &mut Timer, ic: &mut InterruptController, count: u32) {
        for _ in 0..count {
            timer.step(ic);
        }
    }

    #[test]
    fn div_advances_every_64_ticks() {
        let mut timer = Timer::new();
        let mut ic = InterruptController::new();

        tick(&mut timer, &mut ic, 63);
        assert_eq!(timer.get_div(), 0);

        tick(&mut timer, &mut ic, 1);
        assert_eq!(timer.get_div(), 1);
    }

    #[test]
    fn div_wraps_after_16384_ticks() {
        let mut timer = Timer::new();
        let mut ic = InterruptController::new();

        tick(&mut timer, &mut ic, 16384);
        assert_eq!(timer.get_div(), 0);
    }

    #[test]
    fn div_write_resets() {
        let mut timer = Timer::new();
        let mut ic = InterruptController::new();

        tick(&mut timer, &mut ic, 64);
        assert_eq!(timer.get_div(), 1);

        timer.set_div(0xAB);
        assert_eq!(timer.get_div(), 0);
    }

    #[test]
    fn tima_rate_follows_tac() {
        let mut timer = Timer::new();
        let mut ic = InterruptController::new();

        timer.set_tac(0x05);

        tick(&mut timer, &mut ic, 4);
        assert_eq!(timer.get_tima(), 1);

        tick(&mut timer, &mut ic, 16);
        assert_eq!(timer.get_tima(), 5);
    }

    #[test]
    fn tima_disabled_without_start_bit() {
        let mut timer = Timer::new();
        let mut ic = InterruptController::new();

        timer.set_tac(0x01);

        tick(&mut timer, &mut ic, 256);
        assert_eq!(timer.get_tima(), 0);
    }

    #[test]
    fn tima_overflow_reloads_and_signals() {
        let mut timer = Timer::new();
        let mut ic = InterruptController::new();

        timer.set_tac(0x05);
        timer.set_tma(0x23);
        timer.set_tima(0xFF);

        tick(&mut timer, &mut ic, 4);
        assert_eq!(timer.get_tima(), 0x23);
        assert_eq!(ic.get_if() & 0x04, 0x04);
    }

    #[test]
    fn tac_unused_bits_read_high() {
        let mut timer = Timer::new();

        timer.set_tac(0x05);
        assert_eq!(timer.get_tac(), 0xF8 | 0x05);
    }
}
