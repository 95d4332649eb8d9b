// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delays

use cast::u32;
use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::SYST;
use embedded_hal::blocking::delay::{DelayMs, DelayUs};

use crate::rcc::Clocks;

/// Largest SysTick reload
const MAX_RVR: u32 = 0x00FF_FFFF;

/// System timer (SysTick) as a delay provider
///
/// Busy waits on the counter, so it can't be used while [`crate::tick::Tick`] owns SysTick.
pub struct Delay {
    hclk: u32,
    syst: SYST,
}

impl Delay {
    /// Configures the system timer (SysTick) as a delay provider
    pub fn new(mut syst: SYST, clocks: Clocks) -> Self {
        syst.set_clock_source(SystClkSource::Core);

        Delay {
            hclk: clocks.hclk().0,
            syst,
        }
    }

    /// Releases the system timer (SysTick) resource
    pub fn free(self) -> SYST {
        self.syst
    }
}

/// Core cycles for `us` microseconds
fn cycles(hclk: u32, us: u32) -> u64 {
    u64::from(us) * u64::from(hclk) / 1_000_000
}

impl DelayMs<u32> for Delay {
    fn delay_ms(&mut self, ms: u32) {
        // split so the microsecond count can't overflow
        for _ in 0..ms / 1_000 {
            self.delay_us(1_000_000_u32);
        }
        self.delay_us((ms % 1_000) * 1_000);
    }
}

impl DelayMs<u16> for Delay {
    fn delay_ms(&mut self, ms: u16) {
        self.delay_ms(u32(ms));
    }
}

impl DelayMs<u8> for Delay {
    fn delay_ms(&mut self, ms: u8) {
        self.delay_ms(u32(ms));
    }
}

impl DelayUs<u32> for Delay {
    fn delay_us(&mut self, us: u32) {
        let mut total = cycles(self.hclk, us);

        while total != 0 {
            let current = total.min(u64::from(MAX_RVR));
            total -= current;

            self.syst.set_reload(current as u32);
            self.syst.clear_current();
            self.syst.enable_counter();

            while !self.syst.has_wrapped() {}

            self.syst.disable_counter();
        }
    }
}

impl DelayUs<u16> for Delay {
    fn delay_us(&mut self, us: u16) {
        self.delay_us(u32(us))
    }
}

impl DelayUs<u8> for Delay {
    fn delay_us(&mut self, us: u8) {
        self.delay_us(u32(us))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycles_per_microsecond() {
        assert_eq!(cycles(24_000_000, 1), 24);
        assert_eq!(cycles(4_000_000, 1_000), 4_000);
        assert_eq!(cycles(32_768, 1_000_000), 32_768);
    }
}
