// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Auto wake-up timer
//!
//! An 8-bit down-counter clocked from a low speed oscillator through a power of two divider. It
//! keeps running in deep sleep and wakes the core through the AWK interrupt when it expires. The
//! period is `(reload + 1) * 2^(div + 1) / source`.

use crate::pac::{awk, AWK};
use crate::rcc::{Clocks, Enable, Reset, APB};
use crate::time::{Hertz, MilliSeconds};

const MAX_DIVSEL: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// The selected clock is not running
    ClockNotRunning,
    /// The period can't be represented
    Period,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockSource {
    Lirc = 1,
    Lxt = 2,
}

/// Divider selection and reload for a period of `ms`
pub fn awk_timing(clk: Hertz, ms: u32) -> Result<(u32, u32), Error> {
    let total = u64::from(clk.0) * u64::from(ms) / 1_000;
    (0..=MAX_DIVSEL)
        .map(|div| (div, total >> (div + 1)))
        .find(|&(_, ticks)| ticks <= 0x100)
        .filter(|&(_, ticks)| ticks != 0)
        .map(|(div, ticks)| (div, (ticks - 1) as u32))
        .ok_or(Error::Period)
}

/// Period of a divider setting in milliseconds
pub fn awk_period_ms(clk: Hertz, div: u32, reload: u32) -> u32 {
    let cycles = u64::from(reload + 1) << (div + 1);
    (cycles * 1_000 / u64::from(clk.0.max(1))) as u32
}

/// Wake-up timer
pub struct WakeupTimer {
    awk: AWK,
    clk: Hertz,
    source: ClockSource,
}

impl WakeupTimer {
    pub fn new(
        awk: AWK,
        source: ClockSource,
        clocks: &Clocks,
        apb: &mut APB,
    ) -> Result<Self, Error> {
        let clk = match source {
            ClockSource::Lirc => clocks.lirc(),
            ClockSource::Lxt => clocks.lxt(),
        }
        .ok_or(Error::ClockNotRunning)?;

        AWK::enable(apb);
        AWK::reset(apb);

        Ok(WakeupTimer { awk, clk, source })
    }

    /// Starts the timer; it expires every `period` until stopped
    pub fn start(&mut self, period: MilliSeconds) -> Result<(), Error> {
        let (div, reload) = awk_timing(self.clk, period.0)?;
        self.stop();
        self.awk.rload.write(awk::RLOAD.val(reload));
        self.awk.intclr.write(awk::sr::AWKF);
        self.awk.cr.write(
            awk::cr::DIVSEL.val(div) | awk::cr::TCLKSEL.val(self.source as u32) | awk::cr::EN,
        );
        Ok(())
    }

    pub fn stop(&mut self) {
        self.awk.cr.clear_bits(awk::cr::EN);
    }

    /// Period currently programmed
    pub fn period(&self) -> MilliSeconds {
        MilliSeconds(awk_period_ms(
            self.clk,
            self.awk.cr.read_field(awk::cr::DIVSEL),
            self.awk.rload.read_field(awk::RLOAD),
        ))
    }

    pub fn is_pending(&self) -> bool {
        self.awk.sr.is_set(awk::sr::AWKF)
    }

    pub fn clear_interrupt(&mut self) {
        self.awk.intclr.write(awk::sr::AWKF);
    }

    pub fn release(mut self) -> AWK {
        self.stop();
        self.awk
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_second_from_lxt() {
        assert_eq!(awk_timing(Hertz(32_768), 1_000), Ok((6, 255)));
        assert_eq!(awk_period_ms(Hertz(32_768), 6, 255), 1_000);
    }

    #[test]
    fn short_period_keeps_the_smallest_divider() {
        assert_eq!(awk_timing(Hertz(38_400), 10), Ok((0, 191)));
    }

    #[test]
    fn unreachable_periods() {
        assert_eq!(awk_timing(Hertz(32_768), 0), Err(Error::Period));
        // 2^16 * 256 cycles is the longest period
        assert_eq!(awk_timing(Hertz(32_768), 600_000), Err(Error::Period));
    }
}
