// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Low power timer
//!
//! 16-bit up-counter that keeps running in deep sleep when clocked from LXT or LIRC. It counts
//! from the load value up to 0xFFFF and reloads from the background load register on overflow.
//! Register writes cross into the counter clock domain; every write waits for `WT_FLAG` to clear.

use embedded_hal::timer::{Cancel, CountDown, Periodic};
use void::Void;

use crate::pac::{lptim, LPTIM};
use crate::rcc::{BusClock, Clocks, Enable, Reset, APB};
use crate::tick::Deadline;
use crate::time::Hertz;

/// Budget for a register write to reach the counter domain; a few LIRC cycles
const SYNC_TIMEOUT_MS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// The selected clock is not running
    ClockNotRunning,
    /// The period doesn't fit the 16-bit counter at this clock
    Period,
    /// `WT_FLAG` stayed set
    SyncTimeout,
    /// Timer is disabled
    Disabled,
}

/// Counter clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockSource {
    Pclk,
    Lxt,
    Lirc,
}

impl ClockSource {
    const fn bits(self) -> u32 {
        match self {
            ClockSource::Pclk => 0,
            ClockSource::Lxt => 2,
            ClockSource::Lirc => 3,
        }
    }

    fn frequency(self, clocks: &Clocks) -> Option<Hertz> {
        match self {
            ClockSource::Pclk => Some(LPTIM::clock(clocks)),
            ClockSource::Lxt => clocks.lxt(),
            ClockSource::Lirc => clocks.lirc(),
        }
    }
}

/// Load value giving one overflow every period of `freq`
pub fn load_for(clk: Hertz, freq: Hertz) -> Result<u16, Error> {
    let ticks = clk.0 / freq.0.max(1);
    if ticks == 0 || ticks > 0x1_0000 {
        return Err(Error::Period);
    }
    Ok((0x1_0000 - ticks) as u16)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    Overflow,
}

/// Low power timer
pub struct LpTimer {
    lptim: LPTIM,
    clk: Hertz,
}

impl LpTimer {
    /// Stops and configures the timer to count `source`
    pub fn new(
        lptim: LPTIM,
        source: ClockSource,
        clocks: &Clocks,
        apb: &mut APB,
    ) -> Result<Self, Error> {
        let clk = source.frequency(clocks).ok_or(Error::ClockNotRunning)?;

        LPTIM::enable(apb);
        LPTIM::reset(apb);

        let timer = LpTimer { lptim, clk };
        timer.sync()?;
        timer
            .lptim
            .cr
            .write(lptim::cr::TCK_SEL.val(source.bits()) | lptim::cr::MODE);
        Ok(timer)
    }

    fn sync(&self) -> Result<(), Error> {
        let mut deadline = Deadline::after_ms(SYNC_TIMEOUT_MS);
        while self.lptim.cr.is_set(lptim::cr::WT_FLAG) {
            if deadline.expired() {
                return Err(Error::SyncTimeout);
            }
        }
        Ok(())
    }

    /// Counter clock
    pub fn clock(&self) -> Hertz {
        self.clk
    }

    /// Starts periodic overflows at `freq`
    pub fn start_periodic(&mut self, freq: Hertz) -> Result<(), Error> {
        let load = u32::from(load_for(self.clk, freq)?);
        self.sync()?;
        self.lptim.cr.clear_bits(lptim::cr::TR);
        self.sync()?;
        self.lptim.load.write(load);
        self.sync()?;
        self.lptim.bgload.write(load);
        self.lptim.intclr.write(lptim::intsr::TF);
        self.sync()?;
        self.lptim.cr.set_bits(lptim::cr::MODE | lptim::cr::TR);
        Ok(())
    }

    /// Counts edges of the external input instead of the clock source
    pub fn set_external_clock(&mut self, enable: bool) -> Result<(), Error> {
        self.sync()?;
        if enable {
            self.lptim.cr.set_bits(lptim::cr::CT);
        } else {
            self.lptim.cr.clear_bits(lptim::cr::CT);
        }
        Ok(())
    }

    /// Toggles the output pin at every overflow
    pub fn set_toggle_output(&mut self, enable: bool) -> Result<(), Error> {
        self.sync()?;
        if enable {
            self.lptim.cr.set_bits(lptim::cr::TOG_EN);
        } else {
            self.lptim.cr.clear_bits(lptim::cr::TOG_EN);
        }
        Ok(())
    }

    /// Gates counting on the gate input: `Some(false)` counts while it is high, `Some(true)`
    /// while it is low
    pub fn set_gate(&mut self, gate: Option<bool>) -> Result<(), Error> {
        self.sync()?;
        self.lptim.cr.modify(|r| {
            let r = r & !(lptim::cr::GATE | lptim::cr::GATE_P);
            match gate {
                None => r,
                Some(false) => r | lptim::cr::GATE,
                Some(true) => r | lptim::cr::GATE | lptim::cr::GATE_P,
            }
        });
        Ok(())
    }

    pub fn listen(&mut self, event: Event) -> Result<(), Error> {
        match event {
            Event::Overflow => {
                self.sync()?;
                self.lptim.cr.set_bits(lptim::cr::INT_EN);
            }
        }
        Ok(())
    }

    pub fn unlisten(&mut self, event: Event) -> Result<(), Error> {
        match event {
            Event::Overflow => {
                self.sync()?;
                self.lptim.cr.clear_bits(lptim::cr::INT_EN);
            }
        }
        Ok(())
    }

    pub fn is_pending(&self) -> bool {
        self.lptim.intsr.is_set(lptim::intsr::TF)
    }

    pub fn clear_interrupt(&mut self) {
        self.lptim.intclr.write(lptim::intsr::TF);
    }

    pub fn counter(&self) -> u16 {
        self.lptim.cnt.read_field(lptim::LOAD) as u16
    }

    pub fn release(self) -> LPTIM {
        self.lptim.cr.clear_bits(lptim::cr::TR | lptim::cr::INT_EN);
        self.lptim
    }
}

impl CountDown for LpTimer {
    type Time = Hertz;

    /// Periods the counter can't reach are clamped to the longest one
    fn start<T>(&mut self, timeout: T)
    where
        T: Into<Hertz>,
    {
        let freq = timeout.into();
        if self.start_periodic(freq).is_err() {
            // too slow for 16 bits: run the longest period the clock allows
            let _ = self.start_periodic(Hertz((self.clk.0 >> 16).max(1)));
        }
    }

    fn wait(&mut self) -> nb::Result<(), Void> {
        if self.is_pending() {
            self.clear_interrupt();
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}

impl Cancel for LpTimer {
    type Error = Error;

    fn cancel(&mut self) -> Result<(), Error> {
        if !self.lptim.cr.is_set(lptim::cr::TR) {
            return Err(Error::Disabled);
        }
        self.sync()?;
        self.lptim.cr.clear_bits(lptim::cr::TR);
        Ok(())
    }
}

impl Periodic for LpTimer {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_counts_up_to_overflow() {
        assert_eq!(load_for(Hertz(32_768), Hertz(1)), Ok(0x8000));
        assert_eq!(load_for(Hertz(32_768), Hertz(32_768)), Ok(0xFFFF));
        assert_eq!(load_for(Hertz(65_536), Hertz(1)), Ok(0));
    }

    #[test]
    fn unreachable_periods() {
        assert_eq!(load_for(Hertz(24_000_000), Hertz(100)), Err(Error::Period));
        assert_eq!(load_for(Hertz(32_768), Hertz(40_000)), Err(Error::Period));
    }
}
