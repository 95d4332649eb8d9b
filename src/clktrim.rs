// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Clock trimming and monitoring
//!
//! Measures one oscillator against another: the reference counter counts `refcon` reference
//! cycles down to zero while the calibration counter counts cycles of the measured clock. The
//! measured frequency is then `calcnt * reference / refcon`. This is how HIRC and LIRC are
//! trimmed against a crystal.
//!
//! The same block watches LXT and HXT for failures once monitoring is on.

use crate::pac::{clktrim, CLKTRIM};
use crate::rcc::{Enable, Reset, APB};
use crate::tick::Deadline;
use crate::time::Hertz;

/// Slack on top of the expected measurement time
const MEASURE_MARGIN_MS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// The measured clock overflowed the calibration counter
    Overflow,
    /// The reference counter never reached zero
    Timeout,
    /// A zero reference count or frequency
    InvalidCount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Clock {
    Hirc = 0,
    Hxt = 1,
    Lirc = 2,
    Lxt = 3,
}

/// Failed oscillators reported by the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Faults {
    pub lxt: bool,
    pub hxt: bool,
}

impl Faults {
    pub fn any(&self) -> bool {
        self.lxt || self.hxt
    }
}

/// Frequency of a clock that counted `calcnt` cycles over `refcon` cycles of `reference`
pub fn measured_hz(calcnt: u32, refcon: u32, reference: Hertz) -> Hertz {
    Hertz((u64::from(calcnt) * u64::from(reference.0) / u64::from(refcon.max(1))) as u32)
}

/// Milliseconds taken by `refcon` cycles of `reference`, rounded up
fn measure_ms(refcon: u32, reference: Hertz) -> u32 {
    let ms = (u64::from(refcon) * 1_000 + u64::from(reference.0) - 1) / u64::from(reference.0);
    cast::u32(ms).unwrap_or(u32::MAX)
}

pub struct ClockTrim {
    clktrim: CLKTRIM,
}

impl ClockTrim {
    pub fn new(clktrim: CLKTRIM, apb: &mut APB) -> Self {
        CLKTRIM::enable(apb);
        CLKTRIM::reset(apb);
        ClockTrim { clktrim }
    }

    /// Counts `target` over `refcon` cycles of `reference` running at `reference_hz` and
    /// returns the measured frequency of `target`
    pub fn measure(
        &mut self,
        reference: Clock,
        reference_hz: Hertz,
        target: Clock,
        refcon: u32,
    ) -> Result<Hertz, Error> {
        if refcon == 0 || reference_hz.0 == 0 {
            return Err(Error::InvalidCount);
        }
        let regs = &self.clktrim;
        regs.cr.clear_bits(clktrim::cr::START);
        regs.refcon.write(refcon);
        regs.calcon.write(u32::MAX);
        regs.iclr.write(clktrim::ifr::STOP | clktrim::ifr::CALCNT_OF);
        regs.cr.modify(|r| {
            let r = clktrim::cr::REFCLK_SEL.set(r, reference as u32);
            clktrim::cr::CALCLK_SEL.set(r, target as u32) | clktrim::cr::START
        });

        let mut deadline = Deadline::after_ms(
            measure_ms(refcon, reference_hz).saturating_add(MEASURE_MARGIN_MS),
        );
        let result = loop {
            let ifr = regs.ifr.read();
            if ifr & clktrim::ifr::CALCNT_OF != 0 {
                break Err(Error::Overflow);
            }
            if ifr & clktrim::ifr::STOP != 0 {
                break Ok(measured_hz(regs.calcnt.read(), refcon, reference_hz));
            }
            if deadline.expired() {
                break Err(Error::Timeout);
            }
        };

        regs.cr.clear_bits(clktrim::cr::START);
        regs.iclr.write(clktrim::ifr::STOP | clktrim::ifr::CALCNT_OF);
        result
    }

    /// Starts watching LXT and HXT; a failure raises the CLKTRIM interrupt
    pub fn start_monitor(&mut self) {
        self.clktrim
            .iclr
            .write(clktrim::ifr::LXT_FAULT | clktrim::ifr::HXT_FAULT);
        self.clktrim
            .cr
            .set_bits(clktrim::cr::MON_EN | clktrim::cr::IE);
    }

    pub fn stop_monitor(&mut self) {
        self.clktrim
            .cr
            .clear_bits(clktrim::cr::MON_EN | clktrim::cr::IE);
    }

    pub fn faults(&self) -> Faults {
        let ifr = self.clktrim.ifr.read();
        Faults {
            lxt: ifr & clktrim::ifr::LXT_FAULT != 0,
            hxt: ifr & clktrim::ifr::HXT_FAULT != 0,
        }
    }

    pub fn clear_faults(&mut self) {
        self.clktrim
            .iclr
            .write(clktrim::ifr::LXT_FAULT | clktrim::ifr::HXT_FAULT);
    }

    pub fn release(mut self) -> CLKTRIM {
        self.stop_monitor();
        self.clktrim
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hirc_against_lxt() {
        // 24 MHz counted over one second of a 32.768 kHz crystal
        assert_eq!(
            measured_hz(24_000_000, 32_768, Hertz(32_768)),
            Hertz(24_000_000)
        );
        assert_eq!(measured_hz(1_500_000, 2_048, Hertz(32_768)), Hertz(24_000_000));
    }

    #[test]
    fn lirc_against_hxt() {
        assert_eq!(measured_hz(384, 240_000, Hertz(24_000_000)), Hertz(38_400));
    }

    #[test]
    fn measurement_time() {
        assert_eq!(measure_ms(32_768, Hertz(32_768)), 1_000);
        assert_eq!(measure_ms(1, Hertz(32_768)), 1);
    }
}
