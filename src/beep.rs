// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Buzzer output
//!
//! The beeper divides a low speed clock into a square wave on the BEEP pin (PD4, AF5, configured
//! by the caller). The output frequency is `source * 2^sel / (8 * (div + 2))`.
//!
//! ```ignore
//! let mut beep = Beep::new(dp.BEEP, beep::ClockSource::Lirc, &clocks, &mut rcc.apb)?;
//! beep.set_frequency(2.khz().into())?;
//! beep.enable();
//! ```

use crate::pac::{beep, BEEP};
use crate::rcc::{Clocks, Enable, APB};
use crate::time::Hertz;

const MAX_DIV: u32 = 0xFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// The selected clock is not running
    ClockNotRunning,
    /// No divider setting comes close to the requested frequency
    Frequency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockSource {
    Lirc = 1,
    Lxt = 2,
}

/// Multiplier exponent and divider for `freq`, rounded to the nearest reachable output
pub fn beep_timing(src: Hertz, freq: Hertz) -> Result<(u32, u32), Error> {
    if freq.0 == 0 {
        return Err(Error::Frequency);
    }
    // the largest multiplier gives the finest divider steps
    for sel in (0..4).rev() {
        let num = u64::from(src.0) << sel;
        let den = 8 * u64::from(freq.0);
        let n = (num + den / 2) / den;
        if (2..=u64::from(MAX_DIV) + 2).contains(&n) {
            return Ok((sel, (n - 2) as u32));
        }
    }
    Err(Error::Frequency)
}

/// Output frequency of a divider setting
pub fn beep_frequency(src: Hertz, sel: u32, div: u32) -> Hertz {
    Hertz((src.0 << sel) / (8 * (div + 2)))
}

pub struct Beep {
    beep: BEEP,
    src: Hertz,
}

impl Beep {
    pub fn new(
        beep: BEEP,
        source: ClockSource,
        clocks: &Clocks,
        apb: &mut APB,
    ) -> Result<Self, Error> {
        let src = match source {
            ClockSource::Lirc => clocks.lirc(),
            ClockSource::Lxt => clocks.lxt(),
        }
        .ok_or(Error::ClockNotRunning)?;

        BEEP::enable(apb);
        beep.csr.write(beep::csr::CLKSEL.val(source as u32));

        Ok(Beep { beep, src })
    }

    /// Sets the output frequency and returns the one actually produced
    pub fn set_frequency(&mut self, freq: Hertz) -> Result<Hertz, Error> {
        let (sel, div) = beep_timing(self.src, freq)?;
        self.beep.csr.modify(|r| {
            let r = beep::csr::BEEPSEL.set(r, sel);
            beep::csr::BEEPDIV.set(r, div)
        });
        Ok(beep_frequency(self.src, sel, div))
    }

    /// Frequency currently programmed
    pub fn frequency(&self) -> Hertz {
        let csr = self.beep.csr.read();
        beep_frequency(
            self.src,
            beep::csr::BEEPSEL.get(csr),
            beep::csr::BEEPDIV.get(csr),
        )
    }

    pub fn enable(&mut self) {
        self.beep.csr.set_bits(beep::csr::BEEPEN);
    }

    pub fn disable(&mut self) {
        self.beep.csr.clear_bits(beep::csr::BEEPEN);
    }

    pub fn is_enabled(&self) -> bool {
        self.beep.csr.is_set(beep::csr::BEEPEN)
    }

    pub fn release(self) -> BEEP {
        self.beep.csr.clear_bits(beep::csr::BEEPEN);
        self.beep
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kilohertz_tones() {
        assert_eq!(beep_timing(Hertz(32_768), Hertz(2_000)), Ok((3, 14)));
        assert_eq!(beep_frequency(Hertz(32_768), 3, 14), Hertz(2_048));
        assert_eq!(beep_timing(Hertz(32_768), Hertz(4_000)), Ok((3, 6)));
    }

    #[test]
    fn low_tone_uses_no_multiplier() {
        assert_eq!(beep_timing(Hertz(32_768), Hertz(1)), Ok((0, 4_094)));
    }

    #[test]
    fn out_of_range() {
        assert_eq!(beep_timing(Hertz(32_768), Hertz(100_000)), Err(Error::Frequency));
        assert_eq!(beep_timing(Hertz(32_768), Hertz(0)), Err(Error::Frequency));
    }
}
