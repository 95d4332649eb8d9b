// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Low voltage detector
//!
//! Compares the supply, or an analog pin, against one of sixteen thresholds from 1.8 V to 4.8 V
//! in 0.2 V steps. Below the threshold it either resets the chip or raises the LVD interrupt on
//! the configured edges or level.
//!
//! LVD shares its bus clock gate with the voltage comparator; the gate is only ever opened.

use crate::pac::{lvd, LVD};
use crate::rcc::{Enable, APB};

/// Lowest threshold
pub const THRESHOLD_MIN_MV: u16 = 1_800;
/// Step between two thresholds
pub const THRESHOLD_STEP_MV: u16 = 200;
/// Highest threshold
pub const THRESHOLD_MAX_MV: u16 = THRESHOLD_MIN_MV + 15 * THRESHOLD_STEP_MV;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// The threshold is outside 1.8 V to 4.8 V
    Threshold,
}

/// Monitored voltage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Input {
    Vcc = 0,
    Pc4 = 1,
    Pd5 = 2,
    Pd6 = 3,
}

/// Reaction to a low voltage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    Reset,
    Interrupt,
}

/// Conditions raising the interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Trigger {
    /// Voltage drops below the threshold
    pub falling: bool,
    /// Voltage rises above the threshold
    pub rising: bool,
    /// Voltage is below the threshold
    pub level: bool,
}

impl Trigger {
    fn bits(self) -> u32 {
        let mut bits = 0;
        if self.falling {
            bits |= lvd::cr::FTEN;
        }
        if self.rising {
            bits |= lvd::cr::RTEN;
        }
        if self.level {
            bits |= lvd::cr::HTEN;
        }
        bits
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub input: Input,
    pub threshold_mv: u16,
    pub action: Action,
    pub trigger: Trigger,
    /// Digital filter length in PCLK cycles as `2^(n + 1)`, `None` to disable
    pub filter: Option<u8>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            input: Input::Vcc,
            threshold_mv: 2_400,
            action: Action::Interrupt,
            trigger: Trigger {
                falling: true,
                ..Trigger::default()
            },
            filter: None,
        }
    }
}

/// Threshold selection closest to `mv`
pub fn threshold_bits(mv: u16) -> Result<u32, Error> {
    if !(THRESHOLD_MIN_MV..=THRESHOLD_MAX_MV).contains(&mv) {
        return Err(Error::Threshold);
    }
    Ok(u32::from((mv - THRESHOLD_MIN_MV + THRESHOLD_STEP_MV / 2) / THRESHOLD_STEP_MV))
}

/// Threshold of a selection in millivolts
pub fn threshold_mv(bits: u32) -> u16 {
    THRESHOLD_MIN_MV + (bits as u16 & 0xF) * THRESHOLD_STEP_MV
}

pub struct Lvd {
    lvd: LVD,
}

impl Lvd {
    pub fn new(lvd: LVD, apb: &mut APB) -> Self {
        LVD::enable(apb);
        lvd.cr.write(0);
        Lvd { lvd }
    }

    /// Applies `config` and enables the detector
    pub fn configure(&mut self, config: &Config) -> Result<(), Error> {
        let vtds = threshold_bits(config.threshold_mv)?;
        let mut cr = lvd::cr::SOURCE.val(config.input as u32)
            | lvd::cr::VTDS.val(vtds)
            | config.trigger.bits();
        match config.action {
            Action::Reset => cr |= lvd::cr::ACT,
            Action::Interrupt => cr |= lvd::cr::IE,
        }
        if let Some(n) = config.filter {
            cr |= lvd::cr::FLTEN | lvd::cr::FLTTIME.val(u32::from(n));
        }

        self.lvd.cr.write(0);
        self.lvd.intclr.write(lvd::sr::INTF);
        self.lvd.cr.write(cr | lvd::cr::EN);
        Ok(())
    }

    /// Threshold currently selected
    pub fn threshold(&self) -> u16 {
        threshold_mv(self.lvd.cr.read_field(lvd::cr::VTDS))
    }

    pub fn enable(&mut self) {
        self.lvd.cr.set_bits(lvd::cr::EN);
    }

    pub fn disable(&mut self) {
        self.lvd.cr.clear_bits(lvd::cr::EN);
    }

    /// Whether the filtered input is below the threshold
    pub fn is_low(&self) -> bool {
        self.lvd.sr.is_set(lvd::sr::FLTV)
    }

    pub fn listen(&mut self) {
        self.lvd.cr.set_bits(lvd::cr::IE);
    }

    pub fn unlisten(&mut self) {
        self.lvd.cr.clear_bits(lvd::cr::IE);
    }

    pub fn is_pending(&self) -> bool {
        self.lvd.sr.is_set(lvd::sr::INTF)
    }

    pub fn clear_interrupt(&mut self) {
        self.lvd.intclr.write(lvd::sr::INTF);
    }

    pub fn release(self) -> LVD {
        self.lvd.cr.write(0);
        self.lvd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds() {
        assert_eq!(threshold_bits(1_800), Ok(0));
        assert_eq!(threshold_bits(2_400), Ok(3));
        assert_eq!(threshold_bits(2_490), Ok(3));
        assert_eq!(threshold_bits(4_800), Ok(15));
        assert_eq!(threshold_mv(3), 2_400);
    }

    #[test]
    fn out_of_range() {
        assert_eq!(threshold_bits(1_700), Err(Error::Threshold));
        assert_eq!(threshold_bits(5_000), Err(Error::Threshold));
    }

    #[test]
    fn default_interrupts_on_falling_supply() {
        let config = Config::default();
        assert_eq!(config.trigger.bits(), lvd::cr::FTEN);
        assert_eq!(config.action, Action::Interrupt);
    }
}
