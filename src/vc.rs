// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Voltage comparator
//!
//! Compares a positive input pin against a negative input: another pin, the internal 1.2 V
//! reference or a 64-step divider of VCC. The output can be inverted, filtered, routed to timer
//! inputs and raise the VC interrupt on edges or level.
//!
//! ```ignore
//! let mut vc = Comparator::new(dp.VC, &mut rcc.apb);
//! vc.configure(&vc::Config {
//!     negative: NegativeInput::VccDiv(vc::vcc_divider(3_300, 1_650)?),
//!     ..Default::default()
//! });
//! ```

use crate::pac::{vc, VC};
use crate::rcc::{Enable, APB};

const DIV_STEPS: u32 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// The divided voltage can't be produced from this supply
    Divider,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PositiveInput {
    Pc4 = 0,
    Pd2 = 1,
    Pd3 = 2,
    Pd5 = 3,
    Pd6 = 4,
    Pc3 = 5,
    Pa1 = 6,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NegativeInput {
    /// VCC * (n + 1) / 64
    VccDiv(u8),
    /// Internal 1.2 V reference
    Vref,
    Pc4,
    Pd2,
    Pd3,
    Pd5,
}

impl NegativeInput {
    fn bits(self) -> u32 {
        match self {
            NegativeInput::VccDiv(_) => 0,
            NegativeInput::Vref => 1,
            NegativeInput::Pc4 => 2,
            NegativeInput::Pd2 => 3,
            NegativeInput::Pd3 => 4,
            NegativeInput::Pd5 => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Hysteresis {
    Off = 0,
    Low = 1,
    Medium = 2,
    High = 3,
}

/// Comparator bias current, faster response at higher current
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Bias {
    Ua0_1 = 0,
    Ua1_2 = 1,
    Ua10 = 2,
    Ua20 = 3,
}

/// Conditions raising the interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Trigger {
    pub falling: bool,
    pub rising: bool,
    /// Output high
    pub level: bool,
}

/// Peripherals fed by the comparator output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Routing {
    pub tim1_break: bool,
    pub tim10_gate: bool,
    pub tim11_gate: bool,
    pub pca_capture0: bool,
}

impl Routing {
    fn bits(self) -> u32 {
        [
            (self.tim1_break, vc::outcfg::TIM1_BRK),
            (self.tim10_gate, vc::outcfg::TIM10_GATE),
            (self.tim11_gate, vc::outcfg::TIM11_GATE),
            (self.pca_capture0, vc::outcfg::PCA_CAP0),
        ]
        .iter()
        .filter(|(on, _)| *on)
        .fold(0, |bits, (_, bit)| bits | bit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub positive: PositiveInput,
    pub negative: NegativeInput,
    pub hysteresis: Hysteresis,
    pub bias: Bias,
    /// Digital filter length selection, `None` to disable
    pub filter: Option<u8>,
    pub invert: bool,
    pub trigger: Trigger,
    pub routing: Routing,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            positive: PositiveInput::Pc4,
            negative: NegativeInput::Vref,
            hysteresis: Hysteresis::Off,
            bias: Bias::Ua1_2,
            filter: None,
            invert: false,
            trigger: Trigger::default(),
            routing: Routing::default(),
        }
    }
}

/// Divider step producing the value closest to `target_mv` from a `vcc_mv` supply
pub fn vcc_divider(vcc_mv: u16, target_mv: u16) -> Result<u8, Error> {
    if vcc_mv == 0 {
        return Err(Error::Divider);
    }
    let vcc = u32::from(vcc_mv);
    let steps = (u32::from(target_mv) * DIV_STEPS + vcc / 2) / vcc;
    if (1..=DIV_STEPS).contains(&steps) {
        Ok((steps - 1) as u8)
    } else {
        Err(Error::Divider)
    }
}

/// Voltage produced by divider step `n` from a `vcc_mv` supply
pub fn divided_mv(vcc_mv: u16, n: u8) -> u16 {
    (u32::from(vcc_mv) * (u32::from(n & 0x3F) + 1) / DIV_STEPS) as u16
}

fn cr1_bits(config: &Config) -> u32 {
    let mut cr1 = vc::cr1::P_SEL.val(config.positive as u32)
        | vc::cr1::N_SEL.val(config.negative.bits())
        | vc::cr1::HYS.val(config.hysteresis as u32)
        | vc::cr1::BIAS.val(config.bias as u32);
    if let Some(n) = config.filter {
        cr1 |= vc::cr1::FLTEN | vc::cr1::FLTTIME.val(u32::from(n));
    }
    if config.trigger.falling {
        cr1 |= vc::cr1::FALLING;
    }
    if config.trigger.rising {
        cr1 |= vc::cr1::RISING;
    }
    if config.trigger.level {
        cr1 |= vc::cr1::LEVEL;
    }
    cr1
}

pub struct Comparator {
    vc: VC,
}

impl Comparator {
    pub fn new(vc: VC, apb: &mut APB) -> Self {
        VC::enable(apb);
        vc.cr1.write(0);
        Comparator { vc }
    }

    /// Applies `config` and enables the comparator, interrupts stay as they were
    pub fn configure(&mut self, config: &Config) {
        let ie = self.vc.cr1.read() & vc::cr1::IE;
        self.vc.cr1.write(0);

        match config.negative {
            NegativeInput::VccDiv(n) => self
                .vc
                .cr0
                .write(vc::cr0::DIV.val(u32::from(n)) | vc::cr0::DIVEN),
            _ => self.vc.cr0.write(0),
        }

        let mut outcfg = config.routing.bits();
        if config.invert {
            outcfg |= vc::outcfg::INV;
        }
        self.vc.outcfg.write(outcfg);
        self.vc.intclr.write(vc::sr::INTF);
        self.vc.cr1.write(cr1_bits(config) | ie | vc::cr1::EN);
    }

    pub fn enable(&mut self) {
        self.vc.cr1.set_bits(vc::cr1::EN);
    }

    pub fn disable(&mut self) {
        self.vc.cr1.clear_bits(vc::cr1::EN);
    }

    /// Filtered comparator output
    pub fn output(&self) -> bool {
        self.vc.sr.is_set(vc::sr::FLTV)
    }

    pub fn listen(&mut self) {
        self.vc.cr1.set_bits(vc::cr1::IE);
    }

    pub fn unlisten(&mut self) {
        self.vc.cr1.clear_bits(vc::cr1::IE);
    }

    pub fn is_pending(&self) -> bool {
        self.vc.sr.is_set(vc::sr::INTF)
    }

    pub fn clear_interrupt(&mut self) {
        self.vc.intclr.write(vc::sr::INTF);
    }

    pub fn release(self) -> VC {
        self.vc.cr1.write(0);
        self.vc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_supply() {
        assert_eq!(vcc_divider(3_300, 1_650), Ok(31));
        assert_eq!(divided_mv(3_300, 31), 1_650);
        assert_eq!(vcc_divider(3_300, 3_300), Ok(63));
    }

    #[test]
    fn unreachable_divider() {
        assert_eq!(vcc_divider(3_300, 10), Err(Error::Divider));
        assert_eq!(vcc_divider(3_300, 4_000), Err(Error::Divider));
        assert_eq!(vcc_divider(0, 1_000), Err(Error::Divider));
    }

    #[test]
    fn configuration_bits() {
        let config = Config {
            positive: PositiveInput::Pd3,
            negative: NegativeInput::VccDiv(31),
            trigger: Trigger {
                rising: true,
                ..Trigger::default()
            },
            ..Config::default()
        };
        let cr1 = cr1_bits(&config);
        assert_eq!(vc::cr1::P_SEL.get(cr1), 2);
        assert_eq!(vc::cr1::N_SEL.get(cr1), 0);
        assert_eq!(cr1 & (vc::cr1::RISING | vc::cr1::FALLING), vc::cr1::RISING);

        let routing = Routing {
            tim1_break: true,
            pca_capture0: true,
            ..Routing::default()
        };
        assert_eq!(routing.bits(), vc::outcfg::TIM1_BRK | vc::outcfg::PCA_CAP0);
    }
}
