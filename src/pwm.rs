// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Pulse width modulation on TIM1 and TIM2
//!
//! Both timers have four channels in PWM mode 1: the output is active while the counter is
//! below the duty value.
//!
//! | Timer | CH1 | CH2 | CH3 | CH4 | AF |
//! |-------|-----|-----|-----|-----|----|
//! | TIM1  | PC3 | PC4 | PC6 | PC7 | 6  |
//! | TIM2  | PA2 | PA3 | PD3 | PD4 | 7  |
//!
//! ```ignore
//! let c1 = gpioc.pc3.into_alternate(&mut gpioc.cfg);
//! let c2 = gpioc.pc4.into_alternate(&mut gpioc.cfg);
//! let mut pwm = Pwm::new(dp.TIM1, (c1, c2), 10.khz(), &clocks, &mut rcc.apb);
//! let max = pwm.get_max_duty();
//! pwm.set_duty(Channel::C1, max / 2);
//! pwm.enable(Channel::C1);
//! ```

use core::ops::Deref;

use crate::gpio::{self, Alternate};
use crate::pac::{tim, TIM1, TIM2};
use crate::rcc::{BusClock, Clocks, Enable, Reset, APB};
use crate::time::Hertz;
use crate::timer::timing_16;

/// PWM channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    C1 = 0,
    C2 = 1,
    C3 = 2,
    C4 = 3,
}

impl Channel {
    const fn index(self) -> u8 {
        self as u8
    }
}

/// TIM1 and TIM2
pub trait Instance:
    crate::Sealed + Deref<Target = tim::RegisterBlock> + Enable<Bus = APB> + Reset + BusClock
{
    /// Outputs gated by the main output enable
    const ADVANCED: bool;
}

impl Instance for TIM1 {
    const ADVANCED: bool = true;
}

impl Instance for TIM2 {
    const ADVANCED: bool = false;
}

/// Pin carrying channel `CH` of timer `TIM`
pub trait PinCh<TIM> {
    const CH: Channel;
}

/// Tuple of one to four channel pins
pub trait Pins<TIM> {
    /// Bit `n` set when channel `n` has a pin
    const CHANNELS: u8;
}

impl<TIM, P1: PinCh<TIM>> Pins<TIM> for (P1,) {
    const CHANNELS: u8 = 1 << P1::CH.index();
}

impl<TIM, P1: PinCh<TIM>, P2: PinCh<TIM>> Pins<TIM> for (P1, P2) {
    const CHANNELS: u8 = (1 << P1::CH.index()) | (1 << P2::CH.index());
}

impl<TIM, P1: PinCh<TIM>, P2: PinCh<TIM>, P3: PinCh<TIM>> Pins<TIM> for (P1, P2, P3) {
    const CHANNELS: u8 =
        (1 << P1::CH.index()) | (1 << P2::CH.index()) | (1 << P3::CH.index());
}

impl<TIM, P1: PinCh<TIM>, P2: PinCh<TIM>, P3: PinCh<TIM>, P4: PinCh<TIM>> Pins<TIM>
    for (P1, P2, P3, P4)
{
    const CHANNELS: u8 = (1 << P1::CH.index())
        | (1 << P2::CH.index())
        | (1 << P3::CH.index())
        | (1 << P4::CH.index());
}

macro_rules! pwm_pins {
    ($($TIM:ident: [$($PIN:ident => $CH:ident),+], $af:literal;)+) => {
        $(
            $(
                impl<MODE> PinCh<$TIM> for gpio::$PIN<Alternate<$af, MODE>> {
                    const CH: Channel = Channel::$CH;
                }
            )+
        )+
    };
}

pwm_pins! {
    TIM1: [PC3 => C1, PC4 => C2, PC6 => C3, PC7 => C4], 6;
    TIM2: [PA2 => C1, PA3 => C2, PD3 => C3, PD4 => C4], 7;
}

/// Output compare mode register and field position of a channel
fn ccmr_of(regs: &tim::RegisterBlock, ch: Channel) -> (&crate::pac::Reg, u8) {
    let n = ch.index();
    if n < 2 {
        (&regs.ccmr1, n)
    } else {
        (&regs.ccmr2, n - 2)
    }
}

/// Duty register value for a fraction `num / den` of the period
pub fn duty_for(max_duty: u16, num: u32, den: u32) -> u16 {
    if den == 0 {
        return 0;
    }
    let duty = u32::from(max_duty) * num.min(den) / den;
    cast::u16(duty).unwrap_or(max_duty)
}

/// Multi-channel PWM
pub struct Pwm<TIM, PINS> {
    tim: TIM,
    pins: PINS,
    clk: Hertz,
}

impl<TIM: Instance, PINS: Pins<TIM>> Pwm<TIM, PINS> {
    /// Sets up the timer at `freq` with every pin's channel in PWM mode 1, outputs disabled
    pub fn new(
        tim: TIM,
        pins: PINS,
        freq: impl Into<Hertz>,
        clocks: &Clocks,
        apb: &mut APB,
    ) -> Self {
        TIM::enable(apb);
        TIM::reset(apb);

        let mut pwm = Pwm {
            tim,
            pins,
            clk: TIM::clock(clocks),
        };

        for ch in [Channel::C1, Channel::C2, Channel::C3, Channel::C4] {
            if PINS::CHANNELS & (1 << ch.index()) != 0 {
                let (ccmr, n) = ccmr_of(&pwm.tim, ch);
                ccmr.modify(|r| {
                    tim::ccmr::ocm(n).set(r, tim::ccmr::PWM_MODE1) | tim::ccmr::ocpe(n)
                });
            }
        }

        pwm.tim.cr1.write(tim::cr1::ARPE);
        pwm.apply_period(freq.into());
        if TIM::ADVANCED {
            pwm.tim.bdtr.set_bits(tim::bdtr::MOE);
        }
        pwm.tim.cr1.set_bits(tim::cr1::CEN);
        pwm
    }

    fn apply_period(&mut self, freq: Hertz) {
        let (psc, arr) = timing_16(self.clk, freq);
        self.tim.psc.write(u32::from(psc));
        self.tim.arr.write(u32::from(arr));
        self.tim.egr.write(tim::egr::UG);
    }

    fn has(&self, ch: Channel) -> bool {
        PINS::CHANNELS & (1 << ch.index()) != 0
    }

    /// Inverts the output of `channel`
    pub fn set_polarity_inverted(&mut self, channel: Channel, inverted: bool) {
        let bit = tim::ccer::ccp(channel.index());
        if inverted {
            self.tim.ccer.set_bits(bit);
        } else {
            self.tim.ccer.clear_bits(bit);
        }
    }

    /// Borrows a single channel as a [`PwmPin`](embedded_hal::PwmPin)
    pub fn channel(&mut self, channel: Channel) -> Option<PwmChannel<'_, TIM>> {
        if self.has(channel) {
            Some(PwmChannel {
                tim: &self.tim,
                ch: channel,
            })
        } else {
            None
        }
    }

    /// Stops the timer and returns the timer and the pins
    pub fn release(self) -> (TIM, PINS) {
        self.tim.cr1.clear_bits(tim::cr1::CEN);
        self.tim.ccer.write(0);
        (self.tim, self.pins)
    }
}

impl<TIM: Instance, PINS: Pins<TIM>> embedded_hal::Pwm for Pwm<TIM, PINS> {
    type Channel = Channel;
    type Time = Hertz;
    type Duty = u16;

    fn disable(&mut self, channel: Channel) {
        self.tim.ccer.clear_bits(tim::ccer::cce(channel.index()));
    }

    fn enable(&mut self, channel: Channel) {
        if self.has(channel) {
            self.tim.ccer.set_bits(tim::ccer::cce(channel.index()));
        }
    }

    fn get_period(&self) -> Hertz {
        let psc = self.tim.psc.read_field(tim::PSC);
        let arr = self.tim.arr.read() & 0xFFFF;
        Hertz(self.clk.0 / ((psc + 1) * (arr + 1)))
    }

    fn get_duty(&self, channel: Channel) -> u16 {
        self.tim.ccr[usize::from(channel.index())].read() as u16
    }

    fn get_max_duty(&self) -> u16 {
        (self.tim.arr.read() as u16).saturating_add(1)
    }

    fn set_duty(&mut self, channel: Channel, duty: u16) {
        self.tim.ccr[usize::from(channel.index())].write(u32::from(duty));
    }

    fn set_period<P>(&mut self, period: P)
    where
        P: Into<Hertz>,
    {
        self.apply_period(period.into());
    }
}

/// A single PWM channel borrowed from [`Pwm`]
pub struct PwmChannel<'a, TIM> {
    tim: &'a TIM,
    ch: Channel,
}

impl<'a, TIM: Instance> embedded_hal::PwmPin for PwmChannel<'a, TIM> {
    type Duty = u16;

    fn disable(&mut self) {
        self.tim.ccer.clear_bits(tim::ccer::cce(self.ch.index()));
    }

    fn enable(&mut self) {
        self.tim.ccer.set_bits(tim::ccer::cce(self.ch.index()));
    }

    fn get_duty(&self) -> u16 {
        self.tim.ccr[usize::from(self.ch.index())].read() as u16
    }

    fn get_max_duty(&self) -> u16 {
        (self.tim.arr.read() as u16).saturating_add(1)
    }

    fn set_duty(&mut self, duty: u16) {
        self.tim.ccr[usize::from(self.ch.index())].write(u32::from(duty));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ch2;
    struct Ch4;

    impl PinCh<TIM1> for Ch2 {
        const CH: Channel = Channel::C2;
    }

    impl PinCh<TIM1> for Ch4 {
        const CH: Channel = Channel::C4;
    }

    #[test]
    fn pin_sets_map_to_channels() {
        assert_eq!(<(Ch2,) as Pins<TIM1>>::CHANNELS, 0b0010);
        assert_eq!(<(Ch2, Ch4) as Pins<TIM1>>::CHANNELS, 0b1010);
    }

    #[test]
    fn duty_fractions() {
        assert_eq!(duty_for(1000, 1, 2), 500);
        assert_eq!(duty_for(1000, 3, 2), 1000);
        assert_eq!(duty_for(u16::MAX, 1, 1), u16::MAX);
        assert_eq!(duty_for(1000, 1, 0), 0);
    }
}
