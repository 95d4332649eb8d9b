// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Timers
//!
//! Count-down timers on SysTick, the basic timers TIM10/TIM11 and the 16-bit timers TIM1/TIM2.
//! For PWM on TIM1/TIM2 see [`pwm`](crate::pwm).
//!
//! ```ignore
//! let mut timer = Timer::tim10(dp.TIM10, &clocks, &mut rcc.apb).start_count_down(2.hz());
//! loop {
//!     block!(timer.wait()).ok();
//!     led.toggle().ok();
//! }
//! ```

use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::SYST;
use embedded_hal::timer::{Cancel, CountDown, Periodic};
use void::Void;

use crate::pac::{basetim, tim, TIM1, TIM10, TIM11, TIM2};
use crate::rcc::{BusClock, Clocks, Enable, Reset, APB};
use crate::time::Hertz;

/// Interrupt events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Timer timed out / count down ended
    Update,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// Timer is disabled
    Disabled,
}

/// Hardware timer
pub struct Timer<TIM> {
    pub(crate) tim: TIM,
    pub(crate) clk: Hertz,
}

/// Running count-down timer
pub struct CountDownTimer<TIM> {
    tim: TIM,
    clk: Hertz,
}

/// Counter ticks for one period of `freq`, at least one
fn ticks_for(clk: Hertz, freq: Hertz) -> u32 {
    (clk.0 / freq.0.max(1)).max(1)
}

/// Prescaler exponent and load value of a basic timer period
///
/// A 32-bit counter covers every period reachable from a `u32` frequency undivided.
pub fn basic_timing(clk: Hertz, freq: Hertz) -> (u32, u32) {
    (0, ticks_for(clk, freq) - 1)
}

/// Prescaler and auto-reload of a 16-bit timer period
pub fn timing_16(clk: Hertz, freq: Hertz) -> (u16, u16) {
    let ticks = ticks_for(clk, freq);
    let psc = (ticks - 1) / (1 << 16);
    let arr = (ticks / (psc + 1)).saturating_sub(1);
    (
        cast::u16(psc).unwrap_or(u16::MAX),
        cast::u16(arr).unwrap_or(u16::MAX),
    )
}

/// SysTick reload for one period of `freq`, clamped to the 24-bit counter
fn syst_reload(clk: Hertz, freq: Hertz) -> u32 {
    (ticks_for(clk, freq) - 1).min(0x00FF_FFFF)
}

impl Timer<SYST> {
    /// SysTick clocked from the core clock
    pub fn syst(mut syst: SYST, clocks: &Clocks) -> Self {
        syst.set_clock_source(SystClkSource::Core);
        Timer {
            tim: syst,
            clk: clocks.hclk(),
        }
    }

    pub fn start_count_down<T>(self, timeout: T) -> CountDownTimer<SYST>
    where
        T: Into<Hertz>,
    {
        let Self { tim, clk } = self;
        let mut timer = CountDownTimer { tim, clk };
        timer.start(timeout);
        timer
    }

    pub fn release(self) -> SYST {
        self.tim
    }
}

impl CountDownTimer<SYST> {
    /// Starts listening for an `event`
    pub fn listen(&mut self, event: Event) {
        match event {
            Event::Update => self.tim.enable_interrupt(),
        }
    }

    /// Stops listening for an `event`
    pub fn unlisten(&mut self, event: Event) {
        match event {
            Event::Update => self.tim.disable_interrupt(),
        }
    }

    /// Current counter value, counting down
    pub fn value(&self) -> u32 {
        SYST::get_current()
    }

    pub fn release(mut self) -> Timer<SYST> {
        self.tim.disable_counter();
        let Self { tim, clk } = self;
        Timer { tim, clk }
    }
}

impl CountDown for CountDownTimer<SYST> {
    type Time = Hertz;

    fn start<T>(&mut self, timeout: T)
    where
        T: Into<Hertz>,
    {
        self.tim.set_reload(syst_reload(self.clk, timeout.into()));
        self.tim.clear_current();
        self.tim.enable_counter();
    }

    fn wait(&mut self) -> nb::Result<(), Void> {
        if self.tim.has_wrapped() {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}

impl Cancel for CountDownTimer<SYST> {
    type Error = Error;

    fn cancel(&mut self) -> Result<(), Error> {
        if !self.tim.is_counter_enabled() {
            return Err(Error::Disabled);
        }
        self.tim.disable_counter();
        Ok(())
    }
}

impl Periodic for CountDownTimer<SYST> {}

/// Level of the gate input that lets a basic timer count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GatePolarity {
    High,
    Low,
}

macro_rules! basic_timers {
    ($($TIMX:ident: $timX:ident,)+) => {
        $(
            impl Timer<$TIMX> {
                /// Basic timer, stopped, 32-bit counter
                ///
                /// TIM10 and TIM11 share a reset line, so the counter is cleared without a
                /// peripheral reset.
                pub fn $timX(tim: $TIMX, clocks: &Clocks, apb: &mut APB) -> Self {
                    $TIMX::enable(apb);
                    tim.cr.write(0);
                    tim.intclr.write(basetim::intsr::TF);
                    Timer { clk: $TIMX::clock(clocks), tim }
                }

                /// Periodic count down, reloading from the background load register
                pub fn start_count_down<T>(self, timeout: T) -> CountDownTimer<$TIMX>
                where
                    T: Into<Hertz>,
                {
                    let Self { tim, clk } = self;
                    let mut timer = CountDownTimer { tim, clk };
                    timer.start(timeout);
                    timer
                }

                /// Counts down once and stops
                pub fn start_one_shot<T>(self, timeout: T) -> CountDownTimer<$TIMX>
                where
                    T: Into<Hertz>,
                {
                    let Self { tim, clk } = self;
                    let (prs, load) = basic_timing(clk, timeout.into());
                    tim.load.write(load);
                    tim.cr.write(
                        basetim::cr::TMRSZ | basetim::cr::ONESHOT | basetim::cr::PRS.val(prs),
                    );
                    tim.intclr.write(basetim::intsr::TF);
                    tim.cr.set_bits(basetim::cr::TR);
                    CountDownTimer { tim, clk }
                }

                /// Free running counter from 0xFFFF_FFFF down at `clk / 2^prescaler`
                pub fn start_free_running(self, prescaler: u8) -> CountDownTimer<$TIMX> {
                    let Self { tim, clk } = self;
                    tim.load.write(u32::MAX);
                    tim.cr.write(
                        basetim::cr::TMRSZ
                            | basetim::cr::PRS.val(u32::from(prescaler))
                            | basetim::cr::TR,
                    );
                    CountDownTimer { tim, clk }
                }

                pub fn release(self) -> $TIMX {
                    self.tim
                }
            }

            impl CountDownTimer<$TIMX> {
                pub fn listen(&mut self, event: Event) {
                    match event {
                        Event::Update => self.tim.cr.set_bits(basetim::cr::INTEN),
                    }
                }

                pub fn unlisten(&mut self, event: Event) {
                    match event {
                        Event::Update => self.tim.cr.clear_bits(basetim::cr::INTEN),
                    }
                }

                /// Whether the update interrupt is pending
                pub fn is_pending(&self) -> bool {
                    self.tim.mskintsr.is_set(basetim::intsr::TF)
                }

                pub fn clear_interrupt(&mut self, event: Event) {
                    match event {
                        Event::Update => self.tim.intclr.write(basetim::intsr::TF),
                    }
                }

                /// Counts only while the gate input is at the given level; `None` counts freely
                pub fn set_gate(&mut self, gate: Option<GatePolarity>) {
                    self.tim.cr.modify(|r| {
                        let r = r & !(basetim::cr::GATE | basetim::cr::GATE_P);
                        match gate {
                            None => r,
                            Some(GatePolarity::High) => r | basetim::cr::GATE,
                            Some(GatePolarity::Low) => {
                                r | basetim::cr::GATE | basetim::cr::GATE_P
                            }
                        }
                    });
                }

                /// Toggles the timer output pin at every update
                pub fn set_toggle_output(&mut self, enable: bool) {
                    if enable {
                        self.tim.cr.set_bits(basetim::cr::TOG_EN);
                    } else {
                        self.tim.cr.clear_bits(basetim::cr::TOG_EN);
                    }
                }

                /// Counts edges of the external input instead of the bus clock
                pub fn set_external_clock(&mut self, enable: bool) {
                    if enable {
                        self.tim.cr.set_bits(basetim::cr::CT);
                    } else {
                        self.tim.cr.clear_bits(basetim::cr::CT);
                    }
                }

                /// Period used from the next reload on, the running period is not cut short
                pub fn reload_at<T: Into<Hertz>>(&mut self, timeout: T) {
                    let (_, load) = basic_timing(self.clk, timeout.into());
                    self.tim.bgload.write(load);
                }

                /// Current counter value
                pub fn value(&self) -> u32 {
                    self.tim.value.read()
                }

                pub fn release(self) -> Timer<$TIMX> {
                    self.tim.cr.write(0);
                    let Self { tim, clk } = self;
                    Timer { tim, clk }
                }
            }

            impl CountDown for CountDownTimer<$TIMX> {
                type Time = Hertz;

                fn start<T>(&mut self, timeout: T)
                where
                    T: Into<Hertz>,
                {
                    let (prs, load) = basic_timing(self.clk, timeout.into());
                    let keep = self.tim.cr.read() & (basetim::cr::INTEN | basetim::cr::TOG_EN);
                    self.tim.cr.write(keep);
                    self.tim.load.write(load);
                    self.tim.bgload.write(load);
                    self.tim.intclr.write(basetim::intsr::TF);
                    self.tim.cr.write(
                        keep | basetim::cr::MODE
                            | basetim::cr::TMRSZ
                            | basetim::cr::PRS.val(prs)
                            | basetim::cr::TR,
                    );
                }

                fn wait(&mut self) -> nb::Result<(), Void> {
                    if self.tim.rawintsr.is_set(basetim::intsr::TF) {
                        self.tim.intclr.write(basetim::intsr::TF);
                        Ok(())
                    } else {
                        Err(nb::Error::WouldBlock)
                    }
                }
            }

            impl Cancel for CountDownTimer<$TIMX> {
                type Error = Error;

                fn cancel(&mut self) -> Result<(), Error> {
                    if !self.tim.cr.is_set(basetim::cr::TR) {
                        return Err(Error::Disabled);
                    }
                    self.tim.cr.clear_bits(basetim::cr::TR);
                    Ok(())
                }
            }

            impl Periodic for CountDownTimer<$TIMX> {}
        )+
    }
}

basic_timers! {
    TIM10: tim10,
    TIM11: tim11,
}

macro_rules! timers {
    ($($TIMX:ident: $timX:ident,)+) => {
        $(
            impl Timer<$TIMX> {
                pub fn $timX(tim: $TIMX, clocks: &Clocks, apb: &mut APB) -> Self {
                    $TIMX::enable(apb);
                    $TIMX::reset(apb);
                    Timer { clk: $TIMX::clock(clocks), tim }
                }

                pub fn start_count_down<T>(self, timeout: T) -> CountDownTimer<$TIMX>
                where
                    T: Into<Hertz>,
                {
                    let Self { tim, clk } = self;
                    let mut timer = CountDownTimer { tim, clk };
                    timer.start(timeout);
                    timer
                }

                pub fn release(self) -> $TIMX {
                    self.tim
                }
            }

            impl CountDownTimer<$TIMX> {
                pub fn listen(&mut self, event: Event) {
                    match event {
                        Event::Update => self.tim.dier.set_bits(tim::dier::UIE),
                    }
                }

                pub fn unlisten(&mut self, event: Event) {
                    match event {
                        Event::Update => self.tim.dier.clear_bits(tim::dier::UIE),
                    }
                }

                pub fn clear_interrupt(&mut self, event: Event) {
                    match event {
                        Event::Update => self.tim.sr.clear_bits(tim::sr::UIF),
                    }
                }

                pub fn release(self) -> Timer<$TIMX> {
                    self.tim.cr1.clear_bits(tim::cr1::CEN);
                    let Self { tim, clk } = self;
                    Timer { tim, clk }
                }
            }

            impl CountDown for CountDownTimer<$TIMX> {
                type Time = Hertz;

                fn start<T>(&mut self, timeout: T)
                where
                    T: Into<Hertz>,
                {
                    self.tim.cr1.clear_bits(tim::cr1::CEN);
                    let (psc, arr) = timing_16(self.clk, timeout.into());
                    self.tim.psc.write(u32::from(psc));
                    self.tim.arr.write(u32::from(arr));
                    // load the prescaler now; URS keeps the forced update from raising UIF
                    self.tim.cr1.set_bits(tim::cr1::URS);
                    self.tim.egr.write(tim::egr::UG);
                    self.tim.sr.clear_bits(tim::sr::UIF);
                    self.tim.cr1.set_bits(tim::cr1::CEN);
                }

                fn wait(&mut self) -> nb::Result<(), Void> {
                    if self.tim.sr.is_set(tim::sr::UIF) {
                        self.tim.sr.clear_bits(tim::sr::UIF);
                        Ok(())
                    } else {
                        Err(nb::Error::WouldBlock)
                    }
                }
            }

            impl Cancel for CountDownTimer<$TIMX> {
                type Error = Error;

                fn cancel(&mut self) -> Result<(), Error> {
                    if !self.tim.cr1.is_set(tim::cr1::CEN) {
                        return Err(Error::Disabled);
                    }
                    self.tim.cr1.clear_bits(tim::cr1::CEN);
                    Ok(())
                }
            }

            impl Periodic for CountDownTimer<$TIMX> {}
        )+
    }
}

timers! {
    TIM1: tim1,
    TIM2: tim2,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_timer_load() {
        assert_eq!(basic_timing(Hertz(24_000_000), Hertz(1)), (0, 23_999_999));
        assert_eq!(basic_timing(Hertz(24_000_000), Hertz(1_000)), (0, 23_999));
        // faster than the clock saturates to one tick
        assert_eq!(basic_timing(Hertz(4_000_000), Hertz(8_000_000)), (0, 0));
    }

    #[test]
    fn sixteen_bit_split() {
        // 24 MHz / 1 Hz = 24_000_000 ticks = 367 * 65_395 (rounded)
        let (psc, arr) = timing_16(Hertz(24_000_000), Hertz(1));
        assert_eq!(psc, 366);
        assert_eq!(u32::from(arr), 24_000_000 / 367 - 1);

        assert_eq!(timing_16(Hertz(24_000_000), Hertz(1_000)), (0, 23_999));
        assert_eq!(timing_16(Hertz(4_000_000), Hertz(50)), (1, 39_999));
    }

    #[test]
    fn systick_reload_is_clamped() {
        assert_eq!(syst_reload(Hertz(24_000_000), Hertz(1_000)), 23_999);
        assert_eq!(syst_reload(Hertz(24_000_000), Hertz(1)), 0x00FF_FFFF);
    }
}
