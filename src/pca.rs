// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Programmable counter array
//!
//! A 16-bit counter shared by five capture/compare modules. Each module is either an 8-bit PWM
//! output, a compare output (optionally toggling the pin on match), or an edge capture.
//! [`PcaCapture`] measures period and pulse width of a signal on one module from the PCA
//! interrupt.
//!
//! Module outputs/inputs are on CH0 PC3, CH1 PC4, CH2 PC5, CH3 PC6, CH4 PC7 (AF3); the pins
//! are configured by the caller.

use crate::pac::{pca, PCA};
use crate::rcc::{BusClock, Clocks, Enable, Reset, APB};
use crate::time::Hertz;

/// Number of capture/compare modules
pub const MODULES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// A measurement is already running
    Busy,
    /// The counter clock has no known frequency
    UnknownClock,
}

/// Counter clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockSource {
    PclkDiv32 = 0,
    PclkDiv16 = 1,
    PclkDiv8 = 2,
    PclkDiv4 = 3,
    PclkDiv2 = 4,
    /// Overflow of TIM10
    Tim10 = 5,
    /// Overflow of TIM11
    Tim11 = 6,
    /// External clock input
    Eci = 7,
}

impl ClockSource {
    /// Counter frequency, for the PCLK derived sources
    pub fn frequency(self, pclk: Hertz) -> Option<Hertz> {
        let div = match self {
            ClockSource::PclkDiv32 => 32,
            ClockSource::PclkDiv16 => 16,
            ClockSource::PclkDiv8 => 8,
            ClockSource::PclkDiv4 => 4,
            ClockSource::PclkDiv2 => 2,
            _ => return None,
        };
        Some(Hertz(pclk.0 / div))
    }
}

/// Capture/compare module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Module {
    M0 = 0,
    M1 = 1,
    M2 = 2,
    M3 = 3,
    M4 = 4,
}

impl Module {
    const fn index(self) -> usize {
        self as usize
    }

    const fn flag(self) -> u32 {
        pca::ccon::ccf(self as u8)
    }
}

/// Captured edges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    Rising,
    Falling,
    Both,
}

impl Edge {
    const fn bits(self) -> u32 {
        match self {
            Edge::Rising => pca::ccapm::CAPP,
            Edge::Falling => pca::ccapm::CAPN,
            Edge::Both => pca::ccapm::CAPP | pca::ccapm::CAPN,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Counter overflow
    Overflow,
    /// Capture or compare match of a module
    Module(Module),
}

/// Maximum 8-bit PWM duty
pub const PWM_MAX_DUTY: u16 = 256;

/// Compare reload of an 8-bit PWM module
///
/// The output is high while the low counter byte is at or above the reload, so a duty of
/// `d / 256` takes a reload of `256 - d`. A duty of 0 is reached by disabling the comparator.
pub fn pwm_reload(duty: u16) -> Option<u8> {
    match duty {
        0 => None,
        d => Some((PWM_MAX_DUTY - d.min(PWM_MAX_DUTY)) as u8),
    }
}

/// Programmable counter array
pub struct Pca {
    pca: PCA,
    clock: ClockSource,
    pclk: Hertz,
}

impl Pca {
    /// Configures the counter clock, the counter is stopped
    pub fn new(pca: PCA, clock: ClockSource, clocks: &Clocks, apb: &mut APB) -> Self {
        PCA::enable(apb);
        PCA::reset(apb);

        pca.cmod.write(pca::cmod::CPS.val(clock as u32));
        pca.carr.write(0xFFFF);
        Pca {
            pca,
            clock,
            pclk: PCA::clock(clocks),
        }
    }

    /// Counter frequency, `None` for timer overflow and external clocks
    pub fn tick_hz(&self) -> Option<Hertz> {
        self.clock.frequency(self.pclk)
    }

    pub fn start(&mut self) {
        self.pca.ccon.set_bits(pca::ccon::CR);
    }

    pub fn stop(&mut self) {
        self.pca.ccon.clear_bits(pca::ccon::CR);
    }

    /// Counter wraps to zero after `reload`
    pub fn set_reload(&mut self, reload: u16) {
        self.pca.carr.write(u32::from(reload));
    }

    /// Stops counting while the core sleeps
    pub fn set_idle_stop(&mut self, stop: bool) {
        if stop {
            self.pca.cmod.set_bits(pca::cmod::CIDL);
        } else {
            self.pca.cmod.clear_bits(pca::cmod::CIDL);
        }
    }

    pub fn counter(&self) -> u16 {
        self.pca.cnt.read() as u16
    }

    /// Puts `module` in 8-bit PWM mode with a duty of `duty / 256`
    pub fn set_pwm(&mut self, module: Module, duty: u16) {
        let n = module.index();
        match pwm_reload(duty) {
            Some(reload) => {
                let reload = u32::from(reload);
                self.pca.ccap[n]
                    .write(pca::ccap::LOW.val(reload) | pca::ccap::HIGH.val(reload));
                self.pca.ccapm[n].write(pca::ccapm::ECOM | pca::ccapm::PWM);
            }
            None => self.pca.ccapm[n].write(pca::ccapm::PWM),
        }
        self.pca.ccapo.set_bits(1 << n);
    }

    /// Compare match at `value`, toggling the module output on every match if `toggle`
    pub fn set_compare(&mut self, module: Module, value: u16, toggle: bool) {
        let n = module.index();
        self.pca.ccap[n].write(pca::ccap::VALUE.val(u32::from(value)));
        let mut mode = pca::ccapm::ECOM | pca::ccapm::MAT;
        if toggle {
            mode |= pca::ccapm::TOG;
            self.pca.ccapo.set_bits(1 << n);
        }
        self.pca.ccapm[n].modify(|r| (r & pca::ccapm::CCIE) | mode);
    }

    /// Captures the counter on `edge` of the module input
    pub fn set_capture(&mut self, module: Module, edge: Edge) {
        let n = module.index();
        self.pca.ccapm[n].modify(|r| (r & pca::ccapm::CCIE) | edge.bits());
        self.pca.ccapo.clear_bits(1 << n);
    }

    /// Inverts the module output
    pub fn set_output_inverted(&mut self, module: Module, inverted: bool) {
        if inverted {
            self.pca.pocr.set_bits(1 << module.index());
        } else {
            self.pca.pocr.clear_bits(1 << module.index());
        }
    }

    /// Turns a module off
    pub fn disable(&mut self, module: Module) {
        self.pca.ccapm[module.index()].write(0);
        self.pca.ccapo.clear_bits(1 << module.index());
    }

    /// Last captured counter value
    pub fn captured(&self, module: Module) -> u16 {
        self.pca.ccap[module.index()].read_field(pca::ccap::VALUE) as u16
    }

    pub fn listen(&mut self, event: Event) {
        match event {
            Event::Overflow => self.pca.cmod.set_bits(pca::cmod::CFIE),
            Event::Module(m) => self.pca.ccapm[m.index()].set_bits(pca::ccapm::CCIE),
        }
    }

    pub fn unlisten(&mut self, event: Event) {
        match event {
            Event::Overflow => self.pca.cmod.clear_bits(pca::cmod::CFIE),
            Event::Module(m) => self.pca.ccapm[m.index()].clear_bits(pca::ccapm::CCIE),
        }
    }

    pub fn is_pending(&self, event: Event) -> bool {
        match event {
            Event::Overflow => self.pca.ccon.is_set(pca::ccon::CF),
            Event::Module(m) => self.pca.ccon.is_set(m.flag()),
        }
    }

    pub fn clear_interrupt(&mut self, event: Event) {
        let flag = match event {
            Event::Overflow => pca::ccon::CF,
            Event::Module(m) => m.flag(),
        };
        self.pca.icr.write(flag);
    }

    /// Moves `module` into interrupt driven period/width measurement
    pub fn into_capture(self, module: Module) -> PcaCapture {
        PcaCapture {
            pca: self,
            module,
            tracker: CaptureTracker::new(),
            state: CaptureState::Ready,
            last: None,
        }
    }

    pub fn release(self) -> PCA {
        self.pca.ccon.clear_bits(pca::ccon::CR);
        self.pca
    }
}

/// Period and high time of a captured signal, in counter ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    pub period: u32,
    pub width: u32,
}

impl Measurement {
    pub fn frequency(&self, tick: Hertz) -> Option<Hertz> {
        if self.period == 0 {
            None
        } else {
            Some(Hertz(tick.0 / self.period))
        }
    }

    /// High time in percent of the period
    pub fn duty_percent(&self) -> u32 {
        if self.period == 0 {
            0
        } else {
            (u64::from(self.width) * 100 / u64::from(self.period)) as u32
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    FirstRise,
    Fall,
    SecondRise,
}

/// Counter extended to 32 bits with the overflow count, and the edge sequence
/// rise → fall → rise
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CaptureTracker {
    overflows: u16,
    phase: Phase,
    rise: u32,
    fall: u32,
}

impl CaptureTracker {
    const fn new() -> Self {
        CaptureTracker {
            overflows: 0,
            phase: Phase::FirstRise,
            rise: 0,
            fall: 0,
        }
    }

    fn on_overflow(&mut self) {
        self.overflows = self.overflows.wrapping_add(1);
    }

    fn stamp(&self, captured: u16) -> u32 {
        (u32::from(self.overflows) << 16) | u32::from(captured)
    }

    /// Edge the module must capture next
    fn next_edge(&self) -> Edge {
        match self.phase {
            Phase::Fall => Edge::Falling,
            Phase::FirstRise | Phase::SecondRise => Edge::Rising,
        }
    }

    /// Handles the flags found pending in one interrupt
    ///
    /// A capture in the upper half of the range was latched before a pending overflow, so it
    /// takes the overflow count from before the wrap.
    fn service(&mut self, overflowed: bool, captured: Option<u16>) -> Option<Measurement> {
        match captured {
            Some(value) if overflowed && value >= 0x8000 => {
                let m = self.on_capture(value);
                if m.is_none() {
                    self.on_overflow();
                }
                m
            }
            Some(value) => {
                if overflowed {
                    self.on_overflow();
                }
                self.on_capture(value)
            }
            None => {
                if overflowed {
                    self.on_overflow();
                }
                None
            }
        }
    }

    fn on_capture(&mut self, captured: u16) -> Option<Measurement> {
        let now = self.stamp(captured);
        match self.phase {
            Phase::FirstRise => {
                self.rise = now;
                self.phase = Phase::Fall;
                None
            }
            Phase::Fall => {
                self.fall = now;
                self.phase = Phase::SecondRise;
                None
            }
            Phase::SecondRise => {
                let m = Measurement {
                    period: now.wrapping_sub(self.rise),
                    width: self.fall.wrapping_sub(self.rise),
                };
                *self = CaptureTracker::new();
                Some(m)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CaptureState {
    Ready,
    Busy,
}

/// Hooks of [`PcaCapture`]
pub trait CaptureCallbacks {
    fn measured(&mut self, _measurement: &Measurement) {}
}

/// Interrupt driven period and pulse width measurement on one module
pub struct PcaCapture {
    pca: Pca,
    module: Module,
    tracker: CaptureTracker,
    state: CaptureState,
    last: Option<Measurement>,
}

impl PcaCapture {
    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Last complete measurement
    pub fn last(&self) -> Option<Measurement> {
        self.last
    }

    /// Starts one measurement, `on_interrupt` stops the counter once it completes
    pub fn start(&mut self) -> Result<(), Error> {
        if self.state == CaptureState::Busy {
            return Err(Error::Busy);
        }
        self.tracker = CaptureTracker::new();
        self.pca.set_capture(self.module, self.tracker.next_edge());
        self.pca.clear_interrupt(Event::Overflow);
        self.pca.clear_interrupt(Event::Module(self.module));
        self.pca.listen(Event::Overflow);
        self.pca.listen(Event::Module(self.module));
        self.state = CaptureState::Busy;
        self.pca.start();
        Ok(())
    }

    pub fn stop(&mut self) {
        self.pca.unlisten(Event::Overflow);
        self.pca.unlisten(Event::Module(self.module));
        self.pca.stop();
        self.state = CaptureState::Ready;
    }

    /// Services the PCA interrupt
    pub fn on_interrupt(&mut self, callbacks: &mut impl CaptureCallbacks) {
        let overflowed = self.pca.is_pending(Event::Overflow);
        if overflowed {
            self.pca.clear_interrupt(Event::Overflow);
        }
        let module = Event::Module(self.module);
        let captured = if self.pca.is_pending(module) {
            self.pca.clear_interrupt(module);
            Some(self.pca.captured(self.module))
        } else {
            None
        };

        if let Some(m) = self.tracker.service(overflowed, captured) {
            self.last = Some(m);
            self.stop();
            callbacks.measured(&m);
        } else if captured.is_some() {
            self.pca.set_capture(self.module, self.tracker.next_edge());
        }
    }

    /// Frequency of the last measurement
    pub fn frequency(&self) -> Result<Option<Hertz>, Error> {
        let tick = self.pca.tick_hz().ok_or(Error::UnknownClock)?;
        Ok(self.last.and_then(|m| m.frequency(tick)))
    }

    pub fn release(mut self) -> Pca {
        self.stop();
        self.pca.disable(self.module);
        self.pca
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pwm_reload_inverts_duty() {
        assert_eq!(pwm_reload(0), None);
        assert_eq!(pwm_reload(1), Some(255));
        assert_eq!(pwm_reload(128), Some(128));
        assert_eq!(pwm_reload(256), Some(0));
        assert_eq!(pwm_reload(1000), Some(0));
    }

    #[test]
    fn counter_clock() {
        let pclk = Hertz(24_000_000);
        assert_eq!(ClockSource::PclkDiv32.frequency(pclk), Some(Hertz(750_000)));
        assert_eq!(ClockSource::PclkDiv2.frequency(pclk), Some(Hertz(12_000_000)));
        assert_eq!(ClockSource::Eci.frequency(pclk), None);
    }

    #[test]
    fn capture_sequence() {
        let mut t = CaptureTracker::new();
        assert_eq!(t.next_edge(), Edge::Rising);
        assert_eq!(t.on_capture(1_000), None);
        assert_eq!(t.next_edge(), Edge::Falling);
        assert_eq!(t.on_capture(1_250), None);
        assert_eq!(t.next_edge(), Edge::Rising);
        assert_eq!(
            t.on_capture(2_000),
            Some(Measurement {
                period: 1_000,
                width: 250
            })
        );
        assert_eq!(t, CaptureTracker::new());
    }

    #[test]
    fn capture_across_overflow() {
        let mut t = CaptureTracker::new();
        t.on_capture(65_000);
        t.on_overflow();
        t.on_capture(100);
        let m = t.on_capture(600).map(|m| (m.period, m.width));
        assert_eq!(m, Some((1_136, 636)));
    }

    #[test]
    fn fall_latched_just_before_wrap() {
        let mut t = CaptureTracker::new();
        assert_eq!(t.service(false, Some(65_000)), None);
        // overflow and capture pending together, the capture came first
        assert_eq!(t.service(true, Some(65_400)), None);
        let m = t.service(false, Some(464)).map(|m| (m.period, m.width));
        assert_eq!(m, Some((1_000, 400)));
    }

    #[test]
    fn rise_latched_just_after_wrap() {
        let mut t = CaptureTracker::new();
        t.service(false, Some(65_000));
        t.service(false, Some(65_300));
        let m = t.service(true, Some(464)).map(|m| (m.period, m.width));
        assert_eq!(m, Some((1_000, 300)));
    }

    #[test]
    fn measurement_derivations() {
        let m = Measurement {
            period: 750,
            width: 250,
        };
        assert_eq!(m.frequency(Hertz(750_000)), Some(Hertz(1_000)));
        assert_eq!(m.duty_percent(), 33);
    }
}
