// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Reset & Clock Control
//!
//! The CX32L003 has four oscillators: the internal high speed RC (HIRC), an external high speed
//! crystal (HXT), the internal low speed RC (LIRC) and an external 32.768 kHz crystal (LXT). Any of
//! them can drive SYSCLK. HCLK and PCLK are derived from SYSCLK through two dividers where a field
//! value of `0` divides by one and a value of `n` divides by `2n`.
//!
//! [`Rcc::osc_config`] and [`Rcc::clock_config`] give step by step control over the clock tree.
//! The [`CFGR`] builder covers the common case of asking for target frequencies:
//!
//! ```ignore
//! let mut rcc = dp.RCC.constrain();
//! let mut flash = dp.FLASH.constrain();
//! let clocks = rcc
//!     .cfgr
//!     .use_hxt(16.mhz())
//!     .hclk(16.mhz())
//!     .pclk(8.mhz())
//!     .freeze(&mut flash.ws)?;
//! ```

use core::ptr;

use crate::flash::{FlashLatency, FlashWs};
use crate::pac::{rcc, Reg, RCC};
use crate::tick::{self, Deadline};
use crate::time::Hertz;

/// HCLK after reset: HIRC trimmed to 4 MHz, no division
pub const RESET_HCLK: Hertz = Hertz(4_000_000);
/// LXT nominal frequency
pub const LXT_FREQ: Hertz = Hertz(32_768);

/// Millisecond budgets for an oscillator to report stable
pub const HIRC_TIMEOUT_MS: u32 = 10;
pub const HXT_TIMEOUT_MS: u32 = 100;
pub const LIRC_TIMEOUT_MS: u32 = 10;
pub const LXT_TIMEOUT_MS: u32 = 5_000;
/// Millisecond budget for SYSCLK to switch over
pub const CLOCK_SWITCH_TIMEOUT_MS: u32 = 5_000;

/// Factory trim values, stored in the information area of the flash
const HIRC_TRIM_24M: u32 = 0x0018_00C0;
const HIRC_TRIM_22_12M: u32 = 0x0018_00C4;
const HIRC_TRIM_16M: u32 = 0x0018_00C8;
const HIRC_TRIM_8M: u32 = 0x0018_00CC;
const HIRC_TRIM_4M: u32 = 0x0018_00D0;
const LIRC_TRIM_38_4K: u32 = 0x0018_00A0;
const LIRC_TRIM_32_768K: u32 = 0x0018_00A4;

/// Extension trait that constrains the `RCC` peripheral
pub trait RccExt {
    /// Constrains the `RCC` peripheral so it plays nicely with the other abstractions
    fn constrain(self) -> Rcc;
}

impl RccExt for RCC {
    fn constrain(self) -> Rcc {
        Rcc {
            ahb: AHB { _0: () },
            apb: APB { _0: () },
            cfgr: CFGR::default(),
            hxt: None,
            _rcc: self,
        }
    }
}

/// Constrained RCC peripheral
///
/// Aside from the clock tree operations, this handle hands out the bus tokens used to gate and
/// reset the peripherals.
pub struct Rcc {
    /// AHB peripheral clock gates and resets
    pub ahb: AHB,
    /// APB peripheral clock gates and resets
    pub apb: APB,
    pub cfgr: CFGR,
    hxt: Option<Hertz>,
    _rcc: RCC,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// The oscillator drives SYSCLK and cannot be switched off
    ClockInUse(Oscillator),
    /// The requested SYSCLK source is not running
    NotReady(Oscillator),
    /// The oscillator did not become stable (or stop) in time
    Timeout(Oscillator),
    /// SYSCLK did not switch to the requested source in time
    SwitchTimeout,
    /// The divider is not 1 or an even number up to 510
    InvalidDivider(u32),
    /// The nominal frequency of the oscillator is unknown
    UnknownFrequency(Oscillator),
    /// No divider produces a frequency at or below the target
    UnreachableFrequency,
}

/// Clock sources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Oscillator {
    Hirc,
    Hxt,
    Lirc,
    Lxt,
}

impl Oscillator {
    const fn bits(self) -> u32 {
        match self {
            Oscillator::Hirc => 0,
            Oscillator::Hxt => 1,
            Oscillator::Lirc => 2,
            Oscillator::Lxt => 3,
        }
    }

    const fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0 => Oscillator::Hirc,
            1 => Oscillator::Hxt,
            2 => Oscillator::Lirc,
            _ => Oscillator::Lxt,
        }
    }

    const fn enable_bit(self) -> u32 {
        match self {
            Oscillator::Hirc => rcc::sysclkcr::HIRCEN,
            Oscillator::Hxt => rcc::sysclkcr::HXTEN,
            Oscillator::Lirc => rcc::sysclkcr::LIRCEN,
            Oscillator::Lxt => rcc::sysclkcr::LXTEN,
        }
    }

    const fn timeout_ms(self) -> u32 {
        match self {
            Oscillator::Hirc => HIRC_TIMEOUT_MS,
            Oscillator::Hxt => HXT_TIMEOUT_MS,
            Oscillator::Lirc => LIRC_TIMEOUT_MS,
            Oscillator::Lxt => LXT_TIMEOUT_MS,
        }
    }

    fn is_stable(self, rcc: &rcc::RegisterBlock) -> bool {
        match self {
            Oscillator::Hirc => rcc.hirccr.is_set(rcc::hirccr::STABLE),
            Oscillator::Hxt => rcc.hxtcr.is_set(rcc::hxtcr::STABLE),
            Oscillator::Lirc => rcc.lirccr.is_set(rcc::lirccr::STABLE),
            Oscillator::Lxt => rcc.lxtcr.is_set(rcc::lxtcr::STABLE),
        }
    }
}

/// HIRC frequencies with a factory trim value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HircFreq {
    Mhz4,
    Mhz8,
    Mhz16,
    Mhz22_12,
    Mhz24,
}

impl HircFreq {
    pub const ALL: [HircFreq; 5] = [
        HircFreq::Mhz4,
        HircFreq::Mhz8,
        HircFreq::Mhz16,
        HircFreq::Mhz22_12,
        HircFreq::Mhz24,
    ];

    pub const fn hertz(self) -> Hertz {
        match self {
            HircFreq::Mhz4 => Hertz(4_000_000),
            HircFreq::Mhz8 => Hertz(8_000_000),
            HircFreq::Mhz16 => Hertz(16_000_000),
            HircFreq::Mhz22_12 => Hertz(22_120_000),
            HircFreq::Mhz24 => Hertz(24_000_000),
        }
    }

    const fn trim_address(self) -> u32 {
        match self {
            HircFreq::Mhz4 => HIRC_TRIM_4M,
            HircFreq::Mhz8 => HIRC_TRIM_8M,
            HircFreq::Mhz16 => HIRC_TRIM_16M,
            HircFreq::Mhz22_12 => HIRC_TRIM_22_12M,
            HircFreq::Mhz24 => HIRC_TRIM_24M,
        }
    }

    fn factory_trim(self) -> u32 {
        // NOTE(unsafe) read only access to the information area of the flash
        let trim = unsafe { ptr::read_volatile(self.trim_address() as *const u32) };
        rcc::hirccr::TRIM.get(trim)
    }

    /// Finds the frequency whose factory trim is loaded
    fn from_trim(trim: u32) -> Option<HircFreq> {
        HircFreq::ALL.iter().copied().find(|f| f.factory_trim() == trim)
    }

    /// Highest frequency at or below `target`
    pub fn at_most(target: Hertz) -> Option<HircFreq> {
        HircFreq::ALL
            .iter()
            .rev()
            .copied()
            .find(|f| f.hertz().0 <= target.0)
    }
}

/// LIRC frequencies with a factory trim value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LircFreq {
    Khz32_768,
    Khz38_4,
}

impl LircFreq {
    pub const fn hertz(self) -> Hertz {
        match self {
            LircFreq::Khz32_768 => Hertz(32_768),
            LircFreq::Khz38_4 => Hertz(38_400),
        }
    }

    fn factory_trim(self) -> u32 {
        let address = match self {
            LircFreq::Khz32_768 => LIRC_TRIM_32_768K,
            LircFreq::Khz38_4 => LIRC_TRIM_38_4K,
        };
        // NOTE(unsafe) read only access to the information area of the flash
        let trim = unsafe { ptr::read_volatile(address as *const u32) };
        rcc::lirccr::TRIM.get(trim)
    }

    fn from_trim(trim: u32) -> LircFreq {
        if LircFreq::Khz32_768.factory_trim() == trim {
            LircFreq::Khz32_768
        } else {
            LircFreq::Khz38_4
        }
    }
}

/// Oscillator start-up delay, in oscillator cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Startup {
    Cycles256 = 0,
    Cycles1024 = 1,
    Cycles4096 = 2,
    Cycles16384 = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HircState {
    Off,
    On(HircFreq),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HxtState {
    Off,
    /// Crystal between the oscillator pins; `drive` is the amplifier current, 0..=7
    Crystal {
        freq: Hertz,
        drive: u8,
        startup: Startup,
    },
    /// External clock fed to the input pin
    Bypass(Hertz),
}

impl HxtState {
    /// Nominal frequency, `None` when switched off
    pub fn freq(self) -> Option<Hertz> {
        match self {
            HxtState::Off => None,
            HxtState::Crystal { freq, .. } | HxtState::Bypass(freq) => Some(freq),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LircState {
    Off,
    On(LircFreq),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LxtState {
    Off,
    /// `drive` is the amplifier current, 0..=15
    Crystal { drive: u8, startup: Startup },
    Bypass,
}

/// Oscillators to (re)configure. `None` leaves an oscillator untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OscConfig {
    pub hirc: Option<HircState>,
    pub hxt: Option<HxtState>,
    pub lirc: Option<LircState>,
    pub lxt: Option<LxtState>,
}

/// SYSCLK source and bus dividers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockConfig {
    pub source: Oscillator,
    /// SYSCLK to HCLK ratio, 1 or even up to 510
    pub hclk_div: u32,
    /// HCLK to PCLK ratio, 1 or even up to 510
    pub pclk_div: u32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        ClockConfig {
            source: Oscillator::Hirc,
            hclk_div: 1,
            pclk_div: 1,
        }
    }
}

/// Ratio encoded by a divider field
pub const fn div_from_field(field: u32) -> u32 {
    if field == 0 {
        1
    } else {
        2 * field
    }
}

/// Divider field for a ratio, if the hardware supports it
pub fn field_from_div(div: u32) -> Result<u32, Error> {
    match div {
        1 => Ok(0),
        d if d % 2 == 0 && d >= 2 && d <= 510 => Ok(d / 2),
        d => Err(Error::InvalidDivider(d)),
    }
}

/// Smallest supported ratio that brings `input` to at most `target`
fn div_for_target(input: u32, target: u32) -> Result<u32, Error> {
    if target == 0 {
        return Err(Error::UnreachableFrequency);
    }
    if input <= target {
        return Ok(1);
    }
    let mut div = (input + target - 1) / target;
    if div % 2 != 0 {
        div += 1;
    }
    if div > 510 {
        Err(Error::UnreachableFrequency)
    } else {
        Ok(div)
    }
}

/// Whether an oscillator may be reconfigured while `active` drives SYSCLK
fn check_osc_request(active: Oscillator, osc: Oscillator, switch_off: bool) -> Result<(), Error> {
    if active == osc && switch_off {
        Err(Error::ClockInUse(osc))
    } else {
        Ok(())
    }
}

/// What [`Rcc::osc_config`] does to one oscillator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OscAction {
    /// Not named in the request
    Skip,
    /// Configure, switch on and wait until stable
    Enable,
    /// Switch off and wait until stopped
    Disable,
    /// Drives SYSCLK: only the trim of an RC oscillator is rewritten
    Retrim,
}

/// `request` is `Some(switch_off)` for an oscillator named in the configuration
fn osc_action(
    active: Oscillator,
    osc: Oscillator,
    request: Option<bool>,
) -> Result<OscAction, Error> {
    let switch_off = match request {
        None => return Ok(OscAction::Skip),
        Some(off) => off,
    };
    check_osc_request(active, osc, switch_off)?;
    Ok(if switch_off {
        OscAction::Disable
    } else if active == osc {
        OscAction::Retrim
    } else {
        OscAction::Enable
    })
}

/// Refuses to switch to a source that isn't stable
fn check_source(source: Oscillator, stable: bool) -> Result<(), Error> {
    if stable {
        Ok(())
    } else {
        Err(Error::NotReady(source))
    }
}

/// Order of the register writes of a SYSCLK switch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SwitchSequence {
    /// Wait states to program before anything else
    raise: Option<FlashLatency>,
    /// Write the HCLK divider before selecting the new source
    divider_first: bool,
    /// Wait states to program once the switch completed
    lower: Option<FlashLatency>,
}

/// Plans a switch from `old_sysclk / old_div` to `new_sysclk / new_div`
///
/// A growing divider is written while the old source still runs, a shrinking one after the new
/// source took over. HCLK in between then never exceeds both end points, and the wait states
/// cover the highest of them for the whole sequence.
fn switch_sequence(
    current: FlashLatency,
    old_sysclk: u32,
    old_div: u32,
    new_sysclk: u32,
    new_div: u32,
) -> SwitchSequence {
    let divider_first = new_div >= old_div;
    let transient = if divider_first {
        old_sysclk / new_div
    } else {
        new_sysclk / old_div
    };
    let target = FlashLatency::from_hertz(new_sysclk / new_div);
    let peak = FlashLatency::from_hertz(transient).max(target);
    let during = peak.max(current);
    SwitchSequence {
        raise: if peak > current { Some(peak) } else { None },
        divider_first,
        lower: if target < during { Some(target) } else { None },
    }
}

/// Polls `ready` until it returns `true` or `deadline` expires
fn poll_until(
    deadline: &mut Deadline,
    err: Error,
    mut ready: impl FnMut() -> bool,
) -> Result<(), Error> {
    while !ready() {
        if deadline.expired() {
            return Err(err);
        }
    }
    Ok(())
}

impl Rcc {
    /// Enables or disables the oscillators named in `config`
    ///
    /// An oscillator that currently drives SYSCLK can't be switched off; for an active HIRC or
    /// LIRC only a new trim (frequency) is applied, and the millisecond tick follows it.
    pub fn osc_config(&mut self, config: &OscConfig) -> Result<(), Error> {
        let retrimmed = apply_osc_config(config)?;
        if let Some(state) = config.hxt {
            self.hxt = state.freq();
        }
        if retrimmed {
            // RC oscillators stay at or below 24 MHz, within zero wait state range
            tick::retune(&self.clocks()?);
        }
        Ok(())
    }

    /// Switches SYSCLK to `config.source` and programs the bus dividers
    ///
    /// Flash wait states are raised before a frequency increase and lowered after a decrease. The
    /// millisecond tick, if running, is adapted to the new HCLK.
    pub fn clock_config(
        &mut self,
        config: &ClockConfig,
        ws: &mut FlashWs,
    ) -> Result<Clocks, Error> {
        apply_clock_config(config, self.hxt, ws)
    }

    /// Source currently driving SYSCLK
    pub fn sysclk_source(&self) -> Oscillator {
        active_source(regs())
    }

    /// SYSCLK frequency derived from the selection and trim registers
    pub fn sysclk_freq(&self) -> Result<Hertz, Error> {
        source_freq(regs(), self.sysclk_source(), self.hxt)
    }

    pub fn hclk_freq(&self) -> Result<Hertz, Error> {
        let div = div_from_field(regs().hclkdiv.read_field(rcc::hclkdiv::DIV));
        Ok(self.sysclk_freq()? / div)
    }

    pub fn pclk_freq(&self) -> Result<Hertz, Error> {
        let div = div_from_field(regs().pclkdiv.read_field(rcc::pclkdiv::DIV));
        Ok(self.hclk_freq()? / div)
    }

    /// Current clock tree
    pub fn clocks(&self) -> Result<Clocks, Error> {
        let rcc = regs();
        Ok(Clocks::derive(
            self.sysclk_source(),
            self.sysclk_freq()?,
            rcc.hclkdiv.read_field(rcc::hclkdiv::DIV),
            rcc.pclkdiv.read_field(rcc::pclkdiv::DIV),
            low_speed(rcc),
        ))
    }

    /// Routes a clock to the MCO pin, divided by `div` (1 or even up to 510)
    pub fn enable_mco(&mut self, source: McoSource, div: u32) -> Result<(), Error> {
        let field = field_from_div(div)?;
        regs().mcocr.write(
            rcc::mcocr::SEL.val(source as u32) | rcc::mcocr::DIV.val(field) | rcc::mcocr::EN,
        );
        Ok(())
    }

    pub fn disable_mco(&mut self) {
        regs().mcocr.clear_bits(rcc::mcocr::EN);
    }

    /// Causes of the last reset
    pub fn reset_reason(&self) -> ResetReason {
        ResetReason::from_bits(regs().rstsr.read())
    }

    pub fn clear_reset_reason(&mut self) {
        regs().rstsr.write(0);
    }
}

/// Clock sources of the MCO pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum McoSource {
    Hirc = 0,
    Hxt = 1,
    Lirc = 2,
    Lxt = 3,
    Sysclk = 4,
    Hclk = 5,
}

/// Reset causes, several can be set at once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResetReason {
    pub power_on: bool,
    pub low_voltage: bool,
    pub pin: bool,
    pub independent_watchdog: bool,
    pub window_watchdog: bool,
    pub lockup: bool,
    pub software: bool,
}

impl ResetReason {
    fn from_bits(bits: u32) -> Self {
        ResetReason {
            power_on: bits & rcc::rstsr::POR != 0,
            low_voltage: bits & rcc::rstsr::LVD != 0,
            pin: bits & rcc::rstsr::PIN != 0,
            independent_watchdog: bits & rcc::rstsr::IWDG != 0,
            window_watchdog: bits & rcc::rstsr::WWDG != 0,
            lockup: bits & rcc::rstsr::LOCKUP != 0,
            software: bits & rcc::rstsr::SYSRESETREQ != 0,
        }
    }
}

/// Returns `true` when the trim of the oscillator driving SYSCLK was rewritten
fn apply_osc_config(config: &OscConfig) -> Result<bool, Error> {
    let rcc = regs();
    let active = active_source(rcc);
    let mut retrimmed = false;

    let hirc = osc_action(active, Oscillator::Hirc, config.hirc.map(|s| s == HircState::Off))?;
    match (hirc, config.hirc) {
        (OscAction::Disable, _) => disable(rcc, Oscillator::Hirc)?,
        (OscAction::Enable, Some(HircState::On(freq))) => {
            write_keyed(&rcc.hirccr, |r| {
                rcc::hirccr::TRIM.set(r, freq.factory_trim())
            });
            enable(rcc, Oscillator::Hirc)?;
        }
        (OscAction::Retrim, Some(HircState::On(freq))) => {
            let trim = freq.factory_trim();
            if rcc.hirccr.read_field(rcc::hirccr::TRIM) != trim {
                write_keyed(&rcc.hirccr, |r| rcc::hirccr::TRIM.set(r, trim));
                retrimmed = true;
            }
        }
        _ => {}
    }

    let hxt = osc_action(active, Oscillator::Hxt, config.hxt.map(|s| s == HxtState::Off))?;
    match (hxt, config.hxt) {
        (OscAction::Disable, _) => disable(rcc, Oscillator::Hxt)?,
        (OscAction::Enable, Some(HxtState::Crystal { drive, startup, .. })) => {
            write_keyed(&rcc.hxtcr, |r| {
                let r = rcc::hxtcr::DRIVER.set(r, u32::from(drive));
                rcc::hxtcr::STARTUP.set(r, startup as u32)
            });
            write_keyed(&rcc.sysclkcr, |r| r & !rcc::sysclkcr::HXTBYP);
            enable(rcc, Oscillator::Hxt)?;
        }
        (OscAction::Enable, Some(HxtState::Bypass(_))) => {
            write_keyed(&rcc.sysclkcr, |r| r | rcc::sysclkcr::HXTBYP);
            enable(rcc, Oscillator::Hxt)?;
        }
        _ => {}
    }

    let lirc = osc_action(active, Oscillator::Lirc, config.lirc.map(|s| s == LircState::Off))?;
    match (lirc, config.lirc) {
        (OscAction::Disable, _) => disable(rcc, Oscillator::Lirc)?,
        (OscAction::Enable, Some(LircState::On(freq))) => {
            write_keyed(&rcc.lirccr, |r| {
                rcc::lirccr::TRIM.set(r, freq.factory_trim())
            });
            enable(rcc, Oscillator::Lirc)?;
        }
        (OscAction::Retrim, Some(LircState::On(freq))) => {
            let trim = freq.factory_trim();
            if rcc.lirccr.read_field(rcc::lirccr::TRIM) != trim {
                write_keyed(&rcc.lirccr, |r| rcc::lirccr::TRIM.set(r, trim));
                retrimmed = true;
            }
        }
        _ => {}
    }

    let lxt = osc_action(active, Oscillator::Lxt, config.lxt.map(|s| s == LxtState::Off))?;
    match (lxt, config.lxt) {
        (OscAction::Disable, _) => disable(rcc, Oscillator::Lxt)?,
        (OscAction::Enable, Some(LxtState::Crystal { drive, startup })) => {
            write_keyed(&rcc.lxtcr, |r| {
                let r = rcc::lxtcr::DRIVER.set(r, u32::from(drive));
                rcc::lxtcr::STARTUP.set(r, startup as u32)
            });
            write_keyed(&rcc.sysclkcr, |r| r & !rcc::sysclkcr::LXTBYP);
            enable(rcc, Oscillator::Lxt)?;
        }
        (OscAction::Enable, Some(LxtState::Bypass)) => {
            write_keyed(&rcc.sysclkcr, |r| r | rcc::sysclkcr::LXTBYP);
            enable(rcc, Oscillator::Lxt)?;
        }
        _ => {}
    }

    Ok(retrimmed)
}

fn apply_clock_config(
    config: &ClockConfig,
    hxt: Option<Hertz>,
    ws: &mut FlashWs,
) -> Result<Clocks, Error> {
    let rcc = regs();
    let hclk_field = field_from_div(config.hclk_div)?;
    let pclk_field = field_from_div(config.pclk_div)?;

    check_source(config.source, config.source.is_stable(rcc))?;
    let sysclk = source_freq(rcc, config.source, hxt)?;

    let active = active_source(rcc);
    let old_sysclk = match source_freq(rcc, active, hxt) {
        Ok(freq) => freq.0,
        // crystal of unknown frequency, assume the worst
        Err(_) => u32::MAX,
    };
    let old_div = div_from_field(rcc.hclkdiv.read_field(rcc::hclkdiv::DIV));
    let sequence = switch_sequence(ws.latency(), old_sysclk, old_div, sysclk.0, config.hclk_div);

    if let Some(latency) = sequence.raise {
        ws.set_latency(latency);
    }
    if sequence.divider_first {
        rcc.hclkdiv.write_field(rcc::hclkdiv::DIV, hclk_field);
    }
    write_keyed(&rcc.sysclksel, |r| {
        rcc::sysclksel::SW.set(r, config.source.bits())
    });

    let mut deadline = Deadline::after_ms(CLOCK_SWITCH_TIMEOUT_MS);
    poll_until(&mut deadline, Error::SwitchTimeout, || {
        active_source(rcc) == config.source
    })?;

    if !sequence.divider_first {
        rcc.hclkdiv.write_field(rcc::hclkdiv::DIV, hclk_field);
    }
    if let Some(latency) = sequence.lower {
        ws.set_latency(latency);
    }

    rcc.pclkdiv.write_field(rcc::pclkdiv::DIV, pclk_field);

    let clocks = Clocks::derive(config.source, sysclk, hclk_field, pclk_field, low_speed(rcc));
    tick::retune(&clocks);
    Ok(clocks)
}

#[inline(always)]
fn regs() -> &'static rcc::RegisterBlock {
    // NOTE(unsafe) the clock tree registers are only written through `Rcc`, which is unique
    unsafe { &*RCC::ptr() }
}

/// Writes an oscillator register together with its key
fn write_keyed(reg: &Reg, f: impl FnOnce(u32) -> u32) {
    let value = f(reg.read()) & 0xFFFF;
    reg.write(rcc::REGISTER_KEY | value);
}

fn active_source(rcc: &rcc::RegisterBlock) -> Oscillator {
    Oscillator::from_bits(rcc.sysclksel.read_field(rcc::sysclksel::SWS))
}

fn enable(rcc: &rcc::RegisterBlock, osc: Oscillator) -> Result<(), Error> {
    write_keyed(&rcc.sysclkcr, |r| r | osc.enable_bit());
    let mut deadline = Deadline::after_ms(osc.timeout_ms());
    poll_until(&mut deadline, Error::Timeout(osc), || osc.is_stable(rcc))
}

fn disable(rcc: &rcc::RegisterBlock, osc: Oscillator) -> Result<(), Error> {
    write_keyed(&rcc.sysclkcr, |r| r & !osc.enable_bit());
    let mut deadline = Deadline::after_ms(osc.timeout_ms());
    poll_until(&mut deadline, Error::Timeout(osc), || !osc.is_stable(rcc))
}

fn source_freq(
    rcc: &rcc::RegisterBlock,
    source: Oscillator,
    hxt: Option<Hertz>,
) -> Result<Hertz, Error> {
    match source {
        Oscillator::Hirc => {
            let trim = rcc.hirccr.read_field(rcc::hirccr::TRIM);
            Ok(HircFreq::from_trim(trim)
                .map(HircFreq::hertz)
                .unwrap_or(RESET_HCLK))
        }
        Oscillator::Hxt => hxt.ok_or(Error::UnknownFrequency(Oscillator::Hxt)),
        Oscillator::Lirc => {
            Ok(LircFreq::from_trim(rcc.lirccr.read_field(rcc::lirccr::TRIM)).hertz())
        }
        Oscillator::Lxt => Ok(LXT_FREQ),
    }
}

fn low_speed(rcc: &rcc::RegisterBlock) -> LowSpeed {
    let enabled = rcc.sysclkcr.read();
    LowSpeed {
        lirc: if enabled & rcc::sysclkcr::LIRCEN != 0 {
            Some(LircFreq::from_trim(rcc.lirccr.read_field(rcc::lirccr::TRIM)).hertz())
        } else {
            None
        },
        lxt: if enabled & rcc::sysclkcr::LXTEN != 0 {
            Some(LXT_FREQ)
        } else {
            None
        },
    }
}

/// Low speed oscillators that peripherals can use as kernel clock
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct LowSpeed {
    lirc: Option<Hertz>,
    lxt: Option<Hertz>,
}

/// Clock configuration builder
///
/// Used to configure the frequencies of the clocks present in the processor. After setting all
/// frequencies, call [`freeze`](CFGR::freeze) to apply them.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CFGR {
    hirc: Option<HircFreq>,
    hxt: Option<Hertz>,
    hxt_bypass: bool,
    use_lxt: bool,
    use_lirc: Option<LircFreq>,
    keep_lxt: bool,
    keep_lirc: Option<LircFreq>,
    hclk: Option<u32>,
    pclk: Option<u32>,
}

impl CFGR {
    /// Uses HIRC at `freq` as SYSCLK source. This is the default, at 24 MHz.
    pub fn hirc(mut self, freq: HircFreq) -> Self {
        self.hirc = Some(freq);
        self
    }

    /// Uses an external crystal of frequency `freq` as SYSCLK source
    pub fn use_hxt<F>(mut self, freq: F) -> Self
    where
        F: Into<Hertz>,
    {
        self.hxt = Some(freq.into());
        self.hxt_bypass = false;
        self
    }

    /// Uses an external clock signal of frequency `freq` as SYSCLK source
    pub fn bypass_hxt<F>(mut self, freq: F) -> Self
    where
        F: Into<Hertz>,
    {
        self.hxt = Some(freq.into());
        self.hxt_bypass = true;
        self
    }

    /// Uses the 32.768 kHz crystal as SYSCLK source
    pub fn use_lxt(mut self) -> Self {
        self.use_lxt = true;
        self
    }

    /// Uses LIRC as SYSCLK source
    pub fn use_lirc(mut self, freq: LircFreq) -> Self {
        self.use_lirc = Some(freq);
        self
    }

    /// Starts the 32.768 kHz crystal for the RTC, LPTIM or LPUART without using it as SYSCLK
    pub fn enable_lxt(mut self) -> Self {
        self.keep_lxt = true;
        self
    }

    /// Starts LIRC for the watchdog, RTC or LPTIM without using it as SYSCLK
    pub fn enable_lirc(mut self, freq: LircFreq) -> Self {
        self.keep_lirc = Some(freq);
        self
    }

    /// Sets the desired frequency for the HCLK clock
    pub fn hclk<F>(mut self, freq: F) -> Self
    where
        F: Into<Hertz>,
    {
        self.hclk = Some(freq.into().0);
        self
    }

    /// Sets the desired frequency for the PCLK clock
    pub fn pclk<F>(mut self, freq: F) -> Self
    where
        F: Into<Hertz>,
    {
        self.pclk = Some(freq.into().0);
        self
    }

    /// Translates the requested frequencies into oscillator and divider settings
    fn plan(&self) -> Result<(OscConfig, ClockConfig), Error> {
        let mut osc = OscConfig::default();

        let (source, sysclk) = if let Some(freq) = self.hxt {
            osc.hxt = Some(if self.hxt_bypass {
                HxtState::Bypass(freq)
            } else {
                HxtState::Crystal {
                    freq,
                    drive: hxt_drive(freq),
                    startup: Startup::Cycles4096,
                }
            });
            (Oscillator::Hxt, freq.0)
        } else if self.use_lxt {
            (Oscillator::Lxt, LXT_FREQ.0)
        } else if let Some(freq) = self.use_lirc {
            osc.lirc = Some(LircState::On(freq));
            (Oscillator::Lirc, freq.hertz().0)
        } else {
            let freq = self.hirc.unwrap_or(HircFreq::Mhz24);
            osc.hirc = Some(HircState::On(freq));
            (Oscillator::Hirc, freq.hertz().0)
        };

        if self.use_lxt || self.keep_lxt {
            osc.lxt = Some(LxtState::Crystal {
                drive: 0x8,
                startup: Startup::Cycles16384,
            });
        }
        if osc.lirc.is_none() {
            if let Some(freq) = self.keep_lirc {
                osc.lirc = Some(LircState::On(freq));
            }
        }

        let hclk_div = div_for_target(sysclk, self.hclk.unwrap_or(sysclk))?;
        let hclk = sysclk / hclk_div;
        let pclk_div = div_for_target(hclk, self.pclk.unwrap_or(hclk))?;

        Ok((
            osc,
            ClockConfig {
                source,
                hclk_div,
                pclk_div,
            },
        ))
    }

    /// Freezes the clock configuration, making it effective
    pub fn freeze(self, ws: &mut FlashWs) -> Result<Clocks, Error> {
        let (osc, clock) = self.plan()?;
        let hxt = osc.hxt.and_then(HxtState::freq);
        apply_osc_config(&osc)?;
        apply_clock_config(&clock, hxt, ws)
    }
}

/// Crystal amplifier current suited to the crystal frequency
fn hxt_drive(freq: Hertz) -> u8 {
    match freq.0 {
        0..=8_000_000 => 1,
        8_000_001..=16_000_000 => 3,
        16_000_001..=24_000_000 => 5,
        _ => 7,
    }
}

/// Frozen clock frequencies
///
/// The existence of this value indicates that the clock configuration can no longer be changed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Clocks {
    source: Oscillator,
    sysclk: Hertz,
    hclk: Hertz,
    pclk: Hertz,
    lirc: Option<Hertz>,
    lxt: Option<Hertz>,
}

impl Clocks {
    fn derive(
        source: Oscillator,
        sysclk: Hertz,
        hclk_field: u32,
        pclk_field: u32,
        low_speed: LowSpeed,
    ) -> Self {
        let hclk = sysclk / div_from_field(hclk_field);
        let pclk = hclk / div_from_field(pclk_field);
        Clocks {
            source,
            sysclk,
            hclk,
            pclk,
            lirc: low_speed.lirc,
            lxt: low_speed.lxt,
        }
    }

    /// Clock tree out of reset: HIRC at 4 MHz, no division
    pub fn reset_default() -> Self {
        Clocks {
            source: Oscillator::Hirc,
            sysclk: RESET_HCLK,
            hclk: RESET_HCLK,
            pclk: RESET_HCLK,
            lirc: None,
            lxt: None,
        }
    }

    pub fn source(&self) -> Oscillator {
        self.source
    }

    /// Returns the system (core) frequency
    pub fn sysclk(&self) -> Hertz {
        self.sysclk
    }

    /// Returns the frequency of the AHB bus
    pub fn hclk(&self) -> Hertz {
        self.hclk
    }

    /// Returns the frequency of the APB bus
    pub fn pclk(&self) -> Hertz {
        self.pclk
    }

    /// LIRC frequency if it was running when the clocks were frozen
    pub fn lirc(&self) -> Option<Hertz> {
        self.lirc
    }

    /// LXT frequency if it was running when the clocks were frozen
    pub fn lxt(&self) -> Option<Hertz> {
        self.lxt
    }
}

/// AHB clock gates and resets
pub struct AHB {
    _0: (),
}

impl AHB {
    fn enr(&self) -> &Reg {
        &regs().hclken
    }

    fn rstr(&self) -> &Reg {
        &regs().hclkrst
    }
}

/// APB clock gates and resets
pub struct APB {
    _0: (),
}

impl APB {
    fn enr(&self) -> &Reg {
        &regs().pclken
    }

    fn rstr(&self) -> &Reg {
        &regs().perirst
    }
}

/// Frequency of a bus
pub trait GetBusFreq {
    fn get_frequency(clocks: &Clocks) -> Hertz;
}

impl GetBusFreq for AHB {
    fn get_frequency(clocks: &Clocks) -> Hertz {
        clocks.hclk
    }
}

impl GetBusFreq for APB {
    fn get_frequency(clocks: &Clocks) -> Hertz {
        clocks.pclk
    }
}

/// Bus associated to peripheral
pub trait RccBus: crate::Sealed {
    /// Bus type;
    type Bus;
}

/// Enable/disable peripheral
pub trait Enable: RccBus {
    fn enable(bus: &mut Self::Bus);
    fn disable(bus: &mut Self::Bus);
}

/// Reset peripheral
pub trait Reset: RccBus {
    fn reset(bus: &mut Self::Bus);
}

/// Kernel clock of a peripheral
pub trait BusClock {
    fn clock(clocks: &Clocks) -> Hertz;
}

impl<T> BusClock for T
where
    T: RccBus,
    T::Bus: GetBusFreq,
{
    fn clock(clocks: &Clocks) -> Hertz {
        T::Bus::get_frequency(clocks)
    }
}

macro_rules! bus {
    ($($PER:ident => ($busX:ty, $bit:expr),)+) => {
        $(
            impl crate::Sealed for crate::pac::$PER {}
            impl RccBus for crate::pac::$PER {
                type Bus = $busX;
            }
            impl Enable for crate::pac::$PER {
                #[inline(always)]
                fn enable(bus: &mut Self::Bus) {
                    bus.enr().set_bits(1 << $bit);
                }
                #[inline(always)]
                fn disable(bus: &mut Self::Bus) {
                    bus.enr().clear_bits(1 << $bit);
                }
            }
            impl Reset for crate::pac::$PER {
                #[inline(always)]
                fn reset(bus: &mut Self::Bus) {
                    regs().unlock.write(rcc::UNLOCK_KEY);
                    bus.rstr().set_bits(1 << $bit);
                    regs().unlock.write(rcc::UNLOCK_KEY);
                    bus.rstr().clear_bits(1 << $bit);
                    regs().unlock.write(rcc::LOCK_KEY);
                }
            }
        )+
    }
}

bus! {
    GPIOA => (AHB, 0),
    GPIOB => (AHB, 1),
    GPIOC => (AHB, 2),
    GPIOD => (AHB, 3),
    CRC => (AHB, 4),
    UART0 => (APB, 0),
    UART1 => (APB, 1),
    I2C => (APB, 2),
    LPUART => (APB, 3),
    SPI => (APB, 4),
    LPTIM => (APB, 5),
    TIM10 => (APB, 6),
    TIM11 => (APB, 6),
    PCA => (APB, 8),
    OWIRE => (APB, 9),
    TIM1 => (APB, 10),
    TIM2 => (APB, 11),
    WWDG => (APB, 12),
    ADC => (APB, 13),
    AWK => (APB, 14),
    RTC => (APB, 15),
    CLKTRIM => (APB, 16),
    IWDG => (APB, 17),
    LVD => (APB, 18),
    VC => (APB, 18),
    BEEP => (APB, 19),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divider_encoding() {
        assert_eq!(div_from_field(0), 1);
        assert_eq!(div_from_field(1), 2);
        assert_eq!(div_from_field(255), 510);

        assert_eq!(field_from_div(1), Ok(0));
        assert_eq!(field_from_div(8), Ok(4));
        assert_eq!(field_from_div(510), Ok(255));
        assert_eq!(field_from_div(3), Err(Error::InvalidDivider(3)));
        assert_eq!(field_from_div(0), Err(Error::InvalidDivider(0)));
        assert_eq!(field_from_div(512), Err(Error::InvalidDivider(512)));
    }

    #[test]
    fn divider_for_target_never_overshoots() {
        assert_eq!(div_for_target(24_000_000, 24_000_000), Ok(1));
        assert_eq!(div_for_target(24_000_000, 12_000_000), Ok(2));
        // 24 / 5 MHz needs 4.8, rounded up to the next even ratio
        assert_eq!(div_for_target(24_000_000, 5_000_000), Ok(6));
        assert_eq!(div_for_target(24_000_000, 7_000_000), Ok(4));
        assert_eq!(
            div_for_target(24_000_000, 40_000),
            Err(Error::UnreachableFrequency)
        );
        assert_eq!(div_for_target(24_000_000, 0), Err(Error::UnreachableFrequency));
    }

    #[test]
    fn active_oscillator_cannot_be_switched_off() {
        assert_eq!(
            check_osc_request(Oscillator::Hirc, Oscillator::Hirc, true),
            Err(Error::ClockInUse(Oscillator::Hirc))
        );
        assert_eq!(
            check_osc_request(Oscillator::Hirc, Oscillator::Hirc, false),
            Ok(())
        );
        assert_eq!(check_osc_request(Oscillator::Hxt, Oscillator::Hirc, true), Ok(()));
    }

    #[test]
    fn oscillator_actions() {
        let hirc = Oscillator::Hirc;
        let hxt = Oscillator::Hxt;
        assert_eq!(osc_action(hirc, hxt, None), Ok(OscAction::Skip));
        assert_eq!(osc_action(hirc, hxt, Some(false)), Ok(OscAction::Enable));
        assert_eq!(osc_action(hirc, hxt, Some(true)), Ok(OscAction::Disable));
        // running HIRC only takes a new trim
        assert_eq!(osc_action(hirc, hirc, Some(false)), Ok(OscAction::Retrim));
        assert_eq!(
            osc_action(hirc, hirc, Some(true)),
            Err(Error::ClockInUse(Oscillator::Hirc))
        );
        assert_eq!(osc_action(hirc, hirc, None), Ok(OscAction::Skip));
    }

    #[test]
    fn switch_needs_a_stable_source() {
        assert_eq!(
            check_source(Oscillator::Hxt, false),
            Err(Error::NotReady(Oscillator::Hxt))
        );
        assert_eq!(check_source(Oscillator::Hxt, true), Ok(()));
    }

    #[test]
    fn wait_states_raised_before_faster_clock() {
        // HIRC 24 MHz to a 32 MHz crystal
        let seq = switch_sequence(FlashLatency::Zero, 24_000_000, 1, 32_000_000, 1);
        assert_eq!(seq.raise, Some(FlashLatency::One));
        assert!(seq.divider_first);
        assert_eq!(seq.lower, None);
    }

    #[test]
    fn wait_states_lowered_after_slower_clock() {
        // 32 MHz crystal to HIRC 24 MHz divided by 2
        let seq = switch_sequence(FlashLatency::One, 32_000_000, 1, 24_000_000, 2);
        assert_eq!(seq.raise, None);
        assert!(seq.divider_first);
        assert_eq!(seq.lower, Some(FlashLatency::Zero));
    }

    #[test]
    fn shrinking_divider_written_after_switch() {
        // 32 MHz crystal / 2 to LIRC / 1: dividing first would run the crystal undivided
        let seq = switch_sequence(FlashLatency::Zero, 32_000_000, 2, 38_400, 1);
        assert!(!seq.divider_first);
        assert_eq!(seq.raise, None);
        assert_eq!(seq.lower, None);

        // an unknown old frequency keeps the worst case covered
        let seq = switch_sequence(FlashLatency::Zero, u32::MAX, 2, 4_000_000, 4);
        assert!(seq.divider_first);
        assert_eq!(seq.raise, Some(FlashLatency::One));
        assert_eq!(seq.lower, Some(FlashLatency::Zero));
    }

    #[test]
    fn polls_give_up_with_their_error() {
        let mut deadline = Deadline::new(false, 0, 1, 8_000);
        assert_eq!(
            poll_until(&mut deadline, Error::Timeout(Oscillator::Lxt), || false),
            Err(Error::Timeout(Oscillator::Lxt))
        );

        let mut deadline = Deadline::new(false, 0, 1, 8_000);
        assert_eq!(
            poll_until(&mut deadline, Error::SwitchTimeout, || false),
            Err(Error::SwitchTimeout)
        );

        let mut polls = 0;
        let mut deadline = Deadline::new(false, 0, 1, 8_000);
        let ready = poll_until(&mut deadline, Error::SwitchTimeout, || {
            polls += 1;
            polls == 2
        });
        assert_eq!(ready, Ok(()));
    }

    #[test]
    fn source_selection_bits_round_trip() {
        for osc in [
            Oscillator::Hirc,
            Oscillator::Hxt,
            Oscillator::Lirc,
            Oscillator::Lxt,
        ]
        .iter()
        {
            assert_eq!(Oscillator::from_bits(osc.bits()), *osc);
        }
    }

    #[test]
    fn clocks_follow_divider_fields() {
        let clocks = Clocks::derive(
            Oscillator::Hirc,
            Hertz(24_000_000),
            1,
            2,
            LowSpeed::default(),
        );
        assert_eq!(clocks.sysclk(), Hertz(24_000_000));
        assert_eq!(clocks.hclk(), Hertz(12_000_000));
        assert_eq!(clocks.pclk(), Hertz(3_000_000));
        assert_eq!(APB::get_frequency(&clocks), Hertz(3_000_000));
        assert_eq!(AHB::get_frequency(&clocks), Hertz(12_000_000));
        assert_eq!(crate::pac::UART0::clock(&clocks), Hertz(3_000_000));
    }

    #[test]
    fn hirc_frequency_lookup() {
        assert_eq!(HircFreq::at_most(Hertz(24_000_000)), Some(HircFreq::Mhz24));
        assert_eq!(HircFreq::at_most(Hertz(23_000_000)), Some(HircFreq::Mhz22_12));
        assert_eq!(HircFreq::at_most(Hertz(10_000_000)), Some(HircFreq::Mhz8));
        assert_eq!(HircFreq::at_most(Hertz(1_000_000)), None);
    }

    #[test]
    fn default_plan_runs_hirc_at_24mhz() {
        let (osc, clock) = CFGR::default().plan().unwrap();
        assert_eq!(osc.hirc, Some(HircState::On(HircFreq::Mhz24)));
        assert_eq!(osc.hxt, None);
        assert_eq!(clock, ClockConfig {
            source: Oscillator::Hirc,
            hclk_div: 1,
            pclk_div: 1,
        });
    }

    #[test]
    fn plan_for_crystal_with_bus_targets() {
        let cfgr = CFGR::default()
            .use_hxt(Hertz(16_000_000))
            .hclk(Hertz(8_000_000))
            .pclk(Hertz(2_000_000))
            .enable_lirc(LircFreq::Khz38_4);
        let (osc, clock) = cfgr.plan().unwrap();
        assert_eq!(
            osc.hxt,
            Some(HxtState::Crystal {
                freq: Hertz(16_000_000),
                drive: 3,
                startup: Startup::Cycles4096,
            })
        );
        assert_eq!(osc.lirc, Some(LircState::On(LircFreq::Khz38_4)));
        assert_eq!(clock.source, Oscillator::Hxt);
        assert_eq!(clock.hclk_div, 2);
        assert_eq!(clock.pclk_div, 4);
    }

    #[test]
    fn plan_for_low_speed_sources() {
        let (osc, clock) = CFGR::default().use_lxt().plan().unwrap();
        assert_eq!(clock.source, Oscillator::Lxt);
        assert!(matches!(osc.lxt, Some(LxtState::Crystal { .. })));

        let (osc, clock) = CFGR::default()
            .use_lirc(LircFreq::Khz32_768)
            .plan()
            .unwrap();
        assert_eq!(clock.source, Oscillator::Lirc);
        assert_eq!(osc.lirc, Some(LircState::On(LircFreq::Khz32_768)));
    }

    #[test]
    fn reset_flags_decode() {
        let reason = ResetReason::from_bits(rcc::rstsr::IWDG | rcc::rstsr::PIN);
        assert!(reason.independent_watchdog);
        assert!(reason.pin);
        assert!(!reason.power_on);
        assert!(!reason.software);
    }
}
