// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Watchdogs
//!
//! [`IndependentWatchdog`] runs from LIRC and keeps running whatever the core clock does. On
//! expiry it resets the chip or, in interrupt mode, raises the IWDG interrupt.
//!
//! [`WindowWatchdog`] counts PCLK / 4096 / (prescaler + 1) down from its reload value. It
//! raises its interrupt when the counter reaches the window value; feeding before that point
//! resets the chip just like not feeding at all.

use crate::pac::{iwdg, wwdg, IWDG, WWDG};
use crate::rcc::{BusClock, Clocks, Enable, APB};
use crate::tick::Deadline;
use crate::time::{Hertz, MilliSeconds};

use embedded_hal::watchdog::{Watchdog, WatchdogDisable, WatchdogEnable};

const RELOAD_SYNC_TIMEOUT_MS: u32 = 10;

/// Largest independent watchdog reload
pub const IWDG_MAX_RELOAD: u32 = 0x000F_FFFF;

/// Fixed divider in front of the window watchdog prescaler
pub const WWDG_DIV: u32 = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// LIRC is not running
    ClockNotRunning,
    /// The reload value did not reach the counter domain in time
    Timeout,
    /// The timeout can't be represented
    Period,
}

/// Behavior on expiry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    Reset,
    Interrupt,
}

/// Independent watchdog reload for `ms` at `lirc`, clamped to the 20-bit counter
pub fn iwdg_reload(lirc: Hertz, ms: u32) -> u32 {
    let ticks = u64::from(lirc.0) * u64::from(ms) / 1_000;
    cast::u32(ticks)
        .unwrap_or(IWDG_MAX_RELOAD)
        .clamp(1, IWDG_MAX_RELOAD)
}

/// Independent watchdog
pub struct IndependentWatchdog {
    iwdg: IWDG,
    lirc: Hertz,
}

impl IndependentWatchdog {
    pub fn new(iwdg: IWDG, clocks: &Clocks, apb: &mut APB) -> Result<Self, Error> {
        let lirc = clocks.lirc().ok_or(Error::ClockNotRunning)?;
        IWDG::enable(apb);
        Ok(IndependentWatchdog { iwdg, lirc })
    }

    fn unlocked(&mut self, f: impl FnOnce(&iwdg::RegisterBlock)) {
        self.iwdg.unlock.write(iwdg::UNLOCK_KEY);
        f(&self.iwdg);
        self.iwdg.unlock.write(0);
    }

    /// Selects reset or interrupt on expiry; takes effect at the next start
    pub fn set_mode(&mut self, mode: Mode) {
        self.unlocked(|iwdg| match mode {
            Mode::Reset => iwdg.cfgr.write(0),
            Mode::Interrupt => iwdg.cfgr.write(iwdg::cfgr::INTM),
        });
    }

    /// Sets the reload and starts the counter
    pub fn try_start(&mut self, period: MilliSeconds) -> Result<(), Error> {
        let reload = iwdg_reload(self.lirc, period.0);
        self.unlocked(|iwdg| iwdg.rlr.write(iwdg::RLR.val(reload)));
        let mut deadline = Deadline::after_ms(RELOAD_SYNC_TIMEOUT_MS);
        while self.iwdg.sr.is_set(iwdg::sr::RLF) {
            if deadline.expired() {
                return Err(Error::Timeout);
            }
        }
        self.iwdg.cmdcr.write(iwdg::CMD_START);
        self.iwdg.cmdcr.write(iwdg::CMD_RELOAD);
        Ok(())
    }

    /// Remaining counter value
    pub fn counter(&self) -> u32 {
        self.iwdg.cntval.read_field(iwdg::RLR)
    }

    pub fn is_pending(&self) -> bool {
        self.iwdg.sr.is_set(iwdg::sr::INTF)
    }

    pub fn clear_interrupt(&mut self) {
        self.iwdg.intclr.write(iwdg::sr::INTF);
    }
}

impl WatchdogEnable for IndependentWatchdog {
    type Time = MilliSeconds;

    fn start<T>(&mut self, period: T)
    where
        T: Into<MilliSeconds>,
    {
        // the reload flag only stays set if LIRC stopped, the counter then can't run either
        let _ = self.try_start(period.into());
    }
}

impl Watchdog for IndependentWatchdog {
    fn feed(&mut self) {
        self.iwdg.cmdcr.write(iwdg::CMD_RELOAD);
    }
}

/// Window watchdog prescaler and reload for a timeout of `ms`
pub fn wwdg_timing(pclk: Hertz, ms: u32) -> Result<(u32, u8), Error> {
    let ticks = u64::from(pclk.0) * u64::from(ms) / 1_000 / u64::from(WWDG_DIV);
    if ticks == 0 {
        return Err(Error::Period);
    }
    let prsc = (ticks - 1) / 256;
    if prsc > u64::from(wwdg::cr::PRSC.mask() >> wwdg::cr::PRSC.offset) {
        return Err(Error::Period);
    }
    let reload = (ticks / (prsc + 1)).saturating_sub(1);
    Ok((prsc as u32, reload as u8))
}

/// Window watchdog
pub struct WindowWatchdog {
    wwdg: WWDG,
    pclk: Hertz,
    prsc: u32,
    reload: u8,
    window: u8,
}

impl WindowWatchdog {
    pub fn new(wwdg: WWDG, clocks: &Clocks, apb: &mut APB) -> Self {
        WWDG::enable(apb);
        WindowWatchdog {
            wwdg,
            pclk: WWDG::clock(clocks),
            prsc: 0,
            reload: 0xFF,
            window: 0xFF,
        }
    }

    /// Counter frequency
    pub fn tick(&self) -> Hertz {
        Hertz(self.pclk.0 / WWDG_DIV / (self.prsc + 1))
    }

    /// Starts with `timeout` until reset; feeding is allowed once less than `window` is left
    pub fn start_windowed(
        &mut self,
        timeout: MilliSeconds,
        window: MilliSeconds,
    ) -> Result<(), Error> {
        let (prsc, reload) = wwdg_timing(self.pclk, timeout.0)?;
        self.prsc = prsc;
        self.reload = reload;
        let window_ticks = u64::from(self.tick().0) * u64::from(window.0) / 1_000;
        self.window = window_ticks.min(u64::from(reload)) as u8;

        self.wwdg.rload.write(wwdg::RLOAD.val(u32::from(self.reload)));
        self.wwdg.intclr.write(wwdg::sr::INTF);
        self.wwdg.cr.write(
            wwdg::cr::WINR.val(u32::from(self.window))
                | wwdg::cr::PRSC.val(self.prsc)
                | wwdg::cr::EN,
        );
        Ok(())
    }

    /// Whether a feed now is inside the window
    pub fn in_window(&self) -> bool {
        (self.wwdg.cnt.read() & 0xFF) <= u32::from(self.window)
    }

    /// Enables the interrupt raised when the counter enters the window
    pub fn listen(&mut self) {
        self.wwdg.inten.write(1);
    }

    pub fn unlisten(&mut self) {
        self.wwdg.inten.write(0);
    }

    pub fn is_pending(&self) -> bool {
        self.wwdg.sr.is_set(wwdg::sr::INTF)
    }

    pub fn clear_interrupt(&mut self) {
        self.wwdg.intclr.write(wwdg::sr::INTF);
    }

    pub fn release(self) -> WWDG {
        self.wwdg
    }
}

impl WatchdogEnable for WindowWatchdog {
    type Time = MilliSeconds;

    /// Starts without a window; unreachable timeouts run the nearest reachable one
    fn start<T>(&mut self, period: T)
    where
        T: Into<MilliSeconds>,
    {
        let period = period.into();
        if self.start_windowed(period, period).is_err() {
            let shortest = WWDG_DIV * 1_000 / self.pclk.0.max(1) + 1;
            let fallback = if period.0 < shortest {
                shortest
            } else {
                u32::MAX / 1_000
            };
            let _ = self.start_windowed(MilliSeconds(fallback), MilliSeconds(fallback));
        }
    }
}

impl Watchdog for WindowWatchdog {
    fn feed(&mut self) {
        self.wwdg.rload.write(wwdg::RLOAD.val(u32::from(self.reload)));
    }
}

impl WatchdogDisable for WindowWatchdog {
    fn disable(&mut self) {
        self.wwdg.cr.clear_bits(wwdg::cr::EN);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn independent_reload() {
        assert_eq!(iwdg_reload(Hertz(32_768), 1_000), 32_768);
        assert_eq!(iwdg_reload(Hertz(38_400), 500), 19_200);
        assert_eq!(iwdg_reload(Hertz(32_768), 0), 1);
        assert_eq!(iwdg_reload(Hertz(38_400), 100_000), IWDG_MAX_RELOAD);
    }

    #[test]
    fn window_timing() {
        // 24 MHz / 4096 = 5859 ticks per second
        assert_eq!(wwdg_timing(Hertz(24_000_000), 10), Ok((0, 57)));
        let (prsc, reload) = wwdg_timing(Hertz(24_000_000), 1_000).unwrap();
        assert_eq!(prsc, 22);
        assert_eq!(reload, 253);
        assert_eq!(wwdg_timing(Hertz(4_000_000), 0), Err(Error::Period));
    }
}
