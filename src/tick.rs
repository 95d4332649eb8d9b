// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Millisecond tick
//!
//! Every bounded wait in this crate polls a hardware flag against a [`Deadline`]. Deadlines count
//! the ticks produced by SysTick once [`Tick::start`] has been called and the application forwards
//! the SysTick exception to [`on_systick`]. Before that, deadlines fall back to a spin budget
//! derived from the last known core clock, so a poll can never hang forever.

use core::cell::Cell;

use cortex_m::interrupt::{self, Mutex};
use cortex_m::peripheral::syst::SystClkSource;
use cortex_m::peripheral::SYST;

use crate::rcc::{Clocks, RESET_HCLK};

/// Tick rate
pub const TICK_HZ: u32 = 1_000;

/// Core cycles spent by one iteration of a polling loop, at least.
const SPIN_CYCLES: u32 = 8;

static TICKS: Mutex<Cell<u32>> = Mutex::new(Cell::new(0));
static RUNNING: Mutex<Cell<bool>> = Mutex::new(Cell::new(false));
static CORE_HZ: Mutex<Cell<u32>> = Mutex::new(Cell::new(RESET_HCLK.0));

/// Owner of the SysTick timer while it generates the millisecond tick
pub struct Tick {
    syst: SYST,
}

impl Tick {
    /// Configures SysTick to interrupt every millisecond at the frozen core clock
    pub fn start(mut syst: SYST, clocks: &Clocks) -> Self {
        syst.disable_counter();
        syst.set_clock_source(SystClkSource::Core);
        syst.set_reload(reload_for(clocks.hclk().0));
        syst.clear_current();
        syst.enable_interrupt();
        syst.enable_counter();

        interrupt::free(|cs| {
            RUNNING.borrow(cs).set(true);
            CORE_HZ.borrow(cs).set(clocks.hclk().0);
        });

        Tick { syst }
    }

    /// Stops the tick interrupt, e.g. before entering deep sleep
    ///
    /// Deadlines created while suspended fall back to the spin budget.
    pub fn suspend(&mut self) {
        self.syst.disable_interrupt();
        interrupt::free(|cs| RUNNING.borrow(cs).set(false));
    }

    pub fn resume(&mut self) {
        interrupt::free(|cs| RUNNING.borrow(cs).set(true));
        self.syst.enable_interrupt();
    }

    /// Stops the tick and returns the SysTick peripheral
    pub fn release(mut self) -> SYST {
        self.syst.disable_interrupt();
        self.syst.disable_counter();
        interrupt::free(|cs| RUNNING.borrow(cs).set(false));
        self.syst
    }
}

/// Advances the tick. Call this from the SysTick exception handler.
pub fn on_systick() {
    interrupt::free(|cs| {
        let ticks = TICKS.borrow(cs);
        ticks.set(ticks.get().wrapping_add(1));
    });
}

/// Milliseconds since the tick was started, wrapping
pub fn now() -> u32 {
    interrupt::free(|cs| TICKS.borrow(cs).get())
}

/// Busy waits for `ms` milliseconds
pub fn delay_ms(ms: u32) {
    let mut deadline = Deadline::after_ms(ms);
    while !deadline.expired() {}
}

/// Adapts the tick to a new core clock. Called after every clock switch.
pub(crate) fn retune(clocks: &Clocks) {
    let hz = clocks.hclk().0;
    interrupt::free(|cs| {
        CORE_HZ.borrow(cs).set(hz);
        if RUNNING.borrow(cs).get() {
            // NOTE(unsafe) the running `Tick` owns SYST, only the reload value changes here and
            // this happens inside a critical section
            unsafe {
                let syst = &*SYST::PTR;
                syst.rvr.write(reload_for(hz));
                syst.cvr.write(0);
            }
        }
    });
}

/// A point in time after which a bounded wait gives up
pub struct Deadline {
    start: u32,
    ms: u32,
    ticking: bool,
    spins: u32,
}

impl Deadline {
    pub fn after_ms(ms: u32) -> Self {
        let (ticking, start, core_hz) = interrupt::free(|cs| {
            (
                RUNNING.borrow(cs).get(),
                TICKS.borrow(cs).get(),
                CORE_HZ.borrow(cs).get(),
            )
        });
        Deadline::new(ticking, start, ms, core_hz)
    }

    pub(crate) fn new(ticking: bool, start: u32, ms: u32, core_hz: u32) -> Self {
        Deadline {
            start,
            ms,
            ticking,
            spins: spin_budget(ms, core_hz),
        }
    }

    /// Returns `true` once the deadline has passed
    pub fn expired(&mut self) -> bool {
        let ticks = if self.ticking { now() } else { self.start };
        self.expired_at(ticks)
    }

    fn expired_at(&mut self, ticks: u32) -> bool {
        if self.ticking {
            ticks.wrapping_sub(self.start) > self.ms
        } else if self.spins == 0 {
            true
        } else {
            self.spins -= 1;
            false
        }
    }
}

/// SysTick reload value for a 1 kHz tick
fn reload_for(core_hz: u32) -> u32 {
    (core_hz / TICK_HZ).saturating_sub(1).min(0x00FF_FFFF)
}

fn spin_budget(ms: u32, core_hz: u32) -> u32 {
    (core_hz / TICK_HZ / SPIN_CYCLES).saturating_mul(ms).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reload_gives_one_millisecond() {
        assert_eq!(reload_for(24_000_000), 23_999);
        assert_eq!(reload_for(4_000_000), 3_999);
        // LIRC as core clock: fewer than 1000 cycles per tick still counts
        assert_eq!(reload_for(38_400), 37);
    }

    #[test]
    fn stalled_tick_still_expires() {
        // tick stopped: the count never moves, the spin budget runs out
        let mut deadline = Deadline::new(false, 500, 10, 24_000_000);
        let mut polls = 0;
        while !deadline.expired_at(500) {
            polls += 1;
        }
        assert_eq!(polls, 30_000);
    }

    #[test]
    fn ticking_deadline_wraps() {
        let mut deadline = Deadline::new(true, u32::MAX - 2, 5, 24_000_000);
        assert!(!deadline.expired_at(2));
        assert!(deadline.expired_at(3));
    }

    #[test]
    fn spin_budget_never_zero() {
        assert_eq!(spin_budget(0, 24_000_000), 1);
        assert_eq!(spin_budget(10, 24_000_000), 30_000);
        assert_eq!(spin_budget(5_000, 32_768), 20_000);
        assert_eq!(spin_budget(3, 4_000), 1);
    }
}
