// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Low power modes
//!
//! Sleep stops the core clock only; every peripheral keeps running. Deep sleep also stops HIRC
//! and HXT, so only peripherals clocked from LIRC or LXT (AWK, LPTIM, LPUART, RTC, IWDG) and
//! GPIO interrupts can wake the chip. The core resumes on the oscillator it was running on.
//!
//! SysTick stops in deep sleep; suspend the tick first so a stale deadline doesn't expire early:
//!
//! ```ignore
//! let mut power = Power::new(cp.SCB);
//! tick.suspend();
//! power.deep_sleep(WakeUp::Interrupt);
//! tick.resume();
//! ```

use cortex_m::asm;
use cortex_m::peripheral::SCB;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    Sleep,
    DeepSleep,
}

/// Instruction used to enter a low power mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WakeUp {
    /// `WFI`, any enabled interrupt wakes the core
    Interrupt,
    /// `WFE`, an event or pending interrupt wakes the core
    Event,
}

/// Owner of the system control block bits selecting the low power mode
pub struct Power {
    scb: SCB,
}

impl Power {
    pub fn new(scb: SCB) -> Self {
        Power { scb }
    }

    fn set_mode(&mut self, mode: Mode) {
        match mode {
            Mode::Sleep => self.scb.clear_sleepdeep(),
            Mode::DeepSleep => self.scb.set_sleepdeep(),
        }
    }

    fn enter(wake: WakeUp) {
        match wake {
            WakeUp::Interrupt => asm::wfi(),
            WakeUp::Event => {
                // the first WFE may only consume a stale event
                asm::sev();
                asm::wfe();
                asm::wfe();
            }
        }
    }

    /// Sleeps until woken
    pub fn sleep(&mut self, wake: WakeUp) {
        self.set_mode(Mode::Sleep);
        Self::enter(wake);
    }

    /// Deep sleeps until woken, then returns on the previous clock
    pub fn deep_sleep(&mut self, wake: WakeUp) {
        self.set_mode(Mode::DeepSleep);
        Self::enter(wake);
        self.scb.clear_sleepdeep();
    }

    /// Returns to `mode` after every exception handler instead of to thread mode. Thread mode
    /// only runs again after [`Power::disable_sleep_on_exit`] is called from a handler.
    pub fn sleep_on_exit(&mut self, mode: Mode) {
        self.set_mode(mode);
        self.scb.set_sleeponexit();
        asm::wfi();
    }

    pub fn disable_sleep_on_exit(&mut self) {
        self.scb.clear_sleeponexit();
    }

    pub fn release(self) -> SCB {
        self.scb
    }
}
