// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Starter kit board
//!
//! Two LEDs on PD4 and PD5, lit when driven low, and a user button on PC5 that pulls to ground.
//!
//! ```ignore
//! let mut gpioc = dp.GPIOC.split(&mut rcc.ahb);
//! let mut gpiod = dp.GPIOD.split(&mut rcc.ahb);
//! let mut leds = Leds::new(gpiod.pd4, gpiod.pd5, &mut gpiod.cfg);
//! let button = Button::new(gpioc.pc5, &mut gpioc.cfg);
//! leds[0].on();
//! ```

use core::ops::{Index, IndexMut};

use crate::gpio::gpioc::PC5;
use crate::gpio::gpiod::{PD4, PD5};
use crate::gpio::{
    Active, Cfg, ErasedPin, Input, InterruptPin, Output, PinState, PullUp, PushPull, Trigger,
};

/// One of the board LEDs
pub struct Led {
    pin: ErasedPin<Output<PushPull>>,
}

impl Led {
    pub fn on(&mut self) {
        self.pin.set_low();
    }

    pub fn off(&mut self) {
        self.pin.set_high();
    }

    pub fn toggle(&mut self) {
        self.pin.toggle();
    }

    pub fn is_on(&self) -> bool {
        self.pin.is_set_low()
    }
}

/// Both board LEDs, off after construction
pub struct Leds {
    leds: [Led; 2],
}

impl Leds {
    pub fn new<M1: Active, M2: Active>(pd4: PD4<M1>, pd5: PD5<M2>, cfg: &mut Cfg<'D'>) -> Self {
        let led1 = pd4
            .into_push_pull_output_with_state(cfg, PinState::High)
            .erase();
        let led2 = pd5
            .into_push_pull_output_with_state(cfg, PinState::High)
            .erase();
        Leds {
            leds: [Led { pin: led1 }, Led { pin: led2 }],
        }
    }

    pub fn len(&self) -> usize {
        self.leds.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter_mut(&mut self) -> core::slice::IterMut<'_, Led> {
        self.leds.iter_mut()
    }
}

impl Index<usize> for Leds {
    type Output = Led;

    fn index(&self, i: usize) -> &Led {
        &self.leds[i]
    }
}

impl IndexMut<usize> for Leds {
    fn index_mut(&mut self, i: usize) -> &mut Led {
        &mut self.leds[i]
    }
}

/// User button
pub struct Button {
    pin: PC5<Input<PullUp>>,
}

impl Button {
    pub fn new<M: Active>(pc5: PC5<M>, cfg: &mut Cfg<'C'>) -> Self {
        Button {
            pin: pc5.into_pull_up_input(cfg),
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.pin.is_low()
    }

    /// Raises the GPIOC interrupt when the button is pressed
    pub fn listen(&mut self) {
        self.pin.trigger_on(Trigger::Falling);
        self.pin.clear_interrupt_pending_bit();
        self.pin.enable_interrupt();
    }

    pub fn unlisten(&mut self) {
        self.pin.disable_interrupt();
    }

    /// Whether a press is pending, clearing it
    pub fn take_press(&mut self) -> bool {
        let pending = self.pin.check_interrupt();
        if pending {
            self.pin.clear_interrupt_pending_bit();
        }
        pending
    }
}
