// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::*;

pub type EPin<MODE> = ErasedPin<MODE>;

/// Fully erased pin
///
/// `MODE` is one of the pin modes (see [Modes](crate::gpio#modes) section).
pub struct ErasedPin<MODE> {
    // Bits 0-3: pin, bits 4-5: port
    pin_port: u8,
    _mode: PhantomData<MODE>,
}

impl<MODE> ErasedPin<MODE> {
    pub(crate) fn new(port: u8, pin: u8) -> Self {
        Self {
            pin_port: port << 4 | pin,
            _mode: PhantomData,
        }
    }

    #[inline(always)]
    fn regs(&self) -> &'static gpio::RegisterBlock {
        gpio_regs(self.port_id())
    }

    #[inline(always)]
    fn mask(&self) -> u32 {
        gpio::pin(self.pin_id())
    }
}

impl<MODE> PinExt for ErasedPin<MODE> {
    type Mode = MODE;

    #[inline(always)]
    fn pin_id(&self) -> u8 {
        self.pin_port & 0x0f
    }

    #[inline(always)]
    fn port_id(&self) -> u8 {
        self.pin_port >> 4
    }
}

impl<MODE> ErasedPin<Output<MODE>> {
    #[inline(always)]
    pub fn set_high(&mut self) {
        // atomic write to a stateless register
        self.regs().odset.write(self.mask())
    }

    #[inline(always)]
    pub fn set_low(&mut self) {
        // atomic write to a stateless register
        self.regs().odclr.write(self.mask())
    }

    #[inline(always)]
    pub fn get_state(&self) -> PinState {
        if self.is_set_low() {
            PinState::Low
        } else {
            PinState::High
        }
    }

    #[inline(always)]
    pub fn set_state(&mut self, state: PinState) {
        match state {
            PinState::Low => self.set_low(),
            PinState::High => self.set_high(),
        }
    }

    #[inline(always)]
    pub fn is_set_high(&self) -> bool {
        !self.is_set_low()
    }

    #[inline(always)]
    pub fn is_set_low(&self) -> bool {
        !self.regs().odr.is_set(self.mask())
    }

    #[inline(always)]
    pub fn toggle(&mut self) {
        if self.is_set_low() {
            self.set_high()
        } else {
            self.set_low()
        }
    }
}

impl<MODE> OutputPin for ErasedPin<Output<MODE>> {
    type Error = Infallible;

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.set_high();
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), Infallible> {
        self.set_low();
        Ok(())
    }
}

impl<MODE> StatefulOutputPin for ErasedPin<Output<MODE>> {
    fn is_set_high(&self) -> Result<bool, Self::Error> {
        Ok(self.is_set_high())
    }

    fn is_set_low(&self) -> Result<bool, Self::Error> {
        Ok(self.is_set_low())
    }
}

impl<MODE> ToggleableOutputPin for ErasedPin<Output<MODE>> {
    type Error = Infallible;

    fn toggle(&mut self) -> Result<(), Self::Error> {
        self.toggle();
        Ok(())
    }
}

impl<MODE> ErasedPin<Input<MODE>> {
    #[inline(always)]
    pub fn is_high(&self) -> bool {
        !self.is_low()
    }

    #[inline(always)]
    pub fn is_low(&self) -> bool {
        !self.regs().idr.is_set(self.mask())
    }
}

impl<MODE> InputPin for ErasedPin<Input<MODE>> {
    type Error = Infallible;

    fn is_high(&self) -> Result<bool, Infallible> {
        Ok(self.is_high())
    }

    fn is_low(&self) -> Result<bool, Infallible> {
        Ok(self.is_low())
    }
}

impl ErasedPin<Output<OpenDrain>> {
    #[inline(always)]
    pub fn is_high(&self) -> bool {
        !self.is_low()
    }

    #[inline(always)]
    pub fn is_low(&self) -> bool {
        !self.regs().idr.is_set(self.mask())
    }
}

impl InputPin for ErasedPin<Output<OpenDrain>> {
    type Error = Infallible;

    fn is_high(&self) -> Result<bool, Infallible> {
        Ok(self.is_high())
    }

    fn is_low(&self) -> Result<bool, Infallible> {
        Ok(self.is_low())
    }
}

impl<MODE> InterruptPin for ErasedPin<Input<MODE>> {
    fn trigger_on(&mut self, trigger: Trigger) {
        trigger_on(self.port_id(), self.pin_id(), trigger)
    }

    fn enable_interrupt(&mut self) {
        set_interrupt(self.port_id(), self.pin_id(), true)
    }

    fn disable_interrupt(&mut self) {
        set_interrupt(self.port_id(), self.pin_id(), false)
    }

    fn clear_interrupt_pending_bit(&mut self) {
        clear_interrupt(self.port_id(), self.pin_id())
    }

    fn check_interrupt(&self) -> bool {
        interrupt_pending(self.port_id(), self.pin_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erased_pin_keeps_port_and_number() {
        let pin = ErasedPin::<Input<Floating>>::new(3, 6);
        assert_eq!(pin.port_id(), 3);
        assert_eq!(pin.pin_id(), 6);
        assert_eq!(pin.mask(), 1 << 6);
    }
}
