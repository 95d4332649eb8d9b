// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # General Purpose I/Os
//!
//! Ports A to D have eight pin slots each. Only the pins bonded out by the package are exposed:
//! PA1-PA3, PB4-PB5, PC3-PC7 and PD1-PD6.
//!
//! Pins are type-state: a mode change consumes the pin and returns it in the new mode. Changing
//! the mode of a pin needs the port's [`Cfg`] token, which serializes read-modify-write accesses to
//! the shared port configuration registers.
//!
//! ```ignore
//! let mut gpiod = dp.GPIOD.split(&mut rcc.ahb);
//! let mut led = gpiod.pd5.into_push_pull_output(&mut gpiod.cfg);
//! led.set_high();
//! ```
//!
//! ## Modes
//!
//! - **Input**: [`Floating`], [`PullUp`] or [`PullDown`]
//! - **Output**: [`PushPull`] or [`OpenDrain`]
//! - **Alternate**: alternate function `A` with a push-pull or open-drain driver
//! - **Analog**: routed to the ADC or the voltage comparator
//! - **Dynamic**: switches between input and output at runtime
//!
//! ## Interrupts
//!
//! Input pins can raise their port interrupt on an edge or a level, see [`InterruptPin`].

use core::convert::Infallible;
use core::marker::PhantomData;

use embedded_hal::digital::v2::{InputPin, OutputPin, StatefulOutputPin, ToggleableOutputPin};

use crate::pac::{gpio, GPIOA, GPIOB, GPIOC, GPIOD};
use crate::rcc::AHB;

mod erased;
pub use erased::{EPin, ErasedPin};

pub trait PinExt {
    type Mode;

    /// Return pin number
    fn pin_id(&self) -> u8;

    /// Return port number
    fn port_id(&self) -> u8;
}

/// Extension trait to split a GPIO peripheral in independent pins and registers
pub trait GpioExt {
    /// The parts to split the GPIO into
    type Parts;

    /// Enables and resets the port, then splits it into independent pins and registers
    fn split(self, ahb: &mut AHB) -> Self::Parts;
}

/// Marker trait for active states.
pub trait Active {}

/// Input mode (type state)
#[derive(Default)]
pub struct Input<MODE = Floating> {
    _mode: PhantomData<MODE>,
}
impl<MODE> Active for Input<MODE> {}

/// Floating input (type state)
#[derive(Default)]
pub struct Floating;

/// Pulled down input (type state)
#[derive(Default)]
pub struct PullDown;

/// Pulled up input (type state)
#[derive(Default)]
pub struct PullUp;

/// Output mode (type state)
#[derive(Default)]
pub struct Output<MODE = PushPull> {
    _mode: PhantomData<MODE>,
}
impl<MODE> Active for Output<MODE> {}

/// Push pull output (type state)
#[derive(Default)]
pub struct PushPull;

/// Open drain output (type state)
#[derive(Default)]
pub struct OpenDrain;

/// Analog mode (type state)
#[derive(Default)]
pub struct Analog;
impl Active for Analog {}

/// Alternate function `A` (type state)
#[derive(Default)]
pub struct Alternate<const A: u8, MODE = PushPull> {
    _mode: PhantomData<MODE>,
}
impl<const A: u8, MODE> Active for Alternate<A, MODE> {}

/// Digital output pin state
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinState {
    High,
    Low,
}

/// Output drive strength
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Drive {
    High,
    Low,
}

/// Output slew rate
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Slew {
    Fast,
    Slow,
}

/// Pin interrupt triggers
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Trigger {
    Rising,
    Falling,
    RisingFalling,
    High,
    Low,
}

impl Trigger {
    /// (level sensitive, active high, both edges)
    const fn bits(self) -> (bool, bool, bool) {
        match self {
            Trigger::Rising => (false, true, false),
            Trigger::Falling => (false, false, false),
            Trigger::RisingFalling => (false, false, true),
            Trigger::High => (true, true, false),
            Trigger::Low => (true, false, false),
        }
    }
}

/// Register level description of a pin mode
#[doc(hidden)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeBits {
    output: bool,
    open_drain: bool,
    pull: u32,
    af: u32,
    analog: bool,
}

mod sealed {
    pub trait PinMode: Default {
        const BITS: super::ModeBits;
    }
}

use sealed::PinMode;

impl PinMode for Input<Floating> {
    const BITS: ModeBits = ModeBits {
        output: false,
        open_drain: false,
        pull: gpio::PUPD_NONE,
        af: 0,
        analog: false,
    };
}

impl PinMode for Input<PullUp> {
    const BITS: ModeBits = ModeBits {
        pull: gpio::PUPD_UP,
        ..<Input<Floating> as PinMode>::BITS
    };
}

impl PinMode for Input<PullDown> {
    const BITS: ModeBits = ModeBits {
        pull: gpio::PUPD_DOWN,
        ..<Input<Floating> as PinMode>::BITS
    };
}

impl PinMode for Output<PushPull> {
    const BITS: ModeBits = ModeBits {
        output: true,
        ..<Input<Floating> as PinMode>::BITS
    };
}

impl PinMode for Output<OpenDrain> {
    const BITS: ModeBits = ModeBits {
        output: true,
        open_drain: true,
        ..<Input<Floating> as PinMode>::BITS
    };
}

impl PinMode for Analog {
    const BITS: ModeBits = ModeBits {
        analog: true,
        ..<Input<Floating> as PinMode>::BITS
    };
}

impl<const A: u8> PinMode for Alternate<A, PushPull> {
    const BITS: ModeBits = ModeBits {
        output: true,
        af: A as u32,
        ..<Input<Floating> as PinMode>::BITS
    };
}

impl<const A: u8> PinMode for Alternate<A, OpenDrain> {
    const BITS: ModeBits = ModeBits {
        output: true,
        open_drain: true,
        af: A as u32,
        ..<Input<Floating> as PinMode>::BITS
    };
}

/// Snapshot of the configuration registers of one port
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct PortConfig {
    dir: u32,
    otype: u32,
    pupd: u32,
    afr: u32,
    anaen: u32,
}

impl PortConfig {
    fn read(gpio: &gpio::RegisterBlock) -> Self {
        PortConfig {
            dir: gpio.dircr.read(),
            otype: gpio.otyper.read(),
            pupd: gpio.pupdr.read(),
            afr: gpio.afr.read(),
            anaen: gpio.anaen.read(),
        }
    }

    fn write(&self, gpio: &gpio::RegisterBlock) {
        // function and analog selection go first, so the pin never drives with a stale function
        gpio.afr.write(self.afr);
        gpio.anaen.write(self.anaen);
        gpio.pupdr.write(self.pupd);
        gpio.otyper.write(self.otype);
        gpio.dircr.write(self.dir);
    }

    /// Returns the configuration with pin `n` switched to `mode`
    fn with_mode(self, n: u8, mode: ModeBits) -> Self {
        let mask = gpio::pin(n);
        let flag = |reg: u32, set: bool| if set { reg | mask } else { reg & !mask };
        PortConfig {
            dir: flag(self.dir, mode.output),
            otype: flag(self.otype, mode.open_drain),
            pupd: gpio::pupd(n).set(self.pupd, mode.pull),
            afr: gpio::af(n).set(self.afr, mode.af),
            anaen: flag(self.anaen, mode.analog),
        }
    }
}

/// Opaque port configuration token
///
/// Owning (a mutable reference to) this token is required to change pin modes, drive strength,
/// slew rate and debouncing on port `P`.
pub struct Cfg<const P: char>(());

impl<const P: char> Cfg<P> {
    /// Sets the input debounce clock to HCLK / 2^(div + 1) and enables it
    pub fn enable_debounce_clock(&mut self, div: u8) {
        gpio_regs(P as u8 - b'A')
            .dbclkcr
            .write(gpio::dbclkcr::DIV.val(u32::from(div)) | gpio::dbclkcr::EN);
    }

    pub fn disable_debounce_clock(&mut self) {
        gpio_regs(P as u8 - b'A')
            .dbclkcr
            .clear_bits(gpio::dbclkcr::EN);
    }
}

macro_rules! gpio {
    ($GPIOX:ident, $gpiox:ident, $port_id:expr, [
        $($PXi:ident: ($pxi:ident, $pin_number:expr),)+
    ]) => {
        /// GPIO
        pub mod $gpiox {
            use crate::pac::$GPIOX;
            use crate::rcc::{AHB, Enable, Reset};
            use super::{Cfg, Floating, GpioExt, Input, Pin};

            /// GPIO parts
            pub struct Parts {
                /// Opaque configuration token
                pub cfg: Cfg<$port_id>,
                $(
                    /// Pin
                    pub $pxi: $PXi,
                )+
            }

            $(
                pub type $PXi<MODE = Input<Floating>> = Pin<$port_id, $pin_number, MODE>;
            )+

            impl GpioExt for $GPIOX {
                type Parts = Parts;

                fn split(self, ahb: &mut AHB) -> Parts {
                    $GPIOX::enable(ahb);
                    $GPIOX::reset(ahb);

                    Parts {
                        cfg: Cfg(()),
                        $(
                            $pxi: $PXi::new(),
                        )+
                    }
                }
            }
        }

        pub use $gpiox::{ $($PXi,)+ };
    }
}

/// Generic pin type
///
/// - `P` is port name: `A` for GPIOA, `B` for GPIOB, etc.
/// - `N` is pin number: from `0` to `7`.
/// - `MODE` is one of the pin modes (see [Modes](crate::gpio#modes) section).
pub struct Pin<const P: char, const N: u8, MODE = Input<Floating>> {
    mode: MODE,
}

impl<const P: char, const N: u8, MODE: Default> Pin<P, N, MODE> {
    fn new() -> Self {
        Self {
            mode: Default::default(),
        }
    }
}

impl<const P: char, const N: u8, MODE> PinExt for Pin<P, N, MODE> {
    type Mode = MODE;

    #[inline(always)]
    fn pin_id(&self) -> u8 {
        N
    }

    #[inline(always)]
    fn port_id(&self) -> u8 {
        P as u8 - b'A'
    }
}

/// Tracks the current pin state for dynamic pins
pub enum Dynamic {
    InputFloating,
    InputPullUp,
    InputPullDown,
    OutputPushPull,
    OutputOpenDrain,
}

impl Default for Dynamic {
    fn default() -> Self {
        Dynamic::InputFloating
    }
}

impl Active for Dynamic {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinModeError {
    IncorrectMode,
}

impl Dynamic {
    fn is_input(&self) -> bool {
        use Dynamic::*;
        match self {
            InputFloating | InputPullUp | InputPullDown | OutputOpenDrain => true,
            OutputPushPull => false,
        }
    }

    fn is_output(&self) -> bool {
        use Dynamic::*;
        match self {
            InputFloating | InputPullUp | InputPullDown => false,
            OutputPushPull | OutputOpenDrain => true,
        }
    }
}

impl<const P: char, const N: u8> OutputPin for Pin<P, N, Dynamic> {
    type Error = PinModeError;

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if self.mode.is_output() {
            self._set_high();
            Ok(())
        } else {
            Err(PinModeError::IncorrectMode)
        }
    }

    fn set_low(&mut self) -> Result<(), Self::Error> {
        if self.mode.is_output() {
            self._set_low();
            Ok(())
        } else {
            Err(PinModeError::IncorrectMode)
        }
    }
}

impl<const P: char, const N: u8> InputPin for Pin<P, N, Dynamic> {
    type Error = PinModeError;

    fn is_high(&self) -> Result<bool, Self::Error> {
        self.is_low().map(|b| !b)
    }

    fn is_low(&self) -> Result<bool, Self::Error> {
        if self.mode.is_input() {
            Ok(self._is_low())
        } else {
            Err(PinModeError::IncorrectMode)
        }
    }
}

// Internal helpers, usable in any mode
impl<const P: char, const N: u8, MODE> Pin<P, N, MODE> {
    #[inline(always)]
    fn regs() -> &'static gpio::RegisterBlock {
        gpio_regs(P as u8 - b'A')
    }

    /// Sets the output latch regardless of the mode, so an output starts at a known level
    #[inline(always)]
    fn _set_state(&mut self, state: PinState) {
        match state {
            PinState::High => self._set_high(),
            PinState::Low => self._set_low(),
        }
    }

    #[inline(always)]
    fn _set_high(&mut self) {
        // atomic write to a stateless register
        Self::regs().odset.write(gpio::pin(N))
    }

    #[inline(always)]
    fn _set_low(&mut self) {
        // atomic write to a stateless register
        Self::regs().odclr.write(gpio::pin(N))
    }

    #[inline(always)]
    fn _is_set_low(&self) -> bool {
        !Self::regs().odr.is_set(gpio::pin(N))
    }

    #[inline(always)]
    fn _is_low(&self) -> bool {
        !Self::regs().idr.is_set(gpio::pin(N))
    }
}

impl<const P: char, const N: u8, MODE> Pin<P, N, MODE>
where
    MODE: Active,
{
    /// Erases the pin number and port from the type
    ///
    /// This is useful when you want to collect the pins into an array where you
    /// need all the elements to have the same type
    #[inline]
    pub fn erase(self) -> ErasedPin<MODE> {
        ErasedPin::new(P as u8 - b'A', N)
    }
}

impl<const P: char, const N: u8, MODE> Pin<P, N, Output<MODE>> {
    #[inline]
    pub fn set_high(&mut self) {
        self._set_high()
    }

    #[inline]
    pub fn set_low(&mut self) {
        self._set_low()
    }

    #[inline(always)]
    pub fn get_state(&self) -> PinState {
        if self._is_set_low() {
            PinState::Low
        } else {
            PinState::High
        }
    }

    #[inline(always)]
    pub fn set_state(&mut self, state: PinState) {
        self._set_state(state)
    }

    #[inline]
    pub fn is_set_high(&self) -> bool {
        !self._is_set_low()
    }

    #[inline]
    pub fn is_set_low(&self) -> bool {
        self._is_set_low()
    }

    #[inline]
    pub fn toggle(&mut self) {
        if self._is_set_low() {
            self._set_high()
        } else {
            self._set_low()
        }
    }
}

impl<const P: char, const N: u8, MODE> OutputPin for Pin<P, N, Output<MODE>> {
    type Error = Infallible;

    #[inline]
    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set_high();
        Ok(())
    }

    #[inline]
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set_low();
        Ok(())
    }
}

impl<const P: char, const N: u8, MODE> StatefulOutputPin for Pin<P, N, Output<MODE>> {
    #[inline]
    fn is_set_high(&self) -> Result<bool, Self::Error> {
        Ok(self.is_set_high())
    }

    #[inline]
    fn is_set_low(&self) -> Result<bool, Self::Error> {
        Ok(self.is_set_low())
    }
}

impl<const P: char, const N: u8, MODE> ToggleableOutputPin for Pin<P, N, Output<MODE>> {
    type Error = Infallible;

    #[inline(always)]
    fn toggle(&mut self) -> Result<(), Self::Error> {
        self.toggle();
        Ok(())
    }
}

impl<const P: char, const N: u8, MODE> Pin<P, N, Input<MODE>> {
    #[inline]
    pub fn is_high(&self) -> bool {
        !self._is_low()
    }

    #[inline]
    pub fn is_low(&self) -> bool {
        self._is_low()
    }
}

impl<const P: char, const N: u8, MODE> InputPin for Pin<P, N, Input<MODE>> {
    type Error = Infallible;

    #[inline]
    fn is_high(&self) -> Result<bool, Self::Error> {
        Ok(self.is_high())
    }

    #[inline]
    fn is_low(&self) -> Result<bool, Self::Error> {
        Ok(self.is_low())
    }
}

impl<const P: char, const N: u8> Pin<P, N, Output<OpenDrain>> {
    #[inline]
    pub fn is_high(&self) -> bool {
        !self._is_low()
    }

    #[inline]
    pub fn is_low(&self) -> bool {
        self._is_low()
    }
}

impl<const P: char, const N: u8> InputPin for Pin<P, N, Output<OpenDrain>> {
    type Error = Infallible;

    #[inline]
    fn is_high(&self) -> Result<bool, Self::Error> {
        Ok(self.is_high())
    }

    #[inline]
    fn is_low(&self) -> Result<bool, Self::Error> {
        Ok(self.is_low())
    }
}

impl<const P: char, const N: u8, MODE> Pin<P, N, MODE>
where
    MODE: Active,
{
    /// Configures the pin to operate as alternate function `A` with a push-pull driver
    #[inline]
    pub fn into_alternate<const A: u8>(mut self, cfg: &mut Cfg<P>) -> Pin<P, N, Alternate<A>> {
        self.mode::<Alternate<A, PushPull>>(cfg);
        Pin::new()
    }

    /// Configures the pin to operate as alternate function `A` with an open-drain driver
    #[inline]
    pub fn into_alternate_open_drain<const A: u8>(
        mut self,
        cfg: &mut Cfg<P>,
    ) -> Pin<P, N, Alternate<A, OpenDrain>> {
        self.mode::<Alternate<A, OpenDrain>>(cfg);
        Pin::new()
    }

    /// Configures the pin to operate as a floating input pin
    #[inline]
    pub fn into_floating_input(mut self, cfg: &mut Cfg<P>) -> Pin<P, N, Input<Floating>> {
        self.mode::<Input<Floating>>(cfg);
        Pin::new()
    }

    /// Configures the pin to operate as a pulled down input pin
    #[inline]
    pub fn into_pull_down_input(mut self, cfg: &mut Cfg<P>) -> Pin<P, N, Input<PullDown>> {
        self.mode::<Input<PullDown>>(cfg);
        Pin::new()
    }

    /// Configures the pin to operate as a pulled up input pin
    #[inline]
    pub fn into_pull_up_input(mut self, cfg: &mut Cfg<P>) -> Pin<P, N, Input<PullUp>> {
        self.mode::<Input<PullUp>>(cfg);
        Pin::new()
    }

    /// Configures the pin to operate as an open-drain output pin.
    /// Initial state will be low.
    #[inline]
    pub fn into_open_drain_output(self, cfg: &mut Cfg<P>) -> Pin<P, N, Output<OpenDrain>> {
        self.into_open_drain_output_with_state(cfg, PinState::Low)
    }

    /// Configures the pin to operate as an open-drain output pin.
    /// `initial_state` specifies whether the pin should be initially high or low.
    #[inline]
    pub fn into_open_drain_output_with_state(
        mut self,
        cfg: &mut Cfg<P>,
        initial_state: PinState,
    ) -> Pin<P, N, Output<OpenDrain>> {
        self._set_state(initial_state);
        self.mode::<Output<OpenDrain>>(cfg);
        Pin::new()
    }

    /// Configures the pin to operate as a push-pull output pin.
    /// Initial state will be low.
    #[inline]
    pub fn into_push_pull_output(self, cfg: &mut Cfg<P>) -> Pin<P, N, Output<PushPull>> {
        self.into_push_pull_output_with_state(cfg, PinState::Low)
    }

    /// Configures the pin to operate as a push-pull output pin.
    /// `initial_state` specifies whether the pin should be initially high or low.
    #[inline]
    pub fn into_push_pull_output_with_state(
        mut self,
        cfg: &mut Cfg<P>,
        initial_state: PinState,
    ) -> Pin<P, N, Output<PushPull>> {
        self._set_state(initial_state);
        self.mode::<Output<PushPull>>(cfg);
        Pin::new()
    }

    /// Configures the pin to operate as an analog input pin
    #[inline]
    pub fn into_analog(mut self, cfg: &mut Cfg<P>) -> Pin<P, N, Analog> {
        self.mode::<Analog>(cfg);
        Pin::new()
    }

    /// Configures the pin as a pin that can change between input
    /// and output without changing the type. It starts out
    /// as a floating input
    #[inline]
    pub fn into_dynamic(mut self, cfg: &mut Cfg<P>) -> Pin<P, N, Dynamic> {
        self.mode::<Input<Floating>>(cfg);
        Pin::new()
    }
}

impl<const P: char, const N: u8, MODE> Pin<P, N, MODE> {
    fn mode<M: PinMode>(&mut self, _cfg: &mut Cfg<P>) {
        let gpio = Self::regs();
        PortConfig::read(gpio).with_mode(N, M::BITS).write(gpio);
    }

    /// Sets the output drive strength
    pub fn set_drive(&mut self, _cfg: &mut Cfg<P>, drive: Drive) {
        let regs = Self::regs();
        match drive {
            Drive::High => regs.drvcr.clear_bits(gpio::pin(N)),
            Drive::Low => regs.drvcr.set_bits(gpio::pin(N)),
        }
    }

    /// Sets the output slew rate
    pub fn set_slew(&mut self, _cfg: &mut Cfg<P>, slew: Slew) {
        let regs = Self::regs();
        match slew {
            Slew::Fast => regs.slewcr.clear_bits(gpio::pin(N)),
            Slew::Slow => regs.slewcr.set_bits(gpio::pin(N)),
        }
    }

    /// Filters the input through the port debounce clock, see [`Cfg::enable_debounce_clock`]
    pub fn set_debounce(&mut self, _cfg: &mut Cfg<P>, enable: bool) {
        let regs = Self::regs();
        if enable {
            regs.indben.set_bits(gpio::pin(N));
        } else {
            regs.indben.clear_bits(gpio::pin(N));
        }
    }
}

// Dynamic pin

impl<const P: char, const N: u8> Pin<P, N, Dynamic> {
    #[inline]
    pub fn make_pull_up_input(&mut self, cfg: &mut Cfg<P>) {
        self.mode::<Input<PullUp>>(cfg);
        self.mode = Dynamic::InputPullUp;
    }

    #[inline]
    pub fn make_pull_down_input(&mut self, cfg: &mut Cfg<P>) {
        self.mode::<Input<PullDown>>(cfg);
        self.mode = Dynamic::InputPullDown;
    }

    #[inline]
    pub fn make_floating_input(&mut self, cfg: &mut Cfg<P>) {
        self.mode::<Input<Floating>>(cfg);
        self.mode = Dynamic::InputFloating;
    }

    #[inline]
    pub fn make_push_pull_output(&mut self, cfg: &mut Cfg<P>) {
        self.mode::<Output<PushPull>>(cfg);
        self.mode = Dynamic::OutputPushPull;
    }

    #[inline]
    pub fn make_open_drain_output(&mut self, cfg: &mut Cfg<P>) {
        self.mode::<Output<OpenDrain>>(cfg);
        self.mode = Dynamic::OutputOpenDrain;
    }
}

/// Pin interrupt control
///
/// Every port has a single interrupt line; the handler finds the source pin with
/// [`check_interrupt`](InterruptPin::check_interrupt) and must clear it with
/// [`clear_interrupt_pending_bit`](InterruptPin::clear_interrupt_pending_bit).
pub trait InterruptPin {
    fn trigger_on(&mut self, trigger: Trigger);
    fn enable_interrupt(&mut self);
    fn disable_interrupt(&mut self);
    fn clear_interrupt_pending_bit(&mut self);
    fn check_interrupt(&self) -> bool;
}

/// Shared implementation for typed and erased pins
pub(crate) fn trigger_on(port: u8, n: u8, trigger: Trigger) {
    let regs = gpio_regs(port);
    let mask = gpio::pin(n);
    let (level, high, any) = trigger.bits();
    cortex_m::interrupt::free(|_| {
        let flag = |reg: &crate::pac::Reg, set: bool| {
            if set {
                reg.set_bits(mask)
            } else {
                reg.clear_bits(mask)
            }
        };
        flag(&regs.inttypcr, level);
        flag(&regs.intpolcr, high);
        flag(&regs.intany, any);
    });
}

pub(crate) fn set_interrupt(port: u8, n: u8, enable: bool) {
    let regs = gpio_regs(port);
    cortex_m::interrupt::free(|_| {
        if enable {
            regs.inten.set_bits(gpio::pin(n));
        } else {
            regs.inten.clear_bits(gpio::pin(n));
        }
    });
}

pub(crate) fn clear_interrupt(port: u8, n: u8) {
    // write one to clear, other pins are unaffected
    gpio_regs(port).intclr.write(gpio::pin(n));
}

pub(crate) fn interrupt_pending(port: u8, n: u8) -> bool {
    gpio_regs(port).mskintsr.is_set(gpio::pin(n))
}

impl<const P: char, const N: u8, MODE> InterruptPin for Pin<P, N, Input<MODE>> {
    fn trigger_on(&mut self, trigger: Trigger) {
        trigger_on(P as u8 - b'A', N, trigger)
    }

    fn enable_interrupt(&mut self) {
        set_interrupt(P as u8 - b'A', N, true)
    }

    fn disable_interrupt(&mut self) {
        set_interrupt(P as u8 - b'A', N, false)
    }

    fn clear_interrupt_pending_bit(&mut self) {
        clear_interrupt(P as u8 - b'A', N)
    }

    fn check_interrupt(&self) -> bool {
        interrupt_pending(P as u8 - b'A', N)
    }
}

/// NVIC line of port `P`
pub const fn port_interrupt(port: char) -> crate::pac::Interrupt {
    match port {
        'A' => crate::pac::Interrupt::GPIOA,
        'B' => crate::pac::Interrupt::GPIOB,
        'C' => crate::pac::Interrupt::GPIOC,
        _ => crate::pac::Interrupt::GPIOD,
    }
}

gpio!(GPIOA, gpioa, 'A', [
    PA1: (pa1, 1),
    PA2: (pa2, 2),
    PA3: (pa3, 3),
]);

gpio!(GPIOB, gpiob, 'B', [
    PB4: (pb4, 4),
    PB5: (pb5, 5),
]);

gpio!(GPIOC, gpioc, 'C', [
    PC3: (pc3, 3),
    PC4: (pc4, 4),
    PC5: (pc5, 5),
    PC6: (pc6, 6),
    PC7: (pc7, 7),
]);

gpio!(GPIOD, gpiod, 'D', [
    PD1: (pd1, 1),
    PD2: (pd2, 2),
    PD3: (pd3, 3),
    PD4: (pd4, 4),
    PD5: (pd5, 5),
    PD6: (pd6, 6),
]);

#[inline(always)]
pub(crate) fn gpio_regs(port: u8) -> &'static gpio::RegisterBlock {
    let ptr = match port {
        0 => GPIOA::ptr(),
        1 => GPIOB::ptr(),
        2 => GPIOC::ptr(),
        _ => GPIOD::ptr(),
    };
    // NOTE(unsafe) the port register blocks live for the whole program; accesses are either
    // atomic set/clear writes or serialized by `Cfg` or a critical section
    unsafe { &*ptr }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_mode_sets_direction_only_for_its_pin() {
        let cfg = PortConfig {
            dir: 0b0000_0001,
            ..PortConfig::default()
        };
        let cfg = cfg.with_mode(5, <Output<PushPull> as PinMode>::BITS);
        assert_eq!(cfg.dir, 0b0010_0001);
        assert_eq!(cfg.otype, 0);
        assert_eq!(cfg.afr, 0);
    }

    #[test]
    fn open_drain_and_pull_fields() {
        let cfg = PortConfig::default()
            .with_mode(3, <Output<OpenDrain> as PinMode>::BITS)
            .with_mode(4, <Input<PullUp> as PinMode>::BITS)
            .with_mode(6, <Input<PullDown> as PinMode>::BITS);
        assert_eq!(cfg.otype, 1 << 3);
        assert_eq!(cfg.dir, 1 << 3);
        assert_eq!(cfg.pupd, (gpio::PUPD_UP << 8) | (gpio::PUPD_DOWN << 12));
    }

    #[test]
    fn alternate_function_number_lands_in_its_nibble() {
        let cfg = PortConfig::default().with_mode(2, <Alternate<5, PushPull> as PinMode>::BITS);
        assert_eq!(cfg.afr, 5 << 8);

        // back to GPIO clears the function and the direction
        let cfg = cfg.with_mode(2, <Input<Floating> as PinMode>::BITS);
        assert_eq!(cfg, PortConfig::default());
    }

    #[test]
    fn analog_clears_pull() {
        let cfg = PortConfig::default()
            .with_mode(1, <Input<PullUp> as PinMode>::BITS)
            .with_mode(1, <Analog as PinMode>::BITS);
        assert_eq!(cfg.anaen, 1 << 1);
        assert_eq!(cfg.pupd, 0);
    }

    #[test]
    fn trigger_encoding() {
        assert_eq!(Trigger::Rising.bits(), (false, true, false));
        assert_eq!(Trigger::RisingFalling.bits(), (false, false, true));
        assert_eq!(Trigger::Low.bits(), (true, false, false));
    }

    #[test]
    fn dynamic_pin_directions() {
        assert!(Dynamic::OutputOpenDrain.is_input());
        assert!(Dynamic::OutputOpenDrain.is_output());
        assert!(!Dynamic::OutputPushPull.is_input());
        assert!(!Dynamic::InputPullUp.is_output());
    }
}
