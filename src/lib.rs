// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # HAL for the CX32L003 family of microcontrollers
//!
//! This is an implementation of the [`embedded-hal`] traits for the CX32L003 family of
//! microcontrollers.
//!
//! [`embedded-hal`]: https://crates.io/crates/embedded-hal
//!
//! # Usage
//!
//! ## Commonly used setup
//! Almost all peripherals require references to some registers in `RCC`. The following
//! code shows how to set up those registers
//!
//! ```ignore
//! // Get access to the device specific peripherals from the peripheral access layer
//! let dp = pac::Peripherals::take().unwrap();
//!
//! // Take ownership over the raw RCC and FLASH devices and convert them into the corresponding
//! // HAL structs.
//! let mut rcc = dp.RCC.constrain();
//! let mut flash = dp.FLASH.constrain();
//!
//! // Freeze the configuration of all the clocks in the system and store the frozen frequencies in
//! // `clocks`
//! let clocks = rcc.cfgr.hirc(HircFreq::Mhz24).freeze(&mut flash.ws).unwrap();
//! ```
//!
//! Drivers that can time out poll against the millisecond tick. Start it once the clocks are
//! known and forward the SysTick exception to [`tick::on_systick`]:
//!
//! ```ignore
//! let _tick = Tick::start(cp.SYST, &clocks);
//!
//! #[exception]
//! fn SysTick() {
//!     tick::on_systick();
//! }
//! ```
//!
//! ## Usage examples
//!
//! See the [demos] folder.
//!
//! [demos]: https://github.com/cx32-rust/cx32l003-hal/tree/main/demos

#![cfg_attr(not(test), no_std)]
#![deny(broken_intra_doc_links)]

pub mod pac;

pub mod adc;
pub mod awk;
pub mod beep;
pub mod clktrim;
pub mod crc;
pub mod delay;
pub mod flash;
pub mod gpio;
pub mod i2c;
pub mod logger;
pub mod lpuart;
pub mod lptim;
pub mod lvd;
pub mod owire;
pub mod pca;
pub mod prelude;
pub mod pwm;
pub mod pwr;
pub mod rcc;
pub mod rtc;
pub mod serial;
pub mod spi;
#[cfg(feature = "starterkit")]
pub mod starterkit;
pub mod tick;
pub mod time;
pub mod timer;
pub mod vc;
pub mod watchdog;

mod sealed {
    pub trait Sealed {}
}
pub(crate) use sealed::Sealed;
