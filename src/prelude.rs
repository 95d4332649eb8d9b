// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prelude

pub use embedded_hal::prelude::*;

pub use crate::crc::CrcExt as _cx32l003_hal_crc_CrcExt;
pub use crate::flash::FlashExt as _cx32l003_hal_flash_FlashExt;
pub use crate::gpio::GpioExt as _cx32l003_hal_gpio_GpioExt;
pub use crate::gpio::PinExt as _cx32l003_hal_gpio_PinExt;
pub use crate::rcc::RccExt as _cx32l003_hal_rcc_RccExt;
pub use crate::time::U32Ext as _cx32l003_hal_time_U32Ext;
