// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reset and clock control registers

use super::{bit, Field, Reg};

#[repr(C)]
pub struct RegisterBlock {
    /// 0x00 - AHB clock divider
    pub hclkdiv: Reg,
    /// 0x04 - APB clock divider
    pub pclkdiv: Reg,
    /// 0x08 - AHB peripheral clock enable
    pub hclken: Reg,
    /// 0x0C - APB peripheral clock enable
    pub pclken: Reg,
    /// 0x10 - Clock output control
    pub mcocr: Reg,
    _reserved0: [u32; 1],
    /// 0x18 - Reset control
    pub rstcr: Reg,
    /// 0x1C - Reset status
    pub rstsr: Reg,
    /// 0x20 - Oscillator enables
    pub sysclkcr: Reg,
    /// 0x24 - System clock selection
    pub sysclksel: Reg,
    /// 0x28 - HIRC control
    pub hirccr: Reg,
    /// 0x2C - HXT control
    pub hxtcr: Reg,
    /// 0x30 - LIRC control
    pub lirccr: Reg,
    /// 0x34 - LXT control
    pub lxtcr: Reg,
    /// 0x38 - Interrupt latency
    pub irqlatency: Reg,
    /// 0x3C - SysTick reference clock
    pub stickcr: Reg,
    /// 0x40 - SWD pin function
    pub swdiocr: Reg,
    /// 0x44 - APB peripheral reset
    pub perirst: Reg,
    /// 0x48 - AHB peripheral reset
    pub hclkrst: Reg,
    /// 0x4C - RTC domain reset
    pub rtcrst: Reg,
    /// 0x50 - Register write unlock
    pub unlock: Reg,
}

/// Key that has to accompany every write to the oscillator registers.
pub const REGISTER_KEY: u32 = 0x5A69 << 16;

/// Unlocks the reset and enable registers.
pub const UNLOCK_KEY: u32 = 0x55AA_6699;
/// Locks the reset and enable registers.
pub const LOCK_KEY: u32 = 0x55AA_6698;

pub mod hclkdiv {
    use super::Field;
    pub const DIV: Field = Field::new(0, 8);
}

pub mod pclkdiv {
    use super::Field;
    pub const DIV: Field = Field::new(0, 8);
}

pub mod mcocr {
    use super::{bit, Field};
    pub const SEL: Field = Field::new(0, 3);
    pub const DIV: Field = Field::new(4, 8);
    pub const EN: u32 = bit(12);
}

pub mod rstsr {
    use super::bit;
    pub const POR: u32 = bit(0);
    pub const LVD: u32 = bit(1);
    pub const PIN: u32 = bit(2);
    pub const IWDG: u32 = bit(3);
    pub const WWDG: u32 = bit(4);
    pub const LOCKUP: u32 = bit(5);
    pub const SYSRESETREQ: u32 = bit(6);
}

pub mod sysclkcr {
    use super::bit;
    pub const HIRCEN: u32 = bit(0);
    pub const HXTEN: u32 = bit(1);
    pub const LIRCEN: u32 = bit(2);
    pub const LXTEN: u32 = bit(3);
    pub const HXTBYP: u32 = bit(4);
    pub const LXTBYP: u32 = bit(5);
}

pub mod sysclksel {
    use super::Field;
    /// Requested source
    pub const SW: Field = Field::new(0, 2);
    /// Source currently driving SYSCLK (read-only)
    pub const SWS: Field = Field::new(4, 2);
}

pub mod hirccr {
    use super::{bit, Field};
    pub const TRIM: Field = Field::new(0, 12);
    pub const STABLE: u32 = bit(12);
}

pub mod hxtcr {
    use super::{bit, Field};
    pub const DRIVER: Field = Field::new(0, 3);
    pub const STARTUP: Field = Field::new(3, 2);
    pub const STABLE: u32 = bit(5);
}

pub mod lirccr {
    use super::{bit, Field};
    pub const TRIM: Field = Field::new(0, 9);
    pub const STARTUP: Field = Field::new(9, 2);
    pub const STABLE: u32 = bit(12);
}

pub mod lxtcr {
    use super::{bit, Field};
    pub const DRIVER: Field = Field::new(0, 4);
    pub const STARTUP: Field = Field::new(4, 2);
    pub const STABLE: u32 = bit(6);
}
