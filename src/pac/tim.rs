// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Advanced and general purpose timer registers (TIM1, TIM2)

use super::{bit, Field, Reg};

#[repr(C)]
pub struct RegisterBlock {
    /// 0x00 - Control 1
    pub cr1: Reg,
    /// 0x04 - Control 2
    pub cr2: Reg,
    /// 0x08 - Slave mode control
    pub smcr: Reg,
    /// 0x0C - DMA/interrupt enable
    pub dier: Reg,
    /// 0x10 - Status
    pub sr: Reg,
    /// 0x14 - Event generation
    pub egr: Reg,
    /// 0x18 - Capture/compare mode 1
    pub ccmr1: Reg,
    /// 0x1C - Capture/compare mode 2
    pub ccmr2: Reg,
    /// 0x20 - Capture/compare enable
    pub ccer: Reg,
    /// 0x24 - Counter
    pub cnt: Reg,
    /// 0x28 - Prescaler
    pub psc: Reg,
    /// 0x2C - Auto-reload
    pub arr: Reg,
    /// 0x30 - Repetition counter
    pub rcr: Reg,
    /// 0x34 - Capture/compare 1..4
    pub ccr: [Reg; 4],
    /// 0x44 - Break and dead-time
    pub bdtr: Reg,
}

pub mod cr1 {
    use super::bit;
    pub const CEN: u32 = bit(0);
    pub const UDIS: u32 = bit(1);
    pub const URS: u32 = bit(2);
    pub const OPM: u32 = bit(3);
    pub const DIR: u32 = bit(4);
    pub const ARPE: u32 = bit(7);
}

pub mod dier {
    use super::bit;
    pub const UIE: u32 = bit(0);
    /// Capture/compare interrupt enable of channel `n` (0 based)
    pub const fn ccie(n: u8) -> u32 {
        bit(n + 1)
    }
}

pub mod sr {
    use super::bit;
    pub const UIF: u32 = bit(0);
    pub const fn ccif(n: u8) -> u32 {
        bit(n + 1)
    }
}

pub mod egr {
    use super::bit;
    pub const UG: u32 = bit(0);
}

pub mod ccmr {
    use super::{bit, Field};
    /// Output compare mode of the `n`th channel of a CCMR register (0 or 1)
    pub const fn ocm(n: u8) -> Field {
        Field::new(4 + 8 * n, 3)
    }
    /// Preload enable of the `n`th channel of a CCMR register
    pub const fn ocpe(n: u8) -> u32 {
        bit(3 + 8 * n)
    }
    pub const PWM_MODE1: u32 = 0b110;
    pub const PWM_MODE2: u32 = 0b111;
}

pub mod ccer {
    use super::bit;
    pub const fn cce(n: u8) -> u32 {
        bit(4 * n)
    }
    pub const fn ccp(n: u8) -> u32 {
        bit(4 * n + 1)
    }
}

pub mod bdtr {
    use super::bit;
    pub const MOE: u32 = bit(15);
}

/// Prescaler register width
pub const PSC: Field = Field::new(0, 16);
