// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Clock trimming and monitoring registers

use super::{bit, Field, Reg};

#[repr(C)]
pub struct RegisterBlock {
    /// 0x00 - Control
    pub cr: Reg,
    /// 0x04 - Reference counter preload
    pub refcon: Reg,
    /// 0x08 - Reference counter, counts down
    pub refcnt: Reg,
    /// 0x0C - Measured clock counter
    pub calcnt: Reg,
    /// 0x10 - Measured clock counter overflow value
    pub calcon: Reg,
    /// 0x14 - Interrupt flags
    pub ifr: Reg,
    /// 0x18 - Interrupt flag clear
    pub iclr: Reg,
}

pub mod cr {
    use super::{bit, Field};
    pub const START: u32 = bit(0);
    pub const REFCLK_SEL: Field = Field::new(1, 3);
    pub const CALCLK_SEL: Field = Field::new(4, 2);
    /// Clock failure monitoring
    pub const MON_EN: u32 = bit(6);
    pub const IE: u32 = bit(7);
}

pub mod ifr {
    use super::bit;
    /// Reference counter reached zero
    pub const STOP: u32 = bit(0);
    pub const CALCNT_OF: u32 = bit(1);
    pub const LXT_FAULT: u32 = bit(2);
    pub const HXT_FAULT: u32 = bit(3);
}
