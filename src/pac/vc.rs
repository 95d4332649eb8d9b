// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Voltage comparator registers

use super::{bit, Field, Reg};

#[repr(C)]
pub struct RegisterBlock {
    /// 0x00 - VCC divider
    pub cr0: Reg,
    /// 0x04 - Comparator control
    pub cr1: Reg,
    /// 0x08 - Output routing
    pub outcfg: Reg,
    /// 0x0C - Status
    pub sr: Reg,
    /// 0x10 - Interrupt clear
    pub intclr: Reg,
}

pub mod cr0 {
    use super::{bit, Field};
    /// VCC * (DIV + 1) / 64
    pub const DIV: Field = Field::new(0, 6);
    pub const DIVEN: u32 = bit(6);
}

pub mod cr1 {
    use super::{bit, Field};
    pub const EN: u32 = bit(0);
    pub const P_SEL: Field = Field::new(1, 3);
    pub const N_SEL: Field = Field::new(4, 3);
    pub const HYS: Field = Field::new(7, 2);
    pub const BIAS: Field = Field::new(9, 2);
    pub const FLTEN: u32 = bit(11);
    pub const FLTTIME: Field = Field::new(12, 3);
    pub const IE: u32 = bit(15);
    pub const FALLING: u32 = bit(16);
    pub const RISING: u32 = bit(17);
    pub const LEVEL: u32 = bit(18);
}

pub mod outcfg {
    use super::bit;
    pub const INV: u32 = bit(0);
    pub const TIM1_BRK: u32 = bit(1);
    pub const TIM10_GATE: u32 = bit(2);
    pub const TIM11_GATE: u32 = bit(3);
    pub const PCA_CAP0: u32 = bit(4);
}

pub mod sr {
    use super::bit;
    pub const INTF: u32 = bit(0);
    pub const FLTV: u32 = bit(1);
}
