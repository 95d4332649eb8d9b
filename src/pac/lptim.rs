// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Low power timer registers

use super::{bit, Field, Reg};

#[repr(C)]
pub struct RegisterBlock {
    /// 0x00 - Counter
    pub cnt: Reg,
    /// 0x04 - Load value
    pub load: Reg,
    /// 0x08 - Background load value
    pub bgload: Reg,
    /// 0x0C - Control
    pub cr: Reg,
    /// 0x10 - Interrupt clear
    pub intclr: Reg,
    /// 0x14 - Interrupt status
    pub intsr: Reg,
}

pub mod cr {
    use super::{bit, Field};
    pub const TR: u32 = bit(0);
    /// 1 = auto-reload from BGLOAD
    pub const MODE: u32 = bit(1);
    pub const CT: u32 = bit(2);
    pub const TOG_EN: u32 = bit(3);
    pub const TCK_SEL: Field = Field::new(4, 2);
    /// Set while a register write is being synchronised to the counter clock
    pub const WT_FLAG: u32 = bit(7);
    pub const GATE: u32 = bit(8);
    pub const GATE_P: u32 = bit(9);
    pub const INT_EN: u32 = bit(10);
}

pub mod intsr {
    use super::bit;
    pub const TF: u32 = bit(0);
}

pub const LOAD: Field = Field::new(0, 16);
