// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Low voltage detector registers

use super::{bit, Field, Reg};

#[repr(C)]
pub struct RegisterBlock {
    /// 0x00 - Control
    pub cr: Reg,
    /// 0x04 - Status
    pub sr: Reg,
    /// 0x08 - Interrupt clear
    pub intclr: Reg,
}

pub mod cr {
    use super::{bit, Field};
    pub const EN: u32 = bit(0);
    /// 1 = reset, 0 = interrupt
    pub const ACT: u32 = bit(1);
    pub const SOURCE: Field = Field::new(2, 2);
    pub const VTDS: Field = Field::new(4, 4);
    pub const FLTEN: u32 = bit(8);
    pub const FLTTIME: Field = Field::new(9, 3);
    pub const IE: u32 = bit(12);
    pub const FTEN: u32 = bit(13);
    pub const RTEN: u32 = bit(14);
    pub const HTEN: u32 = bit(15);
}

pub mod sr {
    use super::bit;
    pub const INTF: u32 = bit(0);
    pub const FLTV: u32 = bit(1);
}
