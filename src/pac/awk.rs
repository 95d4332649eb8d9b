// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Auto wake-up timer registers

use super::{bit, Field, Reg};

#[repr(C)]
pub struct RegisterBlock {
    /// 0x00 - Control
    pub cr: Reg,
    /// 0x04 - Reload value
    pub rload: Reg,
    /// 0x08 - Status
    pub sr: Reg,
    /// 0x0C - Interrupt clear
    pub intclr: Reg,
}

pub mod cr {
    use super::{bit, Field};
    /// Counter clock = source / 2^(DIVSEL + 1)
    pub const DIVSEL: Field = Field::new(0, 4);
    pub const TCLKSEL: Field = Field::new(4, 2);
    pub const EN: u32 = bit(6);
}

pub mod sr {
    use super::bit;
    pub const AWKF: u32 = bit(0);
}

pub const RLOAD: Field = Field::new(0, 8);
