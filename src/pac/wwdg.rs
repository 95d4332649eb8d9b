// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Window watchdog registers

use super::{bit, Field, Reg};

#[repr(C)]
pub struct RegisterBlock {
    /// 0x00 - Reload value
    pub rload: Reg,
    /// 0x04 - Control
    pub cr: Reg,
    /// 0x08 - Interrupt enable
    pub inten: Reg,
    /// 0x0C - Status
    pub sr: Reg,
    /// 0x10 - Interrupt clear
    pub intclr: Reg,
    /// 0x14 - Current counter (read-only)
    pub cnt: Reg,
}

pub const RLOAD: Field = Field::new(0, 8);

pub mod cr {
    use super::{bit, Field};
    pub const WINR: Field = Field::new(0, 8);
    pub const PRSC: Field = Field::new(8, 20);
    pub const EN: u32 = bit(28);
}

pub mod sr {
    use super::bit;
    /// Counter reached the window value
    pub const INTF: u32 = bit(0);
}
