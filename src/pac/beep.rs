// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Beeper registers

use super::{bit, Field, Reg};

#[repr(C)]
pub struct RegisterBlock {
    /// 0x00 - Control and status
    pub csr: Reg,
}

pub mod csr {
    use super::{bit, Field};
    pub const BEEPDIV: Field = Field::new(0, 12);
    /// Output multiplier, 2^BEEPSEL
    pub const BEEPSEL: Field = Field::new(12, 2);
    pub const BEEPEN: u32 = bit(14);
    pub const CLKSEL: Field = Field::new(16, 2);
}
