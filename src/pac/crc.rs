// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CRC calculation unit registers

use super::{bit, Field, Reg};

#[repr(C)]
pub struct RegisterBlock {
    /// 0x00 - Result, write to seed
    pub result: Reg,
    _reserved0: [u32; 31],
    /// 0x80 - Data input, accepts 8, 16 and 32 bit writes
    pub data: Reg,
}

pub mod result {
    use super::{bit, Field};
    pub const CRC: Field = Field::new(0, 16);
    /// Set when the data fed after a CRC value checked correct
    pub const FLAG: u32 = bit(16);
}
