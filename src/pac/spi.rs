// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serial peripheral interface registers

use super::{bit, Field, Reg};

#[repr(C)]
pub struct RegisterBlock {
    /// 0x00 - Control
    pub cr: Reg,
    /// 0x04 - Slave select output
    pub ssn: Reg,
    /// 0x08 - Status
    pub sr: Reg,
    /// 0x0C - Data
    pub data: Reg,
}

pub mod cr {
    use super::{bit, Field};
    /// Clock divider, PCLK / 2^(SPR + 1)
    pub const SPR: Field = Field::new(0, 3);
    pub const CPHA: u32 = bit(3);
    pub const CPOL: u32 = bit(4);
    pub const MSTR: u32 = bit(5);
    pub const SPEN: u32 = bit(6);
    pub const SPIEN: u32 = bit(7);
}

pub mod sr {
    use super::bit;
    pub const MDF: u32 = bit(4);
    pub const SSERR: u32 = bit(5);
    pub const WCOL: u32 = bit(6);
    pub const SPIF: u32 = bit(7);
}

pub mod ssn {
    use super::bit;
    pub const SSN: u32 = bit(0);
}
