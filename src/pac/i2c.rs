// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! I2C registers

use super::{bit, Field, Reg};

#[repr(C)]
pub struct RegisterBlock {
    /// 0x00 - Control
    pub cr: Reg,
    /// 0x04 - Data
    pub data: Reg,
    /// 0x08 - Own slave address
    pub addr: Reg,
    /// 0x0C - Status code
    pub stat: Reg,
    /// 0x10 - Baud timer run
    pub tmrun: Reg,
    /// 0x14 - Baud timer count
    pub tm: Reg,
}

pub mod cr {
    use super::bit;
    pub const AA: u32 = bit(2);
    pub const SI: u32 = bit(3);
    pub const STO: u32 = bit(4);
    pub const STA: u32 = bit(5);
    pub const ENS: u32 = bit(6);
    pub const H1M: u32 = bit(7);
}

pub mod addr {
    use super::{bit, Field};
    pub const GC: u32 = bit(0);
    pub const ADDR: Field = Field::new(1, 7);
}

pub mod stat {
    use super::Field;
    pub const STAT: Field = Field::new(0, 8);
}

pub mod tmrun {
    use super::bit;
    pub const TME: u32 = bit(0);
}

pub mod tm {
    use super::Field;
    pub const TM: Field = Field::new(0, 8);
}
