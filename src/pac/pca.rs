// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Programmable counter array registers

use super::{bit, Field, Reg};

#[repr(C)]
pub struct RegisterBlock {
    /// 0x00 - Control
    pub ccon: Reg,
    /// 0x04 - Mode
    pub cmod: Reg,
    /// 0x08 - Counter
    pub cnt: Reg,
    /// 0x0C - Interrupt clear
    pub icr: Reg,
    /// 0x10 - Module mode 0..4
    pub ccapm: [Reg; 5],
    /// 0x24 - Module capture/compare value 0..4, high byte is the PWM reload
    pub ccap: [Reg; 5],
    /// 0x38 - Compare output enable
    pub ccapo: Reg,
    /// 0x3C - Output polarity
    pub pocr: Reg,
    /// 0x40 - Counter reload
    pub carr: Reg,
}

pub mod ccon {
    use super::bit;
    pub const fn ccf(n: u8) -> u32 {
        bit(n)
    }
    pub const CR: u32 = bit(6);
    pub const CF: u32 = bit(7);
}

pub mod cmod {
    use super::{bit, Field};
    pub const CFIE: u32 = bit(0);
    pub const CPS: Field = Field::new(1, 3);
    pub const CIDL: u32 = bit(7);
}

pub mod ccapm {
    use super::bit;
    pub const CCIE: u32 = bit(0);
    pub const PWM: u32 = bit(1);
    pub const TOG: u32 = bit(2);
    pub const MAT: u32 = bit(3);
    pub const CAPN: u32 = bit(4);
    pub const CAPP: u32 = bit(5);
    pub const ECOM: u32 = bit(6);
}

pub mod ccap {
    use super::Field;
    pub const LOW: Field = Field::new(0, 8);
    pub const HIGH: Field = Field::new(8, 8);
    pub const VALUE: Field = Field::new(0, 16);
}
