// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-wire interface registers

use super::{bit, Field, Reg};

#[repr(C)]
pub struct RegisterBlock {
    /// 0x00 - Control
    pub cr: Reg,
    /// 0x04 - Noise filter
    pub nfcr: Reg,
    /// 0x08 - Reset pulse length
    pub rescnt: Reg,
    /// 0x0C - Presence detect sample point
    pub prescnt: Reg,
    /// 0x10 - Bit slot length
    pub bitratecnt: Reg,
    /// 0x14 - Drive low time of a 1 bit / read slot
    pub drvcnt: Reg,
    /// 0x18 - Read sample point
    pub rdsmpcnt: Reg,
    /// 0x1C - Recovery time
    pub reccnt: Reg,
    /// 0x20 - Data
    pub data: Reg,
    /// 0x24 - Command
    pub cmd: Reg,
    /// 0x28 - Interrupt enable
    pub inten: Reg,
    /// 0x2C - Status
    pub sr: Reg,
    /// 0x30 - Interrupt clear
    pub intclr: Reg,
}

pub mod cr {
    use super::{bit, Field};
    pub const EN: u32 = bit(0);
    pub const CLKDIV: Field = Field::new(1, 2);
    /// 1 = single bit transfers
    pub const SIZE: u32 = bit(4);
    pub const MSBFIRST: u32 = bit(5);
}

pub mod nfcr {
    use super::{bit, Field};
    pub const NFDIV: Field = Field::new(0, 3);
    pub const NFEN: u32 = bit(3);
}

pub mod cmd {
    pub const INIT: u32 = 0x1;
    pub const TX: u32 = 0x2;
    pub const RX: u32 = 0x3;
}

pub mod sr {
    use super::bit;
    /// No presence pulse after reset
    pub const ACKERR: u32 = bit(0);
    pub const INITDONE: u32 = bit(1);
    pub const TXDONE: u32 = bit(2);
    pub const RXDONE: u32 = bit(3);
}

pub const COUNT: Field = Field::new(0, 16);
