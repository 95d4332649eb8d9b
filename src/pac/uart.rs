// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! UART and LPUART registers

use super::{bit, Field, Reg};

#[repr(C)]
pub struct RegisterBlock {
    /// 0x00 - Data buffer
    pub sbuf: Reg,
    /// 0x04 - Control
    pub scon: Reg,
    /// 0x08 - Slave address
    pub saddr: Reg,
    /// 0x0C - Slave address mask
    pub saden: Reg,
    /// 0x10 - Interrupt status
    pub intsr: Reg,
    /// 0x14 - Interrupt clear
    pub intclr: Reg,
    /// 0x18 - Baud rate generator
    pub baudcr: Reg,
}

pub mod scon {
    use super::{bit, Field};
    pub const RIEN: u32 = bit(0);
    pub const TIEN: u32 = bit(1);
    pub const RB8: u32 = bit(2);
    pub const TB8: u32 = bit(3);
    pub const REN: u32 = bit(4);
    pub const SM2: u32 = bit(5);
    pub const SM: Field = Field::new(6, 2);
    pub const FEEN: u32 = bit(8);
    pub const DBAUD: u32 = bit(9);
    pub const TXEIE: u32 = bit(10);
    /// LPUART only
    pub const LPMODE: u32 = bit(11);
    /// LPUART only
    pub const SCLKSEL: Field = Field::new(12, 2);
    /// LPUART only
    pub const OVER: Field = Field::new(14, 2);

    pub const MODE0: u32 = 0;
    pub const MODE1: u32 = 1;
    pub const MODE2: u32 = 2;
    pub const MODE3: u32 = 3;
}

pub mod intsr {
    use super::bit;
    pub const RI: u32 = bit(0);
    pub const TI: u32 = bit(1);
    pub const FE: u32 = bit(2);
    pub const TXE: u32 = bit(3);
}

pub mod baudcr {
    use super::{bit, Field};
    pub const BRG: Field = Field::new(0, 16);
    pub const SELF_BRG: u32 = bit(16);
}
