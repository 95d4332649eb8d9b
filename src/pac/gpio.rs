// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! General purpose I/O port registers

use super::{bit, Field, Reg};

#[repr(C)]
pub struct RegisterBlock {
    /// 0x00 - Direction, 1 = output
    pub dircr: Reg,
    /// 0x04 - Output type, 1 = open drain
    pub otyper: Reg,
    /// 0x08 - Output data
    pub odr: Reg,
    /// 0x0C - Input data
    pub idr: Reg,
    /// 0x10 - Interrupt enable
    pub inten: Reg,
    /// 0x14 - Raw interrupt status
    pub rawintsr: Reg,
    /// 0x18 - Masked interrupt status
    pub mskintsr: Reg,
    /// 0x1C - Interrupt clear
    pub intclr: Reg,
    /// 0x20 - Interrupt type, 1 = level
    pub inttypcr: Reg,
    /// 0x24 - Interrupt polarity, 1 = high level / rising edge
    pub intpolcr: Reg,
    /// 0x28 - Interrupt on both edges
    pub intany: Reg,
    /// 0x2C - Output set
    pub odset: Reg,
    /// 0x30 - Output clear
    pub odclr: Reg,
    /// 0x34 - Input debounce enable
    pub indben: Reg,
    /// 0x38 - Debounce clock
    pub dbclkcr: Reg,
    /// 0x3C - Pull-up / pull-down, two bits per pin
    pub pupdr: Reg,
    /// 0x40 - Slew rate, 1 = slow
    pub slewcr: Reg,
    /// 0x44 - Drive strength, 1 = low drive
    pub drvcr: Reg,
    /// 0x48 - Alternate function, four bits per pin
    pub afr: Reg,
    /// 0x4C - Analog enable
    pub anaen: Reg,
}

pub mod dbclkcr {
    use super::{bit, Field};
    pub const DIV: Field = Field::new(0, 4);
    pub const EN: u32 = bit(4);
}

pub const PUPD_NONE: u32 = 0b00;
pub const PUPD_UP: u32 = 0b01;
pub const PUPD_DOWN: u32 = 0b10;

/// Pull configuration field of pin `n`
pub const fn pupd(n: u8) -> Field {
    Field::new(n * 2, 2)
}

/// Alternate function field of pin `n`
pub const fn af(n: u8) -> Field {
    Field::new(n * 4, 4)
}

/// Mask of pin `n` in the one bit per pin registers
pub const fn pin(n: u8) -> u32 {
    bit(n)
}
