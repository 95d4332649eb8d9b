// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Analog to digital converter registers

use super::{bit, Field, Reg};

#[repr(C)]
pub struct RegisterBlock {
    /// 0x00 - Control 0
    pub cr0: Reg,
    /// 0x04 - Control 1
    pub cr1: Reg,
    /// 0x08 - Control 2
    pub cr2: Reg,
    /// 0x0C - Channel 0..7 results
    pub result: [Reg; 8],
    /// 0x2C - Accumulated result
    pub result_acc: Reg,
    /// 0x30 - High threshold
    pub ht: Reg,
    /// 0x34 - Low threshold
    pub lt: Reg,
    /// 0x38 - Interrupt enable
    pub inten: Reg,
    /// 0x3C - Raw interrupt status
    pub rawintsr: Reg,
    /// 0x40 - Masked interrupt status
    pub mskintsr: Reg,
    /// 0x44 - Interrupt clear
    pub intclr: Reg,
}

pub mod cr0 {
    use super::{bit, Field};
    pub const EN: u32 = bit(0);
    /// Start a single conversion; reads back 1 while converting
    pub const START: u32 = bit(1);
    /// ADC clock = PCLK / 2^CLKDIV
    pub const CLKDIV: Field = Field::new(2, 3);
    /// Channel of single conversions
    pub const SEL: Field = Field::new(5, 3);
    /// Sample time
    pub const SAM: Field = Field::new(8, 2);
}

pub mod cr1 {
    use super::{bit, Field};
    /// Continuous (scan) mode
    pub const CT: u32 = bit(0);
    pub const RACC_EN: u32 = bit(1);
    pub const RACC_CLR: u32 = bit(2);
    pub const TRIGS0: Field = Field::new(3, 5);
    pub const TRIGS1: Field = Field::new(8, 5);
    pub const HTCMP: u32 = bit(13);
    pub const LTCMP: u32 = bit(14);
    pub const REGCMP: u32 = bit(15);
}

pub mod cr2 {
    use super::{bit, Field};
    pub const CHEN: Field = Field::new(0, 8);
    pub const ADCCNT: Field = Field::new(8, 8);
    pub const CIRCLE: u32 = bit(16);
}

pub mod int {
    use super::bit;
    pub const fn ch(n: u8) -> u32 {
        bit(n)
    }
    pub const CH_ALL: u32 = 0xFF;
    pub const CONT: u32 = bit(8);
    pub const HHT: u32 = bit(9);
    pub const LLT: u32 = bit(10);
    pub const REG: u32 = bit(11);
}

pub const RESULT: Field = Field::new(0, 12);
pub const RESULT_ACC: Field = Field::new(0, 20);
