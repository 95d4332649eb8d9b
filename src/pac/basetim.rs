// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Basic timer registers (TIM10, TIM11)

use super::{bit, Field, Reg};

#[repr(C)]
pub struct RegisterBlock {
    /// 0x00 - Load value
    pub load: Reg,
    /// 0x04 - Current value, counts down
    pub value: Reg,
    /// 0x08 - Control
    pub cr: Reg,
    /// 0x0C - Interrupt clear
    pub intclr: Reg,
    /// 0x10 - Raw interrupt status
    pub rawintsr: Reg,
    /// 0x14 - Masked interrupt status
    pub mskintsr: Reg,
    /// 0x18 - Background load value, used on the next reload
    pub bgload: Reg,
}

pub mod cr {
    use super::{bit, Field};
    pub const TR: u32 = bit(0);
    /// 1 = periodic (reload from BGLOAD), 0 = free running
    pub const MODE: u32 = bit(1);
    pub const CT: u32 = bit(2);
    pub const TOG_EN: u32 = bit(3);
    /// 1 = 32 bit counter
    pub const TMRSZ: u32 = bit(4);
    pub const ONESHOT: u32 = bit(5);
    /// Prescaler, clock / 2^PRS
    pub const PRS: Field = Field::new(8, 3);
    pub const GATE: u32 = bit(11);
    pub const GATE_P: u32 = bit(12);
    pub const INTEN: u32 = bit(13);
}

pub mod intsr {
    use super::bit;
    pub const TF: u32 = bit(0);
}
