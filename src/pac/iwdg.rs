// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Independent watchdog registers

use super::{bit, Field, Reg};

#[repr(C)]
pub struct RegisterBlock {
    /// 0x00 - Command
    pub cmdcr: Reg,
    /// 0x04 - Configuration
    pub cfgr: Reg,
    /// 0x08 - Reload value
    pub rlr: Reg,
    /// 0x0C - Current counter
    pub cntval: Reg,
    /// 0x10 - Status
    pub sr: Reg,
    /// 0x14 - Interrupt clear
    pub intclr: Reg,
    /// 0x18 - Write unlock
    pub unlock: Reg,
}

pub const CMD_START: u32 = 0x55;
pub const CMD_RELOAD: u32 = 0xAA;
pub const UNLOCK_KEY: u32 = 0x55AA_6699;

pub mod cfgr {
    use super::bit;
    /// 1 = raise an interrupt on expiry instead of resetting
    pub const INTM: u32 = bit(0);
    pub const INTMSK: u32 = bit(1);
}

pub mod sr {
    use super::bit;
    /// Reload value is being transferred to the counter domain
    pub const RLF: u32 = bit(0);
    pub const INTF: u32 = bit(1);
}

pub const RLR: Field = Field::new(0, 20);
