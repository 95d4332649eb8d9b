// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Flash controller registers

use super::{bit, Field, Reg};

#[repr(C)]
pub struct RegisterBlock {
    /// 0x00 - Control
    pub cr: Reg,
    /// 0x04 - Interrupt flags
    pub ifr: Reg,
    /// 0x08 - Interrupt flag clear
    pub iclr: Reg,
    /// 0x0C - Write protection bypass
    pub bypass: Reg,
    /// 0x10 - Sector lock, sectors 0..32
    pub slock0: Reg,
    /// 0x14 - Sector lock, sectors 32..64
    pub slock1: Reg,
    /// 0x18 - Program/erase setup time
    pub tnvs: Reg,
    /// 0x1C - Program setup time
    pub tpgs: Reg,
    /// 0x20 - Program time
    pub tprog: Reg,
    /// 0x24 - Sector erase time
    pub tserase: Reg,
    /// 0x28 - Chip erase time
    pub tmerase: Reg,
    /// 0x2C - Program recovery time
    pub tprcv: Reg,
    /// 0x30 - Sector erase recovery time
    pub tsrcv: Reg,
    /// 0x34 - Chip erase recovery time
    pub tmrcv: Reg,
}

/// First and second word of the protection bypass sequence.
pub const BYPASS_KEYS: [u32; 2] = [0x5A5A, 0xA5A5];

pub mod cr {
    use super::{bit, Field};
    pub const OP: Field = Field::new(0, 2);
    pub const WAIT: u32 = bit(2);
    pub const BUSY: u32 = bit(4);
    pub const IE_PROG: u32 = bit(5);
    pub const IE_PROTECT: u32 = bit(6);

    pub const OP_READ: u32 = 0;
    pub const OP_PROGRAM: u32 = 1;
    pub const OP_SECTOR_ERASE: u32 = 2;
    pub const OP_CHIP_ERASE: u32 = 3;
}

pub mod ifr {
    use super::bit;
    /// Program/erase targeted a locked sector
    pub const PROTECT: u32 = bit(0);
    /// Program/erase of an address that was not erased
    pub const PROG: u32 = bit(1);
}
