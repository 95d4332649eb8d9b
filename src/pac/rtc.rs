// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Real time clock registers

use super::{bit, Field, Reg};

#[repr(C)]
pub struct RegisterBlock {
    /// 0x00 - Control
    pub cr: Reg,
    /// 0x04 - Seconds, BCD
    pub sec: Reg,
    /// 0x08 - Minutes, BCD
    pub min: Reg,
    /// 0x0C - Hours, BCD; PM flag in 12 hour mode
    pub hour: Reg,
    /// 0x10 - Weekday, 0 = Sunday
    pub week: Reg,
    /// 0x14 - Day of month, BCD
    pub day: Reg,
    /// 0x18 - Month, BCD
    pub mon: Reg,
    /// 0x1C - Year in century, BCD
    pub year: Reg,
    /// 0x20 - Alarm seconds, BCD
    pub almsec: Reg,
    /// 0x24 - Alarm minutes, BCD
    pub almmin: Reg,
    /// 0x28 - Alarm hours, BCD
    pub almhour: Reg,
    /// 0x2C - Alarm weekday mask
    pub almweek: Reg,
    /// 0x30 - Clock compensation
    pub compen: Reg,
    /// 0x34 - Interrupt status
    pub isr: Reg,
    /// 0x38 - Interrupt clear
    pub intclr: Reg,
    /// 0x3C - Write protection
    pub wpr: Reg,
}

/// Write protection unlock sequence.
pub const WPR_KEYS: [u32; 2] = [0xCA, 0x53];
/// Any value outside the unlock sequence locks the registers again.
pub const WPR_LOCK: u32 = 0xFF;

pub mod cr {
    use super::{bit, Field};
    pub const START: u32 = bit(0);
    pub const HOUR24: u32 = bit(1);
    pub const PRDS: Field = Field::new(2, 3);
    pub const HZ1OE: u32 = bit(5);
    pub const ALMEN: u32 = bit(6);
    pub const ALMIE: u32 = bit(7);
    pub const PRDIE: u32 = bit(8);
    /// Freeze the counters for a consistent read
    pub const WAIT: u32 = bit(9);
    /// Counters frozen (read-only)
    pub const WAITF: u32 = bit(10);
    pub const CKSEL: Field = Field::new(11, 2);
}

pub mod hour {
    use super::bit;
    /// PM flag in 12 hour mode
    pub const PM: u32 = bit(5);
}

pub mod compen {
    use super::{bit, Field};
    pub const CR: Field = Field::new(0, 9);
    pub const EN: u32 = bit(15);
}

pub mod isr {
    use super::bit;
    pub const ALMF: u32 = bit(0);
    pub const PRDF: u32 = bit(1);
}
