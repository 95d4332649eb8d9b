// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Flash memory
//!
//! The flash controller guards every register write with a two word bypass sequence. Program and
//! erase pulse lengths are counted in HCLK cycles, so [`Program::writer`] has to be given the
//! frozen clocks before anything can be written.

use core::ptr;

use crate::pac::{flash, FLASH};
use crate::rcc::Clocks;
use crate::tick::Deadline;

/// Start of the main flash array
pub const FLASH_START: u32 = 0x0000_0000;
/// Size of the main flash array in bytes
pub const FLASH_SIZE: u32 = 32 * 1024;
/// Erase granularity in bytes
pub const SECTOR_SIZE: u32 = 512;
/// Number of sectors
pub const SECTORS: u32 = FLASH_SIZE / SECTOR_SIZE;

/// Longest program/erase operation (chip erase) plus margin
const OPERATION_TIMEOUT_MS: u32 = 50;

/// Highest HCLK that can be read from flash without wait states
const ZERO_WAIT_STATE_MAX_HZ: u32 = 24_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    AddressLargerThanFlash,
    AddressMisaligned,
    /// The sector is write protected through the sector lock registers
    Locked,
    /// The controller rejected the operation
    Protected,
    /// Programmed a location that was not erased
    NotErased,
    Timeout,
    VerifyError,
}

pub type Result<T> = core::result::Result<T, Error>;

/// Extension trait to constrain the FLASH peripheral
pub trait FlashExt {
    /// Constrains the FLASH peripheral to play nicely with the other abstractions
    fn constrain(self) -> Parts;
}

impl FlashExt for FLASH {
    fn constrain(self) -> Parts {
        Parts {
            ws: FlashWs { _0: () },
            prog: Program { _flash: self },
        }
    }
}

/// Constrained FLASH peripheral
pub struct Parts {
    /// Opaque wait state part of the control register
    pub ws: FlashWs,
    /// Program and erase access
    pub prog: Program,
}

/// Flash read latency
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashLatency {
    Zero,
    One,
}

impl FlashLatency {
    /// Latency needed to read flash at `hclk`
    pub const fn from_hertz(hclk: u32) -> FlashLatency {
        if hclk > ZERO_WAIT_STATE_MAX_HZ {
            FlashLatency::One
        } else {
            FlashLatency::Zero
        }
    }
}

/// Opaque wait state register
pub struct FlashWs {
    _0: (),
}

impl FlashWs {
    pub fn latency(&self) -> FlashLatency {
        if regs().cr.is_set(flash::cr::WAIT) {
            FlashLatency::One
        } else {
            FlashLatency::Zero
        }
    }

    pub fn set_latency(&mut self, latency: FlashLatency) {
        let cr = regs().cr.read();
        let cr = match latency {
            FlashLatency::Zero => cr & !flash::cr::WAIT,
            FlashLatency::One => cr | flash::cr::WAIT,
        };
        protected_write(&regs().cr, cr);
    }
}

/// Program/erase pulse lengths in HCLK cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashTiming {
    pub tnvs: u32,
    pub tpgs: u32,
    pub tprog: u32,
    pub tserase: u32,
    pub tmerase: u32,
    pub tprcv: u32,
    pub tsrcv: u32,
    pub tmrcv: u32,
}

impl FlashTiming {
    /// Converts the datasheet pulse lengths to cycles of `hclk`, rounding up
    pub fn for_hclk(hclk: u32) -> Self {
        let cycles = |us: u32| -> u32 {
            let c = (u64::from(us) * u64::from(hclk) + 999_999) / 1_000_000;
            cast::u32(c).unwrap_or(u32::MAX)
        };
        FlashTiming {
            tnvs: cycles(6),
            tpgs: cycles(11),
            tprog: cycles(22),
            tserase: cycles(4_500),
            tmerase: cycles(35_000),
            tprcv: cycles(6),
            tsrcv: cycles(60),
            tmrcv: cycles(250),
        }
    }
}

/// Program and erase access to the flash array
pub struct Program {
    _flash: FLASH,
}

impl Program {
    /// Loads the pulse lengths for the current HCLK and returns a writer
    ///
    /// The timing must be reloaded whenever HCLK changes, which the borrow of `clocks` enforces
    /// for the lifetime of the writer.
    pub fn writer<'a>(&'a mut self, clocks: &'a Clocks) -> FlashWriter<'a> {
        let t = FlashTiming::for_hclk(clocks.hclk().0);
        let f = regs();
        protected_write(&f.tnvs, t.tnvs);
        protected_write(&f.tpgs, t.tpgs);
        protected_write(&f.tprog, t.tprog);
        protected_write(&f.tserase, t.tserase);
        protected_write(&f.tmerase, t.tmerase);
        protected_write(&f.tprcv, t.tprcv);
        protected_write(&f.tsrcv, t.tsrcv);
        protected_write(&f.tmrcv, t.tmrcv);
        FlashWriter {
            _prog: self,
            _clocks: clocks,
            verify: true,
        }
    }
}

/// Writes and erases the flash array
pub struct FlashWriter<'a> {
    _prog: &'a mut Program,
    _clocks: &'a Clocks,
    verify: bool,
}

impl<'a> FlashWriter<'a> {
    /// Reads back and compares every programmed value
    pub fn change_verification(&mut self, verify: bool) {
        self.verify = verify;
    }

    /// Returns a slice of flash memory
    pub fn read(&self, offset: u32, length: usize) -> Result<&[u8]> {
        check_range(offset, length)?;
        let address = (FLASH_START + offset) as *const u8;
        // NOTE(unsafe) the range was checked against the flash array
        Ok(unsafe { core::slice::from_raw_parts(address, length) })
    }

    /// Erases the sector containing `offset`
    pub fn erase_sector(&mut self, offset: u32) -> Result<()> {
        check_range(offset, 1)?;
        let sector = offset / SECTOR_SIZE;
        check_unlocked(sector)?;

        set_operation(flash::cr::OP_SECTOR_ERASE);
        // Any write inside the sector starts the erase
        // NOTE(unsafe) the address is inside the flash array and the controller is in erase mode
        unsafe { ptr::write_volatile((FLASH_START + sector * SECTOR_SIZE) as *mut u32, 0) };
        let result = wait_done();
        set_operation(flash::cr::OP_READ);
        result?;

        if self.verify {
            let start = sector * SECTOR_SIZE;
            let erased = self
                .read(start, SECTOR_SIZE as usize)?
                .iter()
                .all(|&b| b == 0xFF);
            if !erased {
                return Err(Error::VerifyError);
            }
        }
        Ok(())
    }

    /// Erases `length` bytes starting at a sector boundary
    pub fn erase(&mut self, start_offset: u32, length: usize) -> Result<()> {
        if start_offset % SECTOR_SIZE != 0 || length as u32 % SECTOR_SIZE != 0 {
            return Err(Error::AddressMisaligned);
        }
        check_range(start_offset, length)?;
        let mut offset = start_offset;
        while offset < start_offset + length as u32 {
            self.erase_sector(offset)?;
            offset += SECTOR_SIZE;
        }
        Ok(())
    }

    pub fn write_word(&mut self, offset: u32, word: u32) -> Result<()> {
        if offset % 4 != 0 {
            return Err(Error::AddressMisaligned);
        }
        self.program(offset, 4, || unsafe {
            ptr::write_volatile((FLASH_START + offset) as *mut u32, word)
        })?;
        self.check(offset, &word.to_le_bytes())
    }

    pub fn write_half_word(&mut self, offset: u32, half: u16) -> Result<()> {
        if offset % 2 != 0 {
            return Err(Error::AddressMisaligned);
        }
        self.program(offset, 2, || unsafe {
            ptr::write_volatile((FLASH_START + offset) as *mut u16, half)
        })?;
        self.check(offset, &half.to_le_bytes())
    }

    pub fn write_byte(&mut self, offset: u32, byte: u8) -> Result<()> {
        self.program(offset, 1, || unsafe {
            ptr::write_volatile((FLASH_START + offset) as *mut u8, byte)
        })?;
        self.check(offset, &[byte])
    }

    /// Programs `data` at `offset`, using word writes where alignment allows
    pub fn write(&mut self, offset: u32, data: &[u8]) -> Result<()> {
        check_range(offset, data.len())?;
        let mut offset = offset;
        let mut rest = data;
        while !rest.is_empty() {
            if offset % 4 == 0 && rest.len() >= 4 {
                let word = u32::from_le_bytes([rest[0], rest[1], rest[2], rest[3]]);
                self.write_word(offset, word)?;
                offset += 4;
                rest = &rest[4..];
            } else {
                self.write_byte(offset, rest[0])?;
                offset += 1;
                rest = &rest[1..];
            }
        }
        Ok(())
    }

    /// Write protects the sectors whose bits are set in `mask` (bit n = sector n)
    pub fn lock_sectors(&mut self, mask: u64) {
        let f = regs();
        protected_write(&f.slock0, f.slock0.read() & !(mask as u32));
        protected_write(&f.slock1, f.slock1.read() & !((mask >> 32) as u32));
    }

    pub fn unlock_sectors(&mut self, mask: u64) {
        let f = regs();
        protected_write(&f.slock0, f.slock0.read() | mask as u32);
        protected_write(&f.slock1, f.slock1.read() | (mask >> 32) as u32);
    }

    fn program(&mut self, offset: u32, length: usize, write: impl FnOnce()) -> Result<()> {
        check_range(offset, length)?;
        check_unlocked(offset / SECTOR_SIZE)?;
        set_operation(flash::cr::OP_PROGRAM);
        write();
        let result = wait_done();
        set_operation(flash::cr::OP_READ);
        result
    }

    fn check(&self, offset: u32, expected: &[u8]) -> Result<()> {
        if self.verify && self.read(offset, expected.len())? != expected {
            return Err(Error::VerifyError);
        }
        Ok(())
    }
}

#[inline(always)]
fn regs() -> &'static flash::RegisterBlock {
    // NOTE(unsafe) accesses are serialised by the ownership of `FlashWs` and `Program`
    unsafe { &*FLASH::ptr() }
}

fn protected_write(reg: &crate::pac::Reg, value: u32) {
    let f = regs();
    f.bypass.write(flash::BYPASS_KEYS[0]);
    f.bypass.write(flash::BYPASS_KEYS[1]);
    reg.write(value);
}

fn set_operation(op: u32) {
    let cr = flash::cr::OP.set(regs().cr.read(), op);
    protected_write(&regs().cr, cr);
}

fn wait_done() -> Result<()> {
    let f = regs();
    let mut deadline = Deadline::after_ms(OPERATION_TIMEOUT_MS);
    while f.cr.is_set(flash::cr::BUSY) {
        if deadline.expired() {
            return Err(Error::Timeout);
        }
    }
    let flags = f.ifr.read();
    f.iclr.write(flags);
    operation_result(flags)
}

fn operation_result(flags: u32) -> Result<()> {
    if flags & flash::ifr::PROTECT != 0 {
        Err(Error::Protected)
    } else if flags & flash::ifr::PROG != 0 {
        Err(Error::NotErased)
    } else {
        Ok(())
    }
}

fn check_range(offset: u32, length: usize) -> Result<()> {
    let end = u64::from(offset) + length as u64;
    if end > u64::from(FLASH_SIZE) {
        Err(Error::AddressLargerThanFlash)
    } else {
        Ok(())
    }
}

fn check_unlocked(sector: u32) -> Result<()> {
    let f = regs();
    let unlocked = if sector < 32 {
        f.slock0.read() & (1 << sector)
    } else {
        f.slock1.read() & (1 << (sector - 32))
    };
    if unlocked == 0 {
        Err(Error::Locked)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latency_switches_above_24mhz() {
        assert_eq!(FlashLatency::from_hertz(24_000_000), FlashLatency::Zero);
        assert_eq!(FlashLatency::from_hertz(32_000_000), FlashLatency::One);
        assert!(FlashLatency::One > FlashLatency::Zero);
    }

    #[test]
    fn timing_rounds_up_to_whole_cycles() {
        let t = FlashTiming::for_hclk(24_000_000);
        assert_eq!(t.tnvs, 144);
        assert_eq!(t.tprog, 528);
        assert_eq!(t.tserase, 108_000);
        assert_eq!(t.tmerase, 840_000);

        let slow = FlashTiming::for_hclk(32_768);
        // 6 us at 32.768 kHz is a fraction of a cycle, still at least one
        assert_eq!(slow.tnvs, 1);
        assert_eq!(slow.tserase, 148);
    }

    #[test]
    fn range_checks() {
        assert_eq!(check_range(0, 32 * 1024), Ok(()));
        assert_eq!(
            check_range(FLASH_SIZE - 2, 4),
            Err(Error::AddressLargerThanFlash)
        );
        assert_eq!(SECTORS, 64);
    }

    #[test]
    fn controller_flags_map_to_errors() {
        assert_eq!(operation_result(0), Ok(()));
        assert_eq!(operation_result(flash::ifr::PROTECT), Err(Error::Protected));
        assert_eq!(operation_result(flash::ifr::PROG), Err(Error::NotErased));
    }
}
