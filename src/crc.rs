// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CRC calculation unit
//!
//! CRC-16/CCITT (polynomial 0x1021) seeded with 0xFFFF. Data is fed a byte, a half word or a
//! word at a time; wider writes are processed least significant byte first.

use crate::pac::{crc, CRC};
use crate::rcc::{Enable, AHB};

/// Seed written by [`Crc::reset`]
pub const SEED: u16 = 0xFFFF;

const POLY: u16 = 0x1021;

/// Software CRC over `data`, continuing from `crc`; matches the hardware unit
pub fn crc16(mut crc: u16, data: &[u8]) -> u16 {
    for &byte in data {
        crc ^= u16::from(byte) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ POLY
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// Extension trait to constrain the CRC peripheral
pub trait CrcExt {
    /// Constrains the CRC peripheral to play nicely with the other abstractions
    fn constrain(self, ahb: &mut AHB) -> Crc;
}

impl CrcExt for CRC {
    fn constrain(self, ahb: &mut AHB) -> Crc {
        CRC::enable(ahb);

        Crc { crc: self }
    }
}

/// Constrained CRC peripheral
pub struct Crc {
    crc: CRC,
}

impl Crc {
    /// Restarts the calculation from the seed
    pub fn reset(&mut self) {
        self.seed(SEED);
    }

    /// Continues from a previous result
    pub fn seed(&mut self, value: u16) {
        self.crc.result.write(u32::from(value));
    }

    pub fn read(&self) -> u16 {
        self.crc.result.read_field(crc::result::CRC) as u16
    }

    /// Whether the data fed since the last reset ended with its own correct CRC
    pub fn is_valid(&self) -> bool {
        self.crc.result.is_set(crc::result::FLAG)
    }

    pub fn write_u8(&mut self, value: u8) {
        // NOTE(unsafe) the data register accepts byte accesses at its base address
        unsafe { core::ptr::write_volatile(self.crc.data.as_ptr() as *mut u8, value) }
    }

    pub fn write_u16(&mut self, value: u16) {
        // NOTE(unsafe) the data register accepts half word accesses at its base address
        unsafe { core::ptr::write_volatile(self.crc.data.as_ptr() as *mut u16, value) }
    }

    pub fn write(&mut self, value: u32) {
        self.crc.data.write(value);
    }

    /// Feeds a buffer, words first and the tail byte by byte
    pub fn feed(&mut self, data: &[u8]) {
        let mut chunks = data.chunks_exact(4);
        for word in &mut chunks {
            self.write(u32::from_le_bytes([word[0], word[1], word[2], word[3]]));
        }
        for &byte in chunks.remainder() {
            self.write_u8(byte);
        }
    }

    /// CRC of `data` from a fresh seed
    pub fn checksum(&mut self, data: &[u8]) -> u16 {
        self.reset();
        self.feed(data);
        self.read()
    }

    pub fn release(self) -> CRC {
        self.crc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_value() {
        assert_eq!(crc16(SEED, b"123456789"), 0x29B1);
        assert_eq!(crc16(SEED, b""), SEED);
    }

    #[test]
    fn continues_across_calls() {
        let whole = crc16(SEED, b"123456789");
        let split = crc16(crc16(SEED, b"1234"), b"56789");
        assert_eq!(whole, split);
    }

    #[test]
    fn appended_crc_checks_to_zero() {
        let crc = crc16(SEED, b"abc");
        let mut framed = [b'a', b'b', b'c', 0, 0];
        framed[3..].copy_from_slice(&crc.to_be_bytes());
        assert_eq!(crc16(SEED, &framed), 0);
    }
}
