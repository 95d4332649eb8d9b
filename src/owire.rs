// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # One-Wire master
//!
//! The controller generates reset/presence, write and read slots from counters in module clock
//! cycles; [`Timing`] gives the slot lengths in microseconds and the counters are derived from
//! the clock at construction. The data pin (PC5, AF6, open drain with pull-up) is configured by
//! the caller.
//!
//! Device discovery is the classic ROM search: per ROM bit the master reads the bit and its
//! complement from all remaining devices and writes back the branch it takes.
//!
//! ```ignore
//! let mut ow = OneWire::new(dp.OWIRE, Timing::default(), &clocks, &mut rcc.apb)?;
//! let mut search = Search::new();
//! while let Some(rom) = search.next(&mut ow)? {
//!     // rom.family() == 0x28 for DS18B20
//! }
//! ```

use crate::pac::{owire, OWIRE};
use crate::rcc::{BusClock, Clocks, Enable, Reset, APB};
use crate::tick::Deadline;
use crate::time::Hertz;

/// Budget of one reset or transfer
const SLOT_TIMEOUT_MS: u32 = 5;

pub mod command {
    pub const SEARCH_ROM: u8 = 0xF0;
    pub const READ_ROM: u8 = 0x33;
    pub const MATCH_ROM: u8 = 0x55;
    pub const SKIP_ROM: u8 = 0xCC;
    pub const ALARM_SEARCH: u8 = 0xEC;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// No device answered the reset pulse
    NoPresence,
    /// The controller did not finish a slot in time
    Timeout,
    /// ROM code failed its CRC
    Crc,
    /// A slot length doesn't fit the counters at this clock
    Timing,
}

/// Dallas/Maxim CRC-8 (polynomial x^8 + x^5 + x^4 + 1)
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0u8;
    for &byte in data {
        let mut b = byte;
        for _ in 0..8 {
            let mix = (crc ^ b) & 0x01;
            crc >>= 1;
            if mix != 0 {
                crc ^= 0x8C;
            }
            b >>= 1;
        }
    }
    crc
}

/// 64-bit ROM code: family, serial number, CRC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rom(pub [u8; 8]);

impl Rom {
    pub fn family(&self) -> u8 {
        self.0[0]
    }

    pub fn is_valid(&self) -> bool {
        crc8(&self.0) == 0
    }

    fn bit(&self, n: usize) -> bool {
        self.0[n / 8] & (1 << (n % 8)) != 0
    }

    fn set_bit(&mut self, n: usize, value: bool) {
        if value {
            self.0[n / 8] |= 1 << (n % 8);
        } else {
            self.0[n / 8] &= !(1 << (n % 8));
        }
    }
}

/// Slot lengths in microseconds, standard speed by default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub reset_us: u32,
    pub presence_sample_us: u32,
    pub slot_us: u32,
    pub drive_us: u32,
    pub read_sample_us: u32,
    pub recovery_us: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Timing {
            reset_us: 480,
            presence_sample_us: 70,
            slot_us: 65,
            drive_us: 6,
            read_sample_us: 15,
            recovery_us: 10,
        }
    }
}

/// Module clock divider exponent and the six counters for `timing`
pub fn counters(pclk: Hertz, timing: &Timing) -> Result<(u32, [u16; 6]), Error> {
    let longest = timing.reset_us.max(timing.slot_us);
    let div = (0..4)
        .find(|&d| u64::from(pclk.0 >> d) * u64::from(longest) / 1_000_000 <= 0xFFFF)
        .ok_or(Error::Timing)?;
    let clk = u64::from(pclk.0 >> div);
    let count = |us: u32| -> Result<u16, Error> {
        let c = clk * u64::from(us) / 1_000_000;
        if c == 0 {
            Err(Error::Timing)
        } else {
            cast::u16(c).map_err(|_| Error::Timing)
        }
    };
    Ok((
        div,
        [
            count(timing.reset_us)?,
            count(timing.presence_sample_us)?,
            count(timing.slot_us)?,
            count(timing.drive_us)?,
            count(timing.read_sample_us)?,
            count(timing.recovery_us)?,
        ],
    ))
}

/// Bit level bus access, the ROM search runs on top of it
pub trait Bus {
    /// Reset pulse, `Err(NoPresence)` when no device answers
    fn reset(&mut self) -> Result<(), Error>;
    fn write_bit(&mut self, bit: bool) -> Result<(), Error>;
    fn read_bit(&mut self) -> Result<bool, Error>;

    fn write_byte(&mut self, byte: u8) -> Result<(), Error> {
        for n in 0..8 {
            self.write_bit(byte & (1 << n) != 0)?;
        }
        Ok(())
    }

    fn read_byte(&mut self) -> Result<u8, Error> {
        let mut byte = 0;
        for n in 0..8 {
            if self.read_bit()? {
                byte |= 1 << n;
            }
        }
        Ok(byte)
    }

    /// Reads a ROM bit and its complement, then writes the branch taken. `prefer` is used
    /// when both branches exist. Returns `None` when no device is left on the bus.
    fn triplet(&mut self, prefer: bool) -> Result<Option<(bool, bool)>, Error> {
        let bit = self.read_bit()?;
        let complement = self.read_bit()?;
        let (dir, discrepancy) = match (bit, complement) {
            (true, true) => return Ok(None),
            (false, false) => (prefer, true),
            (b, _) => (b, false),
        };
        self.write_bit(dir)?;
        Ok(Some((dir, discrepancy)))
    }
}

/// ROM search state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Search {
    rom: Rom,
    last_discrepancy: Option<usize>,
    done: bool,
    command: u8,
}

impl Search {
    /// Enumerates every device
    pub fn new() -> Self {
        Search {
            rom: Rom::default(),
            last_discrepancy: None,
            done: false,
            command: command::SEARCH_ROM,
        }
    }

    /// Enumerates the devices with an alarm condition
    pub fn alarms() -> Self {
        Search {
            command: command::ALARM_SEARCH,
            ..Search::new()
        }
    }

    /// Next ROM code, `None` once every device has been found
    pub fn next(&mut self, bus: &mut impl Bus) -> Result<Option<Rom>, Error> {
        if self.done {
            return Ok(None);
        }
        match bus.reset() {
            Ok(()) => {}
            Err(Error::NoPresence) => {
                self.done = true;
                return Ok(None);
            }
            Err(e) => return Err(e),
        }
        bus.write_byte(self.command)?;

        let mut last_zero = None;
        for n in 0..64 {
            let prefer = match self.last_discrepancy {
                Some(last) if n < last => self.rom.bit(n),
                Some(last) => n == last,
                None => false,
            };
            let (dir, discrepancy) = match bus.triplet(prefer)? {
                Some(t) => t,
                None => {
                    self.done = true;
                    return Ok(None);
                }
            };
            if discrepancy && !dir {
                last_zero = Some(n);
            }
            self.rom.set_bit(n, dir);
        }

        self.last_discrepancy = last_zero;
        self.done = last_zero.is_none();
        if self.rom.is_valid() {
            Ok(Some(self.rom))
        } else {
            Err(Error::Crc)
        }
    }
}

impl Default for Search {
    fn default() -> Self {
        Search::new()
    }
}

/// One-Wire controller
pub struct OneWire {
    owire: OWIRE,
}

impl OneWire {
    pub fn new(
        owire: OWIRE,
        timing: Timing,
        clocks: &Clocks,
        apb: &mut APB,
    ) -> Result<Self, Error> {
        let (div, c) = counters(OWIRE::clock(clocks), &timing)?;

        OWIRE::enable(apb);
        OWIRE::reset(apb);

        owire.rescnt.write(owire::COUNT.val(u32::from(c[0])));
        owire.prescnt.write(owire::COUNT.val(u32::from(c[1])));
        owire.bitratecnt.write(owire::COUNT.val(u32::from(c[2])));
        owire.drvcnt.write(owire::COUNT.val(u32::from(c[3])));
        owire.rdsmpcnt.write(owire::COUNT.val(u32::from(c[4])));
        owire.reccnt.write(owire::COUNT.val(u32::from(c[5])));
        owire
            .nfcr
            .write(owire::nfcr::NFEN | owire::nfcr::NFDIV.val(div));
        owire.cr.write(owire::cr::CLKDIV.val(div) | owire::cr::EN);
        Ok(OneWire { owire })
    }

    fn run(&mut self, cmd: u32, done: u32) -> Result<u32, Error> {
        self.owire.intclr.write(0xF);
        self.owire.cmd.write(cmd);
        let mut deadline = Deadline::after_ms(SLOT_TIMEOUT_MS);
        loop {
            let sr = self.owire.sr.read();
            if sr & done != 0 {
                return Ok(sr);
            }
            if deadline.expired() {
                return Err(Error::Timeout);
            }
        }
    }

    fn set_bit_mode(&mut self, single: bool) {
        if single {
            self.owire.cr.set_bits(owire::cr::SIZE);
        } else {
            self.owire.cr.clear_bits(owire::cr::SIZE);
        }
    }

    /// Addresses one device
    pub fn select(&mut self, rom: &Rom) -> Result<(), Error> {
        Bus::reset(self)?;
        Bus::write_byte(self, command::MATCH_ROM)?;
        for &b in &rom.0 {
            Bus::write_byte(self, b)?;
        }
        Ok(())
    }

    /// Addresses every device
    pub fn skip(&mut self) -> Result<(), Error> {
        Bus::reset(self)?;
        Bus::write_byte(self, command::SKIP_ROM)
    }

    /// ROM code of the only device on the bus
    pub fn read_rom(&mut self) -> Result<Rom, Error> {
        Bus::reset(self)?;
        Bus::write_byte(self, command::READ_ROM)?;
        let mut rom = Rom::default();
        for b in rom.0.iter_mut() {
            *b = Bus::read_byte(self)?;
        }
        if rom.is_valid() {
            Ok(rom)
        } else {
            Err(Error::Crc)
        }
    }

    pub fn write(&mut self, data: &[u8]) -> Result<(), Error> {
        data.iter().try_for_each(|&b| Bus::write_byte(self, b))
    }

    pub fn read(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        for b in buf.iter_mut() {
            *b = Bus::read_byte(self)?;
        }
        Ok(())
    }

    pub fn release(self) -> OWIRE {
        self.owire.cr.write(0);
        self.owire
    }
}

impl Bus for OneWire {
    fn reset(&mut self) -> Result<(), Error> {
        let sr = self.run(owire::cmd::INIT, owire::sr::INITDONE)?;
        if sr & owire::sr::ACKERR != 0 {
            Err(Error::NoPresence)
        } else {
            Ok(())
        }
    }

    fn write_bit(&mut self, bit: bool) -> Result<(), Error> {
        self.set_bit_mode(true);
        self.owire.data.write(u32::from(bit));
        self.run(owire::cmd::TX, owire::sr::TXDONE).map(|_| ())
    }

    fn read_bit(&mut self) -> Result<bool, Error> {
        self.set_bit_mode(true);
        self.run(owire::cmd::RX, owire::sr::RXDONE)?;
        Ok(self.owire.data.read() & 1 != 0)
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), Error> {
        self.set_bit_mode(false);
        self.owire.data.write(u32::from(byte));
        self.run(owire::cmd::TX, owire::sr::TXDONE).map(|_| ())
    }

    fn read_byte(&mut self) -> Result<u8, Error> {
        self.set_bit_mode(false);
        self.run(owire::cmd::RX, owire::sr::RXDONE)?;
        Ok(self.owire.data.read() as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Devices answering a ROM search, wired-AND
    struct SimBus {
        roms: [Rom; 3],
        count: usize,
        active: [bool; 3],
        bit: usize,
        reads: u8,
    }

    impl SimBus {
        fn new(roms: &[Rom]) -> Self {
            let mut r = [Rom::default(); 3];
            r[..roms.len()].copy_from_slice(roms);
            SimBus {
                roms: r,
                count: roms.len(),
                active: [false; 3],
                bit: 0,
                reads: 0,
            }
        }

        fn participants(&self) -> impl Iterator<Item = &Rom> + '_ {
            self.roms[..self.count]
                .iter()
                .zip(self.active.iter())
                .filter(|(_, a)| **a)
                .map(|(r, _)| r)
        }
    }

    impl Bus for SimBus {
        fn reset(&mut self) -> Result<(), Error> {
            if self.count == 0 {
                return Err(Error::NoPresence);
            }
            self.active = [true; 3];
            self.bit = 0;
            self.reads = 0;
            Ok(())
        }

        fn write_bit(&mut self, bit: bool) -> Result<(), Error> {
            let n = self.bit;
            for i in 0..self.count {
                if self.roms[i].bit(n) != bit {
                    self.active[i] = false;
                }
            }
            self.bit += 1;
            self.reads = 0;
            Ok(())
        }

        fn read_bit(&mut self) -> Result<bool, Error> {
            let n = self.bit;
            let complement = self.reads == 1;
            self.reads += 1;
            Ok(self.participants().all(|r| r.bit(n) != complement))
        }

        fn write_byte(&mut self, _byte: u8) -> Result<(), Error> {
            Ok(())
        }
    }

    fn rom(family: u8, serial: u8) -> Rom {
        let mut bytes = [family, serial, 0x12, 0x34, 0, 0, 0, 0];
        bytes[7] = crc8(&bytes[..7]);
        Rom(bytes)
    }

    #[test]
    fn maxim_crc8() {
        assert_eq!(crc8(&[0x02, 0x1C, 0xB8, 0x01, 0x00, 0x00, 0x00]), 0xA2);
        assert!(Rom([0x02, 0x1C, 0xB8, 0x01, 0x00, 0x00, 0x00, 0xA2]).is_valid());
    }

    #[test]
    fn search_finds_every_device() {
        let roms = [rom(0x28, 0x01), rom(0x28, 0x80), rom(0x10, 0x01)];
        let mut bus = SimBus::new(&roms);
        let mut search = Search::new();
        let mut found = [Rom::default(); 3];
        let mut n = 0;
        while let Some(r) = search.next(&mut bus).unwrap() {
            found[n] = r;
            n += 1;
        }
        assert_eq!(n, 3);
        for r in &roms {
            assert!(found.contains(r));
        }
        assert_eq!(search.next(&mut bus), Ok(None));
    }

    #[test]
    fn search_on_empty_bus() {
        let mut bus = SimBus::new(&[]);
        assert_eq!(Search::new().next(&mut bus), Ok(None));
    }

    #[test]
    fn counters_from_clock() {
        let (div, c) = counters(Hertz(24_000_000), &Timing::default()).unwrap();
        assert_eq!(div, 0);
        assert_eq!(c[0], 11_520);
        assert_eq!(c[3], 144);

        // the reset pulse overflows 16 bits at 200 MHz, the module clock is halved
        let (div, c) = counters(Hertz(200_000_000), &Timing::default()).unwrap();
        assert_eq!(div, 1);
        assert_eq!(c[0], 48_000);

        assert_eq!(counters(Hertz(100_000), &Timing::default()), Err(Error::Timing));
    }
}
