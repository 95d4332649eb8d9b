// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inter-Integrated Circuit (I2C) bus
//!
//! The controller reports every bus event as a status code and then stalls with the SI flag set
//! until software writes the next control bits. The master driver walks that protocol with a
//! deadline per step; the slave driver is interrupt driven.
//!
//! ```ignore
//! let scl = gpioc.pc4.into_alternate_open_drain(&mut gpioc.cfg);
//! let sda = gpioc.pc3.into_alternate_open_drain(&mut gpioc.cfg);
//! let mut i2c = I2c::new(dp.I2C, (scl, sda), 100.khz(), &clocks, &mut rcc.apb)?;
//! i2c.write_read(0x50, &[0x00], &mut buf)?;
//! ```

use embedded_hal::blocking::i2c::{Read, Write, WriteRead};

use crate::gpio::{self, Alternate, OpenDrain};
use crate::pac::{i2c, I2C};
use crate::rcc::{BusClock, Clocks, Enable, Reset, APB};
use crate::tick::Deadline;
use crate::time::Hertz;

/// Budget for one bus step (START, address or data byte)
pub const STEP_TIMEOUT_MS: u32 = 25;

/// I2C error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// Misplaced START or STOP detected
    Bus,
    /// Lost the bus to another master
    ArbitrationLost,
    /// No acknowledge for the address byte
    AddressNack,
    /// No acknowledge for a data byte
    DataNack,
    /// A bus step did not complete in time
    Timeout,
    /// The bus speed can't be derived from PCLK
    Speed,
    /// Status code not expected at this step
    UnexpectedStatus(u8),
}

/// Bus status codes
pub mod status {
    pub const BUS_ERROR: u8 = 0x00;
    pub const START: u8 = 0x08;
    pub const REPEATED_START: u8 = 0x10;
    pub const SLA_W_ACK: u8 = 0x18;
    pub const SLA_W_NACK: u8 = 0x20;
    pub const TX_DATA_ACK: u8 = 0x28;
    pub const TX_DATA_NACK: u8 = 0x30;
    pub const ARBITRATION_LOST: u8 = 0x38;
    pub const SLA_R_ACK: u8 = 0x40;
    pub const SLA_R_NACK: u8 = 0x48;
    pub const RX_DATA_ACK: u8 = 0x50;
    pub const RX_DATA_NACK: u8 = 0x58;

    pub const SLAVE_SLA_W: u8 = 0x60;
    pub const SLAVE_ARB_LOST_SLA_W: u8 = 0x68;
    pub const SLAVE_GENERAL_CALL: u8 = 0x70;
    pub const SLAVE_ARB_LOST_GENERAL_CALL: u8 = 0x78;
    pub const SLAVE_RX_DATA_ACK: u8 = 0x80;
    pub const SLAVE_RX_DATA_NACK: u8 = 0x88;
    pub const SLAVE_GC_DATA_ACK: u8 = 0x90;
    pub const SLAVE_GC_DATA_NACK: u8 = 0x98;
    pub const SLAVE_STOP: u8 = 0xA0;
    pub const SLAVE_SLA_R: u8 = 0xA8;
    pub const SLAVE_ARB_LOST_SLA_R: u8 = 0xB0;
    pub const SLAVE_TX_DATA_ACK: u8 = 0xB8;
    pub const SLAVE_TX_DATA_NACK: u8 = 0xC0;
    pub const SLAVE_TX_LAST_ACK: u8 = 0xC8;
    pub const IDLE: u8 = 0xF8;
}

/// Maps a status code to the result of a master step that expects one of `expected`
pub fn check_status(status: u8, expected: &[u8]) -> Result<(), Error> {
    if expected.contains(&status) {
        return Ok(());
    }
    Err(match status {
        status::BUS_ERROR => Error::Bus,
        status::ARBITRATION_LOST
        | status::SLAVE_ARB_LOST_SLA_W
        | status::SLAVE_ARB_LOST_GENERAL_CALL
        | status::SLAVE_ARB_LOST_SLA_R => Error::ArbitrationLost,
        status::SLA_W_NACK | status::SLA_R_NACK => Error::AddressNack,
        status::TX_DATA_NACK => Error::DataNack,
        other => Error::UnexpectedStatus(other),
    })
}

/// Baud timer count for a bus speed: `TM = PCLK / (8 * SCL) - 1`, rounded towards a slower bus
pub fn baud_count(pclk: u32, scl: u32) -> Result<u8, Error> {
    if scl == 0 {
        return Err(Error::Speed);
    }
    let den = 8 * scl;
    let div = (pclk + den - 1) / den;
    if div == 0 {
        return Err(Error::Speed);
    }
    cast::u8(div - 1).map_err(|_| Error::Speed)
}

/// SCL pin of the I2C
pub trait SclPin {}
/// SDA pin of the I2C
pub trait SdaPin {}

/// SCL and SDA pin pair
pub trait Pins {}

impl<SCL: SclPin, SDA: SdaPin> Pins for (SCL, SDA) {}

impl SclPin for gpio::PC4<Alternate<4, OpenDrain>> {}
impl SclPin for gpio::PD6<Alternate<4, OpenDrain>> {}
impl SdaPin for gpio::PC3<Alternate<4, OpenDrain>> {}
impl SdaPin for gpio::PD5<Alternate<4, OpenDrain>> {}

/// I2C master
pub struct I2c<PINS> {
    i2c: I2C,
    pins: PINS,
}

fn configure(i2c: &I2C, speed: Hertz, clocks: &Clocks, apb: &mut APB) -> Result<(), Error> {
    let tm = baud_count(I2C::clock(clocks).0, speed.0)?;

    I2C::enable(apb);
    I2C::reset(apb);

    i2c.tm.write(u32::from(tm));
    i2c.tmrun.write(i2c::tmrun::TME);
    let mut cr = i2c::cr::ENS;
    if speed.0 > 400_000 {
        cr |= i2c::cr::H1M;
    }
    i2c.cr.write(cr);
    Ok(())
}

impl<PINS: Pins> I2c<PINS> {
    /// Configures the I2C peripheral as bus master
    pub fn new(
        i2c: I2C,
        pins: PINS,
        speed: impl Into<Hertz>,
        clocks: &Clocks,
        apb: &mut APB,
    ) -> Result<Self, Error> {
        configure(&i2c, speed.into(), clocks, apb)?;
        Ok(I2c { i2c, pins })
    }
}

impl<PINS> I2c<PINS> {
    /// Writes the control bits; SI is written as zero, which starts the next bus step
    fn control(&self, sta: bool, sto: bool, aa: bool) {
        let mut cr = self.i2c.cr.read() & i2c::cr::H1M;
        cr |= i2c::cr::ENS;
        if sta {
            cr |= i2c::cr::STA;
        }
        if sto {
            cr |= i2c::cr::STO;
        }
        if aa {
            cr |= i2c::cr::AA;
        }
        self.i2c.cr.write(cr);
    }

    /// Waits for the end of the current step and returns the status code
    fn wait(&self) -> Result<u8, Error> {
        let mut deadline = Deadline::after_ms(STEP_TIMEOUT_MS);
        while !self.i2c.cr.is_set(i2c::cr::SI) {
            if deadline.expired() {
                return Err(Error::Timeout);
            }
        }
        Ok(self.i2c.stat.read_field(i2c::stat::STAT) as u8)
    }

    fn step(&self, sta: bool, aa: bool, expected: &[u8]) -> Result<(), Error> {
        self.control(sta, false, aa);
        check_status(self.wait()?, expected)
    }

    fn start(&self) -> Result<(), Error> {
        self.step(true, false, &[status::START, status::REPEATED_START])
    }

    fn stop(&self) -> Result<(), Error> {
        self.control(false, true, false);
        let mut deadline = Deadline::after_ms(STEP_TIMEOUT_MS);
        while self.i2c.cr.is_set(i2c::cr::STO) {
            if deadline.expired() {
                return Err(Error::Timeout);
            }
        }
        Ok(())
    }

    fn address(&self, addr: u8, read: bool) -> Result<(), Error> {
        self.i2c.data.write(u32::from(addr) << 1 | u32::from(read));
        if read {
            self.step(false, false, &[status::SLA_R_ACK])
        } else {
            self.step(false, false, &[status::SLA_W_ACK])
        }
    }

    fn write_bytes(&self, bytes: &[u8]) -> Result<(), Error> {
        for &byte in bytes {
            self.i2c.data.write(u32::from(byte));
            self.step(false, false, &[status::TX_DATA_ACK])?;
        }
        Ok(())
    }

    fn read_bytes(&self, buffer: &mut [u8]) -> Result<(), Error> {
        let last = buffer.len().saturating_sub(1);
        for (i, byte) in buffer.iter_mut().enumerate() {
            if i == last {
                self.step(false, false, &[status::RX_DATA_NACK])?;
            } else {
                self.step(false, true, &[status::RX_DATA_ACK])?;
            }
            *byte = self.i2c.data.read() as u8;
        }
        Ok(())
    }

    /// Ends the transfer after `result`, releasing the bus unless it was lost
    fn finish(&self, result: Result<(), Error>) -> Result<(), Error> {
        match result {
            Err(Error::ArbitrationLost) => {
                self.control(false, false, false);
                Err(Error::ArbitrationLost)
            }
            Err(e) => {
                self.stop().ok();
                Err(e)
            }
            Ok(()) => self.stop(),
        }
    }

    pub fn release(self) -> (I2C, PINS) {
        (self.i2c, self.pins)
    }
}

impl<PINS> Write for I2c<PINS> {
    type Error = Error;

    fn write(&mut self, addr: u8, bytes: &[u8]) -> Result<(), Error> {
        let result = self
            .start()
            .and_then(|_| self.address(addr, false))
            .and_then(|_| self.write_bytes(bytes));
        self.finish(result)
    }
}

impl<PINS> Read for I2c<PINS> {
    type Error = Error;

    fn read(&mut self, addr: u8, buffer: &mut [u8]) -> Result<(), Error> {
        let result = self
            .start()
            .and_then(|_| self.address(addr, true))
            .and_then(|_| self.read_bytes(buffer));
        self.finish(result)
    }
}

impl<PINS> WriteRead for I2c<PINS> {
    type Error = Error;

    fn write_read(&mut self, addr: u8, bytes: &[u8], buffer: &mut [u8]) -> Result<(), Error> {
        let result = self
            .start()
            .and_then(|_| self.address(addr, false))
            .and_then(|_| self.write_bytes(bytes))
            .and_then(|_| self.start())
            .and_then(|_| self.address(addr, true))
            .and_then(|_| self.read_bytes(buffer));
        self.finish(result)
    }
}

/// Transfer direction seen from the master
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// The master writes to this slave
    Write,
    /// The master reads from this slave
    Read,
}

/// What a slave status code asks the driver to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SlaveEvent {
    Addressed { direction: Direction, general_call: bool },
    Received { general_call: bool },
    /// The master wants a byte (first byte or after an ACK)
    Requested,
    /// The master NACKed the last byte or the transfer ended
    Done,
    Stop,
    BusError,
    Ignore,
}

pub(crate) fn slave_event(code: u8) -> SlaveEvent {
    use status::*;
    match code {
        SLAVE_SLA_W | SLAVE_ARB_LOST_SLA_W => SlaveEvent::Addressed {
            direction: Direction::Write,
            general_call: false,
        },
        SLAVE_GENERAL_CALL | SLAVE_ARB_LOST_GENERAL_CALL => SlaveEvent::Addressed {
            direction: Direction::Write,
            general_call: true,
        },
        SLAVE_RX_DATA_ACK | SLAVE_RX_DATA_NACK => SlaveEvent::Received {
            general_call: false,
        },
        SLAVE_GC_DATA_ACK | SLAVE_GC_DATA_NACK => SlaveEvent::Received { general_call: true },
        SLAVE_SLA_R | SLAVE_ARB_LOST_SLA_R | SLAVE_TX_DATA_ACK => SlaveEvent::Requested,
        SLAVE_TX_DATA_NACK | SLAVE_TX_LAST_ACK => SlaveEvent::Done,
        SLAVE_STOP => SlaveEvent::Stop,
        BUS_ERROR => SlaveEvent::BusError,
        _ => SlaveEvent::Ignore,
    }
}

/// Hooks of [`I2cSlave`], called from [`I2cSlave::on_interrupt`]
pub trait SlaveCallbacks {
    /// Own address (or the general call address) received
    fn address_matched(&mut self, _direction: Direction, _general_call: bool) {}

    /// A byte arrived; return `false` to NACK the next one
    fn byte_received(&mut self, _byte: u8) -> bool {
        true
    }

    /// The master reads a byte
    fn byte_requested(&mut self) -> u8 {
        0xFF
    }

    /// STOP or repeated START ended the transfer
    fn stop(&mut self) {}

    fn error(&mut self, _error: Error) {}
}

/// Interrupt driven I2C slave
pub struct I2cSlave<PINS> {
    i2c: I2C,
    pins: PINS,
    addressed: bool,
}

impl<PINS: Pins> I2cSlave<PINS> {
    /// Configures the I2C peripheral as slave on `address` (7 bit) and enables its interrupt flag
    pub fn new(
        i2c: I2C,
        pins: PINS,
        address: u8,
        general_call: bool,
        clocks: &Clocks,
        apb: &mut APB,
    ) -> Result<Self, Error> {
        // the baud timer only matters if the slave is later used as master
        configure(&i2c, Hertz(100_000), clocks, apb)?;
        let mut addr = i2c::addr::ADDR.val(u32::from(address));
        if general_call {
            addr |= i2c::addr::GC;
        }
        i2c.addr.write(addr);
        i2c.cr.write(i2c::cr::ENS | i2c::cr::AA);
        Ok(I2cSlave {
            i2c,
            pins,
            addressed: false,
        })
    }
}

impl<PINS> I2cSlave<PINS> {
    /// Returns `true` between an address match and the end of the transfer
    pub fn is_addressed(&self) -> bool {
        self.addressed
    }

    /// Services the I2C interrupt
    pub fn on_interrupt(&mut self, callbacks: &mut impl SlaveCallbacks) {
        if !self.i2c.cr.is_set(i2c::cr::SI) {
            return;
        }
        let code = self.i2c.stat.read_field(i2c::stat::STAT) as u8;
        let mut aa = true;
        let mut sto = false;

        match slave_event(code) {
            SlaveEvent::Addressed {
                direction,
                general_call,
            } => {
                self.addressed = true;
                callbacks.address_matched(direction, general_call);
            }
            SlaveEvent::Received { .. } => {
                let byte = self.i2c.data.read() as u8;
                aa = callbacks.byte_received(byte);
            }
            SlaveEvent::Requested => {
                if code == status::SLAVE_SLA_R || code == status::SLAVE_ARB_LOST_SLA_R {
                    self.addressed = true;
                    callbacks.address_matched(Direction::Read, false);
                }
                let byte = callbacks.byte_requested();
                self.i2c.data.write(u32::from(byte));
            }
            SlaveEvent::Done => self.addressed = false,
            SlaveEvent::Stop => {
                self.addressed = false;
                callbacks.stop();
            }
            SlaveEvent::BusError => {
                self.addressed = false;
                // STO releases the bus lines after a bus error
                sto = true;
                callbacks.error(Error::Bus);
            }
            SlaveEvent::Ignore => {}
        }

        let mut cr = i2c::cr::ENS;
        if aa {
            cr |= i2c::cr::AA;
        }
        if sto {
            cr |= i2c::cr::STO;
        }
        self.i2c.cr.write(cr);
    }

    /// Stops answering to the own address
    pub fn disable(&mut self) {
        self.i2c.cr.write(i2c::cr::ENS);
        self.addressed = false;
    }

    pub fn release(self) -> (I2C, PINS) {
        (self.i2c, self.pins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baud_timer() {
        assert_eq!(baud_count(24_000_000, 100_000), Ok(29));
        // 7.5 rounds up, the bus runs slightly below 400 kHz
        assert_eq!(baud_count(24_000_000, 400_000), Ok(7));
        assert_eq!(baud_count(4_000_000, 100_000), Ok(4));
        assert_eq!(baud_count(24_000_000, 1_000), Err(Error::Speed));
        assert_eq!(baud_count(24_000_000, 0), Err(Error::Speed));
    }

    #[test]
    fn master_status_mapping() {
        assert_eq!(check_status(0x18, &[status::SLA_W_ACK]), Ok(()));
        assert_eq!(check_status(0x20, &[status::SLA_W_ACK]), Err(Error::AddressNack));
        assert_eq!(check_status(0x48, &[status::SLA_R_ACK]), Err(Error::AddressNack));
        assert_eq!(check_status(0x30, &[status::TX_DATA_ACK]), Err(Error::DataNack));
        assert_eq!(check_status(0x38, &[status::TX_DATA_ACK]), Err(Error::ArbitrationLost));
        assert_eq!(check_status(0x00, &[status::START]), Err(Error::Bus));
        assert_eq!(
            check_status(0xF8, &[status::START]),
            Err(Error::UnexpectedStatus(0xF8))
        );
    }

    #[test]
    fn slave_status_decoding() {
        assert_eq!(
            slave_event(0x60),
            SlaveEvent::Addressed {
                direction: Direction::Write,
                general_call: false
            }
        );
        assert_eq!(
            slave_event(0x70),
            SlaveEvent::Addressed {
                direction: Direction::Write,
                general_call: true
            }
        );
        assert_eq!(slave_event(0x80), SlaveEvent::Received { general_call: false });
        assert_eq!(slave_event(0xA8), SlaveEvent::Requested);
        assert_eq!(slave_event(0xB8), SlaveEvent::Requested);
        assert_eq!(slave_event(0xC0), SlaveEvent::Done);
        assert_eq!(slave_event(0xA0), SlaveEvent::Stop);
        assert_eq!(slave_event(0x00), SlaveEvent::BusError);
        assert_eq!(slave_event(0xF8), SlaveEvent::Ignore);
    }
}
