// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Serial Peripheral Interface
//!
//! Full-duplex byte exchange, as master or slave. In master mode the NSS line is driven by
//! software through [`Spi::select`] and [`Spi::deselect`].
//!
//! ```ignore
//! let sck = gpioc.pc6.into_alternate(&mut gpioc.cfg);
//! let miso = gpiod.pd1.into_alternate(&mut gpiod.cfg);
//! let mosi = gpioc.pc7.into_alternate(&mut gpioc.cfg);
//! let mut spi = Spi::new(dp.SPI, (sck, miso, mosi), MODE_0, 1.mhz(), &clocks, &mut rcc.apb)?;
//! spi.select();
//! spi.transfer(&mut buf)?;
//! spi.deselect();
//! ```

pub use embedded_hal::spi::{Mode, Phase, Polarity, MODE_0, MODE_1, MODE_2, MODE_3};

use embedded_hal::spi::FullDuplex;

use crate::gpio::{self, Alternate};
use crate::pac::{spi, SPI};
use crate::rcc::{BusClock, Clocks, Enable, Reset, APB};
use crate::time::Hertz;

/// SPI error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// Another master pulled NSS low while in master mode
    ModeFault,
    /// Data register written during a transfer
    WriteCollision,
    /// NSS released in the middle of a byte (slave mode)
    SlaveSelect,
    /// The bus frequency is out of the divider range
    Frequency,
}

/// Divider field for the highest bus frequency at or below `freq`: PCLK / 2^(n + 1)
pub fn divider_for(pclk: u32, freq: u32) -> Result<u32, Error> {
    (0..7)
        .find(|&n| pclk >> (n + 1) <= freq)
        .ok_or(Error::Frequency)
}

/// Status flags to error, first match wins
fn check_errors(sr: u32) -> Result<(), Error> {
    if sr & spi::sr::MDF != 0 {
        Err(Error::ModeFault)
    } else if sr & spi::sr::SSERR != 0 {
        Err(Error::SlaveSelect)
    } else if sr & spi::sr::WCOL != 0 {
        Err(Error::WriteCollision)
    } else {
        Ok(())
    }
}

fn mode_bits(mode: Mode) -> u32 {
    let mut bits = 0;
    if mode.polarity == Polarity::IdleHigh {
        bits |= spi::cr::CPOL;
    }
    if mode.phase == Phase::CaptureOnSecondTransition {
        bits |= spi::cr::CPHA;
    }
    bits
}

pub trait SckPin {}
pub trait MisoPin {}
pub trait MosiPin {}

/// SCK, MISO and MOSI
pub trait Pins {}

impl<SCK: SckPin, MISO: MisoPin, MOSI: MosiPin> Pins for (SCK, MISO, MOSI) {}

impl<MODE> SckPin for gpio::PC6<Alternate<2, MODE>> {}
impl<MODE> SckPin for gpio::PA2<Alternate<2, MODE>> {}
impl<MODE> MisoPin for gpio::PD1<Alternate<2, MODE>> {}
impl<MODE> MisoPin for gpio::PA1<Alternate<2, MODE>> {}
impl<MODE> MosiPin for gpio::PC7<Alternate<2, MODE>> {}
impl<MODE> MosiPin for gpio::PA3<Alternate<2, MODE>> {}

/// SPI peripheral
pub struct Spi<PINS> {
    spi: SPI,
    pins: PINS,
    // a byte was written and its completion not consumed by `read` yet
    busy: bool,
}

impl<PINS: Pins> Spi<PINS> {
    /// Configures the SPI as bus master, running at the highest frequency not above `freq`
    pub fn new(
        spi: SPI,
        pins: PINS,
        mode: Mode,
        freq: impl Into<Hertz>,
        clocks: &Clocks,
        apb: &mut APB,
    ) -> Result<Self, Error> {
        let spr = divider_for(SPI::clock(clocks).0, freq.into().0)?;

        SPI::enable(apb);
        SPI::reset(apb);

        spi.ssn.write(spi::ssn::SSN);
        spi.cr.write(
            spi::cr::SPR.val(spr) | mode_bits(mode) | spi::cr::MSTR | spi::cr::SPEN,
        );
        Ok(Spi {
            spi,
            pins,
            busy: false,
        })
    }

    /// Configures the SPI as slave; the clock comes from the master
    pub fn new_slave(spi: SPI, pins: PINS, mode: Mode, apb: &mut APB) -> Self {
        SPI::enable(apb);
        SPI::reset(apb);

        spi.cr.write(mode_bits(mode) | spi::cr::SPEN);
        Spi {
            spi,
            pins,
            busy: false,
        }
    }
}

impl<PINS> Spi<PINS> {
    /// Drives NSS low
    pub fn select(&mut self) {
        self.spi.ssn.write(0);
    }

    /// Drives NSS high
    pub fn deselect(&mut self) {
        self.spi.ssn.write(spi::ssn::SSN);
    }

    /// Enables the transfer complete interrupt
    pub fn listen(&mut self) {
        self.spi.cr.set_bits(spi::cr::SPIEN);
    }

    pub fn unlisten(&mut self) {
        self.spi.cr.clear_bits(spi::cr::SPIEN);
    }

    pub fn release(self) -> (SPI, PINS) {
        self.spi.cr.write(0);
        (self.spi, self.pins)
    }
}

impl<PINS> FullDuplex<u8> for Spi<PINS> {
    type Error = Error;

    fn read(&mut self) -> nb::Result<u8, Error> {
        let sr = self.spi.sr.read();
        if let Err(e) = check_errors(sr) {
            // SR then DATA access clears the flags; re-enable after a mode fault dropped SPEN
            let _ = self.spi.data.read();
            self.spi.cr.set_bits(spi::cr::SPEN);
            self.busy = false;
            return Err(nb::Error::Other(e));
        }
        if sr & spi::sr::SPIF == 0 {
            return Err(nb::Error::WouldBlock);
        }
        self.busy = false;
        Ok(self.spi.data.read() as u8)
    }

    fn send(&mut self, byte: u8) -> nb::Result<(), Error> {
        if self.busy {
            return Err(nb::Error::WouldBlock);
        }
        self.spi.data.write(u32::from(byte));
        self.busy = true;
        Ok(())
    }
}

impl<PINS> embedded_hal::blocking::spi::transfer::Default<u8> for Spi<PINS> {}

impl<PINS> embedded_hal::blocking::spi::write::Default<u8> for Spi<PINS> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divider_never_exceeds_target() {
        assert_eq!(divider_for(24_000_000, 12_000_000), Ok(0));
        assert_eq!(divider_for(24_000_000, 10_000_000), Ok(1));
        assert_eq!(divider_for(24_000_000, 1_000_000), Ok(4));
        assert_eq!(divider_for(24_000_000, 187_500), Ok(6));
        assert_eq!(divider_for(24_000_000, 100_000), Err(Error::Frequency));
    }

    #[test]
    fn mode_encoding() {
        assert_eq!(mode_bits(MODE_0), 0);
        assert_eq!(mode_bits(MODE_1), spi::cr::CPHA);
        assert_eq!(mode_bits(MODE_2), spi::cr::CPOL);
        assert_eq!(mode_bits(MODE_3), spi::cr::CPOL | spi::cr::CPHA);
    }

    #[test]
    fn error_flags() {
        assert_eq!(check_errors(spi::sr::SPIF), Ok(()));
        assert_eq!(check_errors(spi::sr::MDF | spi::sr::WCOL), Err(Error::ModeFault));
        assert_eq!(check_errors(spi::sr::WCOL), Err(Error::WriteCollision));
        assert_eq!(check_errors(spi::sr::SSERR), Err(Error::SlaveSelect));
    }
}
