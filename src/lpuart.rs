// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Low power UART
//!
//! The LPUART keeps receiving in deep sleep when it is clocked from LXT or LIRC. Frames, parity and
//! the blocking/interrupt APIs are shared with [`serial`](crate::serial); only the kernel clock and
//! the oversampling differ.
//!
//! ```ignore
//! let lpuart = Serial::lpuart(
//!     dp.LPUART,
//!     (tx, rx),
//!     lpuart::Config::default().clock(ClockSource::Lxt).serial(1_200.bps().into()),
//!     &clocks,
//!     &mut rcc.apb,
//! )?;
//! ```

use crate::pac::{uart, LPUART};
use crate::rcc::{BusClock, Clocks, Enable, Reset, APB};
use crate::serial::{self, Error, Pins, Serial, BAUD_TOLERANCE_PCT};

/// Kernel clock of the LPUART
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockSource {
    Pclk,
    Lxt,
    Lirc,
}

impl ClockSource {
    const fn bits(self) -> u32 {
        match self {
            ClockSource::Pclk => 0,
            ClockSource::Lxt => 2,
            ClockSource::Lirc => 3,
        }
    }

    fn frequency(self, clocks: &Clocks) -> Option<u32> {
        match self {
            ClockSource::Pclk => Some(LPUART::clock(clocks).0),
            ClockSource::Lxt => clocks.lxt().map(|f| f.0),
            ClockSource::Lirc => clocks.lirc().map(|f| f.0),
        }
    }
}

/// Samples per bit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Oversampling {
    X16,
    X8,
    X4,
}

impl Oversampling {
    const fn factor(self) -> u32 {
        match self {
            Oversampling::X16 => 16,
            Oversampling::X8 => 8,
            Oversampling::X4 => 4,
        }
    }

    const fn bits(self) -> u32 {
        match self {
            Oversampling::X16 => 0,
            Oversampling::X8 => 1,
            Oversampling::X4 => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub serial: serial::Config,
    pub clock: ClockSource,
    /// `None` picks the highest oversampling that reaches the baud rate
    pub oversampling: Option<Oversampling>,
}

impl Config {
    pub fn serial(mut self, serial: serial::Config) -> Self {
        self.serial = serial;
        self
    }

    pub fn clock(mut self, clock: ClockSource) -> Self {
        self.clock = clock;
        self
    }

    pub fn oversampling(mut self, oversampling: Oversampling) -> Self {
        self.oversampling = Some(oversampling);
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            serial: serial::Config::default(),
            clock: ClockSource::Pclk,
            oversampling: None,
        }
    }
}

/// Baud rate generator setting: `BRG = round(fsclk / (over * baud)) - 1`
pub fn lpuart_divisor(
    sclk: u32,
    baud: u32,
    oversampling: Option<Oversampling>,
) -> Result<(Oversampling, u16), Error> {
    if baud == 0 {
        return Err(Error::BaudRate);
    }
    let candidates: &[Oversampling] = match oversampling {
        Some(Oversampling::X16) => &[Oversampling::X16],
        Some(Oversampling::X8) => &[Oversampling::X8],
        Some(Oversampling::X4) => &[Oversampling::X4],
        None => &[Oversampling::X16, Oversampling::X8, Oversampling::X4],
    };

    let mut best: Option<(u64, Oversampling, u16)> = None;
    for &over in candidates {
        let den = u64::from(over.factor()) * u64::from(baud);
        let div = (u64::from(sclk) + den / 2) / den;
        if div == 0 {
            continue;
        }
        let brg = match cast::u16(div - 1) {
            Ok(brg) => brg,
            Err(_) => continue,
        };
        let actual = u64::from(sclk) / (u64::from(over.factor()) * div);
        let error = if actual > u64::from(baud) {
            actual - u64::from(baud)
        } else {
            u64::from(baud) - actual
        };
        if best.map_or(true, |(e, _, _)| error < e) {
            best = Some((error, over, brg));
        }
    }

    match best {
        Some((error, over, brg)) if error * 100 <= u64::from(baud) * BAUD_TOLERANCE_PCT => {
            Ok((over, brg))
        }
        _ => Err(Error::BaudRate),
    }
}

impl<PINS> Serial<LPUART, PINS>
where
    PINS: Pins<LPUART>,
{
    /// Configures the LPUART
    ///
    /// Fails with [`Error::BaudRate`] when the clock source is not running or can't produce the
    /// baud rate.
    pub fn lpuart(
        lpuart: LPUART,
        pins: PINS,
        config: Config,
        clocks: &Clocks,
        apb: &mut APB,
    ) -> Result<Self, Error> {
        let sclk = config.clock.frequency(clocks).ok_or(Error::BaudRate)?;
        let (over, brg) = lpuart_divisor(sclk, config.serial.baudrate.0, config.oversampling)?;

        LPUART::enable(apb);
        LPUART::reset(apb);

        lpuart
            .baudcr
            .write(uart::baudcr::SELF_BRG | uart::baudcr::BRG.val(u32::from(brg)));

        let mut scon = uart::scon::SM.val(config.serial.frame.mode())
            | uart::scon::REN
            | uart::scon::SCLKSEL.val(config.clock.bits())
            | uart::scon::OVER.val(over.bits());
        if config.clock != ClockSource::Pclk {
            scon |= uart::scon::LPMODE;
        }
        lpuart.scon.write(scon);

        Ok(Serial::assemble(lpuart, pins, config.serial.frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highest_oversampling_preferred() {
        // 4 MHz / (16 * 9600) = 26.04
        assert_eq!(
            lpuart_divisor(4_000_000, 9_600, None),
            Ok((Oversampling::X16, 25))
        );
    }

    #[test]
    fn crystal_clock_needs_low_oversampling() {
        // 32768 / (4 * 1200) = 6.83
        assert_eq!(
            lpuart_divisor(32_768, 1_200, None),
            Ok((Oversampling::X4, 6))
        );
        assert_eq!(
            lpuart_divisor(32_768, 1_200, Some(Oversampling::X16)),
            Err(Error::BaudRate)
        );
    }

    #[test]
    fn unreachable_rates() {
        assert_eq!(lpuart_divisor(32_768, 115_200, None), Err(Error::BaudRate));
        assert_eq!(lpuart_divisor(24_000_000, 0, None), Err(Error::BaudRate));
    }
}
