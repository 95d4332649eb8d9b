// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text logging over a serial port
//!
//! Test programs report their outcome with [`Logger::logout`], which prints a marker line a
//! host script can wait for.
//!
//! ```ignore
//! let (tx, _rx) = serial.split();
//! let mut log = Logger::new(tx);
//! writeln!(log, "adc: {} mV", mv).ok();
//! log.logout(mv > 3_000);
//! ```

use core::fmt;
use core::panic::Location;

use embedded_hal::serial;
use nb::block;

pub const PASS_MARKER: &str = "PASS";
pub const FAIL_MARKER: &str = "FAIL";

/// Marker printed for a test outcome
pub fn marker(pass: bool) -> &'static str {
    if pass {
        PASS_MARKER
    } else {
        FAIL_MARKER
    }
}

/// Blocking text writer on top of a serial transmitter
pub struct Logger<W> {
    tx: W,
}

impl<W, E> Logger<W>
where
    W: serial::Write<u8, Error = E>,
{
    pub fn new(tx: W) -> Self {
        Logger { tx }
    }

    /// Writes `bytes` and waits for the last one to leave the shift register
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), E> {
        for &byte in bytes {
            block!(self.tx.write(byte))?;
        }
        block!(self.tx.flush())
    }

    /// Prints the pass or fail marker on its own line
    pub fn logout(&mut self, pass: bool) -> Result<(), E> {
        self.write_bytes(b"\r\n")?;
        self.write_bytes(marker(pass).as_bytes())?;
        self.write_bytes(b"\r\n")
    }

    /// Prints the location of the caller as a failure
    #[track_caller]
    pub fn report_failure(&mut self) -> fmt::Result {
        let location = Location::caller();
        fmt::Write::write_fmt(
            self,
            format_args!(
                "{}: {}:{}\r\n",
                FAIL_MARKER,
                location.file(),
                location.line()
            ),
        )
    }

    pub fn release(self) -> W {
        self.tx
    }
}

impl<W, E> fmt::Write for Logger<W>
where
    W: serial::Write<u8, Error = E>,
{
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write_bytes(s.as_bytes()).map_err(|_| fmt::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use core::fmt::Write;

    #[derive(Default)]
    struct Capture {
        buf: heapless::Vec<u8, 128>,
        flushed: bool,
    }

    impl serial::Write<u8> for Capture {
        type Error = Infallible;

        fn write(&mut self, byte: u8) -> nb::Result<(), Infallible> {
            self.buf.push(byte).unwrap();
            self.flushed = false;
            Ok(())
        }

        fn flush(&mut self) -> nb::Result<(), Infallible> {
            self.flushed = true;
            Ok(())
        }
    }

    impl Capture {
        fn text(&self) -> &str {
            core::str::from_utf8(&self.buf).unwrap()
        }
    }

    #[test]
    fn markers() {
        let mut log = Logger::new(Capture::default());
        log.logout(true).unwrap();
        log.logout(false).unwrap();
        let tx = log.release();
        assert_eq!(tx.text(), "\r\nPASS\r\n\r\nFAIL\r\n");
        assert!(tx.flushed);
    }

    #[test]
    fn formatted_text() {
        let mut log = Logger::new(Capture::default());
        write!(log, "adc: {} mV", 1_650).unwrap();
        assert_eq!(log.release().text(), "adc: 1650 mV");
    }

    #[test]
    fn failure_names_the_caller() {
        let mut log = Logger::new(Capture::default());
        log.report_failure().unwrap();
        let tx = log.release();
        assert!(tx.text().starts_with("FAIL: "));
        assert!(tx.text().contains("logger.rs"));
    }
}
