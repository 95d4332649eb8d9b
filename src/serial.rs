// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Serial Communication (UART)
//!
//! This module contains the functions to utilize the UART0 and UART1 peripherals. The low power
//! UART shares the frame handling implemented here, see [`lpuart`](crate::lpuart) for its
//! constructor.
//!
//! ## Frames
//!
//! Without parity, frames carry 8 data bits (mode 1). With parity, the ninth bit of a mode 3 frame
//! carries the parity of the data byte. The same ninth bit flags address bytes in
//! multiprocessor mode.
//!
//! ## Example usage:
//!
//! ```ignore
//! let mut gpioa = dp.GPIOA.split(&mut rcc.ahb);
//! let mut gpiod = dp.GPIOD.split(&mut rcc.ahb);
//! let tx = gpioa.pa3.into_alternate(&mut gpioa.cfg);
//! let rx = gpiod.pd6.into_alternate(&mut gpiod.cfg);
//!
//! let serial = Serial::new(
//!     dp.UART0,
//!     (tx, rx),
//!     Config::default().baudrate(115_200.bps()).parity_even(),
//!     &clocks,
//!     &mut rcc.apb,
//! )?;
//!
//! let (mut tx, mut rx) = serial.split();
//! block!(tx.write(b'x')).ok();
//! let received = block!(rx.read())?;
//! ```

use core::fmt;
use core::marker::PhantomData;
use core::ops::Deref;

use embedded_hal::serial;
use embedded_hal::serial::{Read as _, Write as _};

use crate::gpio::{self, Alternate};
use crate::pac::{self, uart, UART0, UART1};
use crate::rcc::{BusClock, Clocks, Enable, RccBus, Reset, APB};
use crate::time::{Bps, U32Ext};

/// Serial error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// Stop bit not detected
    Framing,
    /// The parity bit does not match the data
    Parity,
    /// The requested baud rate can't be generated from the kernel clock
    BaudRate,
    /// An interrupt driven transfer is already in progress
    Busy,
    /// The operation needs a different frame format
    Mode,
}

/// Interrupt event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// New data has been received
    Rxne,
    /// A frame has been shifted out
    Txc,
    /// The transmit buffer is empty
    Txe,
}

impl Event {
    const fn mask(self) -> u32 {
        match self {
            Event::Rxne => uart::scon::RIEN,
            Event::Txc => uart::scon::TIEN,
            Event::Txe => uart::scon::TXEIE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    ParityEven,
    ParityOdd,
}

/// Frame format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Frame {
    /// 8 data bits
    Data8,
    /// 8 data bits and a parity bit
    Parity(Parity),
    /// 8 data bits and an address flag
    Multiprocessor,
}

impl Frame {
    pub(crate) fn mode(self) -> u32 {
        match self {
            Frame::Data8 => uart::scon::MODE1,
            Frame::Parity(_) | Frame::Multiprocessor => uart::scon::MODE3,
        }
    }
}

/// Serial configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub baudrate: Bps,
    pub frame: Frame,
}

impl Config {
    pub fn baudrate(mut self, baudrate: Bps) -> Self {
        self.baudrate = baudrate;
        self
    }

    pub fn parity_none(mut self) -> Self {
        self.frame = Frame::Data8;
        self
    }

    pub fn parity_even(mut self) -> Self {
        self.frame = Frame::Parity(Parity::ParityEven);
        self
    }

    pub fn parity_odd(mut self) -> Self {
        self.frame = Frame::Parity(Parity::ParityOdd);
        self
    }

    /// Ninth bit set for address bytes, clear for data bytes
    pub fn multiprocessor(mut self) -> Self {
        self.frame = Frame::Multiprocessor;
        self
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            baudrate: 115_200_u32.bps(),
            frame: Frame::Data8,
        }
    }
}

impl From<Bps> for Config {
    fn from(baudrate: Bps) -> Config {
        Config {
            baudrate,
            ..Default::default()
        }
    }
}

/// Parity of every byte value, `1` for an odd number of set bits
pub(crate) static PARITY_TABLE: [u8; 256] = parity_table();

const fn parity_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = (i as u8).count_ones() as u8 & 1;
        i += 1;
    }
    table
}

/// Ninth bit value giving the frame the requested parity
pub fn parity_bit(parity: Parity, byte: u8) -> bool {
    let odd_ones = PARITY_TABLE[byte as usize] == 1;
    match parity {
        Parity::ParityEven => odd_ones,
        Parity::ParityOdd => !odd_ones,
    }
}

/// Tolerated deviation of the generated baud rate, in percent
pub(crate) const BAUD_TOLERANCE_PCT: u64 = 3;

/// Baud rate generator setting for UART0/UART1: (double baud, BRG)
///
/// `BRG = round((DBAUD + 1) * PCLK / (32 * baud)) - 1`. Double baud is only chosen when it gets
/// closer to the requested rate.
pub fn uart_divisor(pclk: u32, baud: u32) -> Result<(bool, u16), Error> {
    if baud == 0 {
        return Err(Error::BaudRate);
    }
    let mut best: Option<(u64, bool, u16)> = None;
    for &dbaud in &[false, true] {
        let num = u64::from(pclk) * if dbaud { 2 } else { 1 };
        let den = 32 * u64::from(baud);
        let div = (num + den / 2) / den;
        if div == 0 || div > 0x1_0000 {
            continue;
        }
        let actual = num / (32 * div);
        let error = if actual > u64::from(baud) {
            actual - u64::from(baud)
        } else {
            u64::from(baud) - actual
        };
        let brg = match cast::u16(div - 1) {
            Ok(brg) => brg,
            Err(_) => continue,
        };
        if best.map_or(true, |(e, _, _)| error < e) {
            best = Some((error, dbaud, brg));
        }
    }
    match best {
        Some((error, dbaud, brg)) if error * 100 <= u64::from(baud) * BAUD_TOLERANCE_PCT => {
            Ok((dbaud, brg))
        }
        _ => Err(Error::BaudRate),
    }
}

pub(crate) mod sealed {
    pub trait Instance {
        const INTERRUPT: crate::pac::Interrupt;
        fn ptr() -> *const crate::pac::uart::RegisterBlock;
    }
}

/// UART, UART1 or LPUART
pub trait Instance:
    sealed::Instance
    + Deref<Target = uart::RegisterBlock>
    + RccBus<Bus = APB>
    + Enable
    + Reset
    + BusClock
{
}

macro_rules! instance {
    ($($UARTX:ident,)+) => {
        $(
            impl sealed::Instance for pac::$UARTX {
                const INTERRUPT: pac::Interrupt = pac::Interrupt::$UARTX;
                fn ptr() -> *const uart::RegisterBlock {
                    pac::$UARTX::ptr()
                }
            }
            impl Instance for pac::$UARTX {}
        )+
    };
}

instance!(UART0, UART1, LPUART,);

/// UART0 or UART1, clocked from PCLK
pub trait ClassicInstance: Instance {}

impl ClassicInstance for UART0 {}
impl ClassicInstance for UART1 {}

/// TX pin of `UART`
pub trait TxPin<UART> {}
/// RX pin of `UART`
pub trait RxPin<UART> {}

/// TX and RX pin pair
pub trait Pins<UART> {}

impl<UART, TX, RX> Pins<UART> for (TX, RX)
where
    TX: TxPin<UART>,
    RX: RxPin<UART>,
{
}

macro_rules! pins {
    ($UARTX:ident: TX: [$($TX:ty),*] RX: [$($RX:ty),*]) => {
        $(
            impl<MODE> TxPin<pac::$UARTX> for $TX {}
        )*
        $(
            impl<MODE> RxPin<pac::$UARTX> for $RX {}
        )*
    };
}

pins!(UART0:
    TX: [gpio::PA3<Alternate<5, MODE>>, gpio::PD5<Alternate<5, MODE>>]
    RX: [gpio::PD6<Alternate<5, MODE>>, gpio::PA2<Alternate<5, MODE>>]
);
pins!(UART1:
    TX: [gpio::PD2<Alternate<5, MODE>>, gpio::PC3<Alternate<5, MODE>>]
    RX: [gpio::PD3<Alternate<5, MODE>>, gpio::PC4<Alternate<5, MODE>>]
);
pins!(LPUART:
    TX: [gpio::PB4<Alternate<3, MODE>>, gpio::PC5<Alternate<3, MODE>>]
    RX: [gpio::PB5<Alternate<3, MODE>>, gpio::PC6<Alternate<3, MODE>>]
);

/// Serial abstraction
pub struct Serial<UART, PINS> {
    uart: UART,
    pins: PINS,
    tx: Tx<UART>,
    rx: Rx<UART>,
}

/// Serial receiver
pub struct Rx<UART> {
    frame: Frame,
    _uart: PhantomData<UART>,
}

/// Serial transmitter
pub struct Tx<UART> {
    frame: Frame,
    // a frame was loaded and its completion flag not seen yet
    pending: bool,
    _uart: PhantomData<UART>,
}

impl<PINS, UART> Serial<UART, PINS>
where
    UART: ClassicInstance,
    PINS: Pins<UART>,
{
    /// Configures UART0 or UART1 to operate as a serial interface
    pub fn new(
        uart: UART,
        pins: PINS,
        config: impl Into<Config>,
        clocks: &Clocks,
        apb: &mut APB,
    ) -> Result<Self, Error> {
        let config = config.into();
        let (dbaud, brg) = uart_divisor(UART::clock(clocks).0, config.baudrate.0)?;

        UART::enable(apb);
        UART::reset(apb);

        uart.baudcr
            .write(uart::baudcr::SELF_BRG | uart::baudcr::BRG.val(u32::from(brg)));
        let mut scon = uart::scon::SM.val(config.frame.mode()) | uart::scon::REN;
        if dbaud {
            scon |= uart::scon::DBAUD;
        }
        uart.scon.write(scon);

        Ok(Self::assemble(uart, pins, config.frame))
    }
}

impl<UART: Instance, PINS> Serial<UART, PINS> {
    pub(crate) fn assemble(uart: UART, pins: PINS, frame: Frame) -> Self {
        Serial {
            uart,
            pins,
            tx: Tx {
                frame,
                pending: false,
                _uart: PhantomData,
            },
            rx: Rx {
                frame,
                _uart: PhantomData,
            },
        }
    }

    /// Starts listening for an interrupt event
    pub fn listen(&mut self, event: Event) {
        modify_scon::<UART>(|r| r | event.mask());
    }

    /// Stops listening for an interrupt event
    pub fn unlisten(&mut self, event: Event) {
        modify_scon::<UART>(|r| r & !event.mask());
    }

    /// Only accepts address bytes matching `addr` under `mask`, multiprocessor frames only
    ///
    /// Once addressed, call [`accept_all`](Self::accept_all) to receive the data bytes.
    pub fn listen_address(&mut self, addr: u8, mask: u8) -> Result<(), Error> {
        if self.rx.frame != Frame::Multiprocessor {
            return Err(Error::Mode);
        }
        self.uart.saddr.write(u32::from(addr));
        self.uart.saden.write(u32::from(mask));
        modify_scon::<UART>(|r| r | uart::scon::SM2);
        Ok(())
    }

    /// Receives data bytes as well as address bytes
    pub fn accept_all(&mut self) {
        modify_scon::<UART>(|r| r & !uart::scon::SM2);
    }

    /// Separates the serial struct into separate channel objects for sending (Tx) and receiving (Rx)
    pub fn split(self) -> (Tx<UART>, Rx<UART>) {
        (self.tx, self.rx)
    }

    /// Returns ownership of the borrowed register handles
    pub fn release(self) -> (UART, PINS) {
        (self.uart, self.pins)
    }
}

fn modify_scon<UART: Instance>(f: impl FnOnce(u32) -> u32) {
    // NOTE(unsafe) SCON is shared by Tx and Rx, every modification happens in a critical section
    let regs = unsafe { &*<UART as sealed::Instance>::ptr() };
    cortex_m::interrupt::free(|_| regs.scon.modify(f));
}

impl<UART: Instance> Tx<UART> {
    #[inline(always)]
    fn regs(&self) -> &'static uart::RegisterBlock {
        // NOTE(unsafe) Tx only touches the transmit side of the UART
        unsafe { &*<UART as sealed::Instance>::ptr() }
    }

    fn load(&mut self, byte: u8, ninth: bool) -> nb::Result<(), Error> {
        let regs = self.regs();
        if !regs.intsr.is_set(uart::intsr::TXE) {
            return Err(nb::Error::WouldBlock);
        }
        if self.frame != Frame::Data8 {
            modify_scon::<UART>(|r| {
                if ninth {
                    r | uart::scon::TB8
                } else {
                    r & !uart::scon::TB8
                }
            });
        }
        regs.intclr.write(uart::intsr::TI);
        regs.sbuf.write(u32::from(byte));
        self.pending = true;
        Ok(())
    }

    /// Sends an address byte, multiprocessor frames only
    pub fn write_address(&mut self, addr: u8) -> nb::Result<(), Error> {
        if self.frame != Frame::Multiprocessor {
            return Err(nb::Error::Other(Error::Mode));
        }
        self.load(addr, true)
    }

    pub fn listen(&mut self) {
        modify_scon::<UART>(|r| r | uart::scon::TIEN);
    }

    pub fn unlisten(&mut self) {
        modify_scon::<UART>(|r| r & !uart::scon::TIEN);
    }

    /// Returns true if the last frame has been shifted out
    pub fn is_tx_complete(&self) -> bool {
        self.regs().intsr.is_set(uart::intsr::TI)
    }
}

impl<UART: Instance> serial::Write<u8> for Tx<UART> {
    type Error = Error;

    fn write(&mut self, byte: u8) -> nb::Result<(), Self::Error> {
        let ninth = match self.frame {
            Frame::Parity(parity) => parity_bit(parity, byte),
            _ => false,
        };
        self.load(byte, ninth)
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        if !self.pending || self.is_tx_complete() {
            self.pending = false;
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}

impl<UART: Instance> embedded_hal::blocking::serial::write::Default<u8> for Tx<UART> {}

impl<UART: Instance> fmt::Write for Tx<UART> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        s.bytes()
            .try_for_each(|c| nb::block!(self.write(c)))
            .map_err(|_| fmt::Error)
    }
}

impl<UART: Instance> Rx<UART> {
    #[inline(always)]
    fn regs(&self) -> &'static uart::RegisterBlock {
        // NOTE(unsafe) Rx only touches the receive side of the UART
        unsafe { &*<UART as sealed::Instance>::ptr() }
    }

    pub fn listen(&mut self) {
        modify_scon::<UART>(|r| r | uart::scon::RIEN);
    }

    pub fn unlisten(&mut self) {
        modify_scon::<UART>(|r| r & !uart::scon::RIEN);
    }

    /// Reads a byte together with its ninth bit, without frame checks
    pub fn read_raw(&mut self) -> nb::Result<(u8, bool), Error> {
        let regs = self.regs();
        let sr = regs.intsr.read();
        if sr & uart::intsr::RI == 0 {
            return Err(nb::Error::WouldBlock);
        }
        let byte = regs.sbuf.read() as u8;
        let ninth = regs.scon.is_set(uart::scon::RB8);
        regs.intclr.write(uart::intsr::RI | uart::intsr::FE);
        if sr & uart::intsr::FE != 0 {
            return Err(nb::Error::Other(Error::Framing));
        }
        Ok((byte, ninth))
    }
}

/// Checks a received frame against the configured format
pub(crate) fn check_frame(frame: Frame, byte: u8, ninth: bool) -> Result<u8, Error> {
    match frame {
        Frame::Parity(parity) if parity_bit(parity, byte) != ninth => Err(Error::Parity),
        _ => Ok(byte),
    }
}

impl<UART: Instance> serial::Read<u8> for Rx<UART> {
    type Error = Error;

    fn read(&mut self) -> nb::Result<u8, Error> {
        let (byte, ninth) = self.read_raw()?;
        check_frame(self.frame, byte, ninth).map_err(nb::Error::Other)
    }
}

impl<UART: Instance, PINS> serial::Write<u8> for Serial<UART, PINS> {
    type Error = Error;

    fn write(&mut self, byte: u8) -> nb::Result<(), Self::Error> {
        self.tx.write(byte)
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        self.tx.flush()
    }
}

impl<UART: Instance, PINS> embedded_hal::blocking::serial::write::Default<u8>
    for Serial<UART, PINS>
{
}

impl<UART: Instance, PINS> serial::Read<u8> for Serial<UART, PINS> {
    type Error = Error;

    fn read(&mut self) -> nb::Result<u8, Error> {
        self.rx.read()
    }
}

impl<UART: Instance, PINS> fmt::Write for Serial<UART, PINS> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        fmt::Write::write_str(&mut self.tx, s)
    }
}

/// State of an interrupt driven transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    Ready,
    BusyTx,
    BusyRx,
    BusyTxRx,
    Error,
}

impl State {
    fn from_activity(tx: bool, rx: bool) -> State {
        match (tx, rx) {
            (false, false) => State::Ready,
            (true, false) => State::BusyTx,
            (false, true) => State::BusyRx,
            (true, true) => State::BusyTxRx,
        }
    }
}

/// Whether a new reception may start
fn rx_request(rx_pending: bool, error: Option<Error>) -> Result<(), Error> {
    match error {
        Some(e) => Err(e),
        None if rx_pending => Err(Error::Busy),
        None => Ok(()),
    }
}

/// Completion hooks of [`SerialIt`], called from [`SerialIt::on_interrupt`]
pub trait Callbacks {
    /// The whole transmit buffer has been sent
    fn tx_complete(&mut self) {}

    /// The receive buffer is full
    fn rx_complete(&mut self, _data: &[u8]) {}

    /// A frame error aborted the reception
    fn error(&mut self, _error: Error) {}
}

/// Interrupt driven transfers
///
/// Move the handle into a `Mutex<RefCell<Option<_>>>` and call
/// [`on_interrupt`](SerialIt::on_interrupt) from the UART interrupt handler.
pub struct SerialIt<UART> {
    tx: Tx<UART>,
    rx: Rx<UART>,
    tx_buf: Option<&'static [u8]>,
    tx_pos: usize,
    rx_buf: Option<&'static mut [u8]>,
    rx_pos: usize,
    rx_done: bool,
    error: Option<Error>,
}

impl<UART: Instance> SerialIt<UART> {
    pub fn new(tx: Tx<UART>, rx: Rx<UART>) -> Self {
        SerialIt {
            tx,
            rx,
            tx_buf: None,
            tx_pos: 0,
            rx_buf: None,
            rx_pos: 0,
            rx_done: false,
            error: None,
        }
    }

    pub fn state(&self) -> State {
        if self.error.is_some() {
            State::Error
        } else {
            State::from_activity(self.tx_buf.is_some(), self.rx_buf.is_some() && !self.rx_done)
        }
    }

    /// Error that stopped the last reception
    pub fn error(&self) -> Option<Error> {
        self.error
    }

    /// Starts sending `buf`; the first byte is loaded immediately
    pub fn write_it(&mut self, buf: &'static [u8]) -> Result<(), Error> {
        if self.tx_buf.is_some() {
            return Err(Error::Busy);
        }
        if buf.is_empty() {
            return Ok(());
        }
        self.tx_buf = Some(buf);
        self.tx_pos = 0;
        self.tx.listen();
        self.feed_tx();
        Ok(())
    }

    /// Starts filling `buf` from received frames
    ///
    /// After a receive error this returns that error until [`take_rx`](SerialIt::take_rx) or
    /// [`abort`](SerialIt::abort) hands the previous buffer back.
    pub fn read_it(&mut self, buf: &'static mut [u8]) -> Result<(), Error> {
        rx_request(self.rx_buf.is_some() && !self.rx_done, self.error)?;
        self.rx_buf = Some(buf);
        self.rx_pos = 0;
        self.rx_done = false;
        self.rx.listen();
        Ok(())
    }

    /// Takes back the receive buffer, with the number of bytes received so far
    ///
    /// Clears a pending receive error.
    pub fn take_rx(&mut self) -> Option<(&'static mut [u8], usize)> {
        let pos = self.rx_pos;
        self.error = None;
        let buf = self.rx_buf.take()?;
        self.rx.unlisten();
        self.rx_done = false;
        self.rx_pos = 0;
        Some((buf, pos))
    }

    /// Stops both directions and gives back the receive buffer
    pub fn abort(&mut self) -> Option<(&'static mut [u8], usize)> {
        self.tx.unlisten();
        self.tx_buf = None;
        self.tx_pos = 0;
        self.error = None;
        self.tx
            .regs()
            .intclr
            .write(uart::intsr::TI | uart::intsr::RI | uart::intsr::FE);
        self.take_rx()
    }

    fn feed_tx(&mut self) {
        if let Some(buf) = self.tx_buf {
            if let Some(&byte) = buf.get(self.tx_pos) {
                if self.tx.write(byte).is_ok() {
                    self.tx_pos += 1;
                }
            }
        }
    }

    /// Services the UART interrupt
    pub fn on_interrupt(&mut self, callbacks: &mut impl Callbacks) {
        let sr = self.tx.regs().intsr.read();

        if sr & uart::intsr::RI != 0 {
            match self.rx.read() {
                Ok(byte) => {
                    if let Some(buf) = self.rx_buf.as_deref_mut() {
                        if !self.rx_done {
                            if let Some(slot) = buf.get_mut(self.rx_pos) {
                                *slot = byte;
                                self.rx_pos += 1;
                            }
                            if self.rx_pos >= buf.len() {
                                self.rx_done = true;
                                self.rx.unlisten();
                                callbacks.rx_complete(&buf[..self.rx_pos]);
                            }
                        }
                    }
                }
                Err(nb::Error::Other(e)) => {
                    self.error = Some(e);
                    self.rx.unlisten();
                    callbacks.error(e);
                }
                Err(nb::Error::WouldBlock) => {}
            }
        }

        if sr & uart::intsr::TI != 0 && self.tx_buf.is_some() {
            let len = self.tx_buf.map_or(0, |b| b.len());
            if self.tx_pos < len {
                self.feed_tx();
            } else {
                self.tx.regs().intclr.write(uart::intsr::TI);
                self.tx.unlisten();
                self.tx.pending = false;
                self.tx_buf = None;
                callbacks.tx_complete();
            }
        }
    }

    pub fn release(self) -> (Tx<UART>, Rx<UART>) {
        (self.tx, self.rx)
    }
}

/// Interrupt line of the instance
pub fn interrupt<UART: Instance>() -> pac::Interrupt {
    <UART as sealed::Instance>::INTERRUPT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parity_table_matches_bit_count() {
        assert_eq!(PARITY_TABLE[0x00], 0);
        assert_eq!(PARITY_TABLE[0x01], 1);
        assert_eq!(PARITY_TABLE[0x03], 0);
        assert_eq!(PARITY_TABLE[0x7F], 1);
        assert_eq!(PARITY_TABLE[0xFF], 0);
        for b in 0..=255u8 {
            assert_eq!(PARITY_TABLE[b as usize] as u32, b.count_ones() % 2);
        }
    }

    #[test]
    fn ninth_bit_completes_parity() {
        // 0x31 has three set bits
        assert!(parity_bit(Parity::ParityEven, 0x31));
        assert!(!parity_bit(Parity::ParityOdd, 0x31));
        assert!(!parity_bit(Parity::ParityEven, 0x33));
        assert!(parity_bit(Parity::ParityOdd, 0x00));
    }

    #[test]
    fn received_parity_is_checked() {
        let even = Frame::Parity(Parity::ParityEven);
        assert_eq!(check_frame(even, 0x31, true), Ok(0x31));
        assert_eq!(check_frame(even, 0x31, false), Err(Error::Parity));
        assert_eq!(check_frame(Frame::Data8, 0x31, false), Ok(0x31));
        assert_eq!(check_frame(Frame::Multiprocessor, 0x31, true), Ok(0x31));
    }

    #[test]
    fn receive_error_reported_until_buffer_taken() {
        assert_eq!(rx_request(false, None), Ok(()));
        assert_eq!(rx_request(true, None), Err(Error::Busy));
        // an aborted reception still holds its buffer
        assert_eq!(rx_request(true, Some(Error::Parity)), Err(Error::Parity));
        assert_eq!(rx_request(false, Some(Error::Framing)), Err(Error::Framing));
    }

    #[test]
    fn double_baud_only_when_closer() {
        // 24 MHz / 115200: single speed would be 7 % off
        assert_eq!(uart_divisor(24_000_000, 115_200), Ok((true, 12)));
        // both settings give the same error, single speed wins
        assert_eq!(uart_divisor(24_000_000, 9_600), Ok((false, 77)));
        assert_eq!(uart_divisor(4_000_000, 9_600), Ok((false, 12)));
    }

    #[test]
    fn unreachable_baud_rates() {
        assert_eq!(uart_divisor(4_000_000, 1_000_000), Err(Error::BaudRate));
        assert_eq!(uart_divisor(24_000_000, 10), Err(Error::BaudRate));
        assert_eq!(uart_divisor(24_000_000, 0), Err(Error::BaudRate));
    }

    #[test]
    fn transfer_state() {
        assert_eq!(State::from_activity(false, false), State::Ready);
        assert_eq!(State::from_activity(true, false), State::BusyTx);
        assert_eq!(State::from_activity(false, true), State::BusyRx);
        assert_eq!(State::from_activity(true, true), State::BusyTxRx);
    }

    #[test]
    fn config_builder() {
        let config = Config::default().baudrate(9_600.bps()).parity_odd();
        assert_eq!(config.baudrate, Bps(9_600));
        assert_eq!(config.frame, Frame::Parity(Parity::ParityOdd));
        assert_eq!(Config::from(Bps(19_200)).frame, Frame::Data8);
    }
}
