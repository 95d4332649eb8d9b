//! Echoes bytes on UART0 with even parity
//!
//! TX on PA3, RX on PD6, 9600 bps, 8 data bits, even parity. Bytes that arrive with a wrong
//! parity bit are answered with `?`.

#![deny(unsafe_code)]
#![no_main]
#![no_std]

use panic_halt as _;

use nb::block;

use cortex_m_rt::entry;
use cx32l003_hal::{
    pac,
    prelude::*,
    serial::{Config, Error, Serial},
};

#[entry]
fn main() -> ! {
    let dp = pac::Peripherals::take().unwrap();

    let mut rcc = dp.RCC.constrain();
    let mut flash = dp.FLASH.constrain();
    let clocks = rcc.cfgr.freeze(&mut flash.ws).unwrap();

    let mut gpioa = dp.GPIOA.split(&mut rcc.ahb);
    let mut gpiod = dp.GPIOD.split(&mut rcc.ahb);
    let tx = gpioa.pa3.into_alternate::<5>(&mut gpioa.cfg);
    let rx = gpiod.pd6.into_alternate::<5>(&mut gpiod.cfg);

    let serial = Serial::new(
        dp.UART0,
        (tx, rx),
        Config::default().baudrate(9_600.bps()).parity_even(),
        &clocks,
        &mut rcc.apb,
    )
    .unwrap();
    let (mut tx, mut rx) = serial.split();

    for &byte in b"parity echo\r\n" {
        block!(tx.write(byte)).ok();
    }

    loop {
        let reply = match block!(rx.read()) {
            Ok(byte) => byte,
            Err(Error::Parity) => b'?',
            Err(_) => continue,
        };
        block!(tx.write(reply)).ok();
    }
}
