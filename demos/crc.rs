//! CRC calculation

#![deny(unsafe_code)]
#![no_main]
#![no_std]

use panic_semihosting as _;

use cortex_m_rt::entry;
use cortex_m_semihosting::hprintln;
use cx32l003_hal::crc::{crc16, SEED};
use cx32l003_hal::{pac, prelude::*};

#[entry]
fn main() -> ! {
    let p = pac::Peripherals::take().unwrap();

    let mut rcc = p.RCC.constrain();
    let mut crc = p.CRC.constrain(&mut rcc.ahb);

    crc.reset();
    crc.write(0x12345678);

    let val = crc.read();
    let expected = crc16(SEED, &0x12345678_u32.to_le_bytes());
    hprintln!("found={:04x}, expected={:04x}", val, expected);

    let check = crc.checksum(b"123456789");
    hprintln!("check={:04x}, expected=29b1", check);

    #[allow(clippy::empty_loop)]
    loop {}
}
