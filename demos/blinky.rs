//! Blinks the starter kit LEDs
//!
//! LED1 (PD4) and LED2 (PD5) toggle in turn every second.

#![deny(unsafe_code)]
#![no_std]
#![no_main]

use panic_halt as _;

use nb::block;

use cortex_m_rt::entry;
use cx32l003_hal::{pac, prelude::*, starterkit::Leds, timer::Timer};

#[entry]
fn main() -> ! {
    // Get access to the core peripherals from the cortex-m crate
    let cp = cortex_m::Peripherals::take().unwrap();
    // Get access to the device specific peripherals from the peripheral access layer
    let dp = pac::Peripherals::take().unwrap();

    // Take ownership over the raw rcc and flash devices and convert them into the corresponding HAL
    // structs.
    let mut flash = dp.FLASH.constrain();
    let mut rcc = dp.RCC.constrain();

    // Freeze the configuration of all the clocks in the system and store the frozen frequencies in
    // `clocks`
    let clocks = rcc.cfgr.freeze(&mut flash.ws).unwrap();

    // Acquire the GPIOD peripheral
    let mut gpiod = dp.GPIOD.split(&mut rcc.ahb);

    // Both LEDs start off. The port configuration token is passed to the constructor in order to
    // configure the pins.
    let mut leds = Leds::new(gpiod.pd4, gpiod.pd5, &mut gpiod.cfg);
    // Configure the syst timer to trigger an update every second
    let mut timer = Timer::syst(cp.SYST, &clocks).start_count_down(1.hz());

    leds[0].on();
    // Wait for the timer to trigger an update and swap the lit LED
    loop {
        block!(timer.wait()).unwrap();
        for led in leds.iter_mut() {
            led.toggle();
        }
    }
}
