//! Scans two analog inputs and prints them in millivolts
//!
//! AIN0 on PC4 and AIN1 on PD2. The supply is measured first through the internal reference.

#![deny(unsafe_code)]
#![no_main]
#![no_std]

use panic_semihosting as _;

use nb::block;

use cortex_m_rt::entry;
use cortex_m_semihosting::hprintln;
use cx32l003_hal::adc::{self, Adc, SampleTime};
use cx32l003_hal::delay::Delay;
use cx32l003_hal::{pac, prelude::*};

#[entry]
fn main() -> ! {
    let dp = pac::Peripherals::take().unwrap();
    let cp = cortex_m::Peripherals::take().unwrap();

    let mut rcc = dp.RCC.constrain();
    let mut flash = dp.FLASH.constrain();
    let clocks = rcc.cfgr.freeze(&mut flash.ws).unwrap();

    let mut gpioc = dp.GPIOC.split(&mut rcc.ahb);
    let mut gpiod = dp.GPIOD.split(&mut rcc.ahb);
    let mut ain0 = gpioc.pc4.into_analog(&mut gpioc.cfg);
    let _ain1 = gpiod.pd2.into_analog(&mut gpiod.cfg);

    let mut adc = Adc::new(dp.ADC, &mut rcc.apb);
    adc.set_sample_time(SampleTime::Cycles12);

    let mut delay = Delay::new(cp.SYST, clocks);

    loop {
        let vdda = adc.read_vdda_mv().unwrap_or(3_300);

        match adc.scan(&[0, 1]) {
            Ok(results) => {
                for ch in 0..2 {
                    if let Some(sample) = results.get(ch) {
                        hprintln!("AIN{}: {} mV", ch, adc::to_millivolts(sample, vdda));
                    }
                }
            }
            Err(e) => hprintln!("scan failed: {:?}", e),
        }

        // the same input through the embedded-hal one-shot interface, averaged by hardware
        let single: u16 = block!(adc.read(&mut ain0)).unwrap();
        let sum = adc.accumulate(0, 16).unwrap_or(0);
        hprintln!("AIN0 once={} avg={} vdda={} mV", single, sum / 16, vdda);

        delay.delay_ms(1_000_u32);
    }
}
