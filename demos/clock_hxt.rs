//! Switches SYSCLK to a 24 MHz crystal and back to HIRC
//!
//! SYSCLK / 8 is routed to the MCO pin (PC4, AF1) so the switch can be checked with a scope.

#![deny(unsafe_code)]
#![no_main]
#![no_std]

use panic_semihosting as _;

use cortex_m_rt::entry;
use cortex_m_semihosting::hprintln;
use cx32l003_hal::delay::Delay;
use cx32l003_hal::rcc::{
    ClockConfig, HircFreq, HircState, HxtState, McoSource, OscConfig, Oscillator, Startup,
};
use cx32l003_hal::{pac, prelude::*};

#[entry]
fn main() -> ! {
    let dp = pac::Peripherals::take().unwrap();
    let cp = cortex_m::Peripherals::take().unwrap();

    let mut rcc = dp.RCC.constrain();
    let mut flash = dp.FLASH.constrain();

    let mut gpioc = dp.GPIOC.split(&mut rcc.ahb);
    let _mco = gpioc.pc4.into_alternate::<1>(&mut gpioc.cfg);
    rcc.enable_mco(McoSource::Sysclk, 8).unwrap();

    rcc.osc_config(&OscConfig {
        hxt: Some(HxtState::Crystal {
            freq: 24.mhz().into(),
            drive: 5,
            startup: Startup::Cycles4096,
        }),
        ..OscConfig::default()
    })
    .unwrap();

    let clocks = rcc
        .clock_config(
            &ClockConfig {
                source: Oscillator::Hxt,
                hclk_div: 1,
                pclk_div: 2,
            },
            &mut flash.ws,
        )
        .unwrap();
    hprintln!(
        "hxt: sysclk={} hclk={} pclk={}",
        clocks.sysclk().0,
        clocks.hclk().0,
        clocks.pclk().0
    );

    let mut delay = Delay::new(cp.SYST, clocks);
    delay.delay_ms(2_000_u32);

    // back to HIRC, then the crystal can be stopped
    rcc.osc_config(&OscConfig {
        hirc: Some(HircState::On(HircFreq::Mhz24)),
        ..OscConfig::default()
    })
    .unwrap();
    let clocks = rcc
        .clock_config(&ClockConfig::default(), &mut flash.ws)
        .unwrap();
    rcc.osc_config(&OscConfig {
        hxt: Some(HxtState::Off),
        ..OscConfig::default()
    })
    .unwrap();
    hprintln!(
        "{:?}: sysclk={} source={:?}",
        rcc.sysclk_source(),
        clocks.sysclk().0,
        clocks.source()
    );

    #[allow(clippy::empty_loop)]
    loop {}
}
