//! RTC calendar with a workday alarm
//!
//! The calendar runs from the 32.768 kHz crystal. LED1 blinks from the periodic one second
//! interrupt; LED2 lights up when the alarm fires and the button turns it off again.

#![no_main]
#![no_std]

use panic_halt as _;

use core::cell::RefCell;

use cortex_m::interrupt::Mutex;
use cortex_m::peripheral::NVIC;
use cortex_m_rt::entry;
use cx32l003_hal::pac::{self, interrupt};
use cx32l003_hal::prelude::*;
use cx32l003_hal::rtc::{
    Alarm, ClockSource, Date, Event, HourFormat, Period, Rtc, RtcCallbacks, Time, Weekdays,
};
use cx32l003_hal::starterkit::{Button, Leds};

static CALENDAR: Mutex<RefCell<Option<Rtc>>> = Mutex::new(RefCell::new(None));
static LEDS: Mutex<RefCell<Option<Leds>>> = Mutex::new(RefCell::new(None));

struct Board<'a> {
    leds: &'a mut Leds,
}

impl RtcCallbacks for Board<'_> {
    fn alarm(&mut self) {
        self.leds[1].on();
    }

    fn periodic(&mut self) {
        self.leds[0].toggle();
    }
}

#[entry]
fn main() -> ! {
    let dp = pac::Peripherals::take().unwrap();

    let mut rcc = dp.RCC.constrain();
    let mut flash = dp.FLASH.constrain();
    let clocks = core::mem::take(&mut rcc.cfgr)
        .enable_lxt()
        .freeze(&mut flash.ws)
        .unwrap();

    let mut gpioc = dp.GPIOC.split(&mut rcc.ahb);
    let mut gpiod = dp.GPIOD.split(&mut rcc.ahb);
    let leds = Leds::new(gpiod.pd4, gpiod.pd5, &mut gpiod.cfg);
    let button = Button::new(gpioc.pc5, &mut gpioc.cfg);

    let mut rtc = Rtc::new(
        dp.RTC,
        ClockSource::Lxt,
        HourFormat::H24,
        &clocks,
        &mut rcc.apb,
    )
    .unwrap();
    rtc.set_date(&Date::new(2023, 6, 30).unwrap());
    rtc.set_time(&Time::new(7, 29, 50).unwrap());
    rtc.set_alarm(&Alarm::new(7, 30, 0, Weekdays::WORKDAYS).unwrap())
        .unwrap();
    rtc.set_period(Some(Period::Second));
    rtc.listen(Event::Alarm);
    rtc.listen(Event::Periodic);

    cortex_m::interrupt::free(|cs| {
        CALENDAR.borrow(cs).replace(Some(rtc));
        LEDS.borrow(cs).replace(Some(leds));
    });
    // NOTE(unsafe) the handler only touches state behind the mutexes
    unsafe { NVIC::unmask(pac::Interrupt::RTC) };

    loop {
        if button.is_pressed() {
            cortex_m::interrupt::free(|cs| {
                if let Some(leds) = LEDS.borrow(cs).borrow_mut().as_mut() {
                    leds[1].off();
                }
            });
        }
        cortex_m::asm::wfi();
    }
}

#[interrupt]
fn RTC() {
    cortex_m::interrupt::free(|cs| {
        let mut rtc = CALENDAR.borrow(cs).borrow_mut();
        let mut leds = LEDS.borrow(cs).borrow_mut();
        if let (Some(rtc), Some(leds)) = (rtc.as_mut(), leds.as_mut()) {
            rtc.on_interrupt(&mut Board { leds });
        }
    });
}
