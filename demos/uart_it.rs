//! Interrupt driven UART0 transfers
//!
//! Receives blocks of 8 bytes in the background and acknowledges each one with `ok`.

#![no_main]
#![no_std]

use panic_halt as _;

use core::cell::RefCell;

use cortex_m::interrupt::Mutex;
use cortex_m::peripheral::NVIC;
use cortex_m_rt::entry;
use cx32l003_hal::pac::{self, interrupt, UART0};
use cx32l003_hal::prelude::*;
use cx32l003_hal::serial::{self, Callbacks, Config, Serial, SerialIt};

static SERIAL: Mutex<RefCell<Option<SerialIt<UART0>>>> = Mutex::new(RefCell::new(None));
static LINE_DONE: Mutex<RefCell<bool>> = Mutex::new(RefCell::new(false));

struct Echo<'a> {
    line_done: &'a mut bool,
}

impl Callbacks for Echo<'_> {
    fn rx_complete(&mut self, _data: &[u8]) {
        *self.line_done = true;
    }

    // the block is dropped, `take_rx` hands the buffer back for a new one
    fn error(&mut self, _error: serial::Error) {
        *self.line_done = true;
    }
}

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

    let serial = Serial::new(dp.UART0, (tx, rx), Config::default(), &clocks, &mut rcc.apb).unwrap();
    let (tx, rx) = serial.split();
    let mut uart = SerialIt::new(tx, rx);

    let line = cortex_m::singleton!(: [u8; 8] = [0; 8]).unwrap();
    uart.read_it(line).unwrap();

    cortex_m::interrupt::free(|cs| SERIAL.borrow(cs).replace(Some(uart)));
    // NOTE(unsafe) the handler only touches state behind the mutex
    unsafe { NVIC::unmask(serial::interrupt::<UART0>()) };

    loop {
        cortex_m::interrupt::free(|cs| {
            if !LINE_DONE.borrow(cs).replace(false) {
                return;
            }
            if let Some(uart) = SERIAL.borrow(cs).borrow_mut().as_mut() {
                if let Some((buf, _len)) = uart.take_rx() {
                    uart.write_it(b"ok\r\n").ok();
                    uart.read_it(buf).ok();
                }
            }
        });
        cortex_m::asm::wfi();
    }
}

#[interrupt]
fn UART0() {
    cortex_m::interrupt::free(|cs| {
        let mut line_done = LINE_DONE.borrow(cs).borrow_mut();
        if let Some(uart) = SERIAL.borrow(cs).borrow_mut().as_mut() {
            uart.on_interrupt(&mut Echo {
                line_done: &mut *line_done,
            });
        }
    });
}
