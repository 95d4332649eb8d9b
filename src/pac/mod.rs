// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Peripheral access layer for the CX32L003.
//!
//! Each peripheral is a zero-sized singleton that dereferences to its
//! [`RegisterBlock`](rcc::RegisterBlock). Registers are plain 32-bit
//! [`Reg`] cells; bit positions are exported as constants next to each
//! register block.

#![allow(non_camel_case_types)]

use core::marker::PhantomData;
use core::ops::Deref;

use vcell::VolatileCell;

pub mod adc;
pub mod awk;
pub mod basetim;
pub mod beep;
pub mod clktrim;
pub mod crc;
pub mod flash;
pub mod gpio;
pub mod i2c;
pub mod iwdg;
pub mod lptim;
pub mod lvd;
pub mod owire;
pub mod pca;
pub mod rcc;
pub mod rtc;
pub mod spi;
pub mod tim;
pub mod uart;
pub mod vc;
pub mod wwdg;

/// Number of priority bits implemented by the NVIC.
pub const NVIC_PRIO_BITS: u8 = 2;

pub use cortex_m::peripheral::Peripherals as CorePeripherals;
pub use cortex_m::peripheral::{CBP, CPUID, DCB, DWT, FPB, ITM, MPU, NVIC, SCB, SYST, TPIU};

/// A 32-bit memory-mapped register.
#[repr(transparent)]
pub struct Reg {
    cell: VolatileCell<u32>,
}

impl Reg {
    /// Reads the raw register value.
    #[inline(always)]
    pub fn read(&self) -> u32 {
        self.cell.get()
    }

    /// Writes a raw value to the register.
    #[inline(always)]
    pub fn write(&self, bits: u32) {
        self.cell.set(bits)
    }

    /// Read-modify-write.
    #[inline(always)]
    pub fn modify<F>(&self, f: F)
    where
        F: FnOnce(u32) -> u32,
    {
        self.write(f(self.read()))
    }

    #[inline(always)]
    pub fn set_bits(&self, mask: u32) {
        self.modify(|r| r | mask)
    }

    #[inline(always)]
    pub fn clear_bits(&self, mask: u32) {
        self.modify(|r| r & !mask)
    }

    /// Returns `true` if any bit of `mask` is set.
    #[inline(always)]
    pub fn is_set(&self, mask: u32) -> bool {
        self.read() & mask != 0
    }

    #[inline(always)]
    pub fn read_field(&self, field: Field) -> u32 {
        field.get(self.read())
    }

    #[inline(always)]
    pub fn write_field(&self, field: Field, value: u32) {
        self.modify(|r| field.set(r, value))
    }

    /// Address of the register, for accesses narrower than 32 bits.
    #[inline(always)]
    pub fn as_ptr(&self) -> *mut u32 {
        self.cell.as_ptr()
    }
}

/// A contiguous bit field inside a register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Field {
    pub offset: u8,
    pub width: u8,
}

impl Field {
    pub const fn new(offset: u8, width: u8) -> Self {
        Field { offset, width }
    }

    /// Mask of the field in register position.
    pub const fn mask(self) -> u32 {
        let ones = if self.width >= 32 {
            u32::MAX
        } else {
            (1 << self.width) - 1
        };
        ones << self.offset
    }

    /// Extracts the field from a register value.
    pub const fn get(self, bits: u32) -> u32 {
        (bits & self.mask()) >> self.offset
    }

    /// Replaces the field in a register value. Excess bits of `value` are dropped.
    pub const fn set(self, bits: u32, value: u32) -> u32 {
        (bits & !self.mask()) | ((value << self.offset) & self.mask())
    }

    /// Places `value` in field position with every other bit cleared.
    pub const fn val(self, value: u32) -> u32 {
        self.set(0, value)
    }
}

/// Single bit mask.
pub const fn bit(n: u8) -> u32 {
    1 << n
}

/// Enumeration of all the interrupts.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum Interrupt {
    GPIOA = 0,
    GPIOB = 1,
    GPIOC = 2,
    GPIOD = 3,
    FLASH = 4,
    UART0 = 6,
    UART1 = 7,
    LPUART = 8,
    SPI = 10,
    I2C = 12,
    TIM10 = 14,
    TIM11 = 15,
    LPTIM = 16,
    TIM1 = 18,
    TIM2 = 19,
    PCA = 21,
    WWDG = 22,
    IWDG = 23,
    ADC = 24,
    LVD = 25,
    VC = 26,
    AWK = 28,
    OWIRE = 29,
    RTC = 30,
    CLKTRIM = 31,
}

unsafe impl cortex_m::interrupt::InterruptNumber for Interrupt {
    #[inline(always)]
    fn number(self) -> u16 {
        self as u16
    }
}

pub use self::Interrupt as interrupt;

#[cfg(feature = "rt")]
pub use cortex_m_rt::interrupt;

#[cfg(feature = "rt")]
mod vectors {
    extern "C" {
        fn GPIOA();
        fn GPIOB();
        fn GPIOC();
        fn GPIOD();
        fn FLASH();
        fn UART0();
        fn UART1();
        fn LPUART();
        fn SPI();
        fn I2C();
        fn TIM10();
        fn TIM11();
        fn LPTIM();
        fn TIM1();
        fn TIM2();
        fn PCA();
        fn WWDG();
        fn IWDG();
        fn ADC();
        fn LVD();
        fn VC();
        fn AWK();
        fn OWIRE();
        fn RTC();
        fn CLKTRIM();
    }

    #[doc(hidden)]
    pub union Vector {
        _handler: unsafe extern "C" fn(),
        _reserved: u32,
    }

    #[doc(hidden)]
    #[link_section = ".vector_table.interrupts"]
    #[no_mangle]
    pub static __INTERRUPTS: [Vector; 32] = [
        Vector { _handler: GPIOA },
        Vector { _handler: GPIOB },
        Vector { _handler: GPIOC },
        Vector { _handler: GPIOD },
        Vector { _handler: FLASH },
        Vector { _reserved: 0 },
        Vector { _handler: UART0 },
        Vector { _handler: UART1 },
        Vector { _handler: LPUART },
        Vector { _reserved: 0 },
        Vector { _handler: SPI },
        Vector { _reserved: 0 },
        Vector { _handler: I2C },
        Vector { _reserved: 0 },
        Vector { _handler: TIM10 },
        Vector { _handler: TIM11 },
        Vector { _handler: LPTIM },
        Vector { _reserved: 0 },
        Vector { _handler: TIM1 },
        Vector { _handler: TIM2 },
        Vector { _reserved: 0 },
        Vector { _handler: PCA },
        Vector { _handler: WWDG },
        Vector { _handler: IWDG },
        Vector { _handler: ADC },
        Vector { _handler: LVD },
        Vector { _handler: VC },
        Vector { _reserved: 0 },
        Vector { _handler: AWK },
        Vector { _handler: OWIRE },
        Vector { _handler: RTC },
        Vector { _handler: CLKTRIM },
    ];
}

macro_rules! peripherals {
    ($($(#[$attr:meta])* $NAME:ident: $module:ident @ $address:expr,)+) => {
        $(
            $(#[$attr])*
            pub struct $NAME {
                _marker: PhantomData<*const ()>,
            }

            unsafe impl Send for $NAME {}

            impl $NAME {
                /// Pointer to the register block
                pub const PTR: *const $module::RegisterBlock = $address as *const _;

                /// Return the pointer to the register block
                #[inline(always)]
                pub const fn ptr() -> *const $module::RegisterBlock {
                    Self::PTR
                }
            }

            impl Deref for $NAME {
                type Target = $module::RegisterBlock;

                #[inline(always)]
                fn deref(&self) -> &Self::Target {
                    // NOTE(unsafe) the register block lives at a fixed address for the whole
                    // program and is only accessed through volatile cells
                    unsafe { &*Self::PTR }
                }
            }
        )+

        /// All the peripherals
        #[allow(non_snake_case)]
        pub struct Peripherals {
            $(
                pub $NAME: $NAME,
            )+
        }

        static mut DEVICE_PERIPHERALS: bool = false;

        impl Peripherals {
            /// Returns all the peripherals *once*
            #[inline]
            pub fn take() -> Option<Self> {
                cortex_m::interrupt::free(|_| {
                    // NOTE(unsafe) the flag is only accessed inside a critical section
                    if unsafe { DEVICE_PERIPHERALS } {
                        None
                    } else {
                        Some(unsafe { Peripherals::steal() })
                    }
                })
            }

            /// Unchecked version of `Peripherals::take`
            ///
            /// # Safety
            ///
            /// Each of the returned peripherals must be used at most once.
            #[inline]
            pub unsafe fn steal() -> Self {
                DEVICE_PERIPHERALS = true;
                Peripherals {
                    $(
                        $NAME: $NAME { _marker: PhantomData },
                    )+
                }
            }
        }
    };
}

peripherals! {
    /// Universal asynchronous receiver/transmitter 0
    UART0: uart @ 0x4000_0000,
    /// Universal asynchronous receiver/transmitter 1
    UART1: uart @ 0x4000_0400,
    /// Low power UART
    LPUART: uart @ 0x4000_0800,
    /// Serial peripheral interface
    SPI: spi @ 0x4000_0C00,
    /// Inter-integrated circuit interface
    I2C: i2c @ 0x4000_1000,
    /// Basic timer 10
    TIM10: basetim @ 0x4000_1800,
    /// Basic timer 11
    TIM11: basetim @ 0x4000_1820,
    /// Low power timer
    LPTIM: lptim @ 0x4000_1C00,
    /// Programmable counter array
    PCA: pca @ 0x4000_2000,
    /// Advanced control timer
    TIM1: tim @ 0x4000_2400,
    /// General purpose timer
    TIM2: tim @ 0x4000_2800,
    /// Independent watchdog
    IWDG: iwdg @ 0x4000_2C00,
    /// Window watchdog
    WWDG: wwdg @ 0x4000_3000,
    /// Real time clock
    RTC: rtc @ 0x4000_3400,
    /// Analog to digital converter
    ADC: adc @ 0x4000_3800,
    /// Voltage comparator
    VC: vc @ 0x4000_3C00,
    /// Low voltage detector
    LVD: lvd @ 0x4000_4000,
    /// Auto wake-up timer
    AWK: awk @ 0x4000_4400,
    /// Beeper
    BEEP: beep @ 0x4000_4800,
    /// One-wire interface
    OWIRE: owire @ 0x4000_4C00,
    /// Clock trimming and monitoring
    CLKTRIM: clktrim @ 0x4000_5000,
    /// Reset and clock control
    RCC: rcc @ 0x4002_0000,
    /// Flash controller
    FLASH: flash @ 0x4002_0400,
    /// CRC calculation unit
    CRC: crc @ 0x4002_0800,
    /// General purpose I/O port A
    GPIOA: gpio @ 0x5000_0000,
    /// General purpose I/O port B
    GPIOB: gpio @ 0x5000_0400,
    /// General purpose I/O port C
    GPIOC: gpio @ 0x5000_0800,
    /// General purpose I/O port D
    GPIOD: gpio @ 0x5000_0C00,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_mask_and_extract() {
        let f = Field::new(4, 3);
        assert_eq!(f.mask(), 0b111_0000);
        assert_eq!(f.get(0b1010_1111), 0b010);
        assert_eq!(f.set(0xFFFF_FFFF, 0), 0xFFFF_FF8F);
        assert_eq!(f.val(0b1111), 0b111_0000);
    }

    #[test]
    fn full_width_field() {
        let f = Field::new(0, 32);
        assert_eq!(f.mask(), u32::MAX);
        assert_eq!(f.get(0xDEAD_BEEF), 0xDEAD_BEEF);
    }

    #[test]
    fn interrupt_numbers_match_vector_slots() {
        use cortex_m::interrupt::InterruptNumber;
        assert_eq!(Interrupt::GPIOA.number(), 0);
        assert_eq!(Interrupt::UART0.number(), 6);
        assert_eq!(Interrupt::CLKTRIM.number(), 31);
    }
}
