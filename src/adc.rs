// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Analog to Digital Converter
//!
//! 12-bit SAR converter with eight channels. Channel 7 measures the internal 1.2 V reference,
//! which gives the supply voltage with [`vdda_mv`].
//!
//! Single conversions go through [`OneShot`]; a set of channels is converted in one run with
//! [`Adc::scan`]. [`AdcIt`] runs scans from the ADC interrupt.
//!
//! ```ignore
//! let mut adc = Adc::new(dp.ADC, &mut rcc.apb);
//! let mut ain0 = gpioc.pc4.into_analog(&mut gpioc.cfg);
//! let raw: u16 = block!(adc.read(&mut ain0))?;
//! ```

use embedded_hal::adc::{Channel, OneShot};

use crate::gpio::{self, Analog};
use crate::pac::{adc, ADC};
use crate::rcc::{Enable, Reset, APB};
use crate::tick::Deadline;

/// Budget for a single conversion or a scan
pub const CONVERSION_TIMEOUT_MS: u32 = 10;

/// Internal reference voltage in millivolts
pub const VREF_INT_MV: u32 = 1_200;

/// Channel of the internal reference
pub const VREF_CHANNEL: u8 = 7;

/// Full scale of a conversion
pub const MAX_SAMPLE: u16 = 0x0FFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// The conversion did not complete in time
    Timeout,
    /// Channel number above 7 or an empty channel set
    InvalidChannel,
    /// A scan is already running
    Busy,
    /// Accumulation count out of 1..=256
    InvalidCount,
    /// The internal reference converted to zero
    NoReference,
}

/// Sample time, in ADC clock cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleTime {
    Cycles4 = 0,
    Cycles6 = 1,
    Cycles8 = 2,
    Cycles12 = 3,
}

impl Default for SampleTime {
    fn default() -> Self {
        SampleTime::Cycles12
    }
}

/// ADC clock, PCLK divided by a power of two
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockDiv {
    Div1 = 0,
    Div2 = 1,
    Div4 = 2,
    Div8 = 3,
    Div16 = 4,
    Div32 = 5,
    Div64 = 6,
    Div128 = 7,
}

impl Default for ClockDiv {
    fn default() -> Self {
        ClockDiv::Div2
    }
}

/// Hardware sources that can start a conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TriggerSource {
    Tim10 = 1,
    Tim11 = 2,
    Tim1 = 3,
    Tim2 = 4,
    Lptim = 5,
    Pca = 6,
    Vc = 7,
    Gpioa = 8,
    Gpiob = 9,
    Gpioc = 10,
    Gpiod = 11,
}

/// Window compare of the converted values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Threshold {
    /// Flag values above `high`
    pub high: Option<u16>,
    /// Flag values below `low`
    pub low: Option<u16>,
    /// Flag values between `low` and `high`
    pub in_range: bool,
}

impl Threshold {
    fn cr1_bits(&self) -> u32 {
        let mut bits = 0;
        if self.high.is_some() {
            bits |= adc::cr1::HTCMP;
        }
        if self.low.is_some() {
            bits |= adc::cr1::LTCMP;
        }
        if self.in_range && self.high.is_some() && self.low.is_some() {
            bits |= adc::cr1::REGCMP;
        }
        bits
    }

    fn int_bits(&self) -> u32 {
        let cr1 = self.cr1_bits();
        let mut bits = 0;
        if cr1 & adc::cr1::HTCMP != 0 {
            bits |= adc::int::HHT;
        }
        if cr1 & adc::cr1::LTCMP != 0 {
            bits |= adc::int::LLT;
        }
        if cr1 & adc::cr1::REGCMP != 0 {
            bits |= adc::int::REG;
        }
        bits
    }
}

/// Supply voltage from a conversion of the internal reference
pub fn vdda_mv(vref_sample: u16) -> Result<u32, Error> {
    if vref_sample == 0 {
        Err(Error::NoReference)
    } else {
        Ok(VREF_INT_MV * u32::from(MAX_SAMPLE) / u32::from(vref_sample))
    }
}

/// Stops a continuous run whether or not it completed
fn conclude<T>(outcome: Result<T, Error>, stop: impl FnOnce()) -> Result<T, Error> {
    stop();
    outcome
}

/// Converts a sample to millivolts for the given supply
pub fn to_millivolts(sample: u16, vdda_mv: u32) -> u32 {
    u32::from(sample) * vdda_mv / u32::from(MAX_SAMPLE)
}

/// Channel set as CHEN bits
pub fn channel_mask(channels: &[u8]) -> Result<u8, Error> {
    let mut mask = 0u8;
    for &ch in channels {
        if ch > 7 {
            return Err(Error::InvalidChannel);
        }
        mask |= 1 << ch;
    }
    if mask == 0 {
        Err(Error::InvalidChannel)
    } else {
        Ok(mask)
    }
}

/// Results of a scan, one slot per channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanResults {
    mask: u8,
    values: [u16; 8],
}

impl ScanResults {
    fn record(&mut self, ch: u8, value: u16) {
        if let Some(slot) = self.values.get_mut(usize::from(ch)) {
            *slot = value & MAX_SAMPLE;
            self.mask |= 1 << ch;
        }
    }

    /// Result of channel `ch`, if it was converted
    pub fn get(&self, ch: u8) -> Option<u16> {
        if ch < 8 && self.mask & (1 << ch) != 0 {
            Some(self.values[usize::from(ch)])
        } else {
            None
        }
    }

    /// Channels with a result
    pub fn channels(&self) -> u8 {
        self.mask
    }

    /// Whether every channel of `mask` has a result
    pub fn covers(&self, mask: u8) -> bool {
        self.mask & mask == mask
    }
}

/// Analog to digital converter
pub struct Adc {
    adc: ADC,
    sample_time: SampleTime,
    clock_div: ClockDiv,
}

impl Adc {
    /// Enables the converter with the default sample time and clock
    pub fn new(adc: ADC, apb: &mut APB) -> Self {
        ADC::enable(apb);
        ADC::reset(apb);

        let mut s = Adc {
            adc,
            sample_time: SampleTime::default(),
            clock_div: ClockDiv::default(),
        };
        s.apply_cr0(0);
        s
    }

    pub fn set_sample_time(&mut self, sample_time: SampleTime) {
        self.sample_time = sample_time;
        self.apply_cr0(self.adc.cr0.read_field(adc::cr0::SEL));
    }

    pub fn set_clock_div(&mut self, clock_div: ClockDiv) {
        self.clock_div = clock_div;
        self.apply_cr0(self.adc.cr0.read_field(adc::cr0::SEL));
    }

    /// Starts conversions from a hardware event instead of software
    pub fn set_trigger(&mut self, source: Option<TriggerSource>) {
        let bits = source.map_or(0, |s| s as u32);
        self.adc.cr1.write_field(adc::cr1::TRIGS0, bits);
    }

    /// Enables the window compare on the following conversions
    pub fn set_threshold(&mut self, threshold: Threshold) {
        self.adc
            .ht
            .write(u32::from(threshold.high.unwrap_or(MAX_SAMPLE)));
        self.adc.lt.write(u32::from(threshold.low.unwrap_or(0)));
        self.adc.cr1.modify(|r| {
            (r & !(adc::cr1::HTCMP | adc::cr1::LTCMP | adc::cr1::REGCMP)) | threshold.cr1_bits()
        });
    }

    fn apply_cr0(&mut self, channel: u32) {
        self.adc.cr0.write(
            adc::cr0::EN
                | adc::cr0::CLKDIV.val(self.clock_div as u32)
                | adc::cr0::SEL.val(channel)
                | adc::cr0::SAM.val(self.sample_time as u32),
        );
    }

    fn wait(&self, done: impl Fn(&adc::RegisterBlock) -> bool) -> Result<(), Error> {
        let mut deadline = Deadline::after_ms(CONVERSION_TIMEOUT_MS);
        while !done(&self.adc) {
            if deadline.expired() {
                return Err(Error::Timeout);
            }
        }
        Ok(())
    }

    /// Converts channel `ch` once
    pub fn read_channel(&mut self, ch: u8) -> Result<u16, Error> {
        if ch > 7 {
            return Err(Error::InvalidChannel);
        }
        self.adc.cr1.clear_bits(adc::cr1::CT | adc::cr1::RACC_EN);
        self.apply_cr0(u32::from(ch));
        self.adc.intclr.write(adc::int::ch(ch));
        self.adc.cr0.set_bits(adc::cr0::START);
        self.wait(|adc| !adc.cr0.is_set(adc::cr0::START))?;
        self.adc.intclr.write(adc::int::ch(ch));
        Ok(self.adc.result[usize::from(ch)].read_field(adc::RESULT) as u16)
    }

    /// Programs a continuous run over `mask`, `rounds` conversions in total
    fn setup_continuous(&mut self, mask: u8, rounds: u8, accumulate: bool) {
        self.adc
            .cr2
            .write(adc::cr2::CHEN.val(u32::from(mask)) | adc::cr2::ADCCNT.val(u32::from(rounds)));
        self.adc.cr1.modify(|mut r| {
            r |= adc::cr1::CT;
            if accumulate {
                r |= adc::cr1::RACC_EN | adc::cr1::RACC_CLR;
            } else {
                r &= !adc::cr1::RACC_EN;
            }
            r
        });
        self.adc.intclr.write(adc::int::CH_ALL | adc::int::CONT);
    }

    /// Waits for the continuous run to end and reads it out, leaving the converter stopped
    fn run_continuous<T>(
        &mut self,
        read: impl FnOnce(&adc::RegisterBlock) -> T,
    ) -> Result<T, Error> {
        self.adc.cr0.set_bits(adc::cr0::START);
        let outcome = self
            .wait(|adc| adc.rawintsr.is_set(adc::int::CONT))
            .map(|()| read(&self.adc));
        let adc = &self.adc;
        conclude(outcome, || {
            adc.cr1.clear_bits(adc::cr1::CT | adc::cr1::RACC_EN);
            adc.intclr.write(adc::int::CH_ALL | adc::int::CONT);
        })
    }

    /// Converts every channel of `channels` once
    pub fn scan(&mut self, channels: &[u8]) -> Result<ScanResults, Error> {
        let mask = channel_mask(channels)?;
        self.setup_continuous(mask, scan_count(mask), false);
        self.run_continuous(|adc| {
            let mut results = ScanResults::default();
            for ch in 0..8 {
                if mask & (1 << ch) != 0 {
                    let value = adc.result[usize::from(ch)].read_field(adc::RESULT);
                    results.record(ch, value as u16);
                }
            }
            results
        })
    }

    /// Sums `count` conversions of channel `ch` in hardware
    pub fn accumulate(&mut self, ch: u8, count: u16) -> Result<u32, Error> {
        if ch > 7 {
            return Err(Error::InvalidChannel);
        }
        let rounds = match count {
            1..=256 => (count - 1) as u8,
            _ => return Err(Error::InvalidCount),
        };
        self.setup_continuous(1 << ch, rounds, true);
        self.run_continuous(|adc| adc.result_acc.read_field(adc::RESULT_ACC))
    }

    /// Converts the internal reference and returns the supply voltage
    pub fn read_vdda_mv(&mut self) -> Result<u32, Error> {
        let sample = self.read_channel(VREF_CHANNEL)?;
        vdda_mv(sample)
    }

    /// Moves the converter into interrupt driven mode
    pub fn into_it(self) -> AdcIt {
        AdcIt {
            adc: self,
            mask: 0,
            state: AdcState::Ready,
            results: ScanResults::default(),
        }
    }

    /// Powers down the converter and returns the peripheral
    pub fn release(self) -> ADC {
        self.adc.cr0.write(0);
        self.adc
    }
}

/// ADCCNT value for one conversion of each channel of `mask`
fn scan_count(mask: u8) -> u8 {
    (mask.count_ones() as u8).saturating_sub(1)
}

/// Internal reference channel
pub struct Vref;

impl Channel<Adc> for Vref {
    type ID = u8;

    fn channel() -> u8 {
        VREF_CHANNEL
    }
}

macro_rules! adc_pins {
    ($($pin:ty => $chan:expr),+ $(,)*) => {
        $(
            impl Channel<Adc> for $pin {
                type ID = u8;

                fn channel() -> u8 { $chan }
            }
        )+
    };
}

adc_pins!(
    gpio::PC4<Analog> => 0,
    gpio::PD2<Analog> => 1,
    gpio::PD3<Analog> => 2,
    gpio::PD5<Analog> => 3,
    gpio::PD6<Analog> => 4,
    gpio::PC3<Analog> => 5,
    gpio::PA1<Analog> => 6,
);

impl<WORD, PIN> OneShot<Adc, WORD, PIN> for Adc
where
    WORD: From<u16>,
    PIN: Channel<Adc, ID = u8>,
{
    type Error = Error;

    fn read(&mut self, _pin: &mut PIN) -> nb::Result<WORD, Error> {
        self.read_channel(PIN::channel())
            .map(WORD::from)
            .map_err(nb::Error::Other)
    }
}

/// State of the interrupt driven converter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcState {
    Ready,
    Busy,
    /// The last scan completed, results are available
    Done,
}

/// Hooks of [`AdcIt`], called from [`AdcIt::on_interrupt`]
pub trait AdcCallbacks {
    fn scan_complete(&mut self, _results: &ScanResults) {}
    fn high_threshold(&mut self) {}
    fn low_threshold(&mut self) {}
    fn in_range(&mut self) {}
}

/// Interrupt driven scans
pub struct AdcIt {
    adc: Adc,
    mask: u8,
    state: AdcState,
    results: ScanResults,
}

impl AdcIt {
    pub fn state(&self) -> AdcState {
        self.state
    }

    /// Results of the last completed scan
    pub fn results(&self) -> Option<&ScanResults> {
        if self.state == AdcState::Done {
            Some(&self.results)
        } else {
            None
        }
    }

    /// Starts a scan of `channels`; `circular` restarts it after every completion
    pub fn start_scan(
        &mut self,
        channels: &[u8],
        threshold: Option<Threshold>,
        circular: bool,
    ) -> Result<(), Error> {
        if self.state == AdcState::Busy {
            return Err(Error::Busy);
        }
        let mask = channel_mask(channels)?;
        let threshold = threshold.unwrap_or_default();
        self.adc.set_threshold(threshold);
        self.adc.setup_continuous(mask, scan_count(mask), false);
        if circular {
            self.adc.adc.cr2.set_bits(adc::cr2::CIRCLE);
        }
        self.adc
            .adc
            .inten
            .write(u32::from(mask) | adc::int::CONT | threshold.int_bits());

        self.mask = mask;
        self.results = ScanResults::default();
        self.state = AdcState::Busy;
        self.adc.adc.cr0.set_bits(adc::cr0::START);
        Ok(())
    }

    /// Stops a running scan
    pub fn stop(&mut self) {
        let regs = &self.adc.adc;
        regs.inten.write(0);
        regs.cr2.clear_bits(adc::cr2::CIRCLE);
        regs.cr1.clear_bits(adc::cr1::CT);
        regs.cr0.clear_bits(adc::cr0::START);
        regs.intclr.write(0xFFF);
        self.state = AdcState::Ready;
    }

    /// Services the ADC interrupt
    pub fn on_interrupt(&mut self, callbacks: &mut impl AdcCallbacks) {
        let regs = &self.adc.adc;
        let flags = regs.mskintsr.read();
        regs.intclr.write(flags);

        for ch in 0..8u8 {
            if flags & adc::int::ch(ch) != 0 {
                let value = regs.result[usize::from(ch)].read_field(adc::RESULT) as u16;
                self.results.record(ch, value);
            }
        }

        if flags & adc::int::HHT != 0 {
            callbacks.high_threshold();
        }
        if flags & adc::int::LLT != 0 {
            callbacks.low_threshold();
        }
        if flags & adc::int::REG != 0 {
            callbacks.in_range();
        }

        if flags & adc::int::CONT != 0 && self.results.covers(self.mask) {
            if !regs.cr2.is_set(adc::cr2::CIRCLE) {
                regs.inten.write(0);
                regs.cr1.clear_bits(adc::cr1::CT);
            }
            self.state = AdcState::Done;
            callbacks.scan_complete(&self.results);
        }
    }

    pub fn release(mut self) -> Adc {
        self.stop();
        self.adc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_sets() {
        assert_eq!(channel_mask(&[0, 2, 7]), Ok(0b1000_0101));
        assert_eq!(channel_mask(&[8]), Err(Error::InvalidChannel));
        assert_eq!(channel_mask(&[]), Err(Error::InvalidChannel));
        assert_eq!(scan_count(0b1000_0101), 2);
        assert_eq!(scan_count(0b1), 0);
    }

    #[test]
    fn scan_results_track_channels() {
        let mut results = ScanResults::default();
        results.record(3, 0x1234);
        results.record(5, 100);
        assert_eq!(results.get(3), Some(0x0234));
        assert_eq!(results.get(5), Some(100));
        assert_eq!(results.get(4), None);
        assert_eq!(results.get(9), None);
        assert!(results.covers(0b0010_1000));
        assert!(!results.covers(0b0011_1000));
    }

    #[test]
    fn supply_from_reference() {
        // the reference reads 1/3 of full scale on a 3.6 V supply
        assert_eq!(vdda_mv(1365), Ok(3600));
        assert_eq!(vdda_mv(0), Err(Error::NoReference));
        assert_eq!(to_millivolts(MAX_SAMPLE, 3300), 3300);
        assert_eq!(to_millivolts(0, 3300), 0);
    }

    #[test]
    fn timed_out_run_is_stopped() {
        let mut stopped = false;
        let outcome: Result<u32, Error> = conclude(Err(Error::Timeout), || stopped = true);
        assert_eq!(outcome, Err(Error::Timeout));
        assert!(stopped);

        let mut stopped = false;
        assert_eq!(conclude(Ok(7), || stopped = true), Ok(7));
        assert!(stopped);
    }

    #[test]
    fn threshold_needs_both_limits_for_range() {
        let t = Threshold {
            high: Some(3000),
            low: None,
            in_range: true,
        };
        assert_eq!(t.cr1_bits(), adc::cr1::HTCMP);
        assert_eq!(t.int_bits(), adc::int::HHT);

        let t = Threshold {
            high: Some(3000),
            low: Some(1000),
            in_range: true,
        };
        assert_eq!(
            t.cr1_bits(),
            adc::cr1::HTCMP | adc::cr1::LTCMP | adc::cr1::REGCMP
        );
    }
}
