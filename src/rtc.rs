// Copyright 2023 The cx32l003-hal authors.
//
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Real time clock
//!
//! BCD calendar with a weekday alarm and a periodic interrupt. Time and date are validated
//! before they reach the registers, which are write protected between updates.
//!
//! Reads freeze the counters (`WAIT`) so that seconds can't roll over between the time and
//! the date registers.
//!
//! ```ignore
//! let mut rtc = Rtc::new(dp.RTC, ClockSource::Lxt, HourFormat::H24, &clocks, &mut rcc.apb)?;
//! rtc.set_date(&Date::new(2023, 6, 30)?);
//! rtc.set_time(&Time::new(23, 59, 50)?);
//! rtc.set_alarm(&Alarm::new(0, 0, 0, Weekdays::ALL)?)?;
//! rtc.listen(Event::Alarm);
//! ```

use crate::pac::{rtc, RTC};
use crate::rcc::{Clocks, Enable, Reset, APB};
use crate::tick::Deadline;

/// Budget for the counters to freeze; one RTC clock cycle
const WAIT_TIMEOUT_MS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// Hours, minutes or seconds out of range
    InvalidTime,
    /// Day, month or year out of range
    InvalidDate,
    /// The counters did not freeze for a read
    Timeout,
    /// The selected clock is not running
    ClockNotRunning,
    /// Compensation value wider than the register
    InvalidCompensation,
}

/// Encodes a value below 100 as BCD
pub const fn to_bcd(value: u8) -> u8 {
    ((value / 10) << 4) | (value % 10)
}

pub const fn from_bcd(bcd: u8) -> u8 {
    (bcd >> 4) * 10 + (bcd & 0x0F)
}

/// Clock of the calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockSource {
    Lxt = 0,
    Lirc = 1,
}

/// Hour register encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HourFormat {
    H24,
    /// 1..12 with a PM flag
    H12,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Weekday {
    Sunday = 0,
    Monday = 1,
    Tuesday = 2,
    Wednesday = 3,
    Thursday = 4,
    Friday = 5,
    Saturday = 6,
}

impl Weekday {
    fn from_bits(bits: u32) -> Self {
        match bits % 7 {
            0 => Weekday::Sunday,
            1 => Weekday::Monday,
            2 => Weekday::Tuesday,
            3 => Weekday::Wednesday,
            4 => Weekday::Thursday,
            5 => Weekday::Friday,
            _ => Weekday::Saturday,
        }
    }
}

/// Time of day, always in 24 hour form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Time {
    hours: u8,
    minutes: u8,
    seconds: u8,
}

impl Time {
    pub fn new(hours: u8, minutes: u8, seconds: u8) -> Result<Self, Error> {
        if hours > 23 || minutes > 59 || seconds > 59 {
            return Err(Error::InvalidTime);
        }
        Ok(Time {
            hours,
            minutes,
            seconds,
        })
    }

    pub fn hours(&self) -> u8 {
        self.hours
    }

    pub fn minutes(&self) -> u8 {
        self.minutes
    }

    pub fn seconds(&self) -> u8 {
        self.seconds
    }
}

/// Calendar date between 2000-01-01 and 2099-12-31
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Date {
    year: u16,
    month: u8,
    day: u8,
}

pub const fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub const fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

impl Date {
    pub fn new(year: u16, month: u8, day: u8) -> Result<Self, Error> {
        if !(2000..=2099).contains(&year) || day == 0 || day > days_in_month(year, month) {
            return Err(Error::InvalidDate);
        }
        Ok(Date { year, month, day })
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    /// Day of the week (Sakamoto's method)
    pub fn weekday(&self) -> Weekday {
        const OFFSETS: [u16; 12] = [0, 3, 2, 5, 0, 3, 5, 1, 4, 6, 2, 4];
        let y = if self.month < 3 { self.year - 1 } else { self.year };
        let d = y + y / 4 - y / 100 + y / 400
            + OFFSETS[usize::from(self.month - 1)]
            + u16::from(self.day);
        Weekday::from_bits(u32::from(d))
    }
}

/// Set of weekdays, bit `n` for [`Weekday`] `n`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Weekdays(u8);

impl Weekdays {
    pub const ALL: Weekdays = Weekdays(0x7F);
    pub const WORKDAYS: Weekdays = Weekdays(0b011_1110);
    pub const WEEKEND: Weekdays = Weekdays(0b100_0001);

    pub const fn empty() -> Self {
        Weekdays(0)
    }

    pub const fn with(self, day: Weekday) -> Self {
        Weekdays(self.0 | (1 << day as u8))
    }

    pub const fn contains(self, day: Weekday) -> bool {
        self.0 & (1 << day as u8) != 0
    }

    pub const fn bits(self) -> u8 {
        self.0
    }
}

/// Alarm matching hours, minutes and seconds on a set of weekdays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Alarm {
    pub time: Time,
    pub weekdays: Weekdays,
}

impl Alarm {
    pub fn new(hours: u8, minutes: u8, seconds: u8, weekdays: Weekdays) -> Result<Self, Error> {
        Ok(Alarm {
            time: Time::new(hours, minutes, seconds)?,
            weekdays,
        })
    }
}

/// Periodic interrupt interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Period {
    HalfSecond = 1,
    Second = 2,
    Minute = 3,
    Hour = 4,
    Day = 5,
    Month = 6,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    Alarm,
    Periodic,
}

/// Hour register value
fn encode_hours(hours: u8, format: HourFormat) -> u32 {
    match format {
        HourFormat::H24 => u32::from(to_bcd(hours)),
        HourFormat::H12 => {
            let pm = hours >= 12;
            let h12 = match hours % 12 {
                0 => 12,
                h => h,
            };
            let bits = u32::from(to_bcd(h12));
            if pm {
                bits | rtc::hour::PM
            } else {
                bits
            }
        }
    }
}

fn decode_hours(bits: u32, format: HourFormat) -> u8 {
    match format {
        HourFormat::H24 => from_bcd((bits & 0x3F) as u8),
        HourFormat::H12 => {
            let h12 = from_bcd((bits & 0x1F) as u8) % 12;
            if bits & rtc::hour::PM != 0 {
                h12 + 12
            } else {
                h12
            }
        }
    }
}

/// Hooks of [`Rtc::on_interrupt`]
pub trait RtcCallbacks {
    fn alarm(&mut self) {}
    fn periodic(&mut self) {}
}

/// Real time clock
pub struct Rtc {
    rtc: RTC,
    format: HourFormat,
}

impl Rtc {
    /// Starts the calendar on `source`; the counters keep their values
    pub fn new(
        rtc: RTC,
        source: ClockSource,
        format: HourFormat,
        clocks: &Clocks,
        apb: &mut APB,
    ) -> Result<Self, Error> {
        let running = match source {
            ClockSource::Lxt => clocks.lxt().is_some(),
            ClockSource::Lirc => clocks.lirc().is_some(),
        };
        if !running {
            return Err(Error::ClockNotRunning);
        }

        RTC::enable(apb);

        let mut s = Rtc { rtc, format };
        s.unprotected(|rtc| {
            let mut cr = rtc::cr::CKSEL.val(source as u32) | rtc::cr::START;
            if format == HourFormat::H24 {
                cr |= rtc::cr::HOUR24;
            }
            rtc.cr.modify(|r| {
                (r & !(rtc::cr::CKSEL.mask() | rtc::cr::HOUR24 | rtc::cr::START)) | cr
            });
        });
        Ok(s)
    }

    /// Resets the calendar to its power-on state
    pub fn reset(&mut self, apb: &mut APB) {
        RTC::reset(apb);
    }

    fn unprotected<R>(&mut self, f: impl FnOnce(&rtc::RegisterBlock) -> R) -> R {
        for key in rtc::WPR_KEYS {
            self.rtc.wpr.write(key);
        }
        let r = f(&self.rtc);
        self.rtc.wpr.write(rtc::WPR_LOCK);
        r
    }

    /// Runs `f` with the counters frozen
    fn frozen<R>(&self, f: impl FnOnce(&rtc::RegisterBlock) -> R) -> Result<R, Error> {
        self.rtc.cr.set_bits(rtc::cr::WAIT);
        let mut deadline = Deadline::after_ms(WAIT_TIMEOUT_MS);
        while !self.rtc.cr.is_set(rtc::cr::WAITF) {
            if deadline.expired() {
                self.rtc.cr.clear_bits(rtc::cr::WAIT);
                return Err(Error::Timeout);
            }
        }
        let r = f(&self.rtc);
        self.rtc.cr.clear_bits(rtc::cr::WAIT);
        Ok(r)
    }

    pub fn set_time(&mut self, time: &Time) {
        let hours = encode_hours(time.hours, self.format);
        self.unprotected(|rtc| {
            rtc.sec.write(u32::from(to_bcd(time.seconds)));
            rtc.min.write(u32::from(to_bcd(time.minutes)));
            rtc.hour.write(hours);
        });
    }

    /// Sets the date, the weekday follows from it
    pub fn set_date(&mut self, date: &Date) {
        let weekday = date.weekday() as u32;
        self.unprotected(|rtc| {
            rtc.day.write(u32::from(to_bcd(date.day)));
            rtc.mon.write(u32::from(to_bcd(date.month)));
            rtc.year.write(u32::from(to_bcd((date.year - 2000) as u8)));
            rtc.week.write(weekday);
        });
    }

    /// Current time and date
    pub fn now(&self) -> Result<(Date, Time), Error> {
        let format = self.format;
        let (sec, min, hour, day, mon, year) = self.frozen(|rtc| {
            (
                rtc.sec.read(),
                rtc.min.read(),
                rtc.hour.read(),
                rtc.day.read(),
                rtc.mon.read(),
                rtc.year.read(),
            )
        })?;
        let time = Time::new(
            decode_hours(hour, format),
            from_bcd(min as u8),
            from_bcd(sec as u8),
        )?;
        let date = Date::new(
            2000 + u16::from(from_bcd(year as u8)),
            from_bcd(mon as u8),
            from_bcd(day as u8),
        )?;
        Ok((date, time))
    }

    pub fn time(&self) -> Result<Time, Error> {
        self.now().map(|(_, t)| t)
    }

    pub fn date(&self) -> Result<Date, Error> {
        self.now().map(|(d, _)| d)
    }

    /// Weekday counter
    pub fn weekday(&self) -> Result<Weekday, Error> {
        self.frozen(|rtc| Weekday::from_bits(rtc.week.read()))
    }

    /// Programs and arms the alarm
    pub fn set_alarm(&mut self, alarm: &Alarm) -> Result<(), Error> {
        let hours = encode_hours(alarm.time.hours, self.format);
        self.unprotected(|rtc| {
            rtc.cr.clear_bits(rtc::cr::ALMEN);
            rtc.almsec.write(u32::from(to_bcd(alarm.time.seconds)));
            rtc.almmin.write(u32::from(to_bcd(alarm.time.minutes)));
            rtc.almhour.write(hours);
            rtc.almweek.write(u32::from(alarm.weekdays.bits()));
            rtc.intclr.write(rtc::isr::ALMF);
            rtc.cr.set_bits(rtc::cr::ALMEN);
        });
        Ok(())
    }

    pub fn disable_alarm(&mut self) {
        self.unprotected(|rtc| rtc.cr.clear_bits(rtc::cr::ALMEN | rtc::cr::ALMIE));
    }

    /// Periodic interrupt interval, `None` turns it off
    pub fn set_period(&mut self, period: Option<Period>) {
        let bits = period.map_or(0, |p| p as u32);
        self.unprotected(|rtc| rtc.cr.write_field(rtc::cr::PRDS, bits));
    }

    /// Drives the 1 Hz output pin
    pub fn set_1hz_output(&mut self, enable: bool) {
        self.unprotected(|rtc| {
            if enable {
                rtc.cr.set_bits(rtc::cr::HZ1OE)
            } else {
                rtc.cr.clear_bits(rtc::cr::HZ1OE)
            }
        });
    }

    /// Clock compensation, in the register's 9-bit units; `None` turns it off
    pub fn set_compensation(&mut self, value: Option<u16>) -> Result<(), Error> {
        let bits = match value {
            None => 0,
            Some(v) if u32::from(v) <= rtc::compen::CR.mask() => {
                rtc::compen::CR.val(u32::from(v)) | rtc::compen::EN
            }
            Some(_) => return Err(Error::InvalidCompensation),
        };
        self.unprotected(|rtc| rtc.compen.write(bits));
        Ok(())
    }

    pub fn listen(&mut self, event: Event) {
        let bit = match event {
            Event::Alarm => rtc::cr::ALMIE,
            Event::Periodic => rtc::cr::PRDIE,
        };
        self.unprotected(|rtc| rtc.cr.set_bits(bit));
    }

    pub fn unlisten(&mut self, event: Event) {
        let bit = match event {
            Event::Alarm => rtc::cr::ALMIE,
            Event::Periodic => rtc::cr::PRDIE,
        };
        self.unprotected(|rtc| rtc.cr.clear_bits(bit));
    }

    pub fn is_pending(&self, event: Event) -> bool {
        match event {
            Event::Alarm => self.rtc.isr.is_set(rtc::isr::ALMF),
            Event::Periodic => self.rtc.isr.is_set(rtc::isr::PRDF),
        }
    }

    pub fn clear_interrupt(&mut self, event: Event) {
        match event {
            Event::Alarm => self.rtc.intclr.write(rtc::isr::ALMF),
            Event::Periodic => self.rtc.intclr.write(rtc::isr::PRDF),
        }
    }

    /// Services the RTC interrupt
    pub fn on_interrupt(&mut self, callbacks: &mut impl RtcCallbacks) {
        let isr = self.rtc.isr.read();
        self.rtc.intclr.write(isr & (rtc::isr::ALMF | rtc::isr::PRDF));
        if isr & rtc::isr::ALMF != 0 {
            callbacks.alarm();
        }
        if isr & rtc::isr::PRDF != 0 {
            callbacks.periodic();
        }
    }

    pub fn release(self) -> RTC {
        self.rtc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bcd() {
        assert_eq!(to_bcd(0), 0x00);
        assert_eq!(to_bcd(59), 0x59);
        assert_eq!(from_bcd(0x23), 23);
        for v in 0..100 {
            assert_eq!(from_bcd(to_bcd(v)), v);
        }
    }

    #[test]
    fn time_validation() {
        assert!(Time::new(23, 59, 59).is_ok());
        assert_eq!(Time::new(24, 0, 0), Err(Error::InvalidTime));
        assert_eq!(Time::new(0, 60, 0), Err(Error::InvalidTime));
        assert_eq!(Time::new(0, 0, 60), Err(Error::InvalidTime));
    }

    #[test]
    fn date_validation() {
        assert!(Date::new(2024, 2, 29).is_ok());
        assert_eq!(Date::new(2023, 2, 29), Err(Error::InvalidDate));
        assert_eq!(Date::new(2000, 2, 29).map(|d| d.day()), Ok(29));
        assert_eq!(Date::new(2023, 4, 31), Err(Error::InvalidDate));
        assert_eq!(Date::new(2023, 13, 1), Err(Error::InvalidDate));
        assert_eq!(Date::new(2023, 1, 0), Err(Error::InvalidDate));
        assert_eq!(Date::new(1999, 12, 31), Err(Error::InvalidDate));
        assert_eq!(Date::new(2100, 1, 1), Err(Error::InvalidDate));
    }

    #[test]
    fn weekdays() {
        assert_eq!(Date::new(2000, 1, 1).map(|d| d.weekday()), Ok(Weekday::Saturday));
        assert_eq!(Date::new(2023, 6, 30).map(|d| d.weekday()), Ok(Weekday::Friday));
        assert_eq!(Date::new(2024, 2, 29).map(|d| d.weekday()), Ok(Weekday::Thursday));

        let set = Weekdays::empty().with(Weekday::Monday).with(Weekday::Friday);
        assert_eq!(set.bits(), 0b010_0010);
        assert!(set.contains(Weekday::Friday));
        assert!(!set.contains(Weekday::Sunday));
        assert!(Weekdays::WORKDAYS.contains(Weekday::Monday));
        assert!(Weekdays::WEEKEND.contains(Weekday::Sunday));
    }

    #[test]
    fn twelve_hour_encoding() {
        assert_eq!(encode_hours(0, HourFormat::H12), 0x12);
        assert_eq!(encode_hours(12, HourFormat::H12), 0x12 | rtc::hour::PM);
        assert_eq!(encode_hours(23, HourFormat::H12), 0x11 | rtc::hour::PM);
        assert_eq!(encode_hours(23, HourFormat::H24), 0x23);
        for h in 0..24 {
            assert_eq!(decode_hours(encode_hours(h, HourFormat::H12), HourFormat::H12), h);
            assert_eq!(decode_hours(encode_hours(h, HourFormat::H24), HourFormat::H24), h);
        }
    }

    #[test]
    fn infallible_setters() {
        let _: fn(&mut Rtc, &Time) = Rtc::set_time;
        let _: fn(&mut Rtc, &Date) = Rtc::set_date;
        let _: fn(&mut Rtc, Event) = Rtc::listen;
    }
}
