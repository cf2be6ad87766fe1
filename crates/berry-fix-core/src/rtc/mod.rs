//! Real-time clock decoding, rollover correction and elapsed-time gating.

pub mod bcd;
pub mod calendar;
mod corrector;
mod elapsed;
pub mod mock;
mod reader;

pub use corrector::{
    Correction, DefectWindow, correct, increment_day, increment_month, is_past_cutover,
};
pub use elapsed::{ElapsedDuration, Time, difference, is_due};
pub use reader::{ClockErrors, RtcReader};

/// Status register: the clock lost power since it was last set.
pub const STATUS_POWER_FAILURE: u8 = 0x80;
/// Status register: 24-hour mode enabled.
pub const STATUS_24_HOUR: u8 = 0x40;

/// Date and time as read from the clock chip, every field BCD-encoded.
///
/// Years count from 2000 (`0x00`), months and days from 1.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RawDateTime {
    pub year: u8,
    pub month: u8,
    pub day: u8,
    pub day_of_week: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl RawDateTime {
    /// Builds a value from binary fields, encoding each as BCD.
    pub const fn from_binary(
        year: u8,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Self {
        Self {
            year: bcd::from_binary(year),
            month: bcd::from_binary(month),
            day: bcd::from_binary(day),
            day_of_week: 0,
            hour: bcd::from_binary(hour),
            minute: bcd::from_binary(minute),
            second: bcd::from_binary(second),
        }
    }

    pub const fn year(&self) -> u8 {
        bcd::to_binary(self.year)
    }

    pub const fn month(&self) -> u8 {
        bcd::to_binary(self.month)
    }

    pub const fn day(&self) -> u8 {
        bcd::to_binary(self.day)
    }

    pub const fn hour(&self) -> u8 {
        bcd::to_binary(self.hour)
    }

    pub const fn minute(&self) -> u8 {
        bcd::to_binary(self.minute)
    }

    pub const fn second(&self) -> u8 {
        bcd::to_binary(self.second)
    }
}

/// One read of the clock: status register plus date/time.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ClockSample {
    pub status: u8,
    pub date_time: RawDateTime,
}

/// Serial clock chip port.
///
/// Calls are short and blocking; the reader masks interrupts around each one.
pub trait ClockDriver {
    type Error: core::fmt::Debug;

    /// Unprotects and probes the chip. A working chip reports `1` in the low
    /// nibble; a non-zero high nibble is a warning.
    fn probe(&mut self) -> Result<u8, Self::Error>;

    fn get_status(&mut self) -> Result<u8, Self::Error>;

    fn get_date_time(&mut self) -> Result<RawDateTime, Self::Error>;

    fn set_date_time(&mut self, date_time: &RawDateTime) -> Result<(), Self::Error>;
}

impl<T: ClockDriver + ?Sized> ClockDriver for &mut T {
    type Error = T::Error;

    fn probe(&mut self) -> Result<u8, Self::Error> {
        (**self).probe()
    }

    fn get_status(&mut self) -> Result<u8, Self::Error> {
        (**self).get_status()
    }

    fn get_date_time(&mut self) -> Result<RawDateTime, Self::Error> {
        (**self).get_date_time()
    }

    fn set_date_time(&mut self, date_time: &RawDateTime) -> Result<(), Self::Error> {
        (**self).set_date_time(date_time)
    }
}
