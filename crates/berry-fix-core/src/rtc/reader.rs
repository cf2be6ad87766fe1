use log::{debug, info, warn};

use super::{
    ClockDriver, ClockSample, Correction, RawDateTime, STATUS_24_HOUR, STATUS_POWER_FAILURE, Time,
    bcd, calendar, correct, difference,
};

/// Error flags gathered by [`RtcReader::probe`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ClockErrors(u16);

impl ClockErrors {
    pub const INIT_ERROR: u16 = 0x0001;
    pub const INIT_WARNING: u16 = 0x0002;
    pub const TWELVE_HOUR: u16 = 0x0010;
    pub const POWER_FAILURE: u16 = 0x0020;
    pub const INVALID_YEAR: u16 = 0x0040;
    pub const INVALID_MONTH: u16 = 0x0080;
    pub const INVALID_DAY: u16 = 0x0100;
    pub const INVALID_HOUR: u16 = 0x0200;
    pub const INVALID_MINUTE: u16 = 0x0400;
    pub const INVALID_SECOND: u16 = 0x0800;

    const UNUSABLE: u16 = Self::INIT_ERROR | Self::TWELVE_HOUR | Self::POWER_FAILURE;
    const RANGE: u16 = Self::INVALID_YEAR
        | Self::INVALID_MONTH
        | Self::INVALID_DAY
        | Self::INVALID_HOUR
        | Self::INVALID_MINUTE
        | Self::INVALID_SECOND;

    pub const fn none() -> Self {
        Self(0)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn contains(self, flag: u16) -> bool {
        self.0 & flag == flag
    }

    pub fn insert(&mut self, flag: u16) {
        self.0 |= flag;
    }

    /// Time deltas taken from this clock cannot be trusted.
    pub const fn is_unusable(self) -> bool {
        self.0 & Self::UNUSABLE != 0
    }

    pub const fn has_range_errors(self) -> bool {
        self.0 & Self::RANGE != 0
    }

    /// Status-register and field range checks of one sample.
    pub fn check(sample: &ClockSample) -> Self {
        let mut errors = Self::none();
        let date_time = &sample.date_time;

        if sample.status & STATUS_POWER_FAILURE != 0 {
            errors.insert(Self::POWER_FAILURE);
        }
        if sample.status & STATUS_24_HOUR == 0 {
            errors.insert(Self::TWELVE_HOUR);
        }

        let year = date_time.year();
        if year == bcd::INVALID {
            errors.insert(Self::INVALID_YEAR);
        }

        let month = date_time.month();
        if month == bcd::INVALID || month == 0 || month > calendar::DECEMBER {
            errors.insert(Self::INVALID_MONTH);
        }

        let day = date_time.day();
        if day == bcd::INVALID {
            errors.insert(Self::INVALID_DAY);
        } else if let Some(length) = calendar::days_in_month(month, year as u16)
            && day > length
        {
            errors.insert(Self::INVALID_DAY);
        }

        if date_time.hour() > 24 {
            errors.insert(Self::INVALID_HOUR);
        }
        if date_time.minute() > 60 {
            errors.insert(Self::INVALID_MINUTE);
        }
        if date_time.second() > 60 {
            errors.insert(Self::INVALID_SECOND);
        }

        errors
    }
}

/// Decoding front end over a [`ClockDriver`].
///
/// Every driver call runs with interrupts masked so the serial transfer is
/// never torn.
#[derive(Debug)]
pub struct RtcReader<C> {
    clock: C,
    errors: ClockErrors,
}

impl<C: ClockDriver> RtcReader<C> {
    pub const fn new(clock: C) -> Self {
        Self {
            clock,
            errors: ClockErrors::none(),
        }
    }

    /// Probes the chip and checks one sample. Returns whether the clock can
    /// be used for time deltas.
    pub fn probe(&mut self) -> bool {
        self.errors = ClockErrors::none();

        let clock = &mut self.clock;
        let code = match critical_section::with(|_| clock.probe()) {
            Ok(code) => code,
            Err(err) => {
                warn!("rtc: probe failed err={:?}", err);
                self.errors.insert(ClockErrors::INIT_ERROR);
                return false;
            }
        };

        if code & 0x0F != 1 {
            warn!("rtc: probe rejected code=0x{:02x}", code);
            self.errors.insert(ClockErrors::INIT_ERROR);
            return false;
        }
        if code & 0xF0 != 0 {
            self.errors.insert(ClockErrors::INIT_WARNING);
        }

        match self.read() {
            Ok(sample) => {
                let checked = ClockErrors::check(&sample);
                self.errors.insert(checked.bits());
            }
            Err(err) => {
                warn!("rtc: read failed err={:?}", err);
                self.errors.insert(ClockErrors::INIT_ERROR);
            }
        }

        let working = !self.errors.is_unusable();
        debug!(
            "rtc: probe code=0x{:02x} errors=0x{:04x} working={}",
            code,
            self.errors.bits(),
            working
        );
        working
    }

    /// Flags from the last [`probe`](Self::probe).
    pub const fn errors(&self) -> ClockErrors {
        self.errors
    }

    /// Status register followed by date and time.
    pub fn read(&mut self) -> Result<ClockSample, C::Error> {
        let clock = &mut self.clock;
        let status = critical_section::with(|_| clock.get_status())?;
        let date_time = critical_section::with(|_| clock.get_date_time())?;
        Ok(ClockSample { status, date_time })
    }

    pub fn set(&mut self, date_time: &RawDateTime) -> Result<(), C::Error> {
        let clock = &mut self.clock;
        critical_section::with(|_| clock.set_date_time(date_time))
    }

    /// Reads the clock and commits a corrected date when it is stuck in the
    /// defect window.
    pub fn fix_date(&mut self) -> Result<Correction, C::Error> {
        let mut date_time = self.read()?.date_time;
        let before = date_time;

        let correction = correct(&mut date_time);
        if correction.changed() {
            self.set(&date_time)?;
            info!(
                "rtc: date corrected {:?} from={:02x}-{:02x}-{:02x} to={:02x}-{:02x}-{:02x}",
                correction, before.year, before.month, before.day, date_time.year, date_time.month,
                date_time.day
            );
        }

        Ok(correction)
    }

    /// Current clock reading as a day count and time of day, minus the
    /// player's stored local offset.
    ///
    /// `None` when a field of the reading is not valid BCD.
    pub fn utc_time(&mut self, local_offset: &Time) -> Result<Option<Time>, C::Error> {
        let now = clock_time(&self.read()?.date_time);
        Ok(now.map(|now| difference(local_offset, &now)))
    }

    pub fn release(self) -> C {
        self.clock
    }
}

fn clock_time(date_time: &RawDateTime) -> Option<Time> {
    let days = calendar::day_count(date_time.year(), date_time.month(), date_time.day())?;
    let (hours, minutes, seconds) = (date_time.hour(), date_time.minute(), date_time.second());
    if hours == bcd::INVALID || minutes == bcd::INVALID || seconds == bcd::INVALID {
        return None;
    }

    Some(Time::new(days as i16, hours as i8, minutes as i8, seconds as i8))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rtc::mock::{MockClock, MockClockError};

    fn reader_at(year: u8, month: u8, day: u8) -> RtcReader<MockClock> {
        let date_time = RawDateTime::from_binary(year, month, day, 10, 20, 30);
        RtcReader::new(MockClock::new(date_time))
    }

    #[test]
    fn healthy_clock_is_working() {
        let mut reader = reader_at(5, 6, 7);
        assert!(reader.probe());
        assert_eq!(reader.errors(), ClockErrors::none());
    }

    #[test]
    fn power_failure_and_twelve_hour_make_clock_unusable() {
        let mut reader = RtcReader::new(MockClock::default().with_status(STATUS_POWER_FAILURE));
        assert!(!reader.probe());
        assert!(reader.errors().contains(ClockErrors::POWER_FAILURE));
        assert!(reader.errors().contains(ClockErrors::TWELVE_HOUR));
    }

    #[test]
    fn bad_probe_code_is_init_error() {
        let mut reader = RtcReader::new(MockClock::default().with_probe_code(0x02));
        assert!(!reader.probe());
        assert!(reader.errors().contains(ClockErrors::INIT_ERROR));
    }

    #[test]
    fn probe_warning_does_not_block() {
        let mut reader = RtcReader::new(MockClock::default().with_probe_code(0x31));
        assert!(reader.probe());
        assert!(reader.errors().contains(ClockErrors::INIT_WARNING));
    }

    #[test]
    fn silent_chip_is_init_error() {
        let mut clock = MockClock::default();
        clock.responding = false;
        let mut reader = RtcReader::new(clock);
        assert!(!reader.probe());
        assert_eq!(reader.errors().bits(), ClockErrors::INIT_ERROR);
        assert_eq!(reader.read(), Err(MockClockError::NoResponse));
    }

    #[test]
    fn range_errors_alone_keep_clock_usable() {
        let date_time = RawDateTime::from_binary(1, 2, 29, 25, 61, 61);
        let mut reader = RtcReader::new(MockClock::new(date_time));

        assert!(reader.probe());
        let errors = reader.errors();
        assert!(errors.has_range_errors());
        assert!(errors.contains(ClockErrors::INVALID_DAY));
        assert!(errors.contains(ClockErrors::INVALID_HOUR));
        assert!(errors.contains(ClockErrors::INVALID_MINUTE));
        assert!(errors.contains(ClockErrors::INVALID_SECOND));
        assert!(!errors.contains(ClockErrors::INVALID_MONTH));
    }

    #[test]
    fn invalid_bcd_fields_are_flagged() {
        let sample = ClockSample {
            status: STATUS_24_HOUR,
            date_time: RawDateTime {
                year: 0xA1,
                month: 0x13,
                day: 0x0F,
                ..RawDateTime::from_binary(0, 1, 1, 0, 0, 0)
            },
        };
        let errors = ClockErrors::check(&sample);
        assert!(errors.contains(ClockErrors::INVALID_YEAR));
        assert!(errors.contains(ClockErrors::INVALID_MONTH));
        assert!(errors.contains(ClockErrors::INVALID_DAY));
        assert!(!errors.is_unusable());
    }

    #[test]
    fn leap_february_allows_day_29() {
        let sample = ClockSample {
            status: STATUS_24_HOUR,
            date_time: RawDateTime::from_binary(4, 2, 29, 0, 0, 0),
        };
        assert!(!ClockErrors::check(&sample).has_range_errors());
    }

    #[test]
    fn fix_date_commits_only_when_changed() {
        let mut reader = reader_at(1, 8, 15);
        assert_eq!(reader.fix_date(), Ok(Correction::FastForward));
        let clock = reader.release();
        assert_eq!(clock.writes(), 1);
        let date = clock.date_time;
        assert_eq!((date.year(), date.month(), date.day()), (2, 1, 2));
        assert_eq!(clock.date_time.hour(), 10);

        let mut reader = reader_at(3, 8, 15);
        assert_eq!(reader.fix_date(), Ok(Correction::Unchanged));
        assert_eq!(reader.release().writes(), 0);
    }

    #[test]
    fn utc_time_subtracts_local_offset() {
        // 2002-01-01 is day 366.
        let mut reader = reader_at(2, 1, 1);
        let offset = Time::new(0, 10, 30, 0);

        let utc = reader.utc_time(&offset).unwrap().unwrap();
        assert_eq!(utc, Time::new(365, 23, 50, 30));
    }

    #[test]
    fn utc_time_is_none_for_garbage_date() {
        let mut date_time = RawDateTime::from_binary(2, 1, 1, 0, 0, 0);
        date_time.day = 0xFF;
        let mut reader = RtcReader::new(MockClock::new(date_time));
        assert_eq!(reader.utc_time(&Time::default()), Ok(None));
    }
}
