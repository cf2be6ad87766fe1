use super::{
    RawDateTime, bcd,
    calendar::{self, FEBRUARY, JANUARY},
};

/// Where a clock reading sits relative to the stuck-calendar defect.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DefectWindow {
    /// Year 2000: the clock has not reached the bad leap-day handling yet,
    /// or went through it.
    Year2000,
    /// Year 2001: the clock stopped one day into the year.
    Year2001,
    /// Year 2002 or later, or an undecodable year.
    Clear,
}

impl DefectWindow {
    pub const fn of(date_time: &RawDateTime) -> Self {
        match date_time.year() {
            0 => Self::Year2000,
            1 => Self::Year2001,
            _ => Self::Clear,
        }
    }
}

/// What [`correct`] did to a reading.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Correction {
    Unchanged,
    /// Year 2001 forced to 2 January 2002.
    FastForward,
    /// Year 2000 moved one year on; the day too when past the cutover.
    YearAdvanced { day_advanced: bool },
}

impl Correction {
    pub const fn changed(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// True once a year-2000 reading reached 29 February.
pub const fn is_past_cutover(date_time: &RawDateTime) -> bool {
    match date_time.month() {
        JANUARY => false,
        FEBRUARY => date_time.day() == 29,
        _ => true,
    }
}

/// Advances the month, rolling December into January of the next year.
///
/// An invalid month stays invalid.
pub fn increment_month(date_time: &mut RawDateTime) {
    date_time.month = bcd::increment(date_time.month);
    let month = date_time.month();
    if month != bcd::INVALID && month > calendar::DECEMBER {
        date_time.year = bcd::increment(date_time.year);
        date_time.month = bcd::from_binary(JANUARY);
    }
}

/// Advances the day, carrying into the month past the common-year length of
/// the month. 29 February of a leap year is kept.
///
/// Invalid day or month fields are never carried.
pub fn increment_day(date_time: &mut RawDateTime) {
    date_time.day = bcd::increment(date_time.day);

    let day = date_time.day();
    let month = date_time.month();
    let Some(month_length) = calendar::base_days_in_month(month) else {
        return;
    };
    if day == bcd::INVALID || day <= month_length {
        return;
    }

    let leap_day =
        month == FEBRUARY && day == 29 && calendar::is_leap_year(date_time.year() as u16);
    if !leap_day {
        date_time.day = bcd::from_binary(1);
        increment_month(date_time);
    }
}

/// Rewrites a reading stuck in the defect window. The caller commits the
/// result to the clock when it changed.
pub fn correct(date_time: &mut RawDateTime) -> Correction {
    match DefectWindow::of(date_time) {
        DefectWindow::Year2001 => {
            date_time.year = bcd::from_binary(2);
            date_time.month = bcd::from_binary(JANUARY);
            date_time.day = bcd::from_binary(2);
            Correction::FastForward
        }
        DefectWindow::Year2000 => {
            let day_advanced = is_past_cutover(date_time);
            if day_advanced {
                increment_day(date_time);
            }
            date_time.year = bcd::increment(date_time.year);
            Correction::YearAdvanced { day_advanced }
        }
        DefectWindow::Clear => Correction::Unchanged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: u8, month: u8, day: u8) -> RawDateTime {
        RawDateTime::from_binary(year, month, day, 12, 34, 56)
    }

    #[test]
    fn january_2000_only_advances_year() {
        let mut sample = date(0, 1, 1);
        assert_eq!(
            correct(&mut sample),
            Correction::YearAdvanced {
                day_advanced: false
            }
        );
        assert_eq!((sample.year(), sample.month(), sample.day()), (1, 1, 1));
        let time = (sample.hour(), sample.minute(), sample.second());
        assert_eq!(time, (12, 34, 56));
    }

    #[test]
    fn year_2001_is_fast_forwarded() {
        for (month, day) in [(1, 1), (1, 2), (6, 30), (12, 31)] {
            let mut sample = date(1, month, day);
            assert_eq!(correct(&mut sample), Correction::FastForward);
            assert_eq!((sample.year(), sample.month(), sample.day()), (2, 1, 2));
        }
    }

    #[test]
    fn march_2000_advances_day_then_year() {
        let mut sample = date(0, 3, 1);
        assert_eq!(
            correct(&mut sample),
            Correction::YearAdvanced { day_advanced: true }
        );
        assert_eq!((sample.year(), sample.month(), sample.day()), (1, 3, 2));
    }

    #[test]
    fn leap_day_2000_is_past_cutover() {
        assert!(!is_past_cutover(&date(0, 2, 28)));
        assert!(is_past_cutover(&date(0, 2, 29)));
        assert!(is_past_cutover(&date(0, 12, 1)));

        let mut sample = date(0, 2, 29);
        correct(&mut sample);
        assert_eq!((sample.year(), sample.month(), sample.day()), (1, 3, 1));
    }

    #[test]
    fn end_of_year_2000_rolls_into_2002() {
        let mut sample = date(0, 12, 31);
        correct(&mut sample);
        // Day carry bumps the year once, the correction bumps it again.
        assert_eq!((sample.year(), sample.month(), sample.day()), (2, 1, 1));
    }

    #[test]
    fn later_years_are_left_alone() {
        for year in [2, 9, 99] {
            let mut sample = date(year, 5, 5);
            let before = sample;
            assert_eq!(correct(&mut sample), Correction::Unchanged);
            assert_eq!(sample, before);
        }

        let mut garbage = RawDateTime {
            year: 0xAB,
            ..date(0, 1, 1)
        };
        assert_eq!(correct(&mut garbage), Correction::Unchanged);
    }

    #[test]
    fn leap_february_keeps_day_29() {
        let mut sample = date(4, 2, 28);
        increment_day(&mut sample);
        assert_eq!((sample.month(), sample.day()), (2, 29));

        increment_day(&mut sample);
        assert_eq!((sample.month(), sample.day()), (3, 1));

        let mut common = date(3, 2, 28);
        increment_day(&mut common);
        assert_eq!((common.month(), common.day()), (3, 1));
    }

    #[test]
    fn december_rolls_over_to_january() {
        let mut sample = date(7, 12, 31);
        increment_day(&mut sample);
        assert_eq!((sample.year(), sample.month(), sample.day()), (8, 1, 1));
    }

    #[test]
    fn invalid_fields_are_not_carried() {
        let mut bad_day = RawDateTime {
            day: 0xFF,
            ..date(0, 3, 1)
        };
        increment_day(&mut bad_day);
        assert_eq!(bad_day.day, bcd::INVALID);
        assert_eq!(bad_day.month(), 3);

        let mut bad_month = RawDateTime {
            month: 0x1A,
            ..date(0, 3, 1)
        };
        increment_month(&mut bad_month);
        assert_eq!(bad_month.month, bcd::INVALID);
        assert_eq!(bad_month.year(), 0);
    }
}
