//! Gregorian calendar helpers over binary (already decoded) fields.

pub const JANUARY: u8 = 1;
pub const FEBRUARY: u8 = 2;
pub const DECEMBER: u8 = 12;

/// Month lengths of a common year.
pub const DAYS_PER_MONTH: [u8; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Years are offsets from 2000, so `0` is a leap year.
pub const fn is_leap_year(year: u16) -> bool {
    (year.is_multiple_of(4) && !year.is_multiple_of(100)) || year.is_multiple_of(400)
}

/// Length of `month` in a common year, `None` for an invalid month.
pub const fn base_days_in_month(month: u8) -> Option<u8> {
    if month == 0 || month > 12 {
        return None;
    }
    Some(DAYS_PER_MONTH[month as usize - 1])
}

/// Length of `month` in `year`, counting 29 February in leap years.
pub const fn days_in_month(month: u8, year: u16) -> Option<u8> {
    match base_days_in_month(month) {
        Some(days) if month == FEBRUARY && is_leap_year(year) => Some(days + 1),
        other => other,
    }
}

/// Day number of a date, with 2000-01-01 as day 1.
///
/// Whole years are counted from year 1, so the leap day of year 0 itself is
/// only added once the date is past February 2000. Matches the count the
/// game stores in its saves.
pub fn day_count(year: u8, month: u8, day: u8) -> Option<u16> {
    if year > 99 || base_days_in_month(month).is_none() || day == 0 || day > 31 {
        return None;
    }

    let mut count: u16 = 0;
    for past_year in (1..year as u16).rev() {
        count += 365;
        if is_leap_year(past_year) {
            count += 1;
        }
    }

    for days in &DAYS_PER_MONTH[..month as usize - 1] {
        count += *days as u16;
    }

    if month > FEBRUARY && is_leap_year(year as u16) {
        count += 1;
    }

    Some(count + day as u16)
}
