/// Day-granular time value as stored in the save: a signed day number plus
/// time of day.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Time {
    pub days: i16,
    pub hours: i8,
    pub minutes: i8,
    pub seconds: i8,
}

/// Result of [`difference`]. Only `days` may stay negative.
pub type ElapsedDuration = Time;

impl Time {
    /// Size of the stored form, including one byte of padding.
    pub const ENCODED_LEN: usize = 6;

    pub const fn new(days: i16, hours: i8, minutes: i8, seconds: i8) -> Self {
        Self {
            days,
            hours,
            minutes,
            seconds,
        }
    }

    pub fn from_le_bytes(bytes: &[u8; Self::ENCODED_LEN]) -> Self {
        Self {
            days: i16::from_le_bytes([bytes[0], bytes[1]]),
            hours: bytes[2] as i8,
            minutes: bytes[3] as i8,
            seconds: bytes[4] as i8,
        }
    }

    pub fn to_le_bytes(&self) -> [u8; Self::ENCODED_LEN] {
        let days = self.days.to_le_bytes();
        [
            days[0],
            days[1],
            self.hours as u8,
            self.minutes as u8,
            self.seconds as u8,
            0,
        ]
    }

    /// Elapsed minutes, ignoring seconds.
    pub const fn total_minutes(&self) -> i32 {
        self.days as i32 * 1440 + self.hours as i32 * 60 + self.minutes as i32
    }
}

/// `to - from`, borrowing seconds into minutes, minutes into hours and hours
/// into days.
pub fn difference(from: &Time, to: &Time) -> ElapsedDuration {
    let mut seconds = to.seconds.wrapping_sub(from.seconds);
    let mut minutes = to.minutes.wrapping_sub(from.minutes);
    let mut hours = to.hours.wrapping_sub(from.hours);
    let mut days = to.days.wrapping_sub(from.days);

    if seconds < 0 {
        seconds = seconds.wrapping_add(60);
        minutes = minutes.wrapping_sub(1);
    }
    if minutes < 0 {
        minutes = minutes.wrapping_add(60);
        hours = hours.wrapping_sub(1);
    }
    if hours < 0 {
        hours = hours.wrapping_add(24);
        days = days.wrapping_sub(1);
    }

    Time {
        days,
        hours,
        minutes,
        seconds,
    }
}

/// True unless the clock moved backwards relative to the reference.
pub const fn is_due(elapsed: &ElapsedDuration) -> bool {
    elapsed.total_minutes() >= 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkpoint_behind_reference_is_not_due() {
        let reference = Time::new(10, 5, 0, 0);
        let checkpoint = Time::new(10, 4, 30, 0);

        let elapsed = difference(&reference, &checkpoint);
        assert_eq!(elapsed, Time::new(-1, 23, 30, 0));
        assert!(!is_due(&elapsed));
    }

    #[test]
    fn checkpoint_at_or_after_reference_is_due() {
        let reference = Time::new(10, 5, 0, 0);
        for checkpoint in [
            Time::new(10, 5, 0, 0),
            Time::new(10, 5, 0, 59),
            Time::new(10, 6, 0, 0),
            Time::new(300, 0, 0, 0),
        ] {
            let elapsed = difference(&reference, &checkpoint);
            assert!(is_due(&elapsed), "{checkpoint:?}");
        }
    }

    #[test]
    fn borrows_cascade_into_days() {
        let from = Time::new(3, 23, 59, 59);
        let to = Time::new(5, 0, 0, 0);
        assert_eq!(difference(&from, &to), Time::new(1, 0, 0, 1));
    }

    #[test]
    fn seconds_regression_borrows_a_minute() {
        let elapsed = difference(&Time::new(1, 0, 0, 30), &Time::new(1, 0, 0, 10));
        assert_eq!(elapsed, Time::new(-1, 23, 59, 40));
        assert!(!is_due(&elapsed));
    }

    #[test]
    fn stored_form_is_little_endian_with_padding() {
        let time = Time::new(-2, 3, 4, 5);
        let bytes = time.to_le_bytes();
        assert_eq!(bytes, [0xFE, 0xFF, 3, 4, 5, 0]);
        assert_eq!(Time::from_le_bytes(&bytes), time);
    }
}
