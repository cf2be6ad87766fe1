use super::{ClockDriver, RawDateTime, STATUS_24_HOUR};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MockClockError {
    NoResponse,
}

/// Scripted clock chip. Starts healthy in 24-hour mode on 2000-01-01.
#[derive(Clone, Debug)]
pub struct MockClock {
    pub probe_code: u8,
    pub status: u8,
    pub date_time: RawDateTime,
    pub responding: bool,
    writes: usize,
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new(RawDateTime::from_binary(0, 1, 1, 0, 0, 0))
    }
}

impl MockClock {
    pub const fn new(date_time: RawDateTime) -> Self {
        Self {
            probe_code: 1,
            status: STATUS_24_HOUR,
            date_time,
            responding: true,
            writes: 0,
        }
    }

    pub const fn with_status(mut self, status: u8) -> Self {
        self.status = status;
        self
    }

    pub const fn with_probe_code(mut self, code: u8) -> Self {
        self.probe_code = code;
        self
    }

    /// Number of `set_date_time` calls seen.
    pub const fn writes(&self) -> usize {
        self.writes
    }

    fn answer(&self) -> Result<(), MockClockError> {
        if self.responding {
            Ok(())
        } else {
            Err(MockClockError::NoResponse)
        }
    }
}

impl ClockDriver for MockClock {
    type Error = MockClockError;

    fn probe(&mut self) -> Result<u8, Self::Error> {
        self.answer()?;
        Ok(self.probe_code)
    }

    fn get_status(&mut self) -> Result<u8, Self::Error> {
        self.answer()?;
        Ok(self.status)
    }

    fn get_date_time(&mut self) -> Result<RawDateTime, Self::Error> {
        self.answer()?;
        Ok(self.date_time)
    }

    fn set_date_time(&mut self, date_time: &RawDateTime) -> Result<(), Self::Error> {
        self.answer()?;
        self.date_time = *date_time;
        self.writes += 1;
        Ok(())
    }
}
