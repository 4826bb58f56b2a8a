//! Modification times for TAR entries.
//!
//! ZIP stores a DOS wall-clock timestamp without a zone; TAR wants seconds
//! since the epoch. [`TimestampResolver`] bridges the two according to a
//! [`TimestampPolicy`].

use std::fmt;

use chrono::{
    DateTime, FixedOffset, Local, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeDelta,
    TimeZone, Utc,
};

use crate::error::{Error, Result};

/// Timestamp as stored in a ZIP header: local wall-clock time, 2 second
/// resolution, no zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredTimestamp {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl StoredTimestamp {
    /// Decode the MS-DOS date and time words of a ZIP header.
    pub fn from_dos(date: u16, time: u16) -> Self {
        Self {
            year: ((date >> 9) & 0x7F) + 1980,
            month: ((date >> 5) & 0x0F) as u8,
            day: (date & 0x1F) as u8,
            hour: ((time >> 11) & 0x1F) as u8,
            minute: ((time >> 5) & 0x3F) as u8,
            second: ((time & 0x1F) * 2) as u8,
        }
    }

    /// Wall-clock time with out-of-range fields carried over the way C
    /// `mktime` does: month 0 is December of the year before, day 0 the last
    /// day of the previous month, second 60 the next minute. Some writers
    /// store an all-zero DOS date, which lands on 1979-11-30.
    fn to_naive(self) -> Option<NaiveDateTime> {
        let months = i32::from(self.year) * 12 + i32::from(self.month) - 1;
        let month = u32::try_from(months.rem_euclid(12)).ok()? + 1;
        let first = NaiveDate::from_ymd_opt(months.div_euclid(12), month, 1)?;
        let midnight = first
            .checked_add_signed(TimeDelta::days(i64::from(self.day) - 1))?
            .and_hms_opt(0, 0, 0)?;
        let seconds = i64::from(self.hour) * 3600
            + i64::from(self.minute) * 60
            + i64::from(self.second);
        midnight.checked_add_signed(TimeDelta::seconds(seconds))
    }
}

impl fmt::Display for StoredTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// What modification time to record for each TAR entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampPolicy {
    /// Use the timestamp stored in the ZIP.
    #[default]
    FromSource,
    /// Record no time; readers show the epoch.
    Suppressed,
    /// Use one explicit instant for every entry. Instants before the epoch
    /// behave like [`TimestampPolicy::Suppressed`].
    Fixed(DateTime<Utc>),
}

/// The zone a stored wall-clock timestamp is interpreted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceTimezone {
    /// The zone of the running process, the usual ZIP convention.
    #[default]
    Local,
    Fixed(FixedOffset),
}

impl SourceTimezone {
    pub fn utc() -> Self {
        SourceTimezone::Fixed(Utc.fix())
    }

    fn epoch_seconds(self, naive: NaiveDateTime) -> Option<i64> {
        match self {
            SourceTimezone::Local => epoch_in(&Local, naive),
            SourceTimezone::Fixed(offset) => epoch_in(&offset, naive),
        }
    }
}

fn epoch_in<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<i64> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(t) => Some(t.timestamp()),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.timestamp()),
        LocalResult::None => {
            // Skipped by a DST change: 02:30 in a one hour gap becomes 03:30.
            let shifted = naive.checked_add_signed(TimeDelta::hours(1))?;
            tz.from_local_datetime(&shifted).earliest().map(|t| t.timestamp())
        }
    }
}

/// Applies a [`TimestampPolicy`] to stored entry timestamps.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampResolver {
    policy: TimestampPolicy,
    zone: SourceTimezone,
}

impl TimestampResolver {
    pub fn new(policy: TimestampPolicy, zone: SourceTimezone) -> Self {
        Self { policy, zone }
    }

    /// Resolve the mtime for entry `name`.
    ///
    /// `None` means no mtime is recorded and the header carries zero.
    ///
    /// # Errors
    ///
    /// [`Error::TimestampInvalid`] under [`TimestampPolicy::FromSource`] when
    /// the stored time cannot be placed on the time line at or after the
    /// epoch. `name` only feeds the error message.
    pub fn resolve(&self, name: &str, stored: &StoredTimestamp) -> Result<Option<u64>> {
        match self.policy {
            TimestampPolicy::Suppressed => Ok(None),
            TimestampPolicy::Fixed(instant) => Ok(u64::try_from(instant.timestamp()).ok()),
            TimestampPolicy::FromSource => {
                let invalid = |detail: String| Error::TimestampInvalid {
                    name: name.to_string(),
                    detail,
                };

                let naive = stored
                    .to_naive()
                    .ok_or_else(|| invalid(format!("{stored} is out of the calendar range")))?;
                let seconds = self
                    .zone
                    .epoch_seconds(naive)
                    .ok_or_else(|| invalid(format!("{stored} does not exist in the source zone")))?;
                u64::try_from(seconds)
                    .map(Some)
                    .map_err(|_| invalid(format!("{stored} is before the epoch")))
            }
        }
    }
}
