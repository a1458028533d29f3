//! Cycle time module - `YYYYMMDDHH` stamps and hour arithmetic
//!
//! Provides the three operations the housekeeping engine relies on:
//! [`is_valid`], [`diff_hours`] and [`decrement`]. They are thin wrappers over
//! the [`CycleTime`] value type.

use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta, Timelike};
use std::fmt;
use thiserror::Error;

/// Number of characters in a cycle time string
pub const CYCLE_TIME_LEN: usize = 10;

/// Error raised for strings that are not valid cycle times
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CycleTimeError {
    /// Not exactly ten ASCII digits
    #[error("Bad cycle time (expected YYYYMMDDHH): {0}")]
    Malformed(String),

    /// Ten digits, but not a real calendar hour
    #[error("Bad cycle time (no such hour): {0}")]
    OutOfRange(String),

    /// Arithmetic left the representable `YYYYMMDDHH` range
    #[error("Cycle time arithmetic out of range: {base} - {hours}h")]
    Overflow {
        /// Starting cycle time
        base: String,
        /// Hour offset that was applied
        hours: i64,
    },
}

/// A validated cycle time
///
/// Ordering is chronological.
///
/// # Examples
///
/// ```
/// use cyclekeeper_domain::CycleTime;
///
/// let ct: CycleTime = "2008081306".parse().unwrap();
/// assert_eq!(ct.hour(), 6);
/// assert_eq!(ct.to_string(), "2008081306");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CycleTime(NaiveDateTime);

impl CycleTime {
    /// Parse a `YYYYMMDDHH` string
    pub fn parse(s: &str) -> Result<Self, CycleTimeError> {
        if s.len() != CYCLE_TIME_LEN || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CycleTimeError::Malformed(s.to_string()));
        }

        let field = |range: std::ops::Range<usize>| -> Result<u32, CycleTimeError> {
            s[range]
                .parse::<u32>()
                .map_err(|_| CycleTimeError::Malformed(s.to_string()))
        };

        let year = field(0..4)? as i32;
        let month = field(4..6)?;
        let day = field(6..8)?;
        let hour = field(8..10)?;

        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(hour, 0, 0))
            .map(Self)
            .ok_or_else(|| CycleTimeError::OutOfRange(s.to_string()))
    }

    /// Whole hours from `earlier` to `self` (negative if `earlier` is later)
    pub fn hours_since(&self, earlier: &CycleTime) -> i64 {
        (self.0 - earlier.0).num_hours()
    }

    /// This cycle time shifted back by `hours` (forward when negative)
    pub fn minus_hours(&self, hours: i64) -> Result<Self, CycleTimeError> {
        let overflow = || CycleTimeError::Overflow {
            base: self.to_string(),
            hours,
        };

        let shifted = TimeDelta::try_hours(hours)
            .and_then(|delta| self.0.checked_sub_signed(delta))
            .ok_or_else(overflow)?;

        // Keep the result printable as exactly ten digits
        if !(0..=9999).contains(&shifted.year()) {
            return Err(overflow());
        }

        Ok(Self(shifted))
    }

    /// Four-digit year
    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Month of the year (1-12)
    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// Day of the month (1-31)
    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// Hour of the day (0-23)
    pub fn hour(&self) -> u32 {
        self.0.hour()
    }
}

impl fmt::Display for CycleTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}{:02}{:02}{:02}",
            self.year(),
            self.month(),
            self.day(),
            self.hour()
        )
    }
}

impl std::str::FromStr for CycleTime {
    type Err = CycleTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Whether `ctime` is a valid `YYYYMMDDHH` cycle time
pub fn is_valid(ctime: &str) -> bool {
    CycleTime::parse(ctime).is_ok()
}

/// Signed hour difference `later - earlier`
///
/// # Examples
///
/// ```
/// use cyclekeeper_domain::cycle_time::diff_hours;
///
/// assert_eq!(diff_hours("2008080800", "2008080700").unwrap(), 24);
/// assert_eq!(diff_hours("2008080700", "2008080800").unwrap(), -24);
/// ```
pub fn diff_hours(later: &str, earlier: &str) -> Result<i64, CycleTimeError> {
    let later = CycleTime::parse(later)?;
    let earlier = CycleTime::parse(earlier)?;
    Ok(later.hours_since(&earlier))
}

/// `ctime` minus `hours`, formatted as `YYYYMMDDHH`
///
/// # Examples
///
/// ```
/// use cyclekeeper_domain::cycle_time::decrement;
///
/// assert_eq!(decrement("2008080100", 6).unwrap(), "2008073118");
/// ```
pub fn decrement(ctime: &str, hours: i64) -> Result<String, CycleTimeError> {
    Ok(CycleTime::parse(ctime)?.minus_hours(hours)?.to_string())
}
