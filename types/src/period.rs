//! Calendar-month period keys.
//!
//! A period is the bucket over which `credits_sent_this_month` accumulates.
//! Periods are computed in UTC and render as `YYYY-MM`, the same shape the
//! `student_credits.month_year` column uses.

use chrono::{DateTime, Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Timestamp, TypesError};

/// A calendar month.
///
/// Field order makes the derived `Ord` chronological.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeriodKey {
    year: u16,
    month: u8,
}

impl PeriodKey {
    /// Number of bytes in [`PeriodKey::to_bytes`].
    pub const ENCODED_LEN: usize = 3;

    /// Build a period from a year and a 1-based month.
    pub fn new(year: u16, month: u8) -> Result<Self, TypesError> {
        if !(1..=12).contains(&month) {
            return Err(TypesError::InvalidPeriod(format!("{year:04}-{month:02}")));
        }
        Ok(Self { year, month })
    }

    /// The period containing `ts`.
    pub fn containing(ts: Timestamp) -> Result<Self, TypesError> {
        let secs = i64::try_from(ts.as_secs()).map_err(|_| TypesError::OutOfRange(ts.as_secs()))?;
        let dt = DateTime::from_timestamp(secs, 0).ok_or(TypesError::OutOfRange(ts.as_secs()))?;
        let year = u16::try_from(dt.year()).map_err(|_| TypesError::OutOfRange(ts.as_secs()))?;
        Ok(Self {
            year,
            month: dt.month() as u8,
        })
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    /// The following calendar month.
    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year.saturating_add(1),
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Midnight UTC on the first day of this period.
    pub fn start(&self) -> Timestamp {
        NaiveDate::from_ymd_opt(i32::from(self.year), u32::from(self.month), 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc().timestamp())
            .and_then(|secs| u64::try_from(secs).ok())
            .map(Timestamp::new)
            .unwrap_or(Timestamp::EPOCH)
    }

    /// Whole days from `now` until this period's successor begins.
    pub fn days_until_reset(&self, now: Timestamp) -> u64 {
        let reset = self.next().start();
        reset.as_secs().saturating_sub(now.as_secs()) / 86_400
    }

    /// Sortable binary encoding: big-endian year followed by the month.
    pub fn to_bytes(&self) -> [u8; Self::ENCODED_LEN] {
        let y = self.year.to_be_bytes();
        [y[0], y[1], self.month]
    }

    pub fn from_bytes(bytes: [u8; Self::ENCODED_LEN]) -> Result<Self, TypesError> {
        Self::new(u16::from_be_bytes([bytes[0], bytes[1]]), bytes[2])
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for PeriodKey {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TypesError::InvalidPeriod(s.to_string());
        let (y, m) = s.split_once('-').ok_or_else(invalid)?;
        if y.len() != 4 || m.len() != 2 {
            return Err(invalid());
        }
        let year = y.parse::<u16>().map_err(|_| invalid())?;
        let month = m.parse::<u8>().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2025-03-15T12:00:00Z
    const MID_MARCH: u64 = 1_742_040_000;

    #[test]
    fn containing_picks_calendar_month() {
        let p = PeriodKey::containing(Timestamp::new(MID_MARCH)).unwrap();
        assert_eq!(p.to_string(), "2025-03");
    }

    #[test]
    fn december_rolls_into_january() {
        let dec = PeriodKey::new(2024, 12).unwrap();
        assert_eq!(dec.next(), PeriodKey::new(2025, 1).unwrap());
    }

    #[test]
    fn start_is_first_midnight() {
        let p = PeriodKey::new(2025, 3).unwrap();
        // 2025-03-01T00:00:00Z
        assert_eq!(p.start(), Timestamp::new(1_740_787_200));
        assert_eq!(PeriodKey::containing(p.start()).unwrap(), p);
    }

    #[test]
    fn days_until_reset_counts_whole_days() {
        let p = PeriodKey::new(2025, 3).unwrap();
        // 16.5 days remain until April 1st.
        assert_eq!(p.days_until_reset(Timestamp::new(MID_MARCH)), 16);
    }

    #[test]
    fn parse_round_trip_and_rejects_bad_input() {
        let p: PeriodKey = "2026-10".parse().unwrap();
        assert_eq!(p.year(), 2026);
        assert_eq!(p.month(), 10);
        assert!("2026-13".parse::<PeriodKey>().is_err());
        assert!("2026/10".parse::<PeriodKey>().is_err());
        assert!("26-10".parse::<PeriodKey>().is_err());
    }

    #[test]
    fn byte_encoding_sorts_chronologically() {
        let a = PeriodKey::new(2024, 12).unwrap();
        let b = PeriodKey::new(2025, 1).unwrap();
        assert!(a.to_bytes() < b.to_bytes());
        assert_eq!(PeriodKey::from_bytes(b.to_bytes()).unwrap(), b);
    }
}
