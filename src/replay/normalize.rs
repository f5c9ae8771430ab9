// src/replay/normalize.rs

use crate::cli::LeapDayPolicy;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("{original} falls on Feb 29 but {year} is not a leap year")]
    LeapDay { original: DateTime<Utc>, year: i32 },
}

/// Maps original modification times onto commit dates.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    cutoff: DateTime<Utc>,
    fallback: DateTime<Utc>,
    leap_day: LeapDayPolicy,
}

impl Normalizer {
    /// Cutoff and fallback are taken at midnight UTC.
    pub fn new(cutoff: NaiveDate, fallback: NaiveDate, leap_day: LeapDayPolicy) -> Self {
        Self { cutoff: midnight(cutoff), fallback: midnight(fallback), leap_day }
    }

    /// `None` means the file has no counterpart in the original tree.
    pub fn commit_date(&self, original: Option<DateTime<Utc>>) -> Result<DateTime<Utc>, NormalizeError> {
        match original {
            None => Ok(self.fallback),
            Some(original) if original >= self.cutoff => Ok(original),
            Some(original) => self.telescope(original),
        }
    }

    /// Moves `original` into the cutoff year, keeping month, day and time of day.
    fn telescope(&self, original: DateTime<Utc>) -> Result<DateTime<Utc>, NormalizeError> {
        let year = self.cutoff.year();
        let date = match NaiveDate::from_ymd_opt(year, original.month(), original.day()) {
            Some(date) => date,
            None => match self.leap_day {
                // only Feb 29 can be missing from a year
                LeapDayPolicy::Clamp => NaiveDate::from_ymd_opt(year, 2, 28)
                    .ok_or(NormalizeError::LeapDay { original, year })?,
                LeapDayPolicy::Reject => return Err(NormalizeError::LeapDay { original, year }),
            },
        };
        Ok(Utc.from_utc_datetime(&NaiveDateTime::new(date, original.time())))
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&NaiveDateTime::new(date, NaiveTime::MIN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn normalizer(policy: LeapDayPolicy) -> Normalizer {
        Normalizer::new(
            NaiveDate::from_ymd_opt(2017, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2017, 3, 2).unwrap(),
            policy,
        )
    }

    #[test]
    fn keeps_timestamps_at_or_after_cutoff() {
        let n = normalizer(LeapDayPolicy::Clamp);
        assert_eq!(n.commit_date(Some(at(2017, 3, 1, 0, 0, 0))).unwrap(), at(2017, 3, 1, 0, 0, 0));
        assert_eq!(n.commit_date(Some(at(2019, 6, 5, 14, 2, 9))).unwrap(), at(2019, 6, 5, 14, 2, 9));
    }

    #[test]
    fn pre_cutoff_takes_cutoff_year_and_keeps_the_rest() {
        let n = normalizer(LeapDayPolicy::Clamp);
        for original in [at(2014, 10, 3, 9, 15, 42), at(2016, 12, 31, 23, 59, 59), at(2017, 2, 28, 1, 2, 3)] {
            let date = n.commit_date(Some(original)).unwrap();
            assert_eq!(date.year(), 2017);
            assert_eq!(date.month(), original.month());
            assert_eq!(date.day(), original.day());
            assert_eq!(date.hour(), original.hour());
            assert_eq!(date.minute(), original.minute());
            assert_eq!(date.second(), original.second());
        }
    }

    #[test]
    fn unmatched_files_use_fallback() {
        let n = normalizer(LeapDayPolicy::Clamp);
        assert_eq!(n.commit_date(None).unwrap(), at(2017, 3, 2, 0, 0, 0));
    }

    #[test]
    fn leap_day_clamps_to_feb_28() {
        let n = normalizer(LeapDayPolicy::Clamp);
        assert_eq!(n.commit_date(Some(at(2016, 2, 29, 8, 30, 0))).unwrap(), at(2017, 2, 28, 8, 30, 0));
    }

    #[test]
    fn leap_day_reject_fails() {
        let n = normalizer(LeapDayPolicy::Reject);
        let original = at(2016, 2, 29, 8, 30, 0);
        assert_eq!(
            n.commit_date(Some(original)),
            Err(NormalizeError::LeapDay { original, year: 2017 })
        );
    }

    #[test]
    fn leap_day_survives_a_leap_cutoff_year() {
        let n = Normalizer::new(
            NaiveDate::from_ymd_opt(2020, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2020, 3, 2).unwrap(),
            LeapDayPolicy::Reject,
        );
        assert_eq!(n.commit_date(Some(at(2016, 2, 29, 8, 30, 0))).unwrap(), at(2020, 2, 29, 8, 30, 0));
    }
}
