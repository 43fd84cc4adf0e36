//! # Business Calendar
//!
//! Maps instants to the store's business day and back.
//!
//! Order numbers, receipt numbers, "today" filters and daily reports all
//! count by the store's local day, not by UTC. The store runs on a fixed UTC
//! offset (no DST), configured once.
//!
//! ```text
//! utc_offset = +01:00
//!
//!   2026-02-06T23:30Z  ──► local 2026-02-07 00:30 ──► business day 2026-02-07
//!
//!   day_bounds(2026-02-07) = [2026-02-06T23:00Z, 2026-02-07T23:00Z)
//! ```

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, Months, NaiveDate, NaiveTime, Offset, Utc,
};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::DateFilter;
use crate::validation::ValidationResult;

/// A half-open interval of instants, `[from, until)`. Open ends are `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl TimeRange {
    pub fn between(from: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        TimeRange {
            from: Some(from),
            until: Some(until),
        }
    }

    /// No bounds at all.
    pub fn unbounded() -> Self {
        TimeRange::default()
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.from.map_or(true, |f| instant >= f) && self.until.map_or(true, |u| instant < u)
    }
}

/// Business-day arithmetic for a store at a fixed UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessCalendar {
    offset: FixedOffset,
}

impl Default for BusinessCalendar {
    fn default() -> Self {
        BusinessCalendar::utc()
    }
}

impl BusinessCalendar {
    /// Calendar for a store `minutes` east of UTC (negative for west).
    ///
    /// Rejects offsets of a day or more.
    pub fn from_offset_minutes(minutes: i32) -> ValidationResult<Self> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(|offset| BusinessCalendar { offset })
            .ok_or(ValidationError::OutOfRange {
                field: "utc_offset_minutes".to_string(),
                min: -1439,
                max: 1439,
            })
    }

    pub fn utc() -> Self {
        BusinessCalendar {
            offset: Utc.fix(),
        }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// The business day containing `instant`.
    pub fn day_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    /// First instant of `day`.
    pub fn day_start(&self, day: NaiveDate) -> DateTime<Utc> {
        let local_midnight = day.and_time(NaiveTime::MIN);
        let utc = local_midnight - Duration::seconds(self.offset.local_minus_utc() as i64);
        DateTime::from_naive_utc_and_offset(utc, Utc)
    }

    /// `[start of day, start of next day)`.
    pub fn day_bounds(&self, day: NaiveDate) -> TimeRange {
        let start = self.day_start(day);
        TimeRange::between(start, start + Duration::days(1))
    }

    /// Bounds of the business day containing `now`.
    pub fn today_bounds(&self, now: DateTime<Utc>) -> TimeRange {
        self.day_bounds(self.day_of(now))
    }

    /// Inclusive range of business days. `start > end` is rejected.
    pub fn range_bounds(&self, start: NaiveDate, end: NaiveDate) -> ValidationResult<TimeRange> {
        if start > end {
            return Err(ValidationError::inconsistent(
                "date range",
                "start date must not be after end date",
            ));
        }
        let from = self.day_start(start);
        let until = self.day_start(end) + Duration::days(1);
        Ok(TimeRange::between(from, until))
    }

    /// The last `days` business days, today included.
    pub fn trailing_days(&self, now: DateTime<Utc>, days: u32) -> TimeRange {
        let today = self.day_of(now);
        let first = today - Duration::days(days.max(1) as i64 - 1);
        let until = self.day_start(today) + Duration::days(1);
        TimeRange::between(self.day_start(first), until)
    }

    /// The calendar month containing `now`.
    pub fn month_bounds(&self, now: DateTime<Utc>) -> TimeRange {
        let today = self.day_of(now);
        let first = today.with_day(1).unwrap_or(today);
        let next = first
            .checked_add_months(Months::new(1))
            .unwrap_or(first + Duration::days(31));
        TimeRange::between(self.day_start(first), self.day_start(next))
    }

    /// Turns a listing's date filter into an instant range.
    ///
    /// ## Precedence
    /// 1. `today`
    /// 2. `date`
    /// 3. `start_date` / `end_date`, either end optional
    pub fn resolve(&self, filter: &DateFilter, now: DateTime<Utc>) -> ValidationResult<TimeRange> {
        if filter.today {
            return Ok(self.today_bounds(now));
        }

        if let Some(date) = filter.date {
            return Ok(self.day_bounds(date));
        }

        match (filter.start_date, filter.end_date) {
            (Some(start), Some(end)) => self.range_bounds(start, end),
            (Some(start), None) => Ok(TimeRange {
                from: Some(self.day_start(start)),
                until: None,
            }),
            (None, Some(end)) => Ok(TimeRange {
                from: None,
                until: Some(self.day_start(end) + Duration::days(1)),
            }),
            (None, None) => Ok(TimeRange::unbounded()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_day_of_respects_offset() {
        let lagos = BusinessCalendar::from_offset_minutes(60).unwrap();
        let late = Utc.with_ymd_and_hms(2026, 2, 6, 23, 30, 0).unwrap();

        assert_eq!(BusinessCalendar::utc().day_of(late), date(2026, 2, 6));
        assert_eq!(lagos.day_of(late), date(2026, 2, 7));
    }

    #[test]
    fn test_day_bounds() {
        let lagos = BusinessCalendar::from_offset_minutes(60).unwrap();
        let range = lagos.day_bounds(date(2026, 2, 7));

        assert_eq!(range.from, Some(Utc.with_ymd_and_hms(2026, 2, 6, 23, 0, 0).unwrap()));
        assert_eq!(range.until, Some(Utc.with_ymd_and_hms(2026, 2, 7, 23, 0, 0).unwrap()));
        assert!(range.contains(Utc.with_ymd_and_hms(2026, 2, 7, 22, 59, 59).unwrap()));
        assert!(!range.contains(Utc.with_ymd_and_hms(2026, 2, 7, 23, 0, 0).unwrap()));
    }

    #[test]
    fn test_invalid_offset() {
        assert!(BusinessCalendar::from_offset_minutes(24 * 60).is_err());
        assert!(BusinessCalendar::from_offset_minutes(-330).is_ok());
    }

    #[test]
    fn test_range_rejects_reversed_dates() {
        let cal = BusinessCalendar::utc();
        assert!(cal.range_bounds(date(2026, 2, 8), date(2026, 2, 7)).is_err());

        let range = cal.range_bounds(date(2026, 2, 7), date(2026, 2, 7)).unwrap();
        assert_eq!(range, cal.day_bounds(date(2026, 2, 7)));
    }

    #[test]
    fn test_resolve_precedence() {
        let cal = BusinessCalendar::utc();
        let now = Utc.with_ymd_and_hms(2026, 2, 7, 12, 0, 0).unwrap();

        let filter = DateFilter {
            today: true,
            date: Some(date(2026, 1, 1)),
            ..Default::default()
        };
        assert_eq!(cal.resolve(&filter, now).unwrap(), cal.day_bounds(date(2026, 2, 7)));

        let filter = DateFilter {
            start_date: Some(date(2026, 2, 1)),
            ..Default::default()
        };
        let range = cal.resolve(&filter, now).unwrap();
        assert_eq!(range.until, None);
        assert!(range.contains(now));

        assert_eq!(
            cal.resolve(&DateFilter::default(), now).unwrap(),
            TimeRange::unbounded()
        );
    }

    #[test]
    fn test_trailing_and_month() {
        let cal = BusinessCalendar::utc();
        let now = Utc.with_ymd_and_hms(2026, 2, 7, 12, 0, 0).unwrap();

        let week = cal.trailing_days(now, 7);
        assert_eq!(week.from, Some(Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap()));
        assert_eq!(week.until, Some(Utc.with_ymd_and_hms(2026, 2, 8, 0, 0, 0).unwrap()));

        let month = cal.month_bounds(now);
        assert_eq!(month.from, Some(Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap()));
        assert_eq!(month.until, Some(Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()));
    }
}
