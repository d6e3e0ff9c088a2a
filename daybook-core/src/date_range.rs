//! Date range for fetching events.

use chrono::{DateTime, Datelike, Months, NaiveDate, TimeDelta, Utc};
use chrono_tz::Tz;

use crate::clock::local_midnight;

/// Inclusive instant range handed to `fetch_events`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// The whole month containing `anchor`, from the first day at 00:00 to
    /// the last millisecond of the last day, in `tz`.
    pub fn month_of(anchor: NaiveDate, tz: &Tz) -> Self {
        let first = first_of_month(anchor);
        let next_first = first
            .checked_add_months(Months::new(1))
            .unwrap_or(first);

        DateRange {
            start: local_midnight(first, tz),
            end: local_midnight(next_first, tz) - TimeDelta::milliseconds(1),
        }
    }

    /// A single local day.
    pub fn day(date: NaiveDate, tz: &Tz) -> Self {
        let next = date.succ_opt().unwrap_or(date);
        DateRange {
            start: local_midnight(date, tz),
            end: local_midnight(next, tz) - TimeDelta::milliseconds(1),
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Shift to the first day of the month `delta` months away.
pub fn shift_month(date: NaiveDate, delta: i32) -> NaiveDate {
    let first = first_of_month(date);
    let months = Months::new(delta.unsigned_abs());

    let shifted = if delta >= 0 {
        first.checked_add_months(months)
    } else {
        first.checked_sub_months(months)
    };
    shifted.unwrap_or(first)
}

/// Parse YYYY-MM as the first day of that month.
pub fn parse_month(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d")
        .map_err(|_| format!("Invalid month '{}'. Expected YYYY-MM", s))
}

/// Parse YYYY-MM-DD.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date format '{}'. Expected YYYY-MM-DD", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_of_covers_whole_month() {
        let range = DateRange::month_of(date(2024, 2, 14), &Tz::UTC);

        assert_eq!(range.start.to_rfc3339(), "2024-02-01T00:00:00+00:00");
        assert_eq!(range.end.to_rfc3339(), "2024-02-29T23:59:59.999+00:00");
    }

    #[test]
    fn test_month_of_uses_local_boundaries() {
        let berlin: Tz = "Europe/Berlin".parse().unwrap();
        let range = DateRange::month_of(date(2024, 7, 3), &berlin);

        assert_eq!(range.start.to_rfc3339(), "2024-06-30T22:00:00+00:00");
    }

    #[test]
    fn test_shift_month_resets_day_and_crosses_years() {
        assert_eq!(shift_month(date(2024, 1, 31), 1), date(2024, 2, 1));
        assert_eq!(shift_month(date(2024, 1, 15), -1), date(2023, 12, 1));
        assert_eq!(shift_month(date(2024, 12, 5), 1), date(2025, 1, 1));
    }

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("2024-03"), Ok(date(2024, 3, 1)));
        assert!(parse_month("March").is_err());
    }

    #[test]
    fn test_day_range_contains() {
        let range = DateRange::day(date(2024, 3, 1), &Tz::UTC);
        assert!(range.contains(range.start));
        assert!(range.contains(range.end));
        assert!(!range.contains(range.end + TimeDelta::milliseconds(1)));
    }
}
