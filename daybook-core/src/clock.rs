//! Wall-clock access and local-day arithmetic.
//!
//! Everything that needs "now" goes through [`Clock`], so the scheduler can
//! run against tokio's paused clock in tests. Day boundaries are always
//! computed in an explicit IANA time zone.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use std::time::Duration;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The operating system's wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A wall clock that starts at `anchor` and advances with tokio's clock.
///
/// Under `#[tokio::test(start_paused = true)]` it only moves when the test
/// advances time, which makes midnight rollovers reproducible.
#[derive(Debug, Clone)]
pub struct AnchoredClock {
    anchor: DateTime<Utc>,
    started: tokio::time::Instant,
}

impl AnchoredClock {
    pub fn new(anchor: DateTime<Utc>) -> Self {
        AnchoredClock {
            anchor,
            started: tokio::time::Instant::now(),
        }
    }
}

impl Clock for AnchoredClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = TimeDelta::from_std(self.started.elapsed()).unwrap_or_default();
        self.anchor + elapsed
    }
}

/// Calendar day of `instant` as seen in `tz`.
pub fn local_date(instant: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    instant.with_timezone(tz).date_naive()
}

/// First instant of `date` in `tz`.
///
/// When midnight falls inside a DST gap the day starts at the first valid
/// local time after it.
pub fn local_midnight(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);

    (0..=3)
        .find_map(|hours| {
            tz.from_local_datetime(&(midnight + TimeDelta::hours(hours)))
                .earliest()
        })
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| midnight.and_utc())
}

/// Time left until the next local midnight after `now`.
///
/// Computed from calendar arithmetic rather than a fixed 24h period, so
/// 23- and 25-hour DST days land on the real boundary.
pub fn until_next_midnight(now: DateTime<Utc>, tz: &Tz) -> Duration {
    let today = local_date(now, tz);
    let next_day = today.succ_opt().unwrap_or(today);

    (local_midnight(next_day, tz) - now)
        .to_std()
        .unwrap_or(Duration::ZERO)
}

/// Whether `date` is the last day of its month.
pub fn is_last_day_of_month(date: NaiveDate) -> bool {
    date.succ_opt()
        .map(|next| next.month0() != date.month0())
        .unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_until_next_midnight_utc() {
        let now = utc("2024-01-31T23:59:59Z");
        assert_eq!(until_next_midnight(now, &Tz::UTC), Duration::from_secs(1));
    }

    #[test]
    fn test_local_date_respects_timezone() {
        let now = utc("2024-03-01T03:00:00Z");
        let ny: Tz = "America/New_York".parse().unwrap();

        assert_eq!(local_date(now, &Tz::UTC), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(local_date(now, &ny), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn test_until_next_midnight_on_short_dst_day() {
        // 2024-03-10 is 23 hours long in New York.
        let ny: Tz = "America/New_York".parse().unwrap();
        let local_start = local_midnight(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(), &ny);

        assert_eq!(
            until_next_midnight(local_start, &ny),
            Duration::from_secs(23 * 3600)
        );
    }

    #[test]
    fn test_until_next_midnight_on_long_dst_day() {
        // 2024-11-03 is 25 hours long in New York.
        let ny: Tz = "America/New_York".parse().unwrap();
        let local_start = local_midnight(NaiveDate::from_ymd_opt(2024, 11, 3).unwrap(), &ny);

        assert_eq!(
            until_next_midnight(local_start, &ny),
            Duration::from_secs(25 * 3600)
        );
    }

    #[test]
    fn test_midnight_inside_dst_gap() {
        // Santiago skips 00:00-01:00 when DST starts.
        let santiago: Tz = "America/Santiago".parse().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 9, 8).unwrap();
        let start = local_midnight(date, &santiago);

        assert_eq!(local_date(start, &santiago), date);
        assert_eq!(start.with_timezone(&santiago).format("%H:%M").to_string(), "01:00");
    }

    #[test]
    fn test_is_last_day_of_month() {
        assert!(is_last_day_of_month(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()));
        assert!(is_last_day_of_month(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()));
        assert!(!is_last_day_of_month(NaiveDate::from_ymd_opt(2023, 2, 27).unwrap()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_anchored_clock_follows_tokio_time() {
        let clock = AnchoredClock::new(utc("2024-01-31T23:59:59Z"));
        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(clock.now(), utc("2024-02-01T00:00:01Z"));
    }
}
