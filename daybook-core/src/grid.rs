//! Month and week grids for calendar views.

use chrono::{Datelike, NaiveDate, TimeDelta, Weekday};
use serde::Serialize;

use crate::date_range::first_of_month;
use crate::event::Event;
use crate::state::CalendarState;

/// Rows × columns of a month view.
pub const MONTH_GRID_CELLS: usize = 6 * 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub is_current_month: bool,
    pub is_today: bool,
    /// Events starting on this day. Padding cells are always empty.
    pub events: Vec<Event>,
}

/// The month around `current_date`, padded with the neighbouring months'
/// days so it starts on `week_start` and always has six full weeks.
pub fn month_grid(state: &CalendarState, week_start: Weekday) -> Vec<CalendarDay> {
    let first = first_of_month(state.current_date());
    let lead = (7 + first.weekday().num_days_from_monday() - week_start.num_days_from_monday()) % 7;
    let grid_start = first - TimeDelta::days(lead as i64);
    let today = state.current_day();

    (0..MONTH_GRID_CELLS as i64)
        .map(|offset| {
            let date = grid_start + TimeDelta::days(offset);
            let is_current_month = date.month() == first.month() && date.year() == first.year();
            CalendarDay {
                date,
                is_current_month,
                is_today: date == today,
                events: if is_current_month {
                    events_on(state, date)
                } else {
                    Vec::new()
                },
            }
        })
        .collect()
}

/// The seven days of the week containing `current_date`, Sunday first.
pub fn week_days(state: &CalendarState) -> Vec<CalendarDay> {
    let current = state.current_date();
    let sunday = current - TimeDelta::days(current.weekday().num_days_from_sunday() as i64);
    let today = state.current_day();

    (0..7)
        .map(|offset| {
            let date = sunday + TimeDelta::days(offset);
            CalendarDay {
                date,
                is_current_month: true,
                is_today: date == today,
                events: events_on(state, date),
            }
        })
        .collect()
}

fn events_on(state: &CalendarState, date: NaiveDate) -> Vec<Event> {
    state
        .events()
        .iter()
        .filter(|e| e.starts_on(date, state.tz()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventTime;
    use chrono::{TimeZone, Utc};
    use chrono_tz::Tz;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn all_day(id: &str, day: NaiveDate) -> Event {
        Event {
            id: id.to_string(),
            title: id.to_string(),
            calendar_title: "Test".to_string(),
            location: None,
            notes: None,
            start: EventTime::Date(day),
            end: Some(EventTime::Date(day)),
        }
    }

    fn state_for(now_day: NaiveDate) -> CalendarState {
        let now = Utc.from_utc_datetime(&now_day.and_hms_opt(12, 0, 0).unwrap());
        CalendarState::new(now, Tz::UTC)
    }

    #[test]
    fn test_month_grid_monday_start() {
        // 2024-05-01 is a Wednesday.
        let state = state_for(date(2024, 5, 15));
        let grid = month_grid(&state, Weekday::Mon);

        assert_eq!(grid.len(), MONTH_GRID_CELLS);
        assert_eq!(grid[0].date, date(2024, 4, 29));
        assert!(!grid[0].is_current_month);
        assert_eq!(grid[2].date, date(2024, 5, 1));
        assert!(grid[2].is_current_month);
        assert_eq!(grid[41].date, date(2024, 6, 9));
        assert_eq!(grid.iter().filter(|d| d.is_current_month).count(), 31);
        assert_eq!(grid.iter().filter(|d| d.is_today).count(), 1);
    }

    #[test]
    fn test_month_grid_sunday_start_without_padding() {
        // 2023-10-01 is a Sunday.
        let state = state_for(date(2023, 10, 9));
        let grid = month_grid(&state, Weekday::Sun);

        assert_eq!(grid[0].date, date(2023, 10, 1));
        assert_eq!(grid[41].date, date(2023, 11, 11));
    }

    #[test]
    fn test_padding_cells_carry_no_events() {
        let mut state = state_for(date(2024, 5, 15));
        state.set_events(
            vec![all_day("april", date(2024, 4, 30)), all_day("may", date(2024, 5, 3))],
            false,
        );

        let grid = month_grid(&state, Weekday::Mon);
        let april_30 = grid.iter().find(|d| d.date == date(2024, 4, 30)).unwrap();
        let may_3 = grid.iter().find(|d| d.date == date(2024, 5, 3)).unwrap();

        assert!(april_30.events.is_empty());
        assert_eq!(may_3.events.len(), 1);
    }

    #[test]
    fn test_week_days_start_on_sunday() {
        // 2024-05-15 is a Wednesday.
        let state = state_for(date(2024, 5, 15));
        let week = week_days(&state);

        assert_eq!(week.len(), 7);
        assert_eq!(week[0].date, date(2024, 5, 12));
        assert_eq!(week[6].date, date(2024, 5, 18));
        assert!(week[3].is_today);
    }
}
