//! Google wire types to daybook types.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use daybook_core::error::{DaybookError, DaybookResult};
use daybook_core::{Calendar, Event, EventTime};

use crate::types::{CalendarListEntry, GoogleEvent, GoogleEventTime};

pub const CALENDAR_TITLE: &str = "Google Calendar";
const UNTITLED: &str = "No Title";

fn malformed(field: String, value: &str) -> DaybookError {
    DaybookError::MalformedDate {
        field,
        value: value.to_string(),
    }
}

/// `None` when neither field is set.
fn to_event_time(field: &str, time: &GoogleEventTime) -> DaybookResult<Option<EventTime>> {
    if let Some(raw) = &time.date_time {
        return DateTime::parse_from_rfc3339(raw)
            .map(|dt| Some(EventTime::DateTime(dt.with_timezone(&Utc))))
            .map_err(|_| malformed(format!("{field}.dateTime"), raw));
    }
    match &time.date {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(|date| Some(EventTime::Date(date)))
            .map_err(|_| malformed(format!("{field}.date"), raw)),
        None => Ok(None),
    }
}

pub fn from_google_event(event: GoogleEvent) -> DaybookResult<Event> {
    let start = match &event.start {
        Some(time) => to_event_time("start", time)?,
        None => None,
    };
    let Some(start) = start else {
        return Err(malformed("start".to_string(), ""));
    };

    let end = match &event.end {
        Some(time) => to_event_time("end", time)?,
        None => None,
    };
    let end = end.map(|end| match (&start, end) {
        // All-day ends are exclusive on the wire.
        (EventTime::Date(start_date), EventTime::Date(end_date)) => {
            let last_day = end_date - TimeDelta::days(1);
            EventTime::Date(last_day.max(*start_date))
        }
        (_, end) => end,
    });

    Ok(Event {
        id: event.id,
        title: event
            .summary
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| UNTITLED.to_string()),
        calendar_title: CALENDAR_TITLE.to_string(),
        location: event.location,
        notes: event.description,
        start,
        end,
    })
}

pub fn from_calendar_entry(entry: CalendarListEntry) -> Calendar {
    Calendar {
        title: entry
            .summary_override
            .or(entry.summary)
            .unwrap_or_else(|| entry.id.clone()),
        id: entry.id,
        color: entry.background_color,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn parse(json: &str) -> GoogleEvent {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_timed_event_is_normalised_to_utc() {
        let event = from_google_event(parse(
            r#"{
                "id": "evt1",
                "summary": "Standup",
                "location": "Room 4",
                "description": "Daily sync",
                "start": {"dateTime": "2024-06-10T09:00:00+02:00", "timeZone": "Europe/Paris"},
                "end": {"dateTime": "2024-06-10T09:15:00+02:00"}
            }"#,
        ))
        .unwrap();

        assert_eq!(event.title, "Standup");
        assert_eq!(event.calendar_title, CALENDAR_TITLE);
        assert_eq!(event.location.as_deref(), Some("Room 4"));
        assert_eq!(event.notes.as_deref(), Some("Daily sync"));
        assert_eq!(
            event.start,
            EventTime::DateTime(Utc.with_ymd_and_hms(2024, 6, 10, 7, 0, 0).unwrap())
        );
        assert!(!event.is_all_day());
    }

    #[test]
    fn test_all_day_end_becomes_inclusive() {
        let event = from_google_event(parse(
            r#"{"id": "a", "start": {"date": "2024-06-10"}, "end": {"date": "2024-06-12"}}"#,
        ))
        .unwrap();

        assert!(event.is_all_day());
        assert_eq!(event.title, "No Title");
        assert_eq!(
            event.end,
            Some(EventTime::Date(NaiveDate::from_ymd_opt(2024, 6, 11).unwrap()))
        );
    }

    #[test]
    fn test_single_all_day_event_ends_on_its_day() {
        let event = from_google_event(parse(
            r#"{"id": "a", "summary": "", "start": {"date": "2024-06-10"}, "end": {"date": "2024-06-11"}}"#,
        ))
        .unwrap();

        assert_eq!(event.end, Some(event.start.clone()));
        assert_eq!(event.title, "No Title");
    }

    #[test]
    fn test_event_without_start_is_rejected() {
        let err = from_google_event(parse(r#"{"id": "broken"}"#)).unwrap_err();
        assert!(matches!(err, DaybookError::MalformedDate { ref field, .. } if field == "start"));
    }

    #[test]
    fn test_unreadable_dates_name_the_field() {
        let err = from_google_event(parse(
            r#"{"id": "x", "start": {"dateTime": "tomorrow 9am"}, "end": {"dateTime": "2024-06-10T10:00:00Z"}}"#,
        ))
        .unwrap_err();
        assert!(
            matches!(err, DaybookError::MalformedDate { ref field, ref value } if field == "start.dateTime" && value == "tomorrow 9am")
        );

        let err = from_google_event(parse(
            r#"{"id": "y", "start": {"date": "2024-06-10"}, "end": {"date": "2024/06/11"}}"#,
        ))
        .unwrap_err();
        assert!(matches!(err, DaybookError::MalformedDate { ref field, .. } if field == "end.date"));
    }

    #[test]
    fn test_calendar_entry_prefers_override() {
        let entry: CalendarListEntry = serde_json::from_str(
            r##"{"id": "me@example.com", "summary": "me@example.com", "summaryOverride": "Personal", "backgroundColor": "#9fe1e7", "primary": true}"##,
        )
        .unwrap();

        let calendar = from_calendar_entry(entry);
        assert_eq!(calendar.title, "Personal");
        assert_eq!(calendar.color.as_deref(), Some("#9fe1e7"));
    }
}
