//! Classify events on the selected day relative to the live clock.
//!
//! Rules, first match wins:
//! 1. all-day events are [`EventTimeKind::AllDay`];
//! 2. on any day other than today every timed event is `Upcoming`;
//! 3. `start <= now <= end` is `Current`;
//! 4. `end < now` is `Past`;
//! 5. events tied for the earliest start strictly after `now` are `Next`;
//! 6. everything else is `Upcoming`.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::clock::local_date;
use crate::event::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventTimeKind {
    AllDay,
    Past,
    Current,
    Next,
    Upcoming,
}

/// One row of the day panel.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedEvent {
    pub event: Event,
    pub kind: EventTimeKind,
}

pub fn is_current(event: &Event, now: DateTime<Utc>, tz: &Tz) -> bool {
    let start = event.start.instant(tz);
    let end = event.effective_end().instant(tz);
    start <= now && now <= end
}

/// Events tied for the earliest start strictly after `now`.
///
/// All-day events never take part. Returns an empty list when nothing
/// starts in the future.
pub fn next_events<'a>(events: &'a [Event], now: DateTime<Utc>, tz: &Tz) -> Vec<&'a Event> {
    let mut candidates: Vec<&Event> = events
        .iter()
        .filter(|e| !e.is_all_day())
        .filter(|e| e.effective_end().instant(tz) >= now || is_current(e, now, tz))
        .collect();
    candidates.sort_by_key(|e| e.start.instant(tz));

    let Some(first) = candidates.iter().find(|e| e.start.instant(tz) > now) else {
        return Vec::new();
    };
    let next_start = first.start.instant(tz);

    candidates
        .into_iter()
        .filter(|e| e.start.instant(tz) == next_start)
        .collect()
}

pub fn next_event<'a>(events: &'a [Event], now: DateTime<Utc>, tz: &Tz) -> Option<&'a Event> {
    next_events(events, now, tz).into_iter().next()
}

/// Classify one event.
///
/// `day_events` must be the events of `selected_day`; they are only used
/// to resolve the "next" tie group.
pub fn classify(
    event: &Event,
    day_events: &[Event],
    selected_day: NaiveDate,
    now: DateTime<Utc>,
    tz: &Tz,
) -> EventTimeKind {
    let next = next_events(day_events, now, tz);
    classify_with_next(event, &next, selected_day, now, tz)
}

fn classify_with_next(
    event: &Event,
    next: &[&Event],
    selected_day: NaiveDate,
    now: DateTime<Utc>,
    tz: &Tz,
) -> EventTimeKind {
    if event.is_all_day() {
        return EventTimeKind::AllDay;
    }

    if selected_day != local_date(now, tz) {
        return EventTimeKind::Upcoming;
    }

    if is_current(event, now, tz) {
        return EventTimeKind::Current;
    }

    if event.effective_end().instant(tz) < now {
        return EventTimeKind::Past;
    }

    if next.iter().any(|n| n.id == event.id) {
        return EventTimeKind::Next;
    }

    EventTimeKind::Upcoming
}

/// Display order: all-day events first (stable), then timed events by start.
pub fn sort_for_display(events: &mut [Event], tz: &Tz) {
    events.sort_by_key(|e| (!e.is_all_day(), (!e.is_all_day()).then(|| e.start.instant(tz))));
}

/// Filter `events` to `selected_day`, order them for display and classify each.
pub fn classify_day(
    events: &[Event],
    selected_day: NaiveDate,
    now: DateTime<Utc>,
    tz: &Tz,
) -> Vec<ClassifiedEvent> {
    let mut day_events: Vec<Event> = events
        .iter()
        .filter(|e| e.starts_on(selected_day, tz))
        .cloned()
        .collect();
    sort_for_display(&mut day_events, tz);

    let next = next_events(&day_events, now, tz);
    let kinds: Vec<EventTimeKind> = day_events
        .iter()
        .map(|e| classify_with_next(e, &next, selected_day, now, tz))
        .collect();

    day_events
        .into_iter()
        .zip(kinds)
        .map(|(event, kind)| ClassifiedEvent { event, kind })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventTime;
    use chrono::{TimeDelta, TimeZone};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, h, m, 0).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 6).unwrap()
    }

    fn timed(id: &str, start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Event {
        Event {
            id: id.to_string(),
            title: id.to_string(),
            calendar_title: "Work".to_string(),
            location: None,
            notes: None,
            start: EventTime::DateTime(start),
            end: end.map(EventTime::DateTime),
        }
    }

    fn all_day(id: &str, date: NaiveDate) -> Event {
        Event {
            id: id.to_string(),
            title: id.to_string(),
            calendar_title: "Holidays".to_string(),
            location: None,
            notes: None,
            start: EventTime::Date(date),
            end: None,
        }
    }

    #[test]
    fn test_current_past_and_upcoming_today() {
        let now = at(10, 30);
        let events = vec![
            timed("standup", at(9, 0), Some(at(9, 15))),
            timed("review", at(10, 0), Some(at(11, 0))),
            timed("lunch", at(12, 0), Some(at(13, 0))),
            timed("retro", at(15, 0), Some(at(16, 0))),
        ];
        let kind = |id: &str| {
            let e = events.iter().find(|e| e.id == id).unwrap();
            classify(e, &events, today(), now, &Tz::UTC)
        };

        assert_eq!(kind("standup"), EventTimeKind::Past);
        assert_eq!(kind("review"), EventTimeKind::Current);
        assert_eq!(kind("lunch"), EventTimeKind::Next);
        assert_eq!(kind("retro"), EventTimeKind::Upcoming);
    }

    #[test]
    fn test_current_window_is_inclusive() {
        let event = timed("call", at(10, 0), Some(at(11, 0)));
        let events = vec![event.clone()];

        for now in [at(10, 0), at(11, 0)] {
            assert_eq!(
                classify(&event, &events, today(), now, &Tz::UTC),
                EventTimeKind::Current
            );
        }
        assert_eq!(
            classify(&event, &events, today(), at(11, 0) + TimeDelta::seconds(1), &Tz::UTC),
            EventTimeKind::Past
        );
    }

    #[test]
    fn test_event_without_end_is_instant() {
        let event = timed("ping", at(10, 0), None);
        let events = vec![event.clone()];

        assert_eq!(classify(&event, &events, today(), at(10, 0), &Tz::UTC), EventTimeKind::Current);
        assert_eq!(classify(&event, &events, today(), at(10, 1), &Tz::UTC), EventTimeKind::Past);
        assert_eq!(classify(&event, &events, today(), at(9, 59), &Tz::UTC), EventTimeKind::Next);
    }

    #[test]
    fn test_next_ties_are_all_next() {
        let now = at(9, 0);
        let events = vec![
            timed("a", at(10, 0), Some(at(10, 30))),
            timed("b", at(10, 0), Some(at(11, 0))),
            timed("c", at(11, 0), Some(at(12, 0))),
        ];

        let kinds: Vec<_> = events
            .iter()
            .map(|e| classify(e, &events, today(), now, &Tz::UTC))
            .collect();
        assert_eq!(
            kinds,
            vec![EventTimeKind::Next, EventTimeKind::Next, EventTimeKind::Upcoming]
        );
    }

    #[test]
    fn test_no_next_when_nothing_starts_later() {
        let now = at(18, 0);
        let events = vec![timed("late", at(17, 0), Some(at(19, 0)))];

        assert!(next_events(&events, now, &Tz::UTC).is_empty());
        assert_eq!(next_event(&events, now, &Tz::UTC), None);
    }

    #[test]
    fn test_other_days_are_always_upcoming() {
        let tomorrow = today().succ_opt().unwrap();
        let start = Utc.with_ymd_and_hms(2024, 5, 7, 8, 0, 0).unwrap();
        let event = timed("early", start, Some(start + TimeDelta::hours(1)));
        let events = vec![event.clone()];

        // Viewing tomorrow from today: before, during and after its slot.
        for now in [at(0, 0), at(8, 30), at(23, 0)] {
            let kind = classify(&event, &events, tomorrow, now, &Tz::UTC);
            assert_eq!(kind, EventTimeKind::Upcoming);
        }

        // Viewing a past day: its events are never marked past.
        let later = start + TimeDelta::days(2);
        assert_eq!(
            classify(&event, &events, tomorrow, later, &Tz::UTC),
            EventTimeKind::Upcoming
        );
    }

    #[test]
    fn test_all_day_always_all_day() {
        let holiday = all_day("holiday", today());
        let events = vec![holiday.clone()];

        for (selected, now) in [(today(), at(12, 0)), (today().pred_opt().unwrap(), at(23, 0))] {
            assert_eq!(
                classify(&holiday, &events, selected, now, &Tz::UTC),
                EventTimeKind::AllDay
            );
        }
    }

    #[test]
    fn test_classify_day_orders_all_day_first() {
        let events = vec![
            timed("late", at(16, 0), Some(at(17, 0))),
            all_day("holiday", today()),
            timed("early", at(8, 0), Some(at(9, 0))),
            timed("tomorrow", at(8, 0) + TimeDelta::days(1), None),
        ];

        let panel = classify_day(&events, today(), at(12, 0), &Tz::UTC);
        let ids: Vec<_> = panel.iter().map(|c| c.event.id.as_str()).collect();
        assert_eq!(ids, vec!["holiday", "early", "late"]);

        let kinds: Vec<_> = panel.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![EventTimeKind::AllDay, EventTimeKind::Past, EventTimeKind::Next]
        );
    }

    #[test]
    fn test_all_day_group_keeps_input_order() {
        let mut events = vec![
            timed("late", at(16, 0), None),
            all_day("conference", today() + TimeDelta::days(2)),
            timed("early", at(8, 0), None),
            all_day("holiday", today()),
        ];

        sort_for_display(&mut events, &Tz::UTC);
        let ids: Vec<_> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["conference", "holiday", "early", "late"]);
    }
}
