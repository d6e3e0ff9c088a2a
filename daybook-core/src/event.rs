//! Provider-neutral event types.
//!
//! Calendar sources convert their backend records into these types, and
//! everything downstream (state, classification, rendering) works
//! exclusively with them.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::clock::{local_date, local_midnight};

/// A calendar event (provider-neutral)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique within one fetch window, not across providers.
    pub id: String,
    pub title: String,
    /// Name of the source calendar
    pub calendar_title: String,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub start: EventTime,
    /// Absent means a zero-length event at `start`.
    pub end: Option<EventTime>,
}

/// Start or end of an event.
///
/// All-day events carry whole dates and are compared at day granularity.
/// An all-day `end` is the last day covered (inclusive).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventTime {
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
}

impl EventTime {
    /// Instant used for ordering. Dates map to local midnight in `tz`.
    pub fn instant(&self, tz: &Tz) -> DateTime<Utc> {
        match self {
            EventTime::DateTime(dt) => *dt,
            EventTime::Date(date) => local_midnight(*date, tz),
        }
    }

    /// Calendar day in `tz`.
    pub fn date(&self, tz: &Tz) -> NaiveDate {
        match self {
            EventTime::DateTime(dt) => local_date(*dt, tz),
            EventTime::Date(date) => *date,
        }
    }
}

impl Event {
    pub fn is_all_day(&self) -> bool {
        matches!(self.start, EventTime::Date(_))
    }

    /// The end if present, otherwise the start.
    pub fn effective_end(&self) -> &EventTime {
        self.end.as_ref().unwrap_or(&self.start)
    }

    pub fn starts_on(&self, day: NaiveDate, tz: &Tz) -> bool {
        self.start.date(tz) == day
    }

    /// Compares the fields a reload can change. `id` is matched separately.
    pub fn same_content(&self, other: &Event) -> bool {
        self.title == other.title
            && self.start == other.start
            && self.end == other.end
            && self.location == other.location
            && self.notes == other.notes
    }
}

/// A calendar the user can read events from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calendar {
    pub id: String,
    pub title: String,
    pub color: Option<String>,
}

/// Structural equality of two event lists, ignoring order.
///
/// Events are paired up by `id` after sorting both sides.
pub fn same_events(a: &[Event], b: &[Event]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut left: Vec<&Event> = a.iter().collect();
    let mut right: Vec<&Event> = b.iter().collect();
    left.sort_by(|x, y| x.id.cmp(&y.id));
    right.sort_by(|x, y| x.id.cmp(&y.id));

    left.iter()
        .zip(right.iter())
        .all(|(x, y)| x.id == y.id && x.same_content(y))
}
