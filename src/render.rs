//! Colored terminal rendering for daybook types.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use daybook_core::classify::{ClassifiedEvent, EventTimeKind};
use daybook_core::grid::CalendarDay;
use daybook_core::notes::Note;
use daybook_core::reminder::{Task, TaskPriority};
use daybook_core::{Calendar, Event, EventTime};
use owo_colors::OwoColorize;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for Calendar {
    fn render(&self) -> String {
        match &self.color {
            Some(color) => format!("📅 {} {}", self.title, color.dimmed()),
            None => format!("📅 {}", self.title),
        }
    }
}

impl Render for TaskPriority {
    fn render(&self) -> String {
        match self {
            TaskPriority::High => "!!!".red().to_string(),
            TaskPriority::Medium => "!! ".yellow().to_string(),
            TaskPriority::Low => "!  ".dimmed().to_string(),
        }
    }
}

/// A task line. Overdue due dates are shown in red.
pub fn task_line(task: &Task, now: DateTime<Utc>, tz: &Tz) -> String {
    let mut line = format!("  {} {}", task.priority.render(), task.title);

    if let Some(due) = task.due_date {
        let label = format!("due {}", due.with_timezone(tz).format("%a %b %-d"));
        if task.is_overdue(now) {
            line.push_str(&format!(" {}", label.red()));
        } else {
            line.push_str(&format!(" {}", label.dimmed()));
        }
    }
    for tag in &task.tags {
        line.push_str(&format!(" {}", format!("#{tag}").blue()));
    }
    line
}

/// Format the time portion of an event (e.g. "15:00" or "all-day")
fn format_time(time: &EventTime, tz: &Tz) -> String {
    match time {
        EventTime::Date(_) => "all-day".to_string(),
        EventTime::DateTime(dt) => format!("{:>7}", dt.with_timezone(tz).format("%H:%M")),
    }
}

fn time_span(event: &Event, tz: &Tz) -> String {
    match (&event.start, &event.end) {
        (EventTime::DateTime(_), Some(end @ EventTime::DateTime(_))) => {
            format!("{}-{}", format_time(&event.start, tz), format_time(end, tz).trim_start())
        }
        (start, _) => format_time(start, tz),
    }
}

/// One row of the day panel, colored by its classification.
pub fn panel_row(row: &ClassifiedEvent, tz: &Tz) -> String {
    let event = &row.event;
    let time = time_span(event, tz);
    let title = match row.kind {
        EventTimeKind::AllDay => event.title.purple().to_string(),
        EventTimeKind::Past => event.title.dimmed().to_string(),
        EventTimeKind::Current => format!("{} {}", event.title.yellow().bold(), "(now)".yellow()),
        EventTimeKind::Next => format!("{} {}", event.title.green().bold(), "(next)".green()),
        EventTimeKind::Upcoming => event.title.blue().to_string(),
    };

    let mut line = format!("  {:<13} {}", time, title);
    if let Some(location) = &event.location {
        line.push_str(&format!(" {}", format!("@ {location}").dimmed()));
    }
    line.push_str(&format!(" {}", format!("[{}]", event.calendar_title).dimmed()));
    line
}

/// Format a date as a human-readable label (e.g. "Today", "Tomorrow", "Wed Feb 25")
pub fn date_label(date: NaiveDate, today: NaiveDate) -> String {
    match (date - today).num_days() {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        -1 => "Yesterday".to_string(),
        _ => date.format("%a %b %-d").to_string(),
    }
}

const WEEKDAY_HEADER: &str = "Su  Mo  Tu  We  Th  Fr  Sa";

/// Six-week month grid. Days with events are marked, today is highlighted.
pub fn month_grid(anchor: NaiveDate, days: &[CalendarDay], selected: NaiveDate) -> Vec<String> {
    let mut lines = vec![
        format!("{}", anchor.format("%B %Y").bold()),
        WEEKDAY_HEADER.dimmed().to_string(),
    ];

    for week in days.chunks(7) {
        let cells: Vec<String> = week.iter().map(|day| grid_cell(day, selected)).collect();
        lines.push(cells.join(" "));
    }
    lines
}

fn grid_cell(day: &CalendarDay, selected: NaiveDate) -> String {
    let number = format!("{:>2}", day.date.format("%-d"));
    let marker = if day.events.is_empty() { " " } else { "•" };

    let number = if !day.is_current_month {
        number.dimmed().to_string()
    } else if day.is_today {
        number.black().on_yellow().to_string()
    } else if day.date == selected {
        number.underline().to_string()
    } else {
        number
    };
    format!("{}{}", number, marker.green())
}

/// One line per day of the week: weekday and day number, then an event count.
pub fn week_strip(days: &[CalendarDay], selected: NaiveDate) -> Vec<String> {
    days.iter()
        .map(|day| {
            let label = format!("{} {:>2}", day.date.format("%a"), day.date.format("%-d"));
            let label = if day.is_today {
                label.black().on_yellow().to_string()
            } else if day.date == selected {
                label.underline().to_string()
            } else {
                label
            };
            match day.events.len() {
                0 => format!("{} {}", label, "-".dimmed()),
                1 => format!("{} {}", label, "1 event".green()),
                n => format!("{} {}", label, format!("{n} events").green()),
            }
        })
        .collect()
}

/// A note: pin marker and title, indented content, then tags.
pub fn note_block(note: &Note, tz: &Tz) -> Vec<String> {
    let pin = if note.is_pinned { "📌" } else { "  " };
    let edited = note.updated_at.with_timezone(tz).format("%a %b %-d");
    let mut lines = vec![format!("{} {} {}", pin, note.title.bold(), edited.dimmed())];
    lines.extend(note.content.lines().map(|line| format!("   {line}")));
    if !note.tags.is_empty() {
        let tags: Vec<String> = note.tags.iter().map(|t| format!("#{t}")).collect();
        lines.push(format!("   {}", tags.join(" ").blue()));
    }
    lines
}
