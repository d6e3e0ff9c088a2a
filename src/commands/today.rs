use anyhow::Result;
use chrono::NaiveDate;
use daybook_core::classify::EventTimeKind;
use daybook_core::{Event, EventTime};
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::commands::{load_once, print_error_banner};
use crate::render::{date_label, panel_row};
use crate::services::Services;

#[derive(Serialize)]
struct PanelEntry<'a> {
    #[serde(flatten)]
    event: &'a Event,
    kind: EventTimeKind,
}

pub async fn run(services: &Services, date: Option<NaiveDate>, json: bool) -> Result<()> {
    let controller = services.calendar_controller()?;
    if let Some(date) = date {
        controller.state().update(|s| {
            s.set_current_date(date);
            s.set_selected_date(date);
        });
    }

    load_once(&controller).await;
    let panel = controller.day_panel();

    if json {
        let entries: Vec<PanelEntry> = panel
            .iter()
            .map(|row| PanelEntry {
                event: &row.event,
                kind: row.kind,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        print_error_banner(&controller);
        return Ok(());
    }

    let (selected, today) = controller
        .state()
        .read(|s| (s.selected_date(), s.current_day()));

    println!("{}", date_label(selected, today).bold());
    print_error_banner(&controller);

    if panel.is_empty() {
        println!("{}", "No events".dimmed());
        return Ok(());
    }

    for row in &panel {
        println!("{}", panel_row(row, &services.tz));
    }

    if selected == today
        && let Some(next) = controller.next_upcoming_event()
        && let EventTime::DateTime(start) = next.start
    {
        println!();
        println!(
            "{} {} at {}",
            "Up next:".dimmed(),
            next.title,
            start.with_timezone(&services.tz).format("%H:%M")
        );
    }

    Ok(())
}
