use anyhow::Result;
use chrono::{NaiveDate, Weekday};
use daybook_core::classify::classify_day;
use daybook_core::grid::month_grid;
use owo_colors::OwoColorize;

use crate::commands::{load_once, print_error_banner};
use crate::render::{self, date_label, panel_row};
use crate::services::Services;

pub async fn run(services: &Services, month: Option<NaiveDate>) -> Result<()> {
    let controller = services.calendar_controller()?;
    if let Some(first) = month {
        controller.state().update(|s| {
            s.set_current_date(first);
            s.set_selected_date(first);
        });
    }

    load_once(&controller).await;

    let (anchor, selected, today, days) = controller.state().read(|s| {
        (
            s.current_date(),
            s.selected_date(),
            s.current_day(),
            month_grid(s, Weekday::Sun),
        )
    });

    for line in render::month_grid(anchor, &days, selected) {
        println!("{}", line);
    }
    print_error_banner(&controller);

    let busy_days: Vec<NaiveDate> = days
        .iter()
        .filter(|d| d.is_current_month && !d.events.is_empty())
        .map(|d| d.date)
        .collect();

    if busy_days.is_empty() {
        println!();
        println!("{}", "No events this month".dimmed());
        return Ok(());
    }

    for date in busy_days {
        let rows = controller
            .state()
            .read(|s| classify_day(s.events(), date, s.current_time(), s.tz()));
        println!();
        println!("{}", date_label(date, today).bold());
        for row in &rows {
            println!("{}", panel_row(row, &services.tz));
        }
    }

    Ok(())
}
