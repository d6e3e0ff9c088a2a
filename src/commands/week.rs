use anyhow::Result;
use chrono::NaiveDate;
use daybook_core::classify::classify_day;
use daybook_core::grid::week_days;
use owo_colors::OwoColorize;

use crate::commands::{load_once, print_error_banner};
use crate::render::{date_label, panel_row, week_strip};
use crate::services::Services;

pub async fn run(services: &Services, date: Option<NaiveDate>) -> Result<()> {
    let controller = services.calendar_controller()?;
    if let Some(date) = date {
        controller.state().update(|s| {
            s.set_current_date(date);
            s.set_selected_date(date);
        });
    }

    load_once(&controller).await;

    let (selected, today, days) = controller
        .state()
        .read(|s| (s.selected_date(), s.current_day(), week_days(s)));

    if let (Some(first), Some(last)) = (days.first(), days.last()) {
        println!(
            "{}",
            format!("{} - {}", first.date.format("%b %-d"), last.date.format("%b %-d, %Y")).bold()
        );
    }
    for line in week_strip(&days, selected) {
        println!("{}", line);
    }
    print_error_banner(&controller);

    // Only the loaded month has events; days of a neighbouring month show none.
    for day in days.iter().filter(|d| !d.events.is_empty()) {
        let rows = controller
            .state()
            .read(|s| classify_day(s.events(), day.date, s.current_time(), s.tz()));
        println!();
        println!("{}", date_label(day.date, today).bold());
        for row in &rows {
            println!("{}", panel_row(row, &services.tz));
        }
    }

    Ok(())
}
