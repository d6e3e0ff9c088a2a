use anyhow::Result;
use owo_colors::OwoColorize;

use crate::render::Render;
use crate::services::Services;

pub async fn run(services: &Services) -> Result<()> {
    let source = services.calendar_source()?;
    source.initialize().await?;

    let calendars = source.get_calendars().await?;
    if calendars.is_empty() {
        println!("{}", format!("No calendars available from {}", source.name()).dimmed());
        return Ok(());
    }

    for calendar in &calendars {
        println!("{}", calendar.render());
    }
    Ok(())
}
