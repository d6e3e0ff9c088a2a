use anyhow::Result;
use daybook_core::clock::Clock;
use daybook_core::controller::LoadMode;
use daybook_core::tasks::{TaskFilter, TaskOrigin, TaskSort};
use owo_colors::OwoColorize;

use crate::render::task_line;
use crate::services::Services;
use crate::utils::tui::create_spinner;

pub async fn run(services: &Services, filter: TaskFilter, sort: TaskSort) -> Result<()> {
    let tasks = services.tasks_controller();

    let spinner = create_spinner("Loading reminders");
    let origin = tasks.load_tasks(LoadMode::Foreground).await;
    spinner.finish_and_clear();

    let error = tasks.error();
    if !error.is_empty() {
        eprintln!("{}", error.yellow());
    }

    match origin {
        Some(TaskOrigin::Native) => println!("{}", "Reminders".bold()),
        _ => println!("{} {}", "Tasks".bold(), "(sample data)".dimmed()),
    }

    let list = tasks.view(&filter, sort);
    if list.is_empty() {
        if filter == TaskFilter::default() {
            println!("{}", "Nothing to do".dimmed());
        } else {
            println!("{}", "No tasks match the filter".dimmed());
        }
        return Ok(());
    }

    let now = services.clock.now();
    for task in &list {
        println!("{}", task_line(task, now, &services.tz));
    }

    let overdue = tasks.overdue_tasks(now).len();
    let tags = tasks.all_tags();
    println!();
    if overdue > 0 {
        println!("{}", format!("{} overdue", overdue).red());
    }
    if !tags.is_empty() {
        println!("{} {}", "Tags:".dimmed(), tags.join(", "));
    }

    Ok(())
}
