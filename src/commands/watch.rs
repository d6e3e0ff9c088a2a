use std::sync::Arc;

use anyhow::Result;
use daybook_core::clock::Clock;
use daybook_core::controller::{CalendarController, LoadMode};
use daybook_core::lifecycle::LifecycleEvent;
use daybook_core::tasks::TasksController;
use owo_colors::OwoColorize;

use crate::render::{date_label, panel_row, task_line};
use crate::services::Services;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";
const TASKS_SHOWN: usize = 5;

/// Keep the day panel on screen, redrawing whenever the state changes.
pub async fn run(services: &Services) -> Result<()> {
    let controller = services.calendar_controller()?;
    let tasks = services.tasks_controller();

    let outcome = controller.start(true).await;
    tracing::info!(?outcome, source = controller.source_name(), "watching");
    tasks.load_tasks(LoadMode::Foreground).await;
    tasks.start_auto_reload();

    let mut resume = resume::ResumeSignal::new()?;
    // Subscribed before the first draw so updates made while drawing still wake the loop.
    let mut changes = controller.state().subscribe();
    draw(services, &controller, &tasks);

    loop {
        tokio::select! {
            _ = changes.next() => draw(services, &controller, &tasks),
            _ = resume.recv() => {
                tracing::info!("resumed from stop, catching up timers");
                services.lifecycle.emit(LifecycleEvent::AppStateChange { is_active: true });
                services.lifecycle.emit(LifecycleEvent::VisibilityChange { hidden: false });
                draw(services, &controller, &tasks);
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    tasks.stop_auto_reload();
    controller.stop();
    Ok(())
}

fn draw(services: &Services, controller: &Arc<CalendarController>, tasks: &Arc<TasksController>) {
    let tz = &services.tz;
    let (selected, today, now, loading, error) = controller.state().read(|s| {
        (
            s.selected_date(),
            s.current_day(),
            s.current_time(),
            s.loading(),
            s.error().to_string(),
        )
    });

    let mut out = String::from(CLEAR_SCREEN);
    out.push_str(&format!(
        "{}  {}\n",
        date_label(selected, today).bold(),
        now.with_timezone(tz).format("%H:%M").dimmed()
    ));
    if loading {
        out.push_str(&format!("{}\n", "Loading...".dimmed()));
    }
    if !error.is_empty() {
        out.push_str(&format!("{}\n", error.red()));
    }

    let panel = controller.day_panel();
    if panel.is_empty() {
        out.push_str(&format!("{}\n", "No events".dimmed()));
    }
    for row in &panel {
        out.push_str(&panel_row(row, tz));
        out.push('\n');
    }

    let list = tasks.tasks();
    if !list.is_empty() {
        let clock_now = services.clock.now();
        out.push_str(&format!("\n{}\n", "Tasks".bold()));
        for task in list.iter().take(TASKS_SHOWN) {
            out.push_str(&task_line(task, clock_now, tz));
            out.push('\n');
        }
        if list.len() > TASKS_SHOWN {
            out.push_str(&format!("  {}\n", format!("+{} more", list.len() - TASKS_SHOWN).dimmed()));
        }
    }

    out.push_str(&format!("\n{}", "Ctrl-C to quit".dimmed()));
    println!("{}", out);
}

mod resume {
    use anyhow::Result;

    /// SIGCONT, i.e. the process was brought back after a stop.
    #[cfg(unix)]
    pub struct ResumeSignal(tokio::signal::unix::Signal);

    #[cfg(unix)]
    impl ResumeSignal {
        pub fn new() -> Result<Self> {
            use anyhow::Context;
            use tokio::signal::unix::{SignalKind, signal};

            let sigcont = signal(SignalKind::from_raw(libc::SIGCONT))
                .context("Failed to listen for SIGCONT")?;
            Ok(ResumeSignal(sigcont))
        }

        pub async fn recv(&mut self) {
            self.0.recv().await;
        }
    }

    #[cfg(not(unix))]
    pub struct ResumeSignal;

    #[cfg(not(unix))]
    impl ResumeSignal {
        pub fn new() -> Result<Self> {
            Ok(ResumeSignal)
        }

        pub async fn recv(&mut self) {
            std::future::pending::<()>().await;
        }
    }
}
