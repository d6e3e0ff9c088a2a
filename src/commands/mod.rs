pub mod auth;
pub mod calendars;
pub mod month;
pub mod notes;
pub mod tasks;
pub mod today;
pub mod watch;
pub mod week;

use std::sync::Arc;

use daybook_core::controller::{CalendarController, LoadOutcome};
use owo_colors::OwoColorize;

use crate::utils::tui::create_spinner;

/// Initialize the source and load the visible month behind a spinner.
///
/// Timers are disarmed again before returning; one-shot commands only
/// need the loaded state.
pub async fn load_once(controller: &Arc<CalendarController>) -> LoadOutcome {
    let spinner = create_spinner(format!("Loading {} events", controller.source_name()));
    let outcome = controller.start(false).await;
    controller.stop();
    spinner.finish_and_clear();
    outcome
}

/// Print the state's error banner, if any. Returns whether one was shown.
pub fn print_error_banner(controller: &CalendarController) -> bool {
    let error = controller.state().read(|s| s.error().to_string());
    if error.is_empty() {
        return false;
    }
    eprintln!("{}", error.red());
    true
}
