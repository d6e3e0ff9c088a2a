//! Apple Calendar and Apple Reminders sources for daybook.
//!
//! Both talk to EventKit through a [`bridge::NativeBridge`] supplied by the
//! iOS shell. Elsewhere [`bridge::UnavailableBridge`] stands in and every
//! permission request is refused.

pub mod bridge;
pub mod calendar;
pub mod iso;
pub mod reminders;

pub use calendar::AppleCalendarSource;
pub use reminders::AppleRemindersSource;

use daybook_core::error::DaybookError;

/// Bridge call failures are transient from the caller's point of view.
pub(crate) fn bridge_error(err: anyhow::Error) -> DaybookError {
    DaybookError::Transient(format!("native bridge error: {:#}", err))
}
