//! Wiring between config, platform and the daybook controllers.
//!
//! The platform is resolved once (command line, then config, then the
//! build target) and picks the calendar source for the whole run.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use daybook_core::clock::{Clock, SystemClock};
use daybook_core::config::DaybookConfig;
use daybook_core::controller::CalendarController;
use daybook_core::lifecycle::Lifecycle;
use daybook_core::reminder::ReminderSource;
use daybook_core::source::{CalendarSource, Capabilities, Platform};
use daybook_core::tasks::TasksController;
use daybook_core::timer::PlatformTimers;
use daybook_provider_apple::bridge::{NativeBridge, UnavailableBridge};
use daybook_provider_apple::{AppleCalendarSource, AppleRemindersSource};
use daybook_provider_google::GoogleCalendarSource;
use daybook_provider_google::token_store::TokenStore;

pub struct Services {
    pub config: DaybookConfig,
    pub capabilities: Capabilities,
    pub tz: Tz,
    pub clock: Arc<dyn Clock>,
    pub lifecycle: Lifecycle,
    timers: PlatformTimers,
}

impl Services {
    pub fn load(platform_override: Option<Platform>) -> Result<Self> {
        let config = DaybookConfig::load()?;
        let platform = match platform_override {
            Some(platform) => platform,
            None => config.platform()?.unwrap_or_else(Platform::detect),
        };
        let capabilities = Capabilities::for_platform(platform);
        let tz = config.timezone()?;
        let lifecycle = Lifecycle::new();
        let timers = PlatformTimers::new(lifecycle.clone(), capabilities.background_catch_up);

        tracing::debug!(%platform, %tz, "services configured");

        Ok(Services {
            config,
            capabilities,
            tz,
            clock: Arc::new(SystemClock),
            lifecycle,
            timers,
        })
    }

    pub fn platform(&self) -> Platform {
        self.capabilities.platform
    }

    pub fn token_store(&self) -> Result<TokenStore> {
        Ok(TokenStore::new(self.config.google_token_path()?))
    }

    // EventKit is only reachable from inside the iOS shell.
    fn bridge(&self) -> Arc<dyn NativeBridge> {
        Arc::new(UnavailableBridge)
    }

    pub fn calendar_source(&self) -> Result<Arc<dyn CalendarSource>> {
        let platform = self.platform();
        let source: Arc<dyn CalendarSource> = match platform {
            Platform::Ios => Arc::new(AppleCalendarSource::new(self.bridge(), platform, self.tz)),
            Platform::Web | Platform::Android => Arc::new(
                GoogleCalendarSource::new(
                    self.token_store()?,
                    self.config.google.api_base_url.as_deref(),
                    platform,
                    self.clock.clone(),
                )
                .context("Failed to set up the Google Calendar client")?,
            ),
        };

        if !source.is_available() {
            tracing::warn!(source = source.name(), %platform, "calendar source reports unavailable");
        }
        Ok(source)
    }

    pub fn reminder_source(&self) -> Option<Arc<dyn ReminderSource>> {
        self.capabilities.native_reminders.then(|| {
            Arc::new(AppleRemindersSource::new(self.bridge(), self.platform()))
                as Arc<dyn ReminderSource>
        })
    }

    pub fn calendar_controller(&self) -> Result<Arc<CalendarController>> {
        Ok(CalendarController::new(
            self.calendar_source()?,
            self.clock.clone(),
            self.tz,
            self.timers.clone(),
            self.config.scheduler_config(),
        ))
    }

    pub fn tasks_controller(&self) -> Arc<TasksController> {
        TasksController::new(
            self.reminder_source(),
            self.clock.clone(),
            self.timers.clone(),
            self.config.tasks_reload_interval(),
        )
    }
}
