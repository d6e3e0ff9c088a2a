//! Core of daybook.
//!
//! This crate holds everything that does not depend on a particular
//! calendar backend:
//! - `Event` and related types, plus time classification of a day's events
//! - the shared calendar state and the controller that loads it
//! - the refresh scheduler and the platform timer shim it runs on
//! - calendar and reminder source traits, tasks, notes and configuration

pub mod classify;
pub mod clock;
pub mod config;
pub mod controller;
pub mod date_range;
pub mod error;
pub mod event;
pub mod grid;
pub mod lifecycle;
pub mod notes;
pub mod reminder;
pub mod scheduler;
pub mod source;
pub mod state;
pub mod tasks;
pub mod timer;

// Re-export all event types at crate root for convenience
pub use event::*;
