//! Calendar synchronization.
//!
//! # Responsibility
//! - Define the calendar capability (`CalendarProvider`) and its errors.
//! - Provide the advisory adapter lifecycle code talks to.
//! - Ship concrete providers: Google Calendar, in-memory, disabled.
//!
//! # Invariants
//! - Calendar failures never propagate past `CalendarSyncAdapter`.

pub mod adapter;
pub mod disabled;
pub mod google;
pub mod memory;
pub mod provider;
