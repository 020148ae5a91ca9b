//! Domain types and pure notification rules for the Garage push engine.
//!
//! This crate has no I/O. It holds the document models the engine reads,
//! the opt-in and quiet-hours rules, array-diff helpers, the reminder and
//! badge catalogs, and the Czech copy helpers shared by every trigger.

pub mod badges;
pub mod channels;
pub mod clock;
pub mod diff;
pub mod error;
pub mod models;
pub mod notification_types;
pub mod paths;
pub mod quiet_hours;
pub mod reminders;
pub mod settings;
pub mod text;
pub mod types;

pub use error::CoreError;
