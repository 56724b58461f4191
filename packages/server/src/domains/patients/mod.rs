//! Patient domain - read-only view of the people receiving reminders.

pub mod models;

pub use models::Patient;
