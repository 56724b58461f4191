// Dose Reminder Engine - API Core
//
// This crate expands medicine regimens into scheduled doses, sweeps them on a
// fixed cadence to send pre-dose reminders and missed-dose alerts, and
// escalates missed doses to caregivers.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
