//! Reminder domain - the periodic sweep that sends pre-reminders and
//! missed-dose alerts, and the messages it sends.

pub mod sweep;
pub mod templates;
pub mod window;

pub use sweep::{run_sweep, DoseFailure, PassReport, SweepReport};
pub use templates::Message;
pub use window::{SweepWindows, Window};
