//! Dose activities - the intake recorder, the intake log and the daily
//! schedule view.

mod intake_log;
mod record_intake;
mod today_schedule;

pub use intake_log::{intake_log, INTAKE_LOG_LIMIT};
pub use record_intake::record_intake;
pub use today_schedule::today_schedule;
