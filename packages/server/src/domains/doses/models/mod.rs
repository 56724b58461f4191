pub mod intake;
pub mod scheduled_dose;

pub use intake::MedicineIntake;
pub use scheduled_dose::{DoseStatus, ScheduledDose};
