//! Dose domain - scheduled dose occurrences, the intake log and the intake
//! recorder that marks doses taken.

pub mod activities;
pub mod data;
pub mod models;

use thiserror::Error;

pub use data::{IntakeLogEntry, IntakeReceipt, IntakeRequest, MedicineSummary, TodayDose};
pub use models::{DoseStatus, MedicineIntake, ScheduledDose};

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("medicine not found")]
    NotFound,

    #[error("patient not found")]
    PatientNotFound,

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
