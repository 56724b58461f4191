//! Regimen domain - medicines, their recurrence definition and the
//! generator that turns a recurrence into scheduled doses.

pub mod activities;
pub mod data;
pub mod models;
pub mod schedule;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub use data::MedicineInput;
pub use models::Medicine;
pub use schedule::{DoseSchedule, DoseTime, ScheduleError};

/// What a schedule edit does to doses already on record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResyncPolicy {
    /// Drop every dose of the medicine and regenerate the whole range.
    #[default]
    Full,
    /// Keep doses at or before "now"; replace only the future.
    FutureOnly,
}

impl FromStr for ResyncPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "future_only" | "future-only" => Ok(Self::FutureOnly),
            other => Err(format!("unknown resync policy {:?}", other)),
        }
    }
}

impl fmt::Display for ResyncPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => f.write_str("full"),
            Self::FutureOnly => f.write_str("future_only"),
        }
    }
}

#[derive(Debug, Error)]
pub enum RegimenError {
    #[error("medicine not found")]
    NotFound,

    #[error("patient not found")]
    PatientNotFound,

    #[error(transparent)]
    InvalidSchedule(#[from] ScheduleError),

    #[error("{0} must not be empty")]
    MissingField(&'static str),

    #[error("quantities must not be negative")]
    NegativeQuantity,

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
