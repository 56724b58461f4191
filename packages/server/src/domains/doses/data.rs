use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::{DoseStatus, MedicineIntake};
use crate::common::{DoseId, MedicineId};
use crate::domains::regimens::Medicine;

/// Body of a "mark taken" request. Without `scheduled_time` the intake is
/// logged against "now" and no scheduled dose is touched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeRequest {
    #[serde(default)]
    pub scheduled_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeReceipt {
    pub intake: MedicineIntake,
    pub medicine: Medicine,
    /// Whether this intake triggered the low-stock alert.
    pub low_stock: bool,
    /// Whether a scheduled dose was found and marked taken.
    pub dose_updated: bool,
}

/// One row of a patient's schedule for the current local day.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayDose {
    pub dose_id: DoseId,
    pub medicine_id: MedicineId,
    pub medicine_name: String,
    pub dosage: String,
    pub scheduled_at: DateTime<Utc>,
    /// "HH:MM" in the deployment time zone.
    pub local_time: String,
    pub status: DoseStatus,
    pub pills_remaining: i32,
    pub low_stock: bool,
}

/// An intake log row with the medicine it was logged against, if that
/// medicine still exists.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeLogEntry {
    #[serde(flatten)]
    pub intake: MedicineIntake,
    pub medicine: Option<MedicineSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicineSummary {
    pub name: String,
    pub dosage: String,
    pub pills_remaining: i32,
    pub low_stock: bool,
}

impl From<&Medicine> for MedicineSummary {
    fn from(medicine: &Medicine) -> Self {
        Self {
            name: medicine.name.clone(),
            dosage: medicine.dosage.clone(),
            pills_remaining: medicine.pills_remaining,
            low_stock: medicine.is_low_stock(),
        }
    }
}
