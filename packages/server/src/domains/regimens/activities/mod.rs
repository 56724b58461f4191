//! Regimen activities - create, read, edit and delete medicines, keeping
//! their scheduled doses in step with the recurrence.

mod create_medicine;
mod delete_medicine;
mod generate;
mod list_medicines;
mod update_medicine;

pub use create_medicine::create_medicine;
pub use delete_medicine::delete_medicine;
pub use generate::{generate_doses, validate_input};
pub use list_medicines::{get_medicine, list_medicines};
pub use update_medicine::update_medicine;

use serde::Serialize;

use crate::common::{MedicineId, PatientId};
use crate::domains::regimens::{Medicine, RegimenError};
use crate::kernel::ServerDeps;

/// Outcome of a regimen write: the stored medicine and what happened to its
/// doses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegimenChange {
    pub medicine: Medicine,
    pub doses_removed: u64,
    pub doses_created: u64,
}

/// Load a medicine and check it belongs to `patient_id`. Someone else's
/// medicine is reported as missing.
pub async fn find_owned_medicine(
    patient_id: PatientId,
    medicine_id: MedicineId,
    deps: &ServerDeps,
) -> Result<Medicine, RegimenError> {
    match deps.regimens.find_medicine(medicine_id).await? {
        Some(medicine) if medicine.patient_id == patient_id => Ok(medicine),
        _ => Err(RegimenError::NotFound),
    }
}
