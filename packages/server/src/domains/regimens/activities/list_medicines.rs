use super::find_owned_medicine;
use crate::common::{MedicineId, PatientId};
use crate::domains::regimens::{Medicine, RegimenError};
use crate::kernel::ServerDeps;

/// Every medicine the patient has, newest first.
pub async fn list_medicines(
    patient_id: PatientId,
    deps: &ServerDeps,
) -> Result<Vec<Medicine>, RegimenError> {
    if deps.regimens.find_patient(patient_id).await?.is_none() {
        return Err(RegimenError::PatientNotFound);
    }
    Ok(deps.regimens.find_medicines_for_patient(patient_id).await?)
}

pub async fn get_medicine(
    patient_id: PatientId,
    medicine_id: MedicineId,
    deps: &ServerDeps,
) -> Result<Medicine, RegimenError> {
    find_owned_medicine(patient_id, medicine_id, deps).await
}
