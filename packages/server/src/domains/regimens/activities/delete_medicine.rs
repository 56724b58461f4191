use tracing::info;

use super::find_owned_medicine;
use crate::common::{MedicineId, PatientId};
use crate::domains::regimens::RegimenError;
use crate::kernel::ServerDeps;

/// Delete a regimen together with all of its doses. Returns how many doses
/// went with it.
pub async fn delete_medicine(
    patient_id: PatientId,
    medicine_id: MedicineId,
    deps: &ServerDeps,
) -> Result<u64, RegimenError> {
    let medicine = find_owned_medicine(patient_id, medicine_id, deps).await?;

    let removed = deps.doses.delete_for_medicine(medicine.id).await?;
    if !deps.regimens.delete_medicine(medicine.id).await? {
        return Err(RegimenError::NotFound);
    }

    info!(medicine_id = %medicine.id, doses = removed, "Medicine deleted");
    Ok(removed)
}
