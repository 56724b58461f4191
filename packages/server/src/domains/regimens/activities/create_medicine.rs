//! Create medicine activity - stores the regimen and generates its doses

use tracing::info;

use super::{generate_doses, validate_input, RegimenChange};
use crate::common::PatientId;
use crate::domains::regimens::{Medicine, MedicineInput, RegimenError};
use crate::kernel::ServerDeps;

/// Store a new regimen for `patient_id` and expand it into pending doses.
///
/// A regimen without an end date is stored but produces no doses.
pub async fn create_medicine(
    patient_id: PatientId,
    input: MedicineInput,
    deps: &ServerDeps,
) -> Result<RegimenChange, RegimenError> {
    validate_input(&input, &deps.schedule)?;

    if deps.regimens.find_patient(patient_id).await?.is_none() {
        return Err(RegimenError::PatientNotFound);
    }

    let quantity = input.total_quantity.unwrap_or(0);
    let medicine = Medicine::builder()
        .patient_id(patient_id)
        .name(input.name.trim())
        .dosage(input.dosage.trim())
        .notes(input.notes)
        .times(input.times)
        .start_date(input.start_date)
        .end_date(input.end_date)
        .total_quantity(quantity)
        .pills_remaining(quantity)
        .low_stock_threshold(input.low_stock_threshold.unwrap_or(5))
        .build();

    let doses = generate_doses(&medicine, &deps.schedule, None)?;
    let (medicine, created) = deps
        .regimens
        .insert_medicine_with_doses(&medicine, &doses)
        .await?;

    info!(
        medicine_id = %medicine.id,
        patient_id = %patient_id,
        doses = created,
        "Medicine created"
    );

    Ok(RegimenChange {
        medicine,
        doses_removed: 0,
        doses_created: created,
    })
}
