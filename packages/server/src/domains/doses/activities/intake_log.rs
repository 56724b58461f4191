use std::collections::HashMap;

use crate::common::PatientId;
use crate::domains::doses::{IntakeError, IntakeLogEntry, MedicineSummary};
use crate::kernel::ServerDeps;

/// How many intakes the log returns.
pub const INTAKE_LOG_LIMIT: i64 = 50;

/// A patient's most recent intakes by scheduled time, newest first.
pub async fn intake_log(
    patient_id: PatientId,
    deps: &ServerDeps,
) -> Result<Vec<IntakeLogEntry>, IntakeError> {
    if deps.regimens.find_patient(patient_id).await?.is_none() {
        return Err(IntakeError::PatientNotFound);
    }

    let intakes = deps
        .regimens
        .recent_intakes(patient_id, INTAKE_LOG_LIMIT)
        .await?;

    let mut medicines = HashMap::new();
    let mut log = Vec::with_capacity(intakes.len());
    for intake in intakes {
        if !medicines.contains_key(&intake.medicine_id) {
            let medicine = deps.regimens.find_medicine(intake.medicine_id).await?;
            medicines.insert(intake.medicine_id, medicine);
        }
        let medicine = medicines
            .get(&intake.medicine_id)
            .and_then(Option::as_ref)
            .map(MedicineSummary::from);
        log.push(IntakeLogEntry { intake, medicine });
    }
    Ok(log)
}
