//! Record intake activity - the patient reports a dose as taken

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::common::{MedicineId, PatientId};
use crate::domains::doses::{IntakeError, IntakeReceipt, IntakeRequest, MedicineIntake};
use crate::domains::reminders::templates;
use crate::kernel::ServerDeps;

/// Log an intake, take one unit off the stock and mark the matching
/// scheduled dose taken.
///
/// Notification flags on the dose are left alone. When stock drops to the
/// threshold and no alert is on record, the patient gets a low-stock email;
/// a failed send is logged and does not fail the intake.
pub async fn record_intake(
    patient_id: PatientId,
    medicine_id: MedicineId,
    request: IntakeRequest,
    now: DateTime<Utc>,
    deps: &ServerDeps,
) -> Result<IntakeReceipt, IntakeError> {
    match deps.regimens.find_medicine(medicine_id).await? {
        Some(medicine) if medicine.patient_id == patient_id => {}
        _ => return Err(IntakeError::NotFound),
    }

    let scheduled_at = request.scheduled_time.unwrap_or(now);
    let intake = MedicineIntake::taken(patient_id, medicine_id, scheduled_at, now, request.notes);
    let intake = deps.regimens.insert_intake(&intake).await?;

    let mut medicine = deps
        .regimens
        .consume_dose(medicine_id)
        .await?
        .ok_or(IntakeError::NotFound)?;

    let dose_updated = match request.scheduled_time {
        Some(at) => deps.doses.mark_taken(medicine_id, at).await?,
        None => false,
    };
    if request.scheduled_time.is_some() && !dose_updated {
        debug!(medicine_id = %medicine_id, at = %scheduled_at, "No scheduled dose at that time");
    }

    let mut low_stock = false;
    if medicine.is_low_stock()
        && medicine.low_stock_alert_at.is_none()
        && deps.regimens.mark_low_stock_alerted(medicine_id, now).await?
    {
        medicine.low_stock_alert_at = Some(now);
        low_stock = true;

        match deps.regimens.find_patient(patient_id).await {
            Ok(Some(patient)) => {
                let message = templates::low_stock(&medicine);
                if let Err(e) = deps
                    .notifier
                    .send(&patient.email, &message.subject, &message.body)
                    .await
                {
                    warn!(medicine_id = %medicine_id, error = %e, "Failed to send low-stock email");
                }
            }
            Ok(None) => warn!(patient_id = %patient_id, "Low stock but patient not found"),
            Err(e) => warn!(patient_id = %patient_id, error = %e, "Failed to load patient"),
        }
    }

    info!(
        medicine_id = %medicine_id,
        pills_remaining = medicine.pills_remaining,
        dose_updated,
        low_stock,
        "Intake recorded"
    );

    Ok(IntakeReceipt {
        intake,
        medicine,
        low_stock,
        dose_updated,
    })
}
