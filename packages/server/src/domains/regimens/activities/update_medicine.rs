//! Update medicine activity - edits a regimen and resyncs its doses when the
//! schedule changed

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::{find_owned_medicine, generate_doses, validate_input, RegimenChange};
use crate::common::{MedicineId, PatientId};
use crate::domains::regimens::{MedicineInput, RegimenError, ResyncPolicy};
use crate::kernel::ServerDeps;

/// Overwrite a regimen's fields. When dose times, start date or end date
/// changed, the medicine's doses are replaced according to the configured
/// resync policy.
///
/// A new total quantity restocks the medicine: remaining stock is reset to it
/// and any low-stock alert on record is cleared.
pub async fn update_medicine(
    patient_id: PatientId,
    medicine_id: MedicineId,
    input: MedicineInput,
    now: DateTime<Utc>,
    deps: &ServerDeps,
) -> Result<RegimenChange, RegimenError> {
    validate_input(&input, &deps.schedule)?;
    let existing = find_owned_medicine(patient_id, medicine_id, deps).await?;

    let mut updated = existing.clone();
    updated.name = input.name.trim().to_string();
    updated.dosage = input.dosage.trim().to_string();
    updated.notes = input.notes;
    updated.times = input.times;
    updated.start_date = input.start_date;
    updated.end_date = input.end_date;
    if let Some(threshold) = input.low_stock_threshold {
        updated.low_stock_threshold = threshold;
    }
    if let Some(quantity) = input.total_quantity {
        if quantity != existing.total_quantity {
            updated.total_quantity = quantity;
            updated.pills_remaining = quantity;
            updated.low_stock_alert_at = None;
        }
    }

    let resync = existing.schedule_differs(&updated);
    let after = match deps.schedule.resync_policy {
        ResyncPolicy::Full => None,
        ResyncPolicy::FutureOnly => Some(now),
    };
    let doses = if resync {
        generate_doses(&updated, &deps.schedule, after)?
    } else {
        Vec::new()
    };

    let medicine = deps.regimens.update_medicine(&updated).await?;

    if !resync {
        debug!(medicine_id = %medicine.id, "Schedule unchanged, keeping doses");
        return Ok(RegimenChange {
            medicine,
            doses_removed: 0,
            doses_created: 0,
        });
    }

    let (removed, created) = deps
        .doses
        .replace_for_medicine(medicine.id, after, &doses)
        .await?;

    info!(
        medicine_id = %medicine.id,
        policy = %deps.schedule.resync_policy,
        removed,
        created,
        "Medicine schedule resynced"
    );

    Ok(RegimenChange {
        medicine,
        doses_removed: removed,
        doses_created: created,
    })
}
