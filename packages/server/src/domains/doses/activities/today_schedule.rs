use chrono::{DateTime, Days, NaiveTime, Utc};
use std::collections::HashMap;

use crate::common::PatientId;
use crate::domains::doses::{IntakeError, TodayDose};
use crate::domains::regimens::schedule::resolve_local;
use crate::kernel::ServerDeps;

/// A patient's doses on the local calendar day containing `now`, by time.
pub async fn today_schedule(
    patient_id: PatientId,
    now: DateTime<Utc>,
    deps: &ServerDeps,
) -> Result<Vec<TodayDose>, IntakeError> {
    if deps.regimens.find_patient(patient_id).await?.is_none() {
        return Err(IntakeError::PatientNotFound);
    }

    let tz = &deps.schedule.timezone;
    let today = now.with_timezone(tz).date_naive();
    let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(today);
    let start = resolve_local(tz, today.and_time(NaiveTime::MIN));
    let end = resolve_local(tz, tomorrow.and_time(NaiveTime::MIN));

    let doses = deps
        .doses
        .find_for_patient_between(patient_id, start, end)
        .await?;

    let mut medicines = HashMap::new();
    let mut schedule = Vec::with_capacity(doses.len());
    for dose in doses {
        if !medicines.contains_key(&dose.medicine_id) {
            let medicine = deps.regimens.find_medicine(dose.medicine_id).await?;
            medicines.insert(dose.medicine_id, medicine);
        }
        // Doses of a medicine deleted mid-request are dropped.
        let Some(Some(medicine)) = medicines.get(&dose.medicine_id) else {
            continue;
        };

        schedule.push(TodayDose {
            dose_id: dose.id,
            medicine_id: dose.medicine_id,
            medicine_name: medicine.name.clone(),
            dosage: medicine.dosage.clone(),
            scheduled_at: dose.scheduled_at,
            local_time: dose.scheduled_at.with_timezone(tz).format("%H:%M").to_string(),
            status: dose.status,
            pills_remaining: medicine.pills_remaining,
            low_stock: medicine.is_low_stock(),
        });
    }

    schedule.sort_by_key(|d| d.scheduled_at);
    Ok(schedule)
}
