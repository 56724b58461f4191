use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;

use super::error::ApiError;
use crate::common::{MedicineId, PatientId};
use crate::domains::doses::activities::{intake_log, record_intake, today_schedule};
use crate::domains::doses::{IntakeLogEntry, IntakeReceipt, IntakeRequest, TodayDose};
use crate::server::app::AppState;

/// Mark a dose taken. An empty body logs an intake at the current time.
pub async fn mark_taken_handler(
    Extension(state): Extension<AppState>,
    Path((patient_id, medicine_id)): Path<(PatientId, MedicineId)>,
    request: Option<Json<IntakeRequest>>,
) -> Result<(StatusCode, Json<IntakeReceipt>), ApiError> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    let receipt = record_intake(patient_id, medicine_id, request, Utc::now(), &state.deps).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

pub async fn today_handler(
    Extension(state): Extension<AppState>,
    Path(patient_id): Path<PatientId>,
) -> Result<Json<Vec<TodayDose>>, ApiError> {
    let schedule = today_schedule(patient_id, Utc::now(), &state.deps).await?;
    Ok(Json(schedule))
}

/// The patient's latest intakes, newest scheduled time first.
pub async fn intake_log_handler(
    Extension(state): Extension<AppState>,
    Path(patient_id): Path<PatientId>,
) -> Result<Json<Vec<IntakeLogEntry>>, ApiError> {
    let log = intake_log(patient_id, &state.deps).await?;
    Ok(Json(log))
}
