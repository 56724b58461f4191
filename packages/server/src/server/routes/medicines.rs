use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use super::error::ApiError;
use crate::common::{MedicineId, PatientId};
use crate::domains::regimens::activities::{
    create_medicine, delete_medicine, get_medicine, list_medicines, update_medicine,
    RegimenChange,
};
use crate::domains::regimens::{Medicine, MedicineInput};
use crate::server::app::AppState;

pub async fn create_medicine_handler(
    Extension(state): Extension<AppState>,
    Path(patient_id): Path<PatientId>,
    Json(input): Json<MedicineInput>,
) -> Result<(StatusCode, Json<RegimenChange>), ApiError> {
    let change = create_medicine(patient_id, input, &state.deps).await?;
    Ok((StatusCode::CREATED, Json(change)))
}

pub async fn list_medicines_handler(
    Extension(state): Extension<AppState>,
    Path(patient_id): Path<PatientId>,
) -> Result<Json<Vec<Medicine>>, ApiError> {
    let medicines = list_medicines(patient_id, &state.deps).await?;
    Ok(Json(medicines))
}

pub async fn get_medicine_handler(
    Extension(state): Extension<AppState>,
    Path((patient_id, medicine_id)): Path<(PatientId, MedicineId)>,
) -> Result<Json<Medicine>, ApiError> {
    let medicine = get_medicine(patient_id, medicine_id, &state.deps).await?;
    Ok(Json(medicine))
}

pub async fn update_medicine_handler(
    Extension(state): Extension<AppState>,
    Path((patient_id, medicine_id)): Path<(PatientId, MedicineId)>,
    Json(input): Json<MedicineInput>,
) -> Result<Json<RegimenChange>, ApiError> {
    let change = update_medicine(patient_id, medicine_id, input, Utc::now(), &state.deps).await?;
    Ok(Json(change))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    deleted: bool,
    doses_removed: u64,
}

pub async fn delete_medicine_handler(
    Extension(state): Extension<AppState>,
    Path((patient_id, medicine_id)): Path<(PatientId, MedicineId)>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let doses_removed = delete_medicine(patient_id, medicine_id, &state.deps).await?;
    Ok(Json(DeleteResponse {
        deleted: true,
        doses_removed,
    }))
}
