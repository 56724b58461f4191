use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{IntakeId, MedicineId, PatientId};

use super::scheduled_dose::DoseStatus;

/// Log entry for a dose the patient reported taking.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MedicineIntake {
    pub id: IntakeId,
    pub patient_id: PatientId,
    pub medicine_id: MedicineId,
    pub scheduled_at: DateTime<Utc>,
    pub status: DoseStatus,
    pub taken_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl MedicineIntake {
    pub fn taken(
        patient_id: PatientId,
        medicine_id: MedicineId,
        scheduled_at: DateTime<Utc>,
        taken_at: DateTime<Utc>,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: IntakeId::new(),
            patient_id,
            medicine_id,
            scheduled_at,
            status: DoseStatus::Taken,
            taken_at: Some(taken_at),
            notes,
            created_at: taken_at,
        }
    }

    pub async fn insert(&self, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO medicine_intakes (
                id, patient_id, medicine_id, scheduled_at, status, taken_at, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(self.patient_id)
        .bind(self.medicine_id)
        .bind(self.scheduled_at)
        .bind(self.status)
        .bind(self.taken_at)
        .bind(&self.notes)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Most recent intakes first.
    pub async fn find_recent_for_patient(
        patient_id: PatientId,
        limit: i64,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM medicine_intakes WHERE patient_id = $1 ORDER BY scheduled_at DESC LIMIT $2",
        )
        .bind(patient_id)
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
