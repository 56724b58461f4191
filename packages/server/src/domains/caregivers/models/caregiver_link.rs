use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{CaregiverLinkId, PatientId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "caregiver_link_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CaregiverLinkStatus {
    #[default]
    Pending,
    Accepted,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "caregiver_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CaregiverRole {
    #[default]
    View,
    Manage,
}

/// A patient's invitation to a caregiver, keyed by the caregiver's email.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CaregiverLink {
    pub id: CaregiverLinkId,
    pub patient_id: PatientId,
    pub email: String,
    pub status: CaregiverLinkStatus,
    pub role: CaregiverRole,
    pub created_at: DateTime<Utc>,
}

impl CaregiverLink {
    pub fn new(
        patient_id: PatientId,
        email: impl Into<String>,
        status: CaregiverLinkStatus,
        role: CaregiverRole,
    ) -> Self {
        Self {
            id: CaregiverLinkId::new(),
            patient_id,
            email: email.into(),
            status,
            role,
            created_at: Utc::now(),
        }
    }

    /// Accepted links for a patient, oldest first.
    pub async fn find_accepted_for_patient(
        patient_id: PatientId,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM caregiver_links
            WHERE patient_id = $1 AND status = 'accepted'
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(patient_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn insert(&self, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO caregiver_links (id, patient_id, email, status, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(self.patient_id)
        .bind(&self.email)
        .bind(self.status)
        .bind(self.role)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }
}
