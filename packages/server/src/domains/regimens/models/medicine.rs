use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use typed_builder::TypedBuilder;

use crate::common::{MedicineId, PatientId};
use crate::domains::doses::ScheduledDose;

/// A medicine regimen owned by a patient.
///
/// `times` holds "HH:MM" strings as entered; `end_date` bounds expansion and
/// a regimen without one never produces dose occurrences.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct Medicine {
    #[builder(default = MedicineId::new())]
    pub id: MedicineId,
    pub patient_id: PatientId,
    pub name: String,
    pub dosage: String,
    #[builder(default)]
    pub notes: Option<String>,
    pub times: Vec<String>,
    pub start_date: NaiveDate,
    #[builder(default)]
    pub end_date: Option<NaiveDate>,
    #[builder(default = 0)]
    pub total_quantity: i32,
    #[builder(default = 0)]
    pub pills_remaining: i32,
    #[builder(default = 5)]
    pub low_stock_threshold: i32,
    #[builder(default)]
    pub low_stock_alert_at: Option<DateTime<Utc>>,
    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
    #[builder(default = Utc::now())]
    pub updated_at: DateTime<Utc>,
}

impl Medicine {
    pub fn is_low_stock(&self) -> bool {
        self.pills_remaining <= self.low_stock_threshold
    }

    /// Whether the fields that drive dose expansion differ from `other`.
    ///
    /// Time lists are compared as entered, so reordering counts as a change.
    pub fn schedule_differs(&self, other: &Medicine) -> bool {
        let normalise = |times: &[String]| -> Vec<String> {
            times.iter().map(|t| t.trim().to_string()).collect()
        };
        normalise(&self.times) != normalise(&other.times)
            || self.start_date != other.start_date
            || self.end_date != other.end_date
    }

    pub async fn find_by_id(id: MedicineId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM medicines WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn find_for_patient(patient_id: PatientId, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM medicines WHERE patient_id = $1 ORDER BY created_at DESC",
        )
        .bind(patient_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn insert<'e, E>(&self, executor: E) -> Result<Self>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO medicines (
                id, patient_id, name, dosage, notes, times, start_date, end_date,
                total_quantity, pills_remaining, low_stock_threshold, low_stock_alert_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(self.patient_id)
        .bind(&self.name)
        .bind(&self.dosage)
        .bind(&self.notes)
        .bind(&self.times)
        .bind(self.start_date)
        .bind(self.end_date)
        .bind(self.total_quantity)
        .bind(self.pills_remaining)
        .bind(self.low_stock_threshold)
        .bind(self.low_stock_alert_at)
        .fetch_one(executor)
        .await
        .map_err(Into::into)
    }

    /// Insert the medicine and its generated doses in one transaction, so a
    /// failed dose insert leaves no medicine behind.
    pub async fn insert_with_doses(
        &self,
        doses: &[ScheduledDose],
        pool: &PgPool,
    ) -> Result<(Self, u64)> {
        let mut tx = pool.begin().await?;
        let medicine = self.insert(&mut *tx).await?;
        let inserted = ScheduledDose::insert_many(doses, &mut *tx).await?;
        tx.commit().await?;
        Ok((medicine, inserted))
    }

    /// Overwrite every editable field. Ownership never changes.
    pub async fn update(&self, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE medicines SET
                name = $2,
                dosage = $3,
                notes = $4,
                times = $5,
                start_date = $6,
                end_date = $7,
                total_quantity = $8,
                pills_remaining = $9,
                low_stock_threshold = $10,
                low_stock_alert_at = $11,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(&self.name)
        .bind(&self.dosage)
        .bind(&self.notes)
        .bind(&self.times)
        .bind(self.start_date)
        .bind(self.end_date)
        .bind(self.total_quantity)
        .bind(self.pills_remaining)
        .bind(self.low_stock_threshold)
        .bind(self.low_stock_alert_at)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Delete the regimen. Its dose occurrences go with it (FK cascade).
    pub async fn delete(id: MedicineId, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query("DELETE FROM medicines WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Take one unit off the remaining stock, never going below zero.
    pub async fn consume_dose(id: MedicineId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE medicines
            SET pills_remaining = GREATEST(pills_remaining - 1, 0),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Record that the low-stock email went out. Returns false when an alert
    /// was already on record, so the email is sent at most once per episode.
    pub async fn mark_low_stock_alerted(
        id: MedicineId,
        at: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE medicines SET low_stock_alert_at = $2 WHERE id = $1 AND low_stock_alert_at IS NULL",
        )
        .bind(id)
        .bind(at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
