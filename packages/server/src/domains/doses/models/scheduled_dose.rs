use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

use crate::common::{DoseId, MedicineId, PatientId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "dose_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DoseStatus {
    #[default]
    Pending,
    /// Terminal. Written only by the intake recorder.
    Taken,
    /// Informational: the missed-dose alert went out while still pending.
    Missed,
}

/// One expected administration of a medicine at an absolute instant.
///
/// `scheduled_at` never changes after insert; a schedule edit replaces rows
/// instead. The three notification flags only ever go from false to true.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ScheduledDose {
    pub id: DoseId,
    pub patient_id: PatientId,
    pub medicine_id: MedicineId,
    pub scheduled_at: DateTime<Utc>,
    pub status: DoseStatus,
    pub pre_reminder_sent: bool,
    pub post_missed_sent: bool,
    pub caregiver_notified: bool,
    pub created_at: DateTime<Utc>,
}

impl ScheduledDose {
    /// A fresh pending occurrence with every flag cleared.
    pub fn pending(
        patient_id: PatientId,
        medicine_id: MedicineId,
        scheduled_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: DoseId::new(),
            patient_id,
            medicine_id,
            scheduled_at,
            status: DoseStatus::Pending,
            pre_reminder_sent: false,
            post_missed_sent: false,
            caregiver_notified: false,
            created_at: Utc::now(),
        }
    }

    /// Doses in `[start, end]` whose pre-reminder has not gone out, any status.
    pub async fn find_pre_reminder_due(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM scheduled_doses
            WHERE scheduled_at BETWEEN $1 AND $2
              AND pre_reminder_sent = false
            ORDER BY scheduled_at ASC, id ASC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Pending doses in `[start, end]` whose missed-dose alert has not gone out.
    pub async fn find_missed_due(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM scheduled_doses
            WHERE scheduled_at BETWEEN $1 AND $2
              AND status = 'pending'
              AND post_missed_sent = false
            ORDER BY scheduled_at ASC, id ASC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_for_medicine(medicine_id: MedicineId, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM scheduled_doses WHERE medicine_id = $1 ORDER BY scheduled_at ASC",
        )
        .bind(medicine_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_for_patient_between(
        patient_id: PatientId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM scheduled_doses
            WHERE patient_id = $1
              AND scheduled_at >= $2
              AND scheduled_at < $3
            ORDER BY scheduled_at ASC
            "#,
        )
        .bind(patient_id)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Bulk insert via UNNEST so a year of doses is one round-trip.
    pub async fn insert_many<'e, E>(doses: &[Self], executor: E) -> Result<u64>
    where
        E: PgExecutor<'e>,
    {
        if doses.is_empty() {
            return Ok(0);
        }
        let ids: Vec<DoseId> = doses.iter().map(|d| d.id).collect();
        let patients: Vec<PatientId> = doses.iter().map(|d| d.patient_id).collect();
        let medicines: Vec<MedicineId> = doses.iter().map(|d| d.medicine_id).collect();
        let instants: Vec<DateTime<Utc>> = doses.iter().map(|d| d.scheduled_at).collect();

        let result = sqlx::query(
            r#"
            INSERT INTO scheduled_doses (id, patient_id, medicine_id, scheduled_at)
            SELECT * FROM UNNEST($1::uuid[], $2::uuid[], $3::uuid[], $4::timestamptz[])
            "#,
        )
        .bind(ids)
        .bind(patients)
        .bind(medicines)
        .bind(instants)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete_for_medicine<'e, E>(
        medicine_id: MedicineId,
        after: Option<DateTime<Utc>>,
        executor: E,
    ) -> Result<u64>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r#"
            DELETE FROM scheduled_doses
            WHERE medicine_id = $1
              AND ($2::timestamptz IS NULL OR scheduled_at > $2)
            "#,
        )
        .bind(medicine_id)
        .bind(after)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Delete a medicine's doses (all of them, or only those after `after`)
    /// and insert the replacement set in one transaction.
    pub async fn replace_for_medicine(
        medicine_id: MedicineId,
        after: Option<DateTime<Utc>>,
        doses: &[Self],
        pool: &PgPool,
    ) -> Result<(u64, u64)> {
        let mut tx = pool.begin().await?;
        let deleted = Self::delete_for_medicine(medicine_id, after, &mut *tx).await?;
        let inserted = Self::insert_many(doses, &mut *tx).await?;
        tx.commit().await?;
        Ok((deleted, inserted))
    }

    /// Set `pre_reminder_sent` if it is still false. Returns whether this
    /// call made the transition.
    pub async fn mark_pre_reminder_sent(id: DoseId, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE scheduled_doses SET pre_reminder_sent = true WHERE id = $1 AND pre_reminder_sent = false",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set `post_missed_sent`, fold in the caregiver outcome and move a
    /// still-pending dose to missed, all in one conditional write.
    pub async fn mark_missed_notified(
        id: DoseId,
        caregiver_notified: bool,
        pool: &PgPool,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE scheduled_doses
            SET post_missed_sent = true,
                caregiver_notified = caregiver_notified OR $2,
                status = CASE WHEN status = 'pending' THEN 'missed'::dose_status ELSE status END
            WHERE id = $1
              AND post_missed_sent = false
            "#,
        )
        .bind(id)
        .bind(caregiver_notified)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark the dose of `medicine_id` at exactly `scheduled_at` as taken.
    /// Notification flags are left alone.
    pub async fn mark_taken(
        medicine_id: MedicineId,
        scheduled_at: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE scheduled_doses SET status = 'taken' WHERE medicine_id = $1 AND scheduled_at = $2",
        )
        .bind(medicine_id)
        .bind(scheduled_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
