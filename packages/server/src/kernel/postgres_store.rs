// PostgresStore - the production store, delegating to the sqlx models.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{BaseCaregiverResolver, BaseDoseStore, BaseRegimenStore};
use crate::common::{DoseId, MedicineId, PatientId};
use crate::domains::caregivers::CaregiverLink;
use crate::domains::doses::{MedicineIntake, ScheduledDose};
use crate::domains::patients::Patient;
use crate::domains::regimens::Medicine;

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl BaseDoseStore for PostgresStore {
    async fn find_pre_reminder_due(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ScheduledDose>> {
        ScheduledDose::find_pre_reminder_due(start, end, &self.pool).await
    }

    async fn find_missed_due(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ScheduledDose>> {
        ScheduledDose::find_missed_due(start, end, &self.pool).await
    }

    async fn find_for_medicine(&self, medicine_id: MedicineId) -> Result<Vec<ScheduledDose>> {
        ScheduledDose::find_for_medicine(medicine_id, &self.pool).await
    }

    async fn find_for_patient_between(
        &self,
        patient_id: PatientId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ScheduledDose>> {
        ScheduledDose::find_for_patient_between(patient_id, start, end, &self.pool).await
    }

    async fn insert_many(&self, doses: &[ScheduledDose]) -> Result<u64> {
        ScheduledDose::insert_many(doses, &self.pool).await
    }

    async fn delete_for_medicine(&self, medicine_id: MedicineId) -> Result<u64> {
        ScheduledDose::delete_for_medicine(medicine_id, None, &self.pool).await
    }

    async fn replace_for_medicine(
        &self,
        medicine_id: MedicineId,
        after: Option<DateTime<Utc>>,
        doses: &[ScheduledDose],
    ) -> Result<(u64, u64)> {
        ScheduledDose::replace_for_medicine(medicine_id, after, doses, &self.pool).await
    }

    async fn mark_pre_reminder_sent(&self, id: DoseId) -> Result<bool> {
        ScheduledDose::mark_pre_reminder_sent(id, &self.pool).await
    }

    async fn mark_missed_notified(&self, id: DoseId, caregiver_notified: bool) -> Result<bool> {
        ScheduledDose::mark_missed_notified(id, caregiver_notified, &self.pool).await
    }

    async fn mark_taken(
        &self,
        medicine_id: MedicineId,
        scheduled_at: DateTime<Utc>,
    ) -> Result<bool> {
        ScheduledDose::mark_taken(medicine_id, scheduled_at, &self.pool).await
    }
}

#[async_trait]
impl BaseRegimenStore for PostgresStore {
    async fn find_patient(&self, id: PatientId) -> Result<Option<Patient>> {
        Patient::find_by_id(id, &self.pool).await
    }

    async fn find_medicine(&self, id: MedicineId) -> Result<Option<Medicine>> {
        Medicine::find_by_id(id, &self.pool).await
    }

    async fn find_medicines_for_patient(&self, patient_id: PatientId) -> Result<Vec<Medicine>> {
        Medicine::find_for_patient(patient_id, &self.pool).await
    }

    async fn insert_medicine_with_doses(
        &self,
        medicine: &Medicine,
        doses: &[ScheduledDose],
    ) -> Result<(Medicine, u64)> {
        medicine.insert_with_doses(doses, &self.pool).await
    }

    async fn update_medicine(&self, medicine: &Medicine) -> Result<Medicine> {
        medicine.update(&self.pool).await
    }

    async fn delete_medicine(&self, id: MedicineId) -> Result<bool> {
        Medicine::delete(id, &self.pool).await
    }

    async fn consume_dose(&self, id: MedicineId) -> Result<Option<Medicine>> {
        Medicine::consume_dose(id, &self.pool).await
    }

    async fn mark_low_stock_alerted(&self, id: MedicineId, at: DateTime<Utc>) -> Result<bool> {
        Medicine::mark_low_stock_alerted(id, at, &self.pool).await
    }

    async fn insert_intake(&self, intake: &MedicineIntake) -> Result<MedicineIntake> {
        intake.insert(&self.pool).await
    }

    async fn recent_intakes(
        &self,
        patient_id: PatientId,
        limit: i64,
    ) -> Result<Vec<MedicineIntake>> {
        MedicineIntake::find_recent_for_patient(patient_id, limit, &self.pool).await
    }
}

#[async_trait]
impl BaseCaregiverResolver for PostgresStore {
    async fn accepted_caregivers(&self, patient_id: PatientId) -> Result<Vec<CaregiverLink>> {
        CaregiverLink::find_accepted_for_patient(patient_id, &self.pool).await
    }
}
