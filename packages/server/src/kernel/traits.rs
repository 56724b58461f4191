// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Business logic (sweeps, resyncs, intake recording) lives in domain
// activities that take these traits through ServerDeps.
//
// Naming convention: Base* for trait names (e.g., BaseNotifier, BaseDoseStore)

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::common::{DoseId, MedicineId, PatientId};
use crate::domains::caregivers::CaregiverLink;
use crate::domains::doses::{MedicineIntake, ScheduledDose};
use crate::domains::patients::Patient;
use crate::domains::regimens::Medicine;

// =============================================================================
// Notifier Trait (Infrastructure - outbound messages)
// =============================================================================

#[async_trait]
pub trait BaseNotifier: Send + Sync {
    /// Deliver a rendered message. `Ok` means the transport accepted it.
    async fn send(&self, address: &str, subject: &str, body: &str) -> Result<()>;
}

// =============================================================================
// Dose Store Trait (Infrastructure - occurrence persistence)
// =============================================================================

#[async_trait]
pub trait BaseDoseStore: Send + Sync {
    /// Doses scheduled in `[start, end]` with `pre_reminder_sent = false`.
    async fn find_pre_reminder_due(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ScheduledDose>>;

    /// Pending doses scheduled in `[start, end]` with `post_missed_sent = false`.
    async fn find_missed_due(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ScheduledDose>>;

    async fn find_for_medicine(&self, medicine_id: MedicineId) -> Result<Vec<ScheduledDose>>;

    /// Doses for a patient in `[start, end)`, ascending.
    async fn find_for_patient_between(
        &self,
        patient_id: PatientId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ScheduledDose>>;

    async fn insert_many(&self, doses: &[ScheduledDose]) -> Result<u64>;

    async fn delete_for_medicine(&self, medicine_id: MedicineId) -> Result<u64>;

    /// Delete a medicine's doses (all, or only those after `after`) and insert
    /// `doses` as one unit. Returns (deleted, inserted).
    async fn replace_for_medicine(
        &self,
        medicine_id: MedicineId,
        after: Option<DateTime<Utc>>,
        doses: &[ScheduledDose],
    ) -> Result<(u64, u64)>;

    /// Compare-and-set `pre_reminder_sent` false → true. Returns whether this
    /// call made the transition.
    async fn mark_pre_reminder_sent(&self, id: DoseId) -> Result<bool>;

    /// Compare-and-set `post_missed_sent` false → true, OR in the caregiver
    /// outcome and move a pending dose to missed.
    async fn mark_missed_notified(&self, id: DoseId, caregiver_notified: bool) -> Result<bool>;

    /// Set status = taken on the dose matching (medicine, instant).
    async fn mark_taken(&self, medicine_id: MedicineId, scheduled_at: DateTime<Utc>)
        -> Result<bool>;
}

// =============================================================================
// Regimen Store Trait (Infrastructure - patients, medicines, intake log)
// =============================================================================

#[async_trait]
pub trait BaseRegimenStore: Send + Sync {
    async fn find_patient(&self, id: PatientId) -> Result<Option<Patient>>;

    async fn find_medicine(&self, id: MedicineId) -> Result<Option<Medicine>>;

    /// Newest first.
    async fn find_medicines_for_patient(&self, patient_id: PatientId) -> Result<Vec<Medicine>>;

    /// Store a medicine together with its doses as one unit. Either both land
    /// or neither does. Returns the stored medicine and the dose count.
    async fn insert_medicine_with_doses(
        &self,
        medicine: &Medicine,
        doses: &[ScheduledDose],
    ) -> Result<(Medicine, u64)>;

    async fn update_medicine(&self, medicine: &Medicine) -> Result<Medicine>;

    async fn delete_medicine(&self, id: MedicineId) -> Result<bool>;

    /// Decrement remaining stock by one, saturating at zero.
    async fn consume_dose(&self, id: MedicineId) -> Result<Option<Medicine>>;

    /// Stamp the low-stock alert if none is on record. Returns whether it did.
    async fn mark_low_stock_alerted(&self, id: MedicineId, at: DateTime<Utc>) -> Result<bool>;

    async fn insert_intake(&self, intake: &MedicineIntake) -> Result<MedicineIntake>;

    async fn recent_intakes(&self, patient_id: PatientId, limit: i64)
        -> Result<Vec<MedicineIntake>>;
}

// =============================================================================
// Caregiver Resolver Trait (Infrastructure)
// =============================================================================

#[async_trait]
pub trait BaseCaregiverResolver: Send + Sync {
    /// Accepted caregiver links for a patient, earliest first.
    async fn accepted_caregivers(&self, patient_id: PatientId) -> Result<Vec<CaregiverLink>>;
}

// =============================================================================
// AI Trait (Infrastructure - Generic LLM capabilities)
// =============================================================================

#[async_trait]
pub trait BaseAI: Send + Sync {
    /// Complete a prompt with an LLM (returns raw text response)
    async fn complete(&self, prompt: &str) -> Result<String>;
}
