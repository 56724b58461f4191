// TestDependencies - in-memory implementations for testing
//
// Provides a store, notifier and AI double that can be injected into
// ServerDeps so the sweep, the regimen activities and the intake recorder run
// without Postgres or an email API.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use super::{
    BaseAI, BaseCaregiverResolver, BaseDoseStore, BaseNotifier, BaseRegimenStore, ServerDeps,
};
use crate::common::{DoseId, MedicineId, PatientId};
use crate::config::{ScheduleConfig, SweepConfig};
use crate::domains::caregivers::{CaregiverLink, CaregiverLinkStatus};
use crate::domains::doses::{DoseStatus, MedicineIntake, ScheduledDose};
use crate::domains::patients::Patient;
use crate::domains::regimens::Medicine;

// =============================================================================
// In-memory Store (doses, regimens, caregivers)
// =============================================================================

#[derive(Default)]
struct StoreState {
    patients: HashMap<PatientId, Patient>,
    medicines: HashMap<MedicineId, Medicine>,
    doses: Vec<ScheduledDose>,
    caregivers: Vec<CaregiverLink>,
    intakes: Vec<MedicineIntake>,
    fail_flag_writes: bool,
    fail_queries: bool,
    fail_dose_inserts: bool,
}

impl StoreState {
    /// All-or-nothing insert honouring the (medicine, instant) uniqueness.
    fn insert_doses(&mut self, doses: &[ScheduledDose]) -> Result<u64> {
        if self.fail_dose_inserts {
            return Err(anyhow!("dose insert rejected by test store"));
        }
        let mut seen: HashSet<(MedicineId, DateTime<Utc>)> = self
            .doses
            .iter()
            .map(|d| (d.medicine_id, d.scheduled_at))
            .collect();
        for dose in doses {
            if !seen.insert((dose.medicine_id, dose.scheduled_at)) {
                return Err(anyhow!(
                    "duplicate dose for medicine {} at {}",
                    dose.medicine_id,
                    dose.scheduled_at
                ));
            }
        }
        self.doses.extend(doses.iter().cloned());
        Ok(doses.len() as u64)
    }
}

/// One store behind all three store traits, with the same conditional-write
/// semantics as the Postgres queries.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_patient(&self, patient: Patient) -> Patient {
        self.state
            .lock()
            .unwrap()
            .patients
            .insert(patient.id, patient.clone());
        patient
    }

    pub fn add_medicine(&self, medicine: Medicine) -> Medicine {
        self.state
            .lock()
            .unwrap()
            .medicines
            .insert(medicine.id, medicine.clone());
        medicine
    }

    /// Remove a medicine without touching its doses, leaving them orphaned.
    pub fn forget_medicine(&self, id: MedicineId) {
        self.state.lock().unwrap().medicines.remove(&id);
    }

    pub fn add_dose(&self, dose: ScheduledDose) -> ScheduledDose {
        self.state.lock().unwrap().doses.push(dose.clone());
        dose
    }

    pub fn add_caregiver(&self, link: CaregiverLink) -> CaregiverLink {
        self.state.lock().unwrap().caregivers.push(link.clone());
        link
    }

    /// Make every flag write fail until switched off again.
    pub fn fail_flag_writes(&self, fail: bool) {
        self.state.lock().unwrap().fail_flag_writes = fail;
    }

    /// Make every dose insert fail until switched off again.
    pub fn fail_dose_inserts(&self, fail: bool) {
        self.state.lock().unwrap().fail_dose_inserts = fail;
    }

    /// Make the sweep's candidate queries fail until switched off again.
    pub fn fail_queries(&self, fail: bool) {
        self.state.lock().unwrap().fail_queries = fail;
    }

    pub fn doses(&self) -> Vec<ScheduledDose> {
        let mut doses = self.state.lock().unwrap().doses.clone();
        doses.sort_by_key(|d| (d.scheduled_at, d.medicine_id));
        doses
    }

    pub fn dose(&self, id: DoseId) -> Option<ScheduledDose> {
        self.state
            .lock()
            .unwrap()
            .doses
            .iter()
            .find(|d| d.id == id)
            .cloned()
    }

    pub fn doses_for(&self, medicine_id: MedicineId) -> Vec<ScheduledDose> {
        self.doses()
            .into_iter()
            .filter(|d| d.medicine_id == medicine_id)
            .collect()
    }

    pub fn medicine(&self, id: MedicineId) -> Option<Medicine> {
        self.state.lock().unwrap().medicines.get(&id).cloned()
    }

    pub fn intakes(&self) -> Vec<MedicineIntake> {
        self.state.lock().unwrap().intakes.clone()
    }

    fn check_flag_write(state: &StoreState) -> Result<()> {
        if state.fail_flag_writes {
            return Err(anyhow!("flag write rejected by test store"));
        }
        Ok(())
    }

    fn check_query(state: &StoreState) -> Result<()> {
        if state.fail_queries {
            return Err(anyhow!("query rejected by test store"));
        }
        Ok(())
    }
}

fn within(at: DateTime<Utc>, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    start <= at && at <= end
}

#[async_trait]
impl BaseDoseStore for InMemoryStore {
    async fn find_pre_reminder_due(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ScheduledDose>> {
        let state = self.state.lock().unwrap();
        Self::check_query(&state)?;
        let mut due: Vec<_> = state
            .doses
            .iter()
            .filter(|d| within(d.scheduled_at, start, end) && !d.pre_reminder_sent)
            .cloned()
            .collect();
        due.sort_by_key(|d| (d.scheduled_at, d.id));
        Ok(due)
    }

    async fn find_missed_due(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ScheduledDose>> {
        let state = self.state.lock().unwrap();
        Self::check_query(&state)?;
        let mut due: Vec<_> = state
            .doses
            .iter()
            .filter(|d| {
                within(d.scheduled_at, start, end)
                    && d.status == DoseStatus::Pending
                    && !d.post_missed_sent
            })
            .cloned()
            .collect();
        due.sort_by_key(|d| (d.scheduled_at, d.id));
        Ok(due)
    }

    async fn find_for_medicine(&self, medicine_id: MedicineId) -> Result<Vec<ScheduledDose>> {
        Ok(self.doses_for(medicine_id))
    }

    async fn find_for_patient_between(
        &self,
        patient_id: PatientId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ScheduledDose>> {
        Ok(self
            .doses()
            .into_iter()
            .filter(|d| d.patient_id == patient_id && start <= d.scheduled_at && d.scheduled_at < end)
            .collect())
    }

    async fn insert_many(&self, doses: &[ScheduledDose]) -> Result<u64> {
        self.state.lock().unwrap().insert_doses(doses)
    }

    async fn delete_for_medicine(&self, medicine_id: MedicineId) -> Result<u64> {
        let mut state = self.state.lock().unwrap();
        let before = state.doses.len();
        state.doses.retain(|d| d.medicine_id != medicine_id);
        Ok((before - state.doses.len()) as u64)
    }

    async fn replace_for_medicine(
        &self,
        medicine_id: MedicineId,
        after: Option<DateTime<Utc>>,
        doses: &[ScheduledDose],
    ) -> Result<(u64, u64)> {
        let mut state = self.state.lock().unwrap();
        let snapshot = state.doses.clone();
        state.doses.retain(|d| {
            d.medicine_id != medicine_id || after.is_some_and(|cutoff| d.scheduled_at <= cutoff)
        });
        let deleted = (snapshot.len() - state.doses.len()) as u64;
        match state.insert_doses(doses) {
            Ok(inserted) => Ok((deleted, inserted)),
            Err(e) => {
                // Roll back the delete.
                state.doses = snapshot;
                Err(e)
            }
        }
    }

    async fn mark_pre_reminder_sent(&self, id: DoseId) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        Self::check_flag_write(&state)?;
        match state.doses.iter_mut().find(|d| d.id == id) {
            Some(dose) if !dose.pre_reminder_sent => {
                dose.pre_reminder_sent = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_missed_notified(&self, id: DoseId, caregiver_notified: bool) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        Self::check_flag_write(&state)?;
        match state.doses.iter_mut().find(|d| d.id == id) {
            Some(dose) if !dose.post_missed_sent => {
                dose.post_missed_sent = true;
                dose.caregiver_notified |= caregiver_notified;
                if dose.status == DoseStatus::Pending {
                    dose.status = DoseStatus::Missed;
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_taken(
        &self,
        medicine_id: MedicineId,
        scheduled_at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let mut updated = false;
        for dose in state
            .doses
            .iter_mut()
            .filter(|d| d.medicine_id == medicine_id && d.scheduled_at == scheduled_at)
        {
            dose.status = DoseStatus::Taken;
            updated = true;
        }
        Ok(updated)
    }
}

#[async_trait]
impl BaseRegimenStore for InMemoryStore {
    async fn find_patient(&self, id: PatientId) -> Result<Option<Patient>> {
        Ok(self.state.lock().unwrap().patients.get(&id).cloned())
    }

    async fn find_medicine(&self, id: MedicineId) -> Result<Option<Medicine>> {
        Ok(self.medicine(id))
    }

    async fn find_medicines_for_patient(&self, patient_id: PatientId) -> Result<Vec<Medicine>> {
        let mut medicines: Vec<_> = self
            .state
            .lock()
            .unwrap()
            .medicines
            .values()
            .filter(|m| m.patient_id == patient_id)
            .cloned()
            .collect();
        medicines.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(medicines)
    }

    async fn insert_medicine_with_doses(
        &self,
        medicine: &Medicine,
        doses: &[ScheduledDose],
    ) -> Result<(Medicine, u64)> {
        let mut state = self.state.lock().unwrap();
        let inserted = state.insert_doses(doses)?;
        state.medicines.insert(medicine.id, medicine.clone());
        Ok((medicine.clone(), inserted))
    }

    async fn update_medicine(&self, medicine: &Medicine) -> Result<Medicine> {
        let mut state = self.state.lock().unwrap();
        let stored = state
            .medicines
            .get_mut(&medicine.id)
            .ok_or_else(|| anyhow!("medicine {} not found", medicine.id))?;
        *stored = Medicine {
            patient_id: stored.patient_id,
            created_at: stored.created_at,
            updated_at: Utc::now(),
            ..medicine.clone()
        };
        Ok(stored.clone())
    }

    async fn delete_medicine(&self, id: MedicineId) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let removed = state.medicines.remove(&id).is_some();
        state.doses.retain(|d| d.medicine_id != id);
        Ok(removed)
    }

    async fn consume_dose(&self, id: MedicineId) -> Result<Option<Medicine>> {
        let mut state = self.state.lock().unwrap();
        Ok(state.medicines.get_mut(&id).map(|medicine| {
            medicine.pills_remaining = (medicine.pills_remaining - 1).max(0);
            medicine.clone()
        }))
    }

    async fn mark_low_stock_alerted(&self, id: MedicineId, at: DateTime<Utc>) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        match state.medicines.get_mut(&id) {
            Some(medicine) if medicine.low_stock_alert_at.is_none() => {
                medicine.low_stock_alert_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn insert_intake(&self, intake: &MedicineIntake) -> Result<MedicineIntake> {
        self.state.lock().unwrap().intakes.push(intake.clone());
        Ok(intake.clone())
    }

    async fn recent_intakes(
        &self,
        patient_id: PatientId,
        limit: i64,
    ) -> Result<Vec<MedicineIntake>> {
        let mut intakes: Vec<_> = self
            .intakes()
            .into_iter()
            .filter(|i| i.patient_id == patient_id)
            .collect();
        intakes.sort_by(|a, b| b.scheduled_at.cmp(&a.scheduled_at));
        intakes.truncate(limit.max(0) as usize);
        Ok(intakes)
    }
}

#[async_trait]
impl BaseCaregiverResolver for InMemoryStore {
    async fn accepted_caregivers(&self, patient_id: PatientId) -> Result<Vec<CaregiverLink>> {
        let mut links: Vec<_> = self
            .state
            .lock()
            .unwrap()
            .caregivers
            .iter()
            .filter(|l| l.patient_id == patient_id && l.status == CaregiverLinkStatus::Accepted)
            .cloned()
            .collect();
        links.sort_by_key(|l| l.created_at);
        Ok(links)
    }
}

// =============================================================================
// Mock Notifier
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub address: String,
    pub subject: String,
    pub body: String,
}

#[derive(Default)]
pub struct MockNotifier {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    attempts: Arc<Mutex<usize>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every send to `address` until `recover` is called.
    pub fn fail_for(&self, address: &str) {
        self.failing.lock().unwrap().insert(address.to_string());
    }

    pub fn recover(&self, address: &str) {
        self.failing.lock().unwrap().remove(address);
    }

    /// Messages the notifier accepted, in order.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, address: &str) -> Vec<SentMessage> {
        self.sent()
            .into_iter()
            .filter(|m| m.address == address)
            .collect()
    }

    /// Every call to `send`, accepted or not.
    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
        *self.attempts.lock().unwrap() = 0;
    }
}

#[async_trait]
impl BaseNotifier for MockNotifier {
    async fn send(&self, address: &str, subject: &str, body: &str) -> Result<()> {
        *self.attempts.lock().unwrap() += 1;
        if self.failing.lock().unwrap().contains(address) {
            return Err(anyhow!("mock transport refused {}", address));
        }
        self.sent.lock().unwrap().push(SentMessage {
            address: address.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

// =============================================================================
// Mock AI (Generic LLM capabilities)
// =============================================================================

#[derive(Default)]
pub struct MockAI {
    responses: Arc<Mutex<Vec<String>>>,
    calls: Arc<Mutex<Vec<String>>>,
    failing: bool,
}

impl MockAI {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text response to the queue
    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.responses.lock().unwrap().push(response.into());
        self
    }

    /// Fail every completion
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    /// Get all prompts that were sent to the AI
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BaseAI for MockAI {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.calls.lock().unwrap().push(prompt.to_string());
        if self.failing {
            return Err(anyhow!("mock AI unavailable"));
        }

        let mut responses = self.responses.lock().unwrap();
        if !responses.is_empty() {
            Ok(responses.remove(0))
        } else {
            Ok("Mock AI response".to_string())
        }
    }
}

// =============================================================================
// TestDependencies - Builder for test dependencies
// =============================================================================

#[derive(Clone)]
pub struct TestDependencies {
    pub store: Arc<InMemoryStore>,
    pub notifier: Arc<MockNotifier>,
    pub schedule: ScheduleConfig,
    pub sweep: SweepConfig,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemoryStore::new()),
            notifier: Arc::new(MockNotifier::new()),
            schedule: ScheduleConfig::default(),
            sweep: SweepConfig::default(),
        }
    }

    pub fn schedule(mut self, schedule: ScheduleConfig) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn sweep(mut self, sweep: SweepConfig) -> Self {
        self.sweep = sweep;
        self
    }

    /// Wire the doubles into a ServerDeps
    pub fn into_server_deps(&self) -> ServerDeps {
        ServerDeps::new(
            self.store.clone(),
            self.store.clone(),
            self.store.clone(),
            self.notifier.clone(),
            self.schedule.clone(),
            self.sweep.clone(),
        )
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
