//! Test fixtures for creating test data.
//!
//! `Fixture` wires the in-memory doubles into a ServerDeps and offers short
//! constructors for the records a test needs.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use reminder_core::domains::caregivers::{CaregiverLink, CaregiverLinkStatus, CaregiverRole};
use reminder_core::domains::doses::ScheduledDose;
use reminder_core::domains::patients::Patient;
use reminder_core::domains::regimens::{Medicine, MedicineInput};
use reminder_core::kernel::test_dependencies::{InMemoryStore, MockNotifier};
use reminder_core::kernel::{ServerDeps, TestDependencies};
use reminder_core::{ScheduleConfig, SweepConfig};

pub struct Fixture {
    pub test: TestDependencies,
    pub deps: ServerDeps,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with(TestDependencies::new())
    }

    pub fn with(test: TestDependencies) -> Self {
        let deps = test.into_server_deps();
        Self { test, deps }
    }

    pub fn with_schedule(schedule: ScheduleConfig) -> Self {
        Self::with(TestDependencies::new().schedule(schedule))
    }

    pub fn with_sweep(sweep: SweepConfig) -> Self {
        Self::with(TestDependencies::new().sweep(sweep))
    }

    pub fn store(&self) -> &InMemoryStore {
        &self.test.store
    }

    pub fn notifier(&self) -> &MockNotifier {
        &self.test.notifier
    }

    pub fn patient(&self, name: &str, email: &str) -> Patient {
        self.store().add_patient(Patient::new(name, email))
    }

    /// An open-ended regimen with a single morning dose and plenty of stock.
    pub fn medicine(&self, patient: &Patient, name: &str) -> Medicine {
        self.store().add_medicine(
            Medicine::builder()
                .patient_id(patient.id)
                .name(name)
                .dosage("10mg")
                .times(vec!["08:00".to_string()])
                .start_date(date(2024, 4, 1))
                .total_quantity(30)
                .pills_remaining(30)
                .build(),
        )
    }

    pub fn dose(&self, patient: &Patient, medicine: &Medicine, at: DateTime<Utc>) -> ScheduledDose {
        self.store()
            .add_dose(ScheduledDose::pending(patient.id, medicine.id, at))
    }

    pub fn caregiver(&self, patient: &Patient, email: &str) -> CaregiverLink {
        self.caregiver_with_status(patient, email, CaregiverLinkStatus::Accepted)
    }

    pub fn caregiver_with_status(
        &self,
        patient: &Patient,
        email: &str,
        status: CaregiverLinkStatus,
    ) -> CaregiverLink {
        self.store().add_caregiver(CaregiverLink::new(
            patient.id,
            email,
            status,
            CaregiverRole::View,
        ))
    }

    /// Accepted link with an explicit creation time, for ordering tests.
    pub fn caregiver_since(
        &self,
        patient: &Patient,
        email: &str,
        created_at: DateTime<Utc>,
    ) -> CaregiverLink {
        let mut link = CaregiverLink::new(
            patient.id,
            email,
            CaregiverLinkStatus::Accepted,
            CaregiverRole::View,
        );
        link.created_at = created_at;
        self.store().add_caregiver(link)
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

/// Regimen input with the given times and an inclusive date range.
pub fn medicine_input(times: &[&str], start: NaiveDate, end: Option<NaiveDate>) -> MedicineInput {
    MedicineInput {
        name: "Metformin".to_string(),
        dosage: "500mg".to_string(),
        notes: Some("Take with food".to_string()),
        times: times.iter().map(|t| t.to_string()).collect(),
        start_date: start,
        end_date: end,
        total_quantity: Some(60),
        low_stock_threshold: Some(5),
    }
}
