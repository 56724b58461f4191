//! Regimen create/edit/delete and the doses they keep in step.

mod common;

use chrono::Duration;
use common::*;
use reminder_core::domains::doses::DoseStatus;
use reminder_core::domains::regimens::activities::{
    create_medicine, delete_medicine, get_medicine, list_medicines, update_medicine,
};
use reminder_core::domains::regimens::{RegimenError, ResyncPolicy, ScheduleError};
use reminder_core::ScheduleConfig;

#[tokio::test]
async fn create_generates_one_dose_per_day_and_time() {
    let fixture = Fixture::new();
    let patient = fixture.patient("Ada", "ada@example.org");

    let change = create_medicine(
        patient.id,
        medicine_input(&["08:00", "20:00"], date(2024, 4, 1), Some(date(2024, 4, 3))),
        &fixture.deps,
    )
    .await
    .unwrap();

    assert_eq!(change.doses_created, 6);
    assert_eq!(change.medicine.pills_remaining, 60);
    let doses = fixture.store().doses_for(change.medicine.id);
    assert_eq!(doses.len(), 6);
    assert_eq!(doses[0].scheduled_at, at(2024, 4, 1, 8, 0));
    assert_eq!(doses[5].scheduled_at, at(2024, 4, 3, 20, 0));
    assert!(doses.iter().all(|d| d.status == DoseStatus::Pending
        && !d.pre_reminder_sent
        && !d.post_missed_sent
        && !d.caregiver_notified));
}

#[tokio::test]
async fn times_are_local_to_the_configured_zone() {
    let fixture = Fixture::with_schedule(ScheduleConfig {
        timezone: chrono_tz::America::Chicago,
        ..ScheduleConfig::default()
    });
    let patient = fixture.patient("Ada", "ada@example.org");

    let change = create_medicine(
        patient.id,
        medicine_input(&["08:00"], date(2024, 4, 2), Some(date(2024, 4, 2))),
        &fixture.deps,
    )
    .await
    .unwrap();

    let doses = fixture.store().doses_for(change.medicine.id);
    // CDT is UTC-5.
    assert_eq!(doses[0].scheduled_at, at(2024, 4, 2, 13, 0));
}

#[tokio::test]
async fn open_ended_regimen_has_no_doses() {
    let fixture = Fixture::new();
    let patient = fixture.patient("Ada", "ada@example.org");

    let change = create_medicine(
        patient.id,
        medicine_input(&["08:00"], date(2024, 4, 1), None),
        &fixture.deps,
    )
    .await
    .unwrap();

    assert_eq!(change.doses_created, 0);
    assert!(fixture.store().medicine(change.medicine.id).is_some());
    assert!(fixture.store().doses().is_empty());
}

#[tokio::test]
async fn create_rejects_unknown_patient() {
    let fixture = Fixture::new();
    let stranger = reminder_core::domains::patients::Patient::new("Eve", "eve@example.org");

    let result = create_medicine(
        stranger.id,
        medicine_input(&["08:00"], date(2024, 4, 1), Some(date(2024, 4, 2))),
        &fixture.deps,
    )
    .await;

    assert!(matches!(result, Err(RegimenError::PatientNotFound)));
    assert!(fixture.store().doses().is_empty());
}

#[tokio::test]
async fn create_rejects_invalid_time() {
    let fixture = Fixture::new();
    let patient = fixture.patient("Ada", "ada@example.org");

    let result = create_medicine(
        patient.id,
        medicine_input(&["8am"], date(2024, 4, 1), Some(date(2024, 4, 2))),
        &fixture.deps,
    )
    .await;

    assert!(matches!(
        result,
        Err(RegimenError::InvalidSchedule(ScheduleError::InvalidDoseTime(_)))
    ));
}

#[tokio::test]
async fn create_rejects_reversed_dates() {
    let fixture = Fixture::new();
    let patient = fixture.patient("Ada", "ada@example.org");

    let result = create_medicine(
        patient.id,
        medicine_input(&["08:00"], date(2024, 4, 5), Some(date(2024, 4, 1))),
        &fixture.deps,
    )
    .await;

    assert!(matches!(
        result,
        Err(RegimenError::InvalidSchedule(ScheduleError::InvalidDateRange { .. }))
    ));
}

#[tokio::test]
async fn full_resync_leaves_no_stale_doses() {
    let fixture = Fixture::new();
    let patient = fixture.patient("Ada", "ada@example.org");
    let created = create_medicine(
        patient.id,
        medicine_input(&["08:00", "20:00"], date(2024, 4, 1), Some(date(2024, 4, 3))),
        &fixture.deps,
    )
    .await
    .unwrap();

    let change = update_medicine(
        patient.id,
        created.medicine.id,
        medicine_input(&["09:00"], date(2024, 4, 1), Some(date(2024, 4, 3))),
        at(2024, 4, 2, 12, 0),
        &fixture.deps,
    )
    .await
    .unwrap();

    assert_eq!(change.doses_removed, 6);
    assert_eq!(change.doses_created, 3);
    let times: Vec<_> = fixture
        .store()
        .doses_for(created.medicine.id)
        .iter()
        .map(|d| d.scheduled_at)
        .collect();
    assert_eq!(
        times,
        vec![
            at(2024, 4, 1, 9, 0),
            at(2024, 4, 2, 9, 0),
            at(2024, 4, 3, 9, 0)
        ]
    );
}

#[tokio::test]
async fn future_only_resync_keeps_the_past() {
    let fixture = Fixture::with_schedule(ScheduleConfig {
        resync_policy: ResyncPolicy::FutureOnly,
        ..ScheduleConfig::default()
    });
    let patient = fixture.patient("Ada", "ada@example.org");
    let created = create_medicine(
        patient.id,
        medicine_input(&["08:00"], date(2024, 4, 1), Some(date(2024, 4, 4))),
        &fixture.deps,
    )
    .await
    .unwrap();
    let now = at(2024, 4, 2, 12, 0);

    let change = update_medicine(
        patient.id,
        created.medicine.id,
        medicine_input(&["10:00"], date(2024, 4, 1), Some(date(2024, 4, 4))),
        now,
        &fixture.deps,
    )
    .await
    .unwrap();

    assert_eq!(change.doses_removed, 2);
    assert_eq!(change.doses_created, 2);
    let times: Vec<_> = fixture
        .store()
        .doses_for(created.medicine.id)
        .iter()
        .map(|d| d.scheduled_at)
        .collect();
    assert_eq!(
        times,
        vec![
            at(2024, 4, 1, 8, 0),
            at(2024, 4, 2, 8, 0),
            at(2024, 4, 3, 10, 0),
            at(2024, 4, 4, 10, 0)
        ]
    );
}

#[tokio::test]
async fn edit_without_schedule_change_keeps_doses() {
    let fixture = Fixture::new();
    let patient = fixture.patient("Ada", "ada@example.org");
    let created = create_medicine(
        patient.id,
        medicine_input(&["08:00"], date(2024, 4, 1), Some(date(2024, 4, 3))),
        &fixture.deps,
    )
    .await
    .unwrap();
    let before: Vec<_> = fixture
        .store()
        .doses_for(created.medicine.id)
        .iter()
        .map(|d| d.id)
        .collect();

    let mut input = medicine_input(&["08:00"], date(2024, 4, 1), Some(date(2024, 4, 3)));
    input.dosage = "1000mg".to_string();
    let change = update_medicine(
        patient.id,
        created.medicine.id,
        input,
        at(2024, 4, 2, 12, 0),
        &fixture.deps,
    )
    .await
    .unwrap();

    assert_eq!(change.medicine.dosage, "1000mg");
    assert_eq!(change.doses_removed, 0);
    let after: Vec<_> = fixture
        .store()
        .doses_for(created.medicine.id)
        .iter()
        .map(|d| d.id)
        .collect();
    assert_eq!(before, after);
}

#[tokio::test]
async fn restock_clears_low_stock_alert() {
    let fixture = Fixture::new();
    let patient = fixture.patient("Ada", "ada@example.org");
    let created = create_medicine(
        patient.id,
        medicine_input(&["08:00"], date(2024, 4, 1), None),
        &fixture.deps,
    )
    .await
    .unwrap();
    let mut stale = created.medicine.clone();
    stale.pills_remaining = 2;
    stale.low_stock_alert_at = Some(at(2024, 4, 1, 9, 0));
    fixture.store().add_medicine(stale);

    let mut input = medicine_input(&["08:00"], date(2024, 4, 1), None);
    input.total_quantity = Some(90);
    let change = update_medicine(
        patient.id,
        created.medicine.id,
        input,
        at(2024, 4, 2, 12, 0),
        &fixture.deps,
    )
    .await
    .unwrap();

    assert_eq!(change.medicine.total_quantity, 90);
    assert_eq!(change.medicine.pills_remaining, 90);
    assert!(change.medicine.low_stock_alert_at.is_none());
}

#[tokio::test]
async fn other_patients_medicine_is_not_found() {
    let fixture = Fixture::new();
    let ada = fixture.patient("Ada", "ada@example.org");
    let eve = fixture.patient("Eve", "eve@example.org");
    let medicine = fixture.medicine(&ada, "Metformin");
    fixture.dose(&ada, &medicine, at(2024, 4, 2, 8, 0));

    let update = update_medicine(
        eve.id,
        medicine.id,
        medicine_input(&["09:00"], date(2024, 4, 1), Some(date(2024, 4, 3))),
        at(2024, 4, 2, 12, 0),
        &fixture.deps,
    )
    .await;
    let delete = delete_medicine(eve.id, medicine.id, &fixture.deps).await;

    assert!(matches!(update, Err(RegimenError::NotFound)));
    assert!(matches!(delete, Err(RegimenError::NotFound)));
    assert_eq!(fixture.store().doses_for(medicine.id).len(), 1);
}

#[tokio::test]
async fn delete_removes_medicine_and_doses() {
    let fixture = Fixture::new();
    let patient = fixture.patient("Ada", "ada@example.org");
    let created = create_medicine(
        patient.id,
        medicine_input(&["08:00"], date(2024, 4, 1), Some(date(2024, 4, 10))),
        &fixture.deps,
    )
    .await
    .unwrap();
    let keep = fixture.medicine(&patient, "Lisinopril");
    fixture.dose(&patient, &keep, at(2024, 4, 2, 8, 0) + Duration::minutes(5));

    let removed = delete_medicine(patient.id, created.medicine.id, &fixture.deps)
        .await
        .unwrap();

    assert_eq!(removed, 10);
    assert!(fixture.store().medicine(created.medicine.id).is_none());
    assert!(fixture.store().doses_for(created.medicine.id).is_empty());
    assert_eq!(fixture.store().doses().len(), 1);
}

#[tokio::test]
async fn failed_dose_insert_leaves_no_medicine_behind() {
    let fixture = Fixture::new();
    let patient = fixture.patient("Ada", "ada@example.org");
    fixture.store().fail_dose_inserts(true);

    let result = create_medicine(
        patient.id,
        medicine_input(&["08:00"], date(2024, 4, 1), Some(date(2024, 4, 3))),
        &fixture.deps,
    )
    .await;

    assert!(matches!(result, Err(RegimenError::Store(_))));
    let listed = list_medicines(patient.id, &fixture.deps).await.unwrap();
    assert!(listed.is_empty());
    assert!(fixture.store().doses().is_empty());

    fixture.store().fail_dose_inserts(false);
    let change = create_medicine(
        patient.id,
        medicine_input(&["08:00"], date(2024, 4, 1), Some(date(2024, 4, 3))),
        &fixture.deps,
    )
    .await
    .unwrap();
    assert_eq!(change.doses_created, 3);
    assert_eq!(fixture.store().doses_for(change.medicine.id).len(), 3);
}

#[tokio::test]
async fn list_medicines_returns_only_the_patients_own_newest_first() {
    let fixture = Fixture::new();
    let ada = fixture.patient("Ada", "ada@example.org");
    let eve = fixture.patient("Eve", "eve@example.org");
    let older = fixture.medicine(&ada, "Metformin");
    let mut newer = fixture.medicine(&ada, "Lisinopril");
    newer.created_at = older.created_at + Duration::minutes(1);
    fixture.store().add_medicine(newer.clone());
    fixture.medicine(&eve, "Aspirin");

    let names: Vec<_> = list_medicines(ada.id, &fixture.deps)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.name)
        .collect();

    assert_eq!(names, vec!["Lisinopril", "Metformin"]);
}

#[tokio::test]
async fn list_medicines_for_unknown_patient() {
    let fixture = Fixture::new();
    let stranger = reminder_core::domains::patients::Patient::new("Eve", "eve@example.org");

    let result = list_medicines(stranger.id, &fixture.deps).await;

    assert!(matches!(result, Err(RegimenError::PatientNotFound)));
}

#[tokio::test]
async fn get_medicine_checks_ownership() {
    let fixture = Fixture::new();
    let ada = fixture.patient("Ada", "ada@example.org");
    let eve = fixture.patient("Eve", "eve@example.org");
    let medicine = fixture.medicine(&ada, "Metformin");

    let own = get_medicine(ada.id, medicine.id, &fixture.deps).await.unwrap();
    let other = get_medicine(eve.id, medicine.id, &fixture.deps).await;

    assert_eq!(own.id, medicine.id);
    assert!(matches!(other, Err(RegimenError::NotFound)));
}
