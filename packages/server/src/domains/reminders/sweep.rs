//! The reminder sweep: one pass over the pre-reminder window and one over the
//! missed window.
//!
//! Every dose is handled on its own. A failure is logged against that dose
//! and the batch moves on; nothing here returns an error to the scheduler.
//! The idempotency flags are the only state the sweep relies on, so running
//! it twice at the same instant sends nothing the second time.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::templates;
use super::window::SweepWindows;
use crate::domains::doses::ScheduledDose;
use crate::domains::patients::Patient;
use crate::domains::regimens::Medicine;
use crate::kernel::ServerDeps;

/// Why a single dose was not fully handled in this sweep.
#[derive(Debug, Error)]
pub enum DoseFailure {
    /// Patient or medicine missing. Flags untouched, retried while in window.
    #[error("could not resolve dose: {0}")]
    Unresolved(String),

    /// The notifier rejected the message. Flag untouched.
    #[error("notification failed: {0}")]
    Notify(#[source] anyhow::Error),

    /// The message went out but the flag write failed, so a later sweep may
    /// send it again.
    #[error("flag write failed after send: {0}")]
    StoreWrite(#[source] anyhow::Error),
}

impl DoseFailure {
    fn kind(&self) -> &'static str {
        match self {
            Self::Unresolved(_) => "unresolved",
            Self::Notify(_) => "notify",
            Self::StoreWrite(_) => "store_write",
        }
    }
}

/// Counters for one pass of a sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassReport {
    pub candidates: usize,
    pub sent: usize,
    pub skipped: usize,
    pub notify_failures: usize,
    pub store_failures: usize,
    /// The candidate query itself failed; nothing in this pass was tried.
    pub query_failed: bool,
}

impl PassReport {
    fn record(&mut self, failure: &DoseFailure) {
        match failure {
            DoseFailure::Unresolved(_) => self.skipped += 1,
            DoseFailure::Notify(_) => self.notify_failures += 1,
            DoseFailure::StoreWrite(_) => {
                // The message did go out.
                self.sent += 1;
                self.store_failures += 1;
            }
        }
    }
}

/// What one sweep did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub at: DateTime<Utc>,
    pub windows: SweepWindows,
    pub pre_reminders: PassReport,
    pub missed: PassReport,
    pub caregivers_sent: usize,
    pub caregivers_failed: usize,
}

impl SweepReport {
    /// Total messages handed to the notifier successfully.
    pub fn messages_sent(&self) -> usize {
        self.pre_reminders.sent + self.missed.sent + self.caregivers_sent
    }
}

#[derive(Debug, Default)]
struct CaregiverOutcome {
    sent: usize,
    failed: usize,
}

/// Run one sweep as of `now`.
pub async fn run_sweep(deps: &ServerDeps, now: DateTime<Utc>) -> SweepReport {
    let windows = SweepWindows::around(now, &deps.sweep);
    let mut report = SweepReport {
        at: now,
        windows,
        pre_reminders: PassReport::default(),
        missed: PassReport::default(),
        caregivers_sent: 0,
        caregivers_failed: 0,
    };

    pre_reminder_pass(deps, &windows, &mut report).await;
    missed_pass(deps, &windows, &mut report).await;

    info!(
        at = %now,
        pre_candidates = report.pre_reminders.candidates,
        pre_sent = report.pre_reminders.sent,
        missed_candidates = report.missed.candidates,
        missed_sent = report.missed.sent,
        caregivers_sent = report.caregivers_sent,
        caregivers_failed = report.caregivers_failed,
        "Reminder sweep finished"
    );

    report
}

async fn pre_reminder_pass(deps: &ServerDeps, windows: &SweepWindows, report: &mut SweepReport) {
    let window = windows.pre_reminder;
    let doses = match deps.doses.find_pre_reminder_due(window.start, window.end).await {
        Ok(doses) => doses,
        Err(e) => {
            error!(error = %e, "Failed to query doses for pre-reminders");
            report.pre_reminders.query_failed = true;
            return;
        }
    };

    report.pre_reminders.candidates = doses.len();
    for dose in &doses {
        match send_pre_reminder(deps, dose).await {
            Ok(()) => report.pre_reminders.sent += 1,
            Err(failure) => {
                log_failure("pre_reminder", dose, &failure);
                report.pre_reminders.record(&failure);
            }
        }
    }
}

async fn missed_pass(deps: &ServerDeps, windows: &SweepWindows, report: &mut SweepReport) {
    let window = windows.missed;
    let doses = match deps.doses.find_missed_due(window.start, window.end).await {
        Ok(doses) => doses,
        Err(e) => {
            error!(error = %e, "Failed to query doses for missed alerts");
            report.missed.query_failed = true;
            return;
        }
    };

    report.missed.candidates = doses.len();
    for dose in &doses {
        match send_missed_alerts(deps, dose).await {
            Ok(outcome) => {
                report.missed.sent += 1;
                report.caregivers_sent += outcome.sent;
                report.caregivers_failed += outcome.failed;
            }
            Err(failure) => {
                log_failure("missed", dose, &failure);
                report.missed.record(&failure);
            }
        }
    }
}

async fn send_pre_reminder(deps: &ServerDeps, dose: &ScheduledDose) -> Result<(), DoseFailure> {
    let (patient, medicine) = resolve(deps, dose).await?;
    let message = templates::pre_reminder(
        &patient,
        &medicine,
        dose.scheduled_at,
        &deps.schedule.timezone,
    );

    deps.notifier
        .send(&patient.email, &message.subject, &message.body)
        .await
        .map_err(DoseFailure::Notify)?;

    let flagged = deps
        .doses
        .mark_pre_reminder_sent(dose.id)
        .await
        .map_err(DoseFailure::StoreWrite)?;
    if !flagged {
        debug!(dose_id = %dose.id, "Pre-reminder flag was already set");
    }

    info!(dose_id = %dose.id, patient_id = %patient.id, "Pre-reminder sent");
    Ok(())
}

async fn send_missed_alerts(
    deps: &ServerDeps,
    dose: &ScheduledDose,
) -> Result<CaregiverOutcome, DoseFailure> {
    let (patient, medicine) = resolve(deps, dose).await?;
    let tz = &deps.schedule.timezone;

    let message = templates::missed_dose(&patient, &medicine, dose.scheduled_at, tz);
    deps.notifier
        .send(&patient.email, &message.subject, &message.body)
        .await
        .map_err(DoseFailure::Notify)?;

    let outcome = alert_caregivers(deps, dose, &patient, &medicine).await;

    let flagged = deps
        .doses
        .mark_missed_notified(dose.id, outcome.sent > 0)
        .await
        .map_err(DoseFailure::StoreWrite)?;
    if !flagged {
        debug!(dose_id = %dose.id, "Missed-dose flag was already set");
    }

    info!(
        dose_id = %dose.id,
        patient_id = %patient.id,
        caregivers = outcome.sent,
        "Missed-dose alert sent"
    );
    Ok(outcome)
}

/// Caregiver trouble is logged and counted but never blocks the patient flag.
async fn alert_caregivers(
    deps: &ServerDeps,
    dose: &ScheduledDose,
    patient: &Patient,
    medicine: &Medicine,
) -> CaregiverOutcome {
    let mut outcome = CaregiverOutcome::default();

    let links = match deps.caregivers.accepted_caregivers(patient.id).await {
        Ok(links) => links,
        Err(e) => {
            warn!(dose_id = %dose.id, error = %e, "Failed to look up caregivers");
            return outcome;
        }
    };

    let recipients = deps.sweep.escalation.select(&links);
    if recipients.is_empty() {
        return outcome;
    }

    let message =
        templates::caregiver_alert(patient, medicine, dose.scheduled_at, &deps.schedule.timezone);
    for link in recipients {
        match deps
            .notifier
            .send(&link.email, &message.subject, &message.body)
            .await
        {
            Ok(()) => outcome.sent += 1,
            Err(e) => {
                warn!(
                    dose_id = %dose.id,
                    caregiver_link_id = %link.id,
                    error = %e,
                    "Failed to alert caregiver"
                );
                outcome.failed += 1;
            }
        }
    }
    outcome
}

async fn resolve(deps: &ServerDeps, dose: &ScheduledDose) -> Result<(Patient, Medicine), DoseFailure> {
    let patient = deps
        .regimens
        .find_patient(dose.patient_id)
        .await
        .map_err(|e| DoseFailure::Unresolved(format!("patient lookup failed: {}", e)))?
        .ok_or_else(|| DoseFailure::Unresolved(format!("patient {} not found", dose.patient_id)))?;

    let medicine = deps
        .regimens
        .find_medicine(dose.medicine_id)
        .await
        .map_err(|e| DoseFailure::Unresolved(format!("medicine lookup failed: {}", e)))?
        .ok_or_else(|| {
            DoseFailure::Unresolved(format!("medicine {} not found", dose.medicine_id))
        })?;

    Ok((patient, medicine))
}

fn log_failure(pass: &'static str, dose: &ScheduledDose, failure: &DoseFailure) {
    match failure {
        DoseFailure::Unresolved(_) => warn!(
            pass,
            dose_id = %dose.id,
            failure = failure.kind(),
            error = %failure,
            "Skipping dose"
        ),
        DoseFailure::Notify(_) | DoseFailure::StoreWrite(_) => error!(
            pass,
            dose_id = %dose.id,
            failure = failure.kind(),
            error = %failure,
            "Dose notification failed"
        ),
    }
}
