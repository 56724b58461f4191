use chrono::{DateTime, Utc};

use crate::config::ScheduleConfig;
use crate::domains::doses::ScheduledDose;
use crate::domains::regimens::schedule::parse_dose_times;
use crate::domains::regimens::{DoseSchedule, Medicine, MedicineInput, RegimenError, ScheduleError};

/// Expand a medicine into pending doses. Without an end date nothing is
/// generated. With `after`, only doses strictly later than it are produced.
pub fn generate_doses(
    medicine: &Medicine,
    config: &ScheduleConfig,
    after: Option<DateTime<Utc>>,
) -> Result<Vec<ScheduledDose>, ScheduleError> {
    let Some(end_date) = medicine.end_date else {
        return Ok(Vec::new());
    };

    let schedule = DoseSchedule::new(&medicine.times, medicine.start_date, end_date, config.max_days)?;
    let instants = match after {
        Some(after) => schedule.expand_after(&config.timezone, after),
        None => schedule.expand(&config.timezone),
    };

    Ok(instants
        .into_iter()
        .map(|at| ScheduledDose::pending(medicine.patient_id, medicine.id, at))
        .collect())
}

/// Reject input the generator or the store would choke on.
pub fn validate_input(input: &MedicineInput, config: &ScheduleConfig) -> Result<(), RegimenError> {
    if input.name.trim().is_empty() {
        return Err(RegimenError::MissingField("name"));
    }
    if input.dosage.trim().is_empty() {
        return Err(RegimenError::MissingField("dosage"));
    }
    if input.total_quantity.is_some_and(|q| q < 0) || input.low_stock_threshold.is_some_and(|t| t < 0) {
        return Err(RegimenError::NegativeQuantity);
    }

    match input.end_date {
        Some(end_date) => {
            DoseSchedule::new(&input.times, input.start_date, end_date, config.max_days)?;
        }
        None => {
            parse_dose_times(&input.times)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::PatientId;
    use chrono::{NaiveDate, TimeZone};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn medicine(times: &[&str], end: Option<NaiveDate>) -> Medicine {
        Medicine::builder()
            .patient_id(PatientId::new())
            .name("Lisinopril")
            .dosage("10mg")
            .times(times.iter().map(|t| t.to_string()).collect::<Vec<_>>())
            .start_date(date(2024, 3, 1))
            .end_date(end)
            .build()
    }

    fn input(times: &[&str], end: Option<NaiveDate>) -> MedicineInput {
        MedicineInput {
            name: "Lisinopril".into(),
            dosage: "10mg".into(),
            notes: None,
            times: times.iter().map(|t| t.to_string()).collect(),
            start_date: date(2024, 3, 1),
            end_date: end,
            total_quantity: Some(30),
            low_stock_threshold: None,
        }
    }

    #[test]
    fn days_times_product() {
        let medicine = medicine(&["08:00", "14:00", "20:00"], Some(date(2024, 3, 10)));
        let doses = generate_doses(&medicine, &ScheduleConfig::default(), None).unwrap();

        assert_eq!(doses.len(), 30);
        assert!(doses.iter().all(|d| d.medicine_id == medicine.id));
        assert!(doses.iter().all(|d| d.patient_id == medicine.patient_id));
        assert!(doses.windows(2).all(|w| w[0].scheduled_at < w[1].scheduled_at));
    }

    #[test]
    fn open_ended_regimen_generates_nothing() {
        let medicine = medicine(&["08:00"], None);
        let doses = generate_doses(&medicine, &ScheduleConfig::default(), None).unwrap();
        assert!(doses.is_empty());
    }

    #[test]
    fn after_cuts_off_past_doses() {
        let medicine = medicine(&["08:00", "20:00"], Some(date(2024, 3, 3)));
        let cutoff = Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).unwrap();
        let doses = generate_doses(&medicine, &ScheduleConfig::default(), Some(cutoff)).unwrap();

        assert_eq!(doses.len(), 3);
        assert!(doses.iter().all(|d| d.scheduled_at > cutoff));
    }

    #[test]
    fn validation_rejects_bad_input() {
        let config = ScheduleConfig::default();
        assert!(validate_input(&input(&["08:00"], Some(date(2024, 3, 31))), &config).is_ok());
        assert!(validate_input(&input(&["08:00"], None), &config).is_ok());

        assert!(matches!(
            validate_input(&input(&["25:00"], None), &config),
            Err(RegimenError::InvalidSchedule(ScheduleError::InvalidDoseTime(_)))
        ));
        assert!(matches!(
            validate_input(&input(&["08:00"], Some(date(2024, 2, 1))), &config),
            Err(RegimenError::InvalidSchedule(ScheduleError::InvalidDateRange { .. }))
        ));

        let mut blank = input(&["08:00"], None);
        blank.name = "  ".into();
        assert!(matches!(
            validate_input(&blank, &config),
            Err(RegimenError::MissingField("name"))
        ));

        let mut negative = input(&["08:00"], None);
        negative.total_quantity = Some(-1);
        assert!(matches!(
            validate_input(&negative, &config),
            Err(RegimenError::NegativeQuantity)
        ));
    }
}
