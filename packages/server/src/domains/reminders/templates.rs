//! Email templates for dose reminders, missed-dose alerts and low stock.
//!
//! Bodies are small HTML fragments. Every user-supplied value is escaped and
//! instants are rendered in the deployment time zone.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::domains::patients::Patient;
use crate::domains::regimens::Medicine;

/// A rendered message ready for a notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub subject: String,
    pub body: String,
}

pub fn pre_reminder(patient: &Patient, medicine: &Medicine, at: DateTime<Utc>, tz: &Tz) -> Message {
    let mut body = String::from("<h2>Medicine Reminder</h2>\n");
    body.push_str(&format!("<p>Hi {},</p>\n", escape(&patient.name)));
    body.push_str(&format!(
        "<p>This is a reminder that your medicine <b>{}</b>{} is scheduled for <b>{}</b>.</p>\n",
        escape(&medicine.name),
        dosage_suffix(medicine),
        render_time(at, tz),
    ));
    push_notes(&mut body, medicine);
    body.push_str("<p>Please ensure you take your dose on time.</p>\n");

    Message {
        subject: format!("Your medicine is due soon: {}", medicine.name),
        body,
    }
}

pub fn missed_dose(patient: &Patient, medicine: &Medicine, at: DateTime<Utc>, tz: &Tz) -> Message {
    let mut body = String::from("<h2>Missed Medicine Alert</h2>\n");
    body.push_str(&format!("<p>Hi {},</p>\n", escape(&patient.name)));
    body.push_str(&format!(
        "<p>It looks like you missed your scheduled dose of <b>{}</b>{} at <b>{}</b>.</p>\n",
        escape(&medicine.name),
        dosage_suffix(medicine),
        render_time(at, tz),
    ));
    body.push_str("<p><b>Please take your dose as soon as possible.</b></p>\n");
    push_notes(&mut body, medicine);

    Message {
        subject: "You missed your medicine!".to_string(),
        body,
    }
}

pub fn caregiver_alert(
    patient: &Patient,
    medicine: &Medicine,
    at: DateTime<Utc>,
    tz: &Tz,
) -> Message {
    let name = escape(&patient.name);
    let mut body = format!("<h2>Missed Medicine Alert for {}</h2>\n", name);
    body.push_str(&format!(
        "<p>{} missed their scheduled dose of <b>{}</b>{} at <b>{}</b>.</p>\n",
        name,
        escape(&medicine.name),
        dosage_suffix(medicine),
        render_time(at, tz),
    ));
    body.push_str("<p>Please check in with them to ensure their safety.</p>\n");

    Message {
        subject: format!("Missed medicine alert for {}", patient.name),
        body,
    }
}

pub fn low_stock(medicine: &Medicine) -> Message {
    let mut body = String::from("<h2>Low Stock Alert</h2>\n");
    body.push_str(&format!(
        "<p>Your medicine {} is running low.</p>\n",
        escape(&medicine.name)
    ));
    body.push_str(&format!(
        "<p>Current quantity: {} pills</p>\n",
        medicine.pills_remaining
    ));
    body.push_str("<p>Please refill soon to ensure uninterrupted treatment.</p>\n");

    Message {
        subject: format!("Low Stock Alert: {}", medicine.name),
        body,
    }
}

/// "2024-03-10 08:00 CST" style, in `tz`.
pub fn render_time(at: DateTime<Utc>, tz: &Tz) -> String {
    at.with_timezone(tz).format("%Y-%m-%d %H:%M %Z").to_string()
}

fn dosage_suffix(medicine: &Medicine) -> String {
    let dosage = medicine.dosage.trim();
    if dosage.is_empty() {
        String::new()
    } else {
        format!(" ({})", escape(dosage))
    }
}

fn push_notes(body: &mut String, medicine: &Medicine) {
    if let Some(notes) = medicine.notes.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        body.push_str(&format!("<p><b>Notes:</b> {}</p>\n", escape(notes)));
    }
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::PatientId;
    use chrono::{NaiveDate, TimeZone};

    fn patient() -> Patient {
        Patient::new("Ada", "ada@example.org")
    }

    fn medicine(notes: Option<&str>) -> Medicine {
        Medicine::builder()
            .patient_id(PatientId::new())
            .name("Warfarin")
            .dosage("5mg")
            .notes(notes.map(str::to_string))
            .times(vec!["08:00".to_string()])
            .start_date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
            .pills_remaining(3)
            .build()
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 14, 0, 0).unwrap()
    }

    #[test]
    fn pre_reminder_mentions_dose_and_notes() {
        let message = pre_reminder(&patient(), &medicine(Some("with food")), at(), &Tz::UTC);

        assert_eq!(message.subject, "Your medicine is due soon: Warfarin");
        assert!(message.body.contains("Hi Ada"));
        assert!(message.body.contains("<b>Warfarin</b> (5mg)"));
        assert!(message.body.contains("2024-03-10 14:00 UTC"));
        assert!(message.body.contains("<b>Notes:</b> with food"));
    }

    #[test]
    fn notes_omitted_when_blank() {
        let message = missed_dose(&patient(), &medicine(Some("   ")), at(), &Tz::UTC);
        assert_eq!(message.subject, "You missed your medicine!");
        assert!(!message.body.contains("Notes"));
    }

    #[test]
    fn times_render_in_deployment_zone() {
        let message = caregiver_alert(
            &patient(),
            &medicine(None),
            at(),
            &chrono_tz::America::Chicago,
        );
        assert_eq!(message.subject, "Missed medicine alert for Ada");
        assert!(message.body.contains("Ada missed their scheduled dose"));
        assert!(message.body.contains("2024-03-10 09:00 CDT"));
    }

    #[test]
    fn low_stock_reports_remaining() {
        let message = low_stock(&medicine(None));
        assert_eq!(message.subject, "Low Stock Alert: Warfarin");
        assert!(message.body.contains("Current quantity: 3 pills"));
    }

    #[test]
    fn user_text_is_escaped() {
        let evil = Patient::new("<script>", "x@example.org");
        let message = pre_reminder(&evil, &medicine(Some("a & b")), at(), &Tz::UTC);
        assert!(message.body.contains("Hi &lt;script&gt;"));
        assert!(message.body.contains("a &amp; b"));
    }
}
