use chrono::NaiveDate;
use serde::Deserialize;

/// Regimen fields as submitted by a client, for both create and update.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicineInput {
    pub name: String,
    pub dosage: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub times: Vec<String>,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub total_quantity: Option<i32>,
    #[serde(default)]
    pub low_stock_threshold: Option<i32>,
}
