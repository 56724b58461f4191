//! Interaction and detail lookups through a language model, fronted by the
//! interaction cache.
//!
//! The caller injects the model client as a [`BaseAI`]; no vendor client
//! ships with this crate.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::cache::{fingerprint, InteractionCache};
use super::details::{strip_fence, MedicineDetails};
use crate::kernel::BaseAI;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Major,
    Moderate,
    Minor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrugInteraction {
    pub drug_a: String,
    pub drug_b: String,
    pub severity: Severity,
    pub description: String,
    #[serde(default)]
    pub management: String,
}

impl DrugInteraction {
    pub fn is_critical(&self) -> bool {
        self.severity == Severity::Major
    }
}

/// Interactions between `names`, served from `cache` when a fresh entry
/// exists. Fewer than two distinct medicines cannot interact.
///
/// A reply that is not a JSON array of interactions yields an empty list and
/// is not cached, so the next call asks again.
pub async fn lookup_interactions<S: AsRef<str>>(
    cache: &InteractionCache<Vec<DrugInteraction>>,
    ai: &dyn BaseAI,
    names: &[S],
    now: DateTime<Utc>,
) -> Result<Vec<DrugInteraction>> {
    let mut distinct: Vec<&str> = names
        .iter()
        .map(|n| n.as_ref().trim())
        .filter(|n| !n.is_empty())
        .collect();
    distinct.sort_unstable_by_key(|n| n.to_lowercase());
    distinct.dedup_by(|a, b| a.eq_ignore_ascii_case(b));
    if distinct.len() < 2 {
        return Ok(Vec::new());
    }

    let key = fingerprint(distinct.as_slice());
    if let Some(hit) = cache.get(&key, now).await {
        debug!(key = %key, "Interaction cache hit");
        return Ok(hit);
    }

    let reply = ai.complete(&interaction_prompt(&distinct)).await?;
    match serde_json::from_str::<Vec<DrugInteraction>>(strip_fence(&reply)) {
        Ok(interactions) => {
            cache.insert(key, interactions.clone(), now).await;
            Ok(interactions)
        }
        Err(e) => {
            warn!(error = %e, "Interaction reply was not a JSON array");
            Ok(Vec::new())
        }
    }
}

/// Details for one medicine. Never fails: a model error becomes
/// `MedicineDetails::Error`.
pub async fn fetch_medicine_details(
    ai: &dyn BaseAI,
    name: &str,
    dosage: Option<&str>,
) -> MedicineDetails {
    match ai.complete(&details_prompt(name, dosage)).await {
        Ok(reply) => MedicineDetails::parse(&reply),
        Err(e) => {
            warn!(medicine = name, error = %e, "Medicine details lookup failed");
            MedicineDetails::Error("could not fetch medicine details".to_string())
        }
    }
}

fn interaction_prompt(names: &[&str]) -> String {
    format!(
        "Given these medicines: {}\n\n\
         Analyze potential drug interactions. Respond with a JSON array of objects with the keys \
         \"drugA\", \"drugB\", \"severity\" (major, moderate or minor), \"description\" and \
         \"management\". Return only the JSON array, no other text.",
        names.join(", ")
    )
}

fn details_prompt(name: &str, dosage: Option<&str>) -> String {
    format!(
        "For the medicine {} {}:\n\
         summarise what it is and how it works, list common and serious side effects, \
         precautions and expected effects.\n\n\
         Respond with a JSON object with the keys \"name\", \"summary\", \"common_side_effects\", \
         \"serious_side_effects\", \"precautions\" and \"expected_effects\".",
        name,
        dosage.unwrap_or_default()
    )
}
