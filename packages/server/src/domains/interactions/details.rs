//! Free-form medicine details from a language model, parsed into one of
//! three shapes callers must handle explicitly.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicineProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub common_side_effects: Vec<String>,
    #[serde(default)]
    pub serious_side_effects: Vec<String>,
    #[serde(default)]
    pub precautions: Vec<String>,
    #[serde(default)]
    pub expected_effects: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MedicineDetails {
    Structured(MedicineProfile),
    /// The model answered, but not with the JSON object asked for.
    RawText(String),
    /// No answer at all.
    Error(String),
}

impl MedicineDetails {
    /// Parse model output. A JSON object (optionally inside a ```json fence)
    /// becomes `Structured`; anything else is kept verbatim as `RawText`.
    pub fn parse(text: &str) -> Self {
        let profile = serde_json::from_str::<serde_json::Value>(strip_fence(text))
            .ok()
            .filter(serde_json::Value::is_object)
            .and_then(|value| serde_json::from_value::<MedicineProfile>(value).ok());
        match profile {
            Some(profile) => Self::Structured(profile),
            None => Self::RawText(text.to_string()),
        }
    }

    /// One line suitable for a list view.
    pub fn headline(&self) -> String {
        match self {
            Self::Structured(profile) if !profile.summary.is_empty() => profile.summary.clone(),
            Self::Structured(profile) => profile.name.clone(),
            Self::RawText(text) => text.lines().next().unwrap_or_default().trim().to_string(),
            Self::Error(message) => format!("Details unavailable: {}", message),
        }
    }
}

/// Strip a surrounding markdown code fence, if any.
pub(crate) fn strip_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_object_is_structured() {
        let details = MedicineDetails::parse(
            r#"{"name":"Ibuprofen","summary":"NSAID pain reliever","common_side_effects":["nausea"]}"#,
        );
        match details {
            MedicineDetails::Structured(profile) => {
                assert_eq!(profile.name, "Ibuprofen");
                assert_eq!(profile.common_side_effects, vec!["nausea"]);
                assert!(profile.precautions.is_empty());
            }
            other => panic!("expected structured details, got {:?}", other),
        }
    }

    #[test]
    fn fenced_json_is_structured() {
        let details = MedicineDetails::parse("```json\n{\"name\":\"Ibuprofen\"}\n```");
        assert!(matches!(details, MedicineDetails::Structured(_)));
    }

    #[test]
    fn prose_is_raw_text() {
        let details = MedicineDetails::parse("Ibuprofen is an NSAID.\nTake with food.");
        assert_eq!(
            details,
            MedicineDetails::RawText("Ibuprofen is an NSAID.\nTake with food.".into())
        );
        assert_eq!(details.headline(), "Ibuprofen is an NSAID.");
    }

    #[test]
    fn headline_covers_every_shape() {
        let structured = MedicineDetails::Structured(MedicineProfile {
            name: "Ibuprofen".into(),
            ..Default::default()
        });
        assert_eq!(structured.headline(), "Ibuprofen");
        assert_eq!(
            MedicineDetails::Error("timeout".into()).headline(),
            "Details unavailable: timeout"
        );
    }

    #[test]
    fn serialises_with_kind_tag() {
        let json = serde_json::to_value(MedicineDetails::RawText("hi".into())).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "raw_text", "value": "hi"}));
    }
}
