use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::models::CaregiverLink;

/// Which accepted caregivers hear about a missed dose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CaregiverEscalation {
    /// Only the earliest accepted caregiver.
    #[default]
    First,
    /// Every accepted caregiver.
    All,
}

impl CaregiverEscalation {
    /// Pick recipients from accepted links ordered oldest first.
    pub fn select<'a>(&self, accepted: &'a [CaregiverLink]) -> &'a [CaregiverLink] {
        match self {
            Self::First => &accepted[..accepted.len().min(1)],
            Self::All => accepted,
        }
    }
}

impl FromStr for CaregiverEscalation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "first" => Ok(Self::First),
            "all" => Ok(Self::All),
            other => Err(format!("unknown caregiver escalation {:?}", other)),
        }
    }
}

impl fmt::Display for CaregiverEscalation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First => f.write_str("first"),
            Self::All => f.write_str("all"),
        }
    }
}
