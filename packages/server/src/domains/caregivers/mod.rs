//! Caregiver domain - accepted caregiver relationships and the policy for
//! escalating missed doses to them.

pub mod escalation;
pub mod models;

pub use escalation::CaregiverEscalation;
pub use models::{CaregiverLink, CaregiverLinkStatus, CaregiverRole};
