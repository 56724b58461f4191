pub mod caregiver_link;

pub use caregiver_link::{CaregiverLink, CaregiverLinkStatus, CaregiverRole};
