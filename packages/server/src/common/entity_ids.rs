//! Typed ID aliases for every persisted entity.

pub use super::id::Id;

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker for patients (the people taking medicine).
pub struct Patient;

/// Marker for medicine regimens.
pub struct Medicine;

/// Marker for scheduled dose occurrences.
pub struct ScheduledDose;

/// Marker for caregiver relationships.
pub struct CaregiverLink;

/// Marker for intake log entries.
pub struct MedicineIntake;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

pub type PatientId = Id<Patient>;
pub type MedicineId = Id<Medicine>;
pub type DoseId = Id<ScheduledDose>;
pub type CaregiverLinkId = Id<CaregiverLink>;
pub type IntakeId = Id<MedicineIntake>;
