//! Interaction domain - cached drug-interaction lookups and medicine details
//! from a language model.

pub mod cache;
pub mod details;
pub mod lookup;

pub use cache::{fingerprint, InteractionCache};
pub use details::{MedicineDetails, MedicineProfile};
pub use lookup::{fetch_medicine_details, lookup_interactions, DrugInteraction, Severity};
