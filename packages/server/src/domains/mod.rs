// Business domains
pub mod caregivers;
pub mod doses;
pub mod interactions;
pub mod patients;
pub mod regimens;
pub mod reminders;
