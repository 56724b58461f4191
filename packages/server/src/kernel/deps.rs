//! Server dependencies for activities (using traits for testability)
//!
//! This module provides the central dependency container used by the sweep,
//! the regimen activities and the intake recorder. Every external service is
//! a trait object so tests can swap in the in-memory doubles.

use std::sync::Arc;

use crate::config::{ScheduleConfig, SweepConfig};
use crate::kernel::{BaseCaregiverResolver, BaseDoseStore, BaseNotifier, BaseRegimenStore};

/// Server dependencies accessible to activities
#[derive(Clone)]
pub struct ServerDeps {
    pub doses: Arc<dyn BaseDoseStore>,
    pub regimens: Arc<dyn BaseRegimenStore>,
    pub caregivers: Arc<dyn BaseCaregiverResolver>,
    pub notifier: Arc<dyn BaseNotifier>,
    pub schedule: ScheduleConfig,
    pub sweep: SweepConfig,
}

impl ServerDeps {
    pub fn new(
        doses: Arc<dyn BaseDoseStore>,
        regimens: Arc<dyn BaseRegimenStore>,
        caregivers: Arc<dyn BaseCaregiverResolver>,
        notifier: Arc<dyn BaseNotifier>,
        schedule: ScheduleConfig,
        sweep: SweepConfig,
    ) -> Self {
        Self {
            doses,
            regimens,
            caregivers,
            notifier,
            schedule,
            sweep,
        }
    }
}
