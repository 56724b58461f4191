//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod email;
pub mod postgres_store;
pub mod scheduled_tasks;
pub mod test_dependencies;
pub mod traits;

pub use deps::ServerDeps;
pub use email::{HttpEmailNotifier, LogNotifier};
pub use postgres_store::PostgresStore;
pub use scheduled_tasks::{start_scheduler, SweepRunner};
pub use test_dependencies::TestDependencies;
pub use traits::*;
