// HTTP routes
pub mod doses;
pub mod error;
pub mod health;
pub mod medicines;

pub use doses::*;
pub use error::ApiError;
pub use health::*;
pub use medicines::*;
