//! Shared message model and error hierarchy for the xAI adapter.

pub mod error;
pub mod message;
pub mod provider;
pub mod settings;

pub use error::{ApiError, ConfigError};
pub use message::*;
pub use settings::ModelSettings;
