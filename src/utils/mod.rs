//! Utility modules: error types, logging setup, and backoff helpers.

pub mod backoff;
pub mod error;
pub mod logging;

pub use backoff::Backoff;
pub use error::{MedPlantError, Result};
pub use logging::{init_default_logging, init_logging, LogConfig, LogLevel, ProgressLogger};
