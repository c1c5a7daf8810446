//! Utility modules: error types and logging helpers.

pub mod error;
pub mod logging;

pub use error::{PrepError, Result};
pub use logging::{init_logging, LogConfig, LogLevel, ProgressLogger};
