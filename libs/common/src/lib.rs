//! Shared support library for the regulator tools
//!
//! Provides:
//! - logging initialization (`tracing` subscriber, runtime level changes)
//! - layered engine settings (defaults, settings file, environment)

pub mod error;
pub mod logging;
pub mod settings;

pub use error::{Error, Result};
pub use settings::EngineSettings;
