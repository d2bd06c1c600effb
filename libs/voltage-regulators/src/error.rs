//! Engine Error Types

use std::fmt;

use thiserror::Error;

use crate::error_history::ErrorType;
use crate::i2c::I2cError;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Kind of entity registered in the ID map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Device,
    Rail,
    Rule,
}

impl fmt::Display for IdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IdKind::Device => "device",
            IdKind::Rail => "rail",
            IdKind::Rule => "rule",
        })
    }
}

/// Engine errors
///
/// Errors raised while an action runs are wrapped in [`Error::Action`] so the
/// chain names every action between the failing collaborator and the caller.
/// Use [`crate::exception_utils::get_messages`] to flatten the chain.
#[derive(Debug, Error)]
pub enum Error {
    /// Action failed; `source` holds the underlying cause
    #[error("ActionError: {description}")]
    Action {
        description: String,
        #[source]
        source: Box<Error>,
    },

    /// ID not registered in the ID map
    #[error("Unable to find {kind} with ID \"{id}\"")]
    IdNotFound { kind: IdKind, id: String },

    /// run_rule nesting went past the environment ceiling
    #[error("Maximum rule depth exceeded by rule {0}.")]
    MaxRuleDepth(String),

    /// I2C transport error
    #[error(transparent)]
    I2c(#[from] I2cError),

    /// PMBus data error
    #[error(transparent)]
    Pmbus(#[from] PmbusError),

    /// Read-back did not match the value written
    #[error(transparent)]
    WriteVerification(#[from] WriteVerificationError),

    /// Internal error
    #[error("{0}")]
    Internal(String),

    /// Collaborator error (VPD, presence, sensors)
    #[error(transparent)]
    Collaborator(#[from] anyhow::Error),
}

impl Error {
    /// Wrap `cause` in an action error described by `action`
    pub fn action(action: &impl fmt::Display, cause: impl Into<Error>) -> Self {
        Error::Action {
            description: action.to_string(),
            source: Box::new(cause.into()),
        }
    }

    /// Error class used to decide whether this error was already reported
    pub fn error_type(&self) -> ErrorType {
        match self {
            Error::Action { source, .. } => source.error_type(),
            Error::I2c(_) => ErrorType::I2c,
            Error::Pmbus(_) => ErrorType::Pmbus,
            Error::WriteVerification(_) => ErrorType::WriteVerification,
            Error::Collaborator(_) => ErrorType::DBus,
            Error::IdNotFound { .. } | Error::MaxRuleDepth(_) | Error::Internal(_) => {
                ErrorType::Internal
            },
        }
    }
}

/// PMBus data error, e.g. a device using an unsupported data format
#[derive(Debug, Clone, Error)]
#[error("PMBusError: {message}")]
pub struct PmbusError {
    message: String,
    device_id: String,
    inventory_path: String,
}

impl PmbusError {
    pub fn new(
        message: impl Into<String>,
        device_id: impl Into<String>,
        inventory_path: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            device_id: device_id.into(),
            inventory_path: inventory_path.into(),
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn inventory_path(&self) -> &str {
        &self.inventory_path
    }
}

/// Value read back from a register differs from the value written
#[derive(Debug, Clone, Error)]
#[error("WriteVerificationError: {message}")]
pub struct WriteVerificationError {
    message: String,
    device_id: String,
    inventory_path: String,
}

impl WriteVerificationError {
    pub fn new(
        message: impl Into<String>,
        device_id: impl Into<String>,
        inventory_path: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            device_id: device_id.into(),
            inventory_path: inventory_path.into(),
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn inventory_path(&self) -> &str {
        &self.inventory_path
    }
}
