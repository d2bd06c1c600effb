//! Configuration File Parser
//!
//! Converts the JSON configuration file into [`Rule`]s and [`Chassis`].
//!
//! Every object parser follows the same steps: check the element kind, check
//! the property set against the allowed and required properties, then parse
//! the children. Errors carry a fixed message and the JSON pointer of the
//! offending element; a failure anywhere rejects the whole file.

mod actions;
mod elements;
mod structure;

use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::chassis::Chassis;
use crate::error_history::ErrorType;
use crate::rule::Rule;

pub use actions::{parse_action, parse_action_array};
pub use elements::{
    get_required_property, parse_bit_position, parse_bit_value, parse_boolean, parse_double,
    parse_hex_byte, parse_hex_byte_array, parse_int8, parse_string, parse_uint8,
    parse_unsigned_integer, verify_is_array, verify_is_object, verify_properties,
};
pub use structure::{
    parse_chassis, parse_chassis_array, parse_configuration, parse_device, parse_device_array,
    parse_i2c_interface, parse_phase_fault_detection, parse_presence_detection, parse_rail,
    parse_rail_array, parse_root, parse_rule, parse_rule_array, parse_sensor_monitoring,
};

/// Result type for element parsers
pub type ElementResult<T> = std::result::Result<T, ElementError>;

/// Invalid JSON element
///
/// Displays only the message; [`ElementError::pointer`] locates the element
/// within the document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ElementError {
    message: String,
    pointer: String,
}

impl ElementError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            pointer: String::new(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// JSON pointer (RFC 6901) of the element, empty for the root
    pub fn pointer(&self) -> &str {
        &self.pointer
    }

    /// Prefix the pointer with one path segment
    pub fn at(mut self, segment: impl fmt::Display) -> Self {
        let segment = segment.to_string().replace('~', "~0").replace('/', "~1");
        self.pointer = format!("/{}{}", segment, self.pointer);
        self
    }
}

/// Adds a path segment to the error of a failed element parse
pub(crate) trait At<T> {
    fn at(self, segment: impl fmt::Display) -> ElementResult<T>;
}

impl<T> At<T> for ElementResult<T> {
    fn at(self, segment: impl fmt::Display) -> ElementResult<T> {
        self.map_err(|e| e.at(segment))
    }
}

/// Configuration file could not be loaded
#[derive(Debug, Clone, Error)]
#[error("ConfigFileParserError: {}: {message}", path.display())]
pub struct ConfigFileParserError {
    path: PathBuf,
    message: String,
    pointer: Option<String>,
}

impl ConfigFileParserError {
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            pointer: None,
        }
    }

    fn from_element(path: &Path, error: ElementError) -> Self {
        let message = if error.pointer().is_empty() {
            error.message().to_string()
        } else {
            format!("{}: {}", error.pointer(), error.message())
        };
        Self {
            path: path.to_path_buf(),
            message,
            pointer: Some(error.pointer),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// JSON pointer of the invalid element, if the file was valid JSON
    pub fn pointer(&self) -> Option<&str> {
        self.pointer.as_deref()
    }

    pub fn error_type(&self) -> ErrorType {
        ErrorType::ConfigFile
    }
}

/// Parse the configuration file at `path`
pub fn parse(path: impl AsRef<Path>) -> Result<(Vec<Rule>, Vec<Chassis>), ConfigFileParserError> {
    let path = path.as_ref();
    debug!("Loading configuration file {}", path.display());
    let text = std::fs::read_to_string(path)
        .map_err(|e| ConfigFileParserError::new(path, e.to_string()))?;
    let (rules, chassis) = parse_str(&text, path)?;
    info!(
        "Loaded {}: {} rule(s), {} chassis",
        path.display(),
        rules.len(),
        chassis.len()
    );
    Ok((rules, chassis))
}

/// Parse configuration text; `path` is only used in error messages
pub fn parse_str(
    text: &str,
    path: impl AsRef<Path>,
) -> Result<(Vec<Rule>, Vec<Chassis>), ConfigFileParserError> {
    let path = path.as_ref();
    let root: Value =
        serde_json::from_str(text).map_err(|e| ConfigFileParserError::new(path, e.to_string()))?;
    parse_root(&root).map_err(|e| ConfigFileParserError::from_element(path, e))
}
