//! Voltage regulator configuration engine
//!
//! Loads a JSON description of the chassis, devices, rails and rules of a
//! system and runs the action sequences it contains:
//! - configuration of devices and rails (output voltage, register setup)
//! - presence detection
//! - sensor monitoring
//! - phase fault detection
//!
//! Hardware and platform services (I2C, VPD, inventory presence, journal,
//! sensor publication) are reached through the traits in [`services`] and
//! [`i2c`], so the engine runs the same against real hardware or the
//! in-memory doubles in [`test_utils`].

pub mod action_environment;
pub mod actions;
pub mod chassis;
pub mod config_file_parser;
pub mod configuration;
pub mod device;
pub mod error;
pub mod error_history;
pub mod exception_utils;
pub mod i2c;
pub mod id_map;
pub mod phase_fault;
pub mod phase_fault_detection;
pub mod pmbus_utils;
pub mod presence_detection;
pub mod rail;
pub mod report;
pub mod rule;
pub mod sensor_monitoring;
pub mod services;
pub mod system;
pub mod test_utils;

pub use action_environment::{ActionEnvironment, ExecutionContext, DEFAULT_MAX_RULE_DEPTH};
pub use actions::{execute_actions, Action};
pub use chassis::Chassis;
pub use config_file_parser::ConfigFileParserError;
pub use configuration::Configuration;
pub use device::Device;
pub use error::{Error, IdKind, PmbusError, Result, WriteVerificationError};
pub use error_history::ErrorType;
pub use i2c::{I2cError, I2cInterface, I2cTransport};
pub use id_map::IdMap;
pub use phase_fault::PhaseFaultType;
pub use rail::Rail;
pub use report::{Fault, FaultKind, Operation};
pub use rule::Rule;
pub use services::{Journal, PresenceService, SensorType, Sensors, Services, Vpd};
pub use system::System;
