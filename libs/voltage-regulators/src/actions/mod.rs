//! Action Interpreter
//!
//! Every action type from the configuration file is one variant of [`Action`].
//! Executing an action returns a boolean that control-flow actions (and, or,
//! not, if) interpret; other actions return `true` once they succeed.
//!
//! Collaborator failures are wrapped in [`crate::Error::Action`] naming the action
//! and its parameters. Errors from nested actions, ID lookups and the rule
//! depth ceiling propagate unchanged.

mod control;
mod i2c;
mod inventory;
mod phase_fault;
mod pmbus;

use std::fmt;

use tracing::trace;

use crate::action_environment::ActionEnvironment;
use crate::error::Result;

pub use control::{AndAction, IfAction, NotAction, OrAction, RunRuleAction, SetDeviceAction};
pub use i2c::{
    I2cCaptureBytesAction, I2cCompareBitAction, I2cCompareByteAction, I2cCompareBytesAction,
    I2cWriteBitAction, I2cWriteByteAction, I2cWriteBytesAction,
};
pub use inventory::{ComparePresenceAction, CompareVpdAction};
pub use phase_fault::LogPhaseFaultAction;
pub use pmbus::{PmbusReadSensorAction, PmbusWriteVoutCommandAction};

/// One executable action
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    And(AndAction),
    ComparePresence(ComparePresenceAction),
    CompareVpd(CompareVpdAction),
    I2cCaptureBytes(I2cCaptureBytesAction),
    I2cCompareBit(I2cCompareBitAction),
    I2cCompareByte(I2cCompareByteAction),
    I2cCompareBytes(I2cCompareBytesAction),
    I2cWriteBit(I2cWriteBitAction),
    I2cWriteByte(I2cWriteByteAction),
    I2cWriteBytes(I2cWriteBytesAction),
    If(IfAction),
    LogPhaseFault(LogPhaseFaultAction),
    Not(NotAction),
    Or(OrAction),
    PmbusReadSensor(PmbusReadSensorAction),
    PmbusWriteVoutCommand(PmbusWriteVoutCommandAction),
    RunRule(RunRuleAction),
    SetDevice(SetDeviceAction),
}

impl Action {
    pub fn execute(&self, env: &mut ActionEnvironment<'_>) -> Result<bool> {
        trace!("Executing {} on device {}", self, env.device_id());
        match self {
            Action::And(a) => a.execute(env),
            Action::ComparePresence(a) => a.execute(env),
            Action::CompareVpd(a) => a.execute(env),
            Action::I2cCaptureBytes(a) => a.execute(env),
            Action::I2cCompareBit(a) => a.execute(env),
            Action::I2cCompareByte(a) => a.execute(env),
            Action::I2cCompareBytes(a) => a.execute(env),
            Action::I2cWriteBit(a) => a.execute(env),
            Action::I2cWriteByte(a) => a.execute(env),
            Action::I2cWriteBytes(a) => a.execute(env),
            Action::If(a) => a.execute(env),
            Action::LogPhaseFault(a) => a.execute(env),
            Action::Not(a) => a.execute(env),
            Action::Or(a) => a.execute(env),
            Action::PmbusReadSensor(a) => a.execute(env),
            Action::PmbusWriteVoutCommand(a) => a.execute(env),
            Action::RunRule(a) => a.execute(env),
            Action::SetDevice(a) => a.execute(env),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::And(a) => fmt::Display::fmt(a, f),
            Action::ComparePresence(a) => fmt::Display::fmt(a, f),
            Action::CompareVpd(a) => fmt::Display::fmt(a, f),
            Action::I2cCaptureBytes(a) => fmt::Display::fmt(a, f),
            Action::I2cCompareBit(a) => fmt::Display::fmt(a, f),
            Action::I2cCompareByte(a) => fmt::Display::fmt(a, f),
            Action::I2cCompareBytes(a) => fmt::Display::fmt(a, f),
            Action::I2cWriteBit(a) => fmt::Display::fmt(a, f),
            Action::I2cWriteByte(a) => fmt::Display::fmt(a, f),
            Action::I2cWriteBytes(a) => fmt::Display::fmt(a, f),
            Action::If(a) => fmt::Display::fmt(a, f),
            Action::LogPhaseFault(a) => fmt::Display::fmt(a, f),
            Action::Not(a) => fmt::Display::fmt(a, f),
            Action::Or(a) => fmt::Display::fmt(a, f),
            Action::PmbusReadSensor(a) => fmt::Display::fmt(a, f),
            Action::PmbusWriteVoutCommand(a) => fmt::Display::fmt(a, f),
            Action::RunRule(a) => fmt::Display::fmt(a, f),
            Action::SetDevice(a) => fmt::Display::fmt(a, f),
        }
    }
}

/// Execute `actions` in order and return the result of the last one.
///
/// An empty list returns `true`. The first error stops execution.
pub fn execute_actions(actions: &[Action], env: &mut ActionEnvironment<'_>) -> Result<bool> {
    let mut result = true;
    for action in actions {
        result = action.execute(env)?;
    }
    Ok(result)
}

/// Format a byte as `0xNN`
pub(crate) fn hex_byte(value: u8) -> String {
    format!("0x{:02X}", value)
}

/// Format bytes as `[ 0xNN, 0xNN ]`
pub(crate) fn hex_bytes(values: &[u8]) -> String {
    let items: Vec<String> = values.iter().map(|v| hex_byte(*v)).collect();
    format!("[ {} ]", items.join(", "))
}
