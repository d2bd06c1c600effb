//! Action element parsers

use serde_json::Value;

use super::elements::{
    parse_bit_position, parse_bit_value, parse_boolean, parse_double, parse_hex_byte,
    parse_hex_byte_array, parse_int8, parse_non_empty_array, parse_optional, parse_required,
    parse_string, parse_uint8, verify_is_object, verify_properties,
};
use super::{At, ElementError, ElementResult};
use crate::actions::{
    Action, AndAction, ComparePresenceAction, CompareVpdAction, I2cCaptureBytesAction,
    I2cCompareBitAction, I2cCompareByteAction, I2cCompareBytesAction, I2cWriteBitAction,
    I2cWriteByteAction, I2cWriteBytesAction, IfAction, LogPhaseFaultAction, NotAction, OrAction,
    PmbusReadSensorAction, PmbusWriteVoutCommandAction, RunRuleAction, SetDeviceAction,
};
use crate::phase_fault::PhaseFaultType;
use crate::pmbus_utils::{SensorDataFormat, VoutDataFormat};
use crate::services::SensorType;

const ACTION_TYPES: [&str; 18] = [
    "and",
    "compare_presence",
    "compare_vpd",
    "i2c_capture_bytes",
    "i2c_compare_bit",
    "i2c_compare_byte",
    "i2c_compare_bytes",
    "i2c_write_bit",
    "i2c_write_byte",
    "i2c_write_bytes",
    "if",
    "log_phase_fault",
    "not",
    "or",
    "pmbus_read_sensor",
    "pmbus_write_vout_command",
    "run_rule",
    "set_device",
];

/// Parse an action object: one action type property plus optional comments
pub fn parse_action(element: &Value) -> ElementResult<Action> {
    let object = verify_is_object(element)?;
    let (action_type, value) = object
        .iter()
        .find(|(key, _)| ACTION_TYPES.contains(&key.as_str()))
        .ok_or_else(|| ElementError::new("Required action type property missing"))?;
    let has_extra = object
        .keys()
        .any(|key| key != action_type && key != "comments");
    if has_extra {
        return Err(ElementError::new("Element contains an invalid property"));
    }
    parse_action_value(action_type, value).at(action_type)
}

fn parse_action_value(action_type: &str, value: &Value) -> ElementResult<Action> {
    let action = match action_type {
        "and" => Action::And(AndAction::new(parse_action_array(value)?)),
        "compare_presence" => Action::ComparePresence(parse_compare_presence(value)?),
        "compare_vpd" => Action::CompareVpd(parse_compare_vpd(value)?),
        "i2c_capture_bytes" => Action::I2cCaptureBytes(parse_i2c_capture_bytes(value)?),
        "i2c_compare_bit" => Action::I2cCompareBit(parse_i2c_compare_bit(value)?),
        "i2c_compare_byte" => Action::I2cCompareByte(parse_i2c_compare_byte(value)?),
        "i2c_compare_bytes" => Action::I2cCompareBytes(parse_i2c_compare_bytes(value)?),
        "i2c_write_bit" => Action::I2cWriteBit(parse_i2c_write_bit(value)?),
        "i2c_write_byte" => Action::I2cWriteByte(parse_i2c_write_byte(value)?),
        "i2c_write_bytes" => Action::I2cWriteBytes(parse_i2c_write_bytes(value)?),
        "if" => Action::If(parse_if(value)?),
        "log_phase_fault" => Action::LogPhaseFault(parse_log_phase_fault(value)?),
        "not" => Action::Not(NotAction::new(parse_action(value)?)),
        "or" => Action::Or(OrAction::new(parse_action_array(value)?)),
        "pmbus_read_sensor" => Action::PmbusReadSensor(parse_pmbus_read_sensor(value)?),
        "pmbus_write_vout_command" => {
            Action::PmbusWriteVoutCommand(parse_pmbus_write_vout_command(value)?)
        },
        "run_rule" => Action::RunRule(RunRuleAction::new(parse_string(value, false)?)),
        "set_device" => Action::SetDevice(SetDeviceAction::new(parse_string(value, false)?)),
        other => return Err(ElementError::new(format!("Invalid action type: {}", other))),
    };
    Ok(action)
}

/// Parse a non-empty array of actions
pub fn parse_action_array(element: &Value) -> ElementResult<Vec<Action>> {
    parse_non_empty_array(element, parse_action)
}

// ============================================================================
// Inventory
// ============================================================================

fn parse_compare_presence(element: &Value) -> ElementResult<ComparePresenceAction> {
    let object = verify_is_object(element)?;
    verify_properties(object, &["fru", "value"], &["fru", "value"])?;
    let fru = parse_required(object, "fru", |v| parse_string(v, false))?;
    let value = parse_required(object, "value", parse_boolean)?;
    Ok(ComparePresenceAction::new(fru, value))
}

fn parse_compare_vpd(element: &Value) -> ElementResult<CompareVpdAction> {
    let object = verify_is_object(element)?;
    verify_properties(
        object,
        &["fru", "keyword", "value"],
        &["fru", "keyword", "value"],
    )?;
    let fru = parse_required(object, "fru", |v| parse_string(v, false))?;
    let keyword = parse_required(object, "keyword", |v| parse_string(v, false))?;
    let value = parse_required(object, "value", |v| parse_string(v, true))?;
    Ok(CompareVpdAction::new(fru, keyword, value))
}

// ============================================================================
// I2C
// ============================================================================

fn parse_i2c_capture_bytes(element: &Value) -> ElementResult<I2cCaptureBytesAction> {
    let object = verify_is_object(element)?;
    verify_properties(object, &["register", "count"], &["register", "count"])?;
    let register = parse_required(object, "register", parse_hex_byte)?;
    let count = parse_required(object, "count", |v| {
        let count = parse_uint8(v)?;
        if count < 1 {
            return Err(ElementError::new("Invalid byte count: Must be > 0"));
        }
        Ok(count)
    })?;
    I2cCaptureBytesAction::new(register, count).map_err(invalid_action)
}

fn parse_i2c_compare_bit(element: &Value) -> ElementResult<I2cCompareBitAction> {
    let (register, position, value) = parse_bit_properties(element)?;
    I2cCompareBitAction::new(register, position, value).map_err(invalid_action)
}

fn parse_i2c_write_bit(element: &Value) -> ElementResult<I2cWriteBitAction> {
    let (register, position, value) = parse_bit_properties(element)?;
    I2cWriteBitAction::new(register, position, value).map_err(invalid_action)
}

fn parse_bit_properties(element: &Value) -> ElementResult<(u8, u8, u8)> {
    let object = verify_is_object(element)?;
    let properties = ["register", "position", "value"];
    verify_properties(object, &properties, &properties)?;
    Ok((
        parse_required(object, "register", parse_hex_byte)?,
        parse_required(object, "position", parse_bit_position)?,
        parse_required(object, "value", parse_bit_value)?,
    ))
}

fn parse_i2c_compare_byte(element: &Value) -> ElementResult<I2cCompareByteAction> {
    let (register, value, mask) = parse_byte_properties(element)?;
    Ok(I2cCompareByteAction::new(register, value, mask))
}

fn parse_i2c_write_byte(element: &Value) -> ElementResult<I2cWriteByteAction> {
    let (register, value, mask) = parse_byte_properties(element)?;
    Ok(I2cWriteByteAction::new(register, value, mask))
}

fn parse_byte_properties(element: &Value) -> ElementResult<(u8, u8, Option<u8>)> {
    let object = verify_is_object(element)?;
    verify_properties(object, &["register", "value", "mask"], &["register", "value"])?;
    Ok((
        parse_required(object, "register", parse_hex_byte)?,
        parse_required(object, "value", parse_hex_byte)?,
        parse_optional(object, "mask", parse_hex_byte)?,
    ))
}

fn parse_i2c_compare_bytes(element: &Value) -> ElementResult<I2cCompareBytesAction> {
    let (register, values, masks) = parse_bytes_properties(element)?;
    I2cCompareBytesAction::new(register, values, masks).map_err(invalid_action)
}

fn parse_i2c_write_bytes(element: &Value) -> ElementResult<I2cWriteBytesAction> {
    let (register, values, masks) = parse_bytes_properties(element)?;
    I2cWriteBytesAction::new(register, values, masks).map_err(invalid_action)
}

fn parse_bytes_properties(element: &Value) -> ElementResult<(u8, Vec<u8>, Option<Vec<u8>>)> {
    let object = verify_is_object(element)?;
    verify_properties(object, &["register", "values", "masks"], &["register", "values"])?;
    let register = parse_required(object, "register", parse_hex_byte)?;
    let values = parse_required(object, "values", |v| {
        parse_non_empty_array(v, parse_hex_byte)
    })?;
    let masks = parse_optional(object, "masks", |v| {
        let masks = parse_hex_byte_array(v)?;
        if masks.len() != values.len() {
            return Err(ElementError::new("Invalid number of elements in masks"));
        }
        Ok(masks)
    })?;
    Ok((register, values, masks))
}

// ============================================================================
// Control flow
// ============================================================================

fn parse_if(element: &Value) -> ElementResult<IfAction> {
    let object = verify_is_object(element)?;
    verify_properties(object, &["condition", "then", "else"], &["condition", "then"])?;
    let condition = parse_required(object, "condition", parse_action)?;
    let then_actions = parse_required(object, "then", parse_action_array)?;
    let else_actions = parse_optional(object, "else", parse_action_array)?.unwrap_or_default();
    Ok(IfAction::new(condition, then_actions, else_actions))
}

// ============================================================================
// PMBus and phase faults
// ============================================================================

fn parse_log_phase_fault(element: &Value) -> ElementResult<LogPhaseFaultAction> {
    let object = verify_is_object(element)?;
    verify_properties(object, &["type"], &["type"])?;
    let fault_type = parse_required(object, "type", |v| {
        let name = parse_string(v, false)?;
        PhaseFaultType::from_name(&name)
            .ok_or_else(|| ElementError::new(format!("Invalid phase fault type: {}", name)))
    })?;
    Ok(LogPhaseFaultAction::new(fault_type))
}

fn parse_pmbus_read_sensor(element: &Value) -> ElementResult<PmbusReadSensorAction> {
    let object = verify_is_object(element)?;
    verify_properties(
        object,
        &["type", "command", "format", "exponent"],
        &["type", "command", "format"],
    )?;
    let sensor_type = parse_required(object, "type", |v| {
        let name = parse_string(v, false)?;
        SensorType::from_name(&name)
            .ok_or_else(|| ElementError::new(format!("Invalid sensor type value: {}", name)))
    })?;
    let command = parse_required(object, "command", parse_hex_byte)?;
    let format = parse_required(object, "format", |v| {
        let name = parse_string(v, false)?;
        SensorDataFormat::from_name(&name)
            .ok_or_else(|| ElementError::new(format!("Invalid format value: {}", name)))
    })?;
    let exponent = parse_optional(object, "exponent", parse_int8)?;
    Ok(PmbusReadSensorAction::new(sensor_type, command, format, exponent))
}

fn parse_pmbus_write_vout_command(element: &Value) -> ElementResult<PmbusWriteVoutCommandAction> {
    let object = verify_is_object(element)?;
    verify_properties(
        object,
        &["volts", "format", "exponent", "is_verified"],
        &["format"],
    )?;
    let volts = parse_optional(object, "volts", parse_double)?;
    let format = parse_required(object, "format", |v| {
        let name = parse_string(v, false)?;
        match name.as_str() {
            "linear" => Ok(VoutDataFormat::Linear),
            _ => Err(ElementError::new(format!("Invalid format value: {}", name))),
        }
    })?;
    let exponent = parse_optional(object, "exponent", parse_int8)?;
    let is_verified = parse_optional(object, "is_verified", parse_boolean)?.unwrap_or(false);
    PmbusWriteVoutCommandAction::new(volts, format, exponent, is_verified).map_err(invalid_action)
}

fn invalid_action(error: crate::Error) -> ElementError {
    ElementError::new(error.to_string())
}
