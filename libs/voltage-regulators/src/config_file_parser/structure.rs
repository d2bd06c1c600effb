//! Parsers for the root, rules, chassis, devices and rails

use serde_json::{Map, Value};

use super::actions::parse_action_array;
use super::elements::{
    parse_array, parse_boolean, parse_double, parse_hex_byte, parse_optional, parse_required,
    parse_string, parse_uint8, parse_unsigned_integer, verify_is_object, verify_properties,
};
use super::{At, ElementError, ElementResult};
use crate::actions::{Action, RunRuleAction};
use crate::chassis::Chassis;
use crate::configuration::Configuration;
use crate::device::Device;
use crate::i2c::I2cInterface;
use crate::phase_fault_detection::PhaseFaultDetection;
use crate::presence_detection::PresenceDetection;
use crate::rail::Rail;
use crate::rule::Rule;
use crate::sensor_monitoring::SensorMonitoring;

/// Parse the root element into rules and chassis
pub fn parse_root(element: &Value) -> ElementResult<(Vec<Rule>, Vec<Chassis>)> {
    let object = verify_is_object(element)?;
    verify_properties(object, &["comments", "rules", "chassis"], &["chassis"])?;
    let rules = parse_optional(object, "rules", parse_rule_array)?.unwrap_or_default();
    let chassis = parse_required(object, "chassis", parse_chassis_array)?;
    Ok((rules, chassis))
}

pub fn parse_rule_array(element: &Value) -> ElementResult<Vec<Rule>> {
    parse_array(element, parse_rule)
}

pub fn parse_rule(element: &Value) -> ElementResult<Rule> {
    let object = verify_is_object(element)?;
    verify_properties(object, &["comments", "id", "actions"], &["id", "actions"])?;
    let id = parse_required(object, "id", |v| parse_string(v, false))?;
    let actions = parse_required(object, "actions", parse_action_array)?;
    Ok(Rule::new(id, actions))
}

pub fn parse_chassis_array(element: &Value) -> ElementResult<Vec<Chassis>> {
    parse_array(element, parse_chassis)
}

pub fn parse_chassis(element: &Value) -> ElementResult<Chassis> {
    let object = verify_is_object(element)?;
    verify_properties(object, &["comments", "number", "devices"], &["number"])?;
    let number = parse_required(object, "number", parse_chassis_number)?;
    let devices = parse_optional(object, "devices", parse_device_array)?.unwrap_or_default();
    Ok(Chassis::new(number, devices))
}

fn parse_chassis_number(element: &Value) -> ElementResult<u32> {
    let number = parse_unsigned_integer(element)?;
    if number < 1 {
        return Err(ElementError::new("Invalid chassis number: Must be > 0"));
    }
    u32::try_from(number).map_err(|_| {
        ElementError::new(format!("Invalid chassis number: Must be <= {}", u32::MAX))
    })
}

pub fn parse_device_array(element: &Value) -> ElementResult<Vec<Device>> {
    parse_array(element, parse_device)
}

pub fn parse_device(element: &Value) -> ElementResult<Device> {
    let object = verify_is_object(element)?;
    verify_properties(
        object,
        &[
            "comments",
            "id",
            "is_regulator",
            "fru",
            "i2c_interface",
            "presence_detection",
            "configuration",
            "phase_fault_detection",
            "rails",
        ],
        &["id", "is_regulator", "fru", "i2c_interface"],
    )?;

    let id = parse_required(object, "id", |v| parse_string(v, false))?;
    let is_regulator = parse_required(object, "is_regulator", parse_boolean)?;
    let fru = parse_required(object, "fru", |v| parse_string(v, false))?;
    let i2c_interface = parse_required(object, "i2c_interface", parse_i2c_interface)?;

    let mut device = Device::new(id, is_regulator, fru, i2c_interface);
    if let Some(presence_detection) =
        parse_optional(object, "presence_detection", parse_presence_detection)?
    {
        device = device.with_presence_detection(presence_detection);
    }
    if let Some(configuration) = parse_optional(object, "configuration", parse_configuration)? {
        device = device.with_configuration(configuration);
    }

    if !is_regulator && object.contains_key("phase_fault_detection") {
        return Err(ElementError::new(
            "Invalid phase_fault_detection property when is_regulator is false",
        ));
    }
    if let Some(detection) =
        parse_optional(object, "phase_fault_detection", parse_phase_fault_detection)?
    {
        device = device.with_phase_fault_detection(detection);
    }

    if !is_regulator && object.contains_key("rails") {
        return Err(ElementError::new(
            "Invalid rails property when is_regulator is false",
        ));
    }
    for rail in parse_optional(object, "rails", parse_rail_array)?.unwrap_or_default() {
        device.add_rail(rail);
    }
    Ok(device)
}

pub fn parse_i2c_interface(element: &Value) -> ElementResult<I2cInterface> {
    let object = verify_is_object(element)?;
    verify_properties(object, &["bus", "address"], &["bus", "address"])?;
    let bus = parse_required(object, "bus", parse_uint8)?;
    let address = parse_required(object, "address", parse_hex_byte)?;
    Ok(I2cInterface::new(bus, address))
}

pub fn parse_rail_array(element: &Value) -> ElementResult<Vec<Rail>> {
    parse_array(element, parse_rail)
}

pub fn parse_rail(element: &Value) -> ElementResult<Rail> {
    let object = verify_is_object(element)?;
    verify_properties(
        object,
        &["comments", "id", "configuration", "sensor_monitoring"],
        &["id"],
    )?;
    let id = parse_required(object, "id", |v| parse_string(v, false))?;
    let configuration = parse_optional(object, "configuration", parse_configuration)?;
    let sensor_monitoring = parse_optional(object, "sensor_monitoring", parse_sensor_monitoring)?;
    Ok(Rail::new(id, configuration, sensor_monitoring))
}

// ============================================================================
// Action sequences
// ============================================================================

pub fn parse_configuration(element: &Value) -> ElementResult<Configuration> {
    let object = verify_is_object(element)?;
    verify_properties(object, &["comments", "volts", "rule_id", "actions"], &[])?;
    let volts = parse_optional(object, "volts", parse_double)?;
    let actions = parse_rule_id_or_actions(object)?;
    Ok(Configuration::new(volts, actions))
}

pub fn parse_presence_detection(element: &Value) -> ElementResult<PresenceDetection> {
    let object = verify_is_object(element)?;
    verify_properties(object, &["comments", "rule_id", "actions"], &[])?;
    Ok(PresenceDetection::new(parse_rule_id_or_actions(object)?))
}

pub fn parse_sensor_monitoring(element: &Value) -> ElementResult<SensorMonitoring> {
    let object = verify_is_object(element)?;
    verify_properties(object, &["comments", "rule_id", "actions"], &[])?;
    Ok(SensorMonitoring::new(parse_rule_id_or_actions(object)?))
}

pub fn parse_phase_fault_detection(element: &Value) -> ElementResult<PhaseFaultDetection> {
    let object = verify_is_object(element)?;
    verify_properties(
        object,
        &["comments", "device_id", "rule_id", "actions"],
        &[],
    )?;
    let device_id = parse_optional(object, "device_id", |v| parse_string(v, false))?;
    let actions = parse_rule_id_or_actions(object)?;
    Ok(PhaseFaultDetection::new(device_id, actions))
}

/// Exactly one of `rule_id` or `actions`; a rule ID becomes a single
/// `run_rule` action.
fn parse_rule_id_or_actions(object: &Map<String, Value>) -> ElementResult<Vec<Action>> {
    match (object.get("rule_id"), object.get("actions")) {
        (Some(rule_id), None) => {
            let rule_id = parse_string(rule_id, false).at("rule_id")?;
            Ok(vec![Action::RunRule(RunRuleAction::new(rule_id))])
        },
        (None, Some(actions)) => parse_action_array(actions).at("actions"),
        _ => Err(ElementError::new(
            "Invalid property combination: Must contain either rule_id or actions",
        )),
    }
}
