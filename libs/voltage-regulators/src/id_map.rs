//! ID lookup for devices, rails and rules
//!
//! The map borrows entities owned by the parsed model, so it can never outlive
//! them. Rules reference each other and devices by ID only.

use std::collections::HashMap;

use crate::chassis::Chassis;
use crate::device::Device;
use crate::error::{Error, IdKind, Result};
use crate::rail::Rail;
use crate::rule::Rule;

#[derive(Debug, Default)]
pub struct IdMap<'a> {
    devices: HashMap<String, &'a Device>,
    rails: HashMap<String, &'a Rail>,
    rules: HashMap<String, &'a Rule>,
}

impl<'a> IdMap<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every rule, device and rail of a parsed configuration
    pub fn build(rules: &'a [Rule], chassis: &'a [Chassis]) -> Self {
        let mut map = Self::new();
        for rule in rules {
            map.add_rule(rule);
        }
        for device in chassis.iter().flat_map(|c| c.devices()) {
            map.add_device(device);
            for rail in device.rails() {
                map.add_rail(rail);
            }
        }
        map
    }

    /// Register a device. A later registration with the same ID wins.
    pub fn add_device(&mut self, device: &'a Device) {
        self.devices.insert(device.id().to_string(), device);
    }

    /// Register a rail. A later registration with the same ID wins.
    pub fn add_rail(&mut self, rail: &'a Rail) {
        self.rails.insert(rail.id().to_string(), rail);
    }

    /// Register a rule. A later registration with the same ID wins.
    pub fn add_rule(&mut self, rule: &'a Rule) {
        self.rules.insert(rule.id().to_string(), rule);
    }

    pub fn get_device(&self, id: &str) -> Result<&'a Device> {
        self.devices.get(id).copied().ok_or_else(|| Error::IdNotFound {
            kind: IdKind::Device,
            id: id.to_string(),
        })
    }

    pub fn get_rail(&self, id: &str) -> Result<&'a Rail> {
        self.rails.get(id).copied().ok_or_else(|| Error::IdNotFound {
            kind: IdKind::Rail,
            id: id.to_string(),
        })
    }

    pub fn get_rule(&self, id: &str) -> Result<&'a Rule> {
        self.rules.get(id).copied().ok_or_else(|| Error::IdNotFound {
            kind: IdKind::Rule,
            id: id.to_string(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use crate::actions::{Action, SetDeviceAction};
    use crate::i2c::I2cInterface;

    fn device(id: &str) -> Device {
        Device::new(
            id,
            true,
            "/xyz/openbmc_project/inventory/system/chassis/motherboard/reg1",
            I2cInterface::new(1, 0x70),
        )
    }

    fn rule(id: &str) -> Rule {
        Rule::new(id, vec![Action::SetDevice(SetDeviceAction::new("reg1"))])
    }

    #[test]
    fn test_device_lookup() {
        let reg1 = device("reg1");
        let mut map = IdMap::new();

        let err = map.get_device("reg1").unwrap_err();
        assert_eq!(err.to_string(), "Unable to find device with ID \"reg1\"");

        map.add_device(&reg1);
        assert!(std::ptr::eq(map.get_device("reg1").unwrap(), &reg1));

        let err = map.get_device("reg2").unwrap_err();
        assert_eq!(err.to_string(), "Unable to find device with ID \"reg2\"");
    }

    #[test]
    fn test_rail_lookup() {
        let vdd = Rail::new("vdd", None, None);
        let mut map = IdMap::new();
        map.add_rail(&vdd);
        assert!(std::ptr::eq(map.get_rail("vdd").unwrap(), &vdd));
        assert_eq!(
            map.get_rail("vio").unwrap_err().to_string(),
            "Unable to find rail with ID \"vio\""
        );
    }

    #[test]
    fn test_rule_lookup() {
        let set_voltage = rule("set_voltage_rule");
        let mut map = IdMap::new();
        assert_eq!(
            map.get_rule("set_voltage_rule").unwrap_err().to_string(),
            "Unable to find rule with ID \"set_voltage_rule\""
        );
        map.add_rule(&set_voltage);
        assert!(std::ptr::eq(map.get_rule("set_voltage_rule").unwrap(), &set_voltage));
    }

    #[test]
    fn test_readd_last_registration_wins() {
        let first = rule("r1");
        let second = rule("r1");
        let mut map = IdMap::new();
        map.add_rule(&first);
        map.add_rule(&second);
        assert!(std::ptr::eq(map.get_rule("r1").unwrap(), &second));
    }

    #[test]
    fn test_build_registers_nested_rails() {
        let rules = vec![rule("r1")];
        let mut reg1 = device("reg1");
        reg1.add_rail(Rail::new("vdd0", None, None));
        let chassis = vec![Chassis::new(1, vec![reg1])];

        let map = IdMap::build(&rules, &chassis);
        assert!(map.get_rule("r1").is_ok());
        assert!(map.get_device("reg1").is_ok());
        assert!(map.get_rail("vdd0").is_ok());
    }
}
