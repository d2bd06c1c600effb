//! Execution context threaded through every action
//!
//! An environment is created for one logical operation, such as configuring a
//! rail, and dropped afterwards. It is never shared between threads.

use std::collections::{BTreeMap, BTreeSet};

use crate::device::Device;
use crate::error::{Error, Result};
use crate::i2c::DeviceI2c;
use crate::id_map::IdMap;
use crate::phase_fault::PhaseFaultType;
use crate::rule::Rule;
use crate::services::Services;

/// Default ceiling on nested run_rule invocations
pub const DEFAULT_MAX_RULE_DEPTH: usize = 5;

pub struct ActionEnvironment<'a> {
    id_map: &'a IdMap<'a>,
    device_id: String,
    services: &'a dyn Services,
    rule_depth: usize,
    max_rule_depth: usize,
    phase_faults: BTreeSet<PhaseFaultType>,
    additional_error_data: BTreeMap<String, String>,
    volts: Option<f64>,
}

impl<'a> ActionEnvironment<'a> {
    pub fn new(id_map: &'a IdMap<'a>, device_id: impl Into<String>, services: &'a dyn Services) -> Self {
        Self {
            id_map,
            device_id: device_id.into(),
            services,
            rule_depth: 0,
            max_rule_depth: DEFAULT_MAX_RULE_DEPTH,
            phase_faults: BTreeSet::new(),
            additional_error_data: BTreeMap::new(),
            volts: None,
        }
    }

    pub fn with_max_rule_depth(mut self, max_rule_depth: usize) -> Self {
        self.max_rule_depth = max_rule_depth;
        self
    }

    /// Current device, resolved through the ID map
    pub fn device(&self) -> Result<&'a Device> {
        self.id_map.get_device(&self.device_id)
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Retarget subsequent actions at another device
    pub fn set_device_id(&mut self, device_id: impl Into<String>) {
        self.device_id = device_id.into();
    }

    pub fn rule(&self, id: &str) -> Result<&'a Rule> {
        self.id_map.get_rule(id)
    }

    pub fn services(&self) -> &'a dyn Services {
        self.services
    }

    /// I2C transport bound to the current device
    pub fn i2c(&self) -> Result<DeviceI2c<'a>> {
        let device = self.device()?;
        Ok(DeviceI2c::new(self.services.i2c(), *device.i2c_interface()))
    }

    pub fn rule_depth(&self) -> usize {
        self.rule_depth
    }

    pub fn max_rule_depth(&self) -> usize {
        self.max_rule_depth
    }

    /// Enter rule `rule_id`; fails without changing the depth at the ceiling.
    pub fn increment_rule_depth(&mut self, rule_id: &str) -> Result<()> {
        if self.rule_depth >= self.max_rule_depth {
            return Err(Error::MaxRuleDepth(rule_id.to_string()));
        }
        self.rule_depth += 1;
        Ok(())
    }

    pub fn decrement_rule_depth(&mut self) {
        self.rule_depth = self.rule_depth.saturating_sub(1);
    }

    pub fn add_phase_fault(&mut self, fault_type: PhaseFaultType) {
        self.phase_faults.insert(fault_type);
    }

    pub fn phase_faults(&self) -> &BTreeSet<PhaseFaultType> {
        &self.phase_faults
    }

    /// Add diagnostic data for the eventual error log; replaces an existing key
    pub fn add_additional_error_data(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.additional_error_data.insert(name.into(), value.into());
    }

    pub fn additional_error_data(&self) -> &BTreeMap<String, String> {
        &self.additional_error_data
    }

    pub fn volts(&self) -> Option<f64> {
        self.volts
    }

    pub fn set_volts(&mut self, volts: f64) {
        self.volts = Some(volts);
    }
}

/// What every environment of one system-level operation shares
#[derive(Clone, Copy)]
pub struct ExecutionContext<'a> {
    pub id_map: &'a IdMap<'a>,
    pub services: &'a dyn Services,
    pub max_rule_depth: usize,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(id_map: &'a IdMap<'a>, services: &'a dyn Services) -> Self {
        Self {
            id_map,
            services,
            max_rule_depth: DEFAULT_MAX_RULE_DEPTH,
        }
    }

    /// Fresh environment targeting `device_id`
    pub fn environment(&self, device_id: &str) -> ActionEnvironment<'a> {
        ActionEnvironment::new(self.id_map, device_id, self.services)
            .with_max_rule_depth(self.max_rule_depth)
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use crate::actions::{Action, SetDeviceAction};
    use crate::i2c::I2cInterface;
    use crate::test_utils::MockServices;

    fn fixtures() -> (Vec<Device>, Vec<Rule>) {
        let devices = vec![
            Device::new("reg1", true, "/system/chassis/motherboard/reg1", I2cInterface::new(1, 0x70)),
            Device::new("reg2", true, "/system/chassis/motherboard/reg2", I2cInterface::new(1, 0x72)),
        ];
        let rules = vec![Rule::new(
            "set_voltage_rule",
            vec![Action::SetDevice(SetDeviceAction::new("reg2"))],
        )];
        (devices, rules)
    }

    fn id_map<'a>(devices: &'a [Device], rules: &'a [Rule]) -> IdMap<'a> {
        let mut map = IdMap::new();
        devices.iter().for_each(|d| map.add_device(d));
        rules.iter().for_each(|r| map.add_rule(r));
        map
    }

    #[test]
    fn test_new_defaults() {
        let (devices, rules) = fixtures();
        let map = id_map(&devices, &rules);
        let services = MockServices::new();
        let env = ActionEnvironment::new(&map, "reg1", &services);

        assert_eq!(env.device_id(), "reg1");
        assert_eq!(env.rule_depth(), 0);
        assert_eq!(env.max_rule_depth(), DEFAULT_MAX_RULE_DEPTH);
        assert!(env.phase_faults().is_empty());
        assert!(env.additional_error_data().is_empty());
        assert_eq!(env.volts(), None);
    }

    #[test]
    fn test_device_resolution() {
        let (devices, rules) = fixtures();
        let map = id_map(&devices, &rules);
        let services = MockServices::new();
        let mut env = ActionEnvironment::new(&map, "reg1", &services);

        assert!(std::ptr::eq(env.device().unwrap(), &devices[0]));
        env.set_device_id("reg2");
        assert!(std::ptr::eq(env.device().unwrap(), &devices[1]));
        assert_eq!(env.i2c().unwrap().interface().address, 0x72);

        env.set_device_id("regulator5");
        assert_eq!(
            env.device().unwrap_err().to_string(),
            "Unable to find device with ID \"regulator5\""
        );
    }

    #[test]
    fn test_rule_resolution() {
        let (devices, rules) = fixtures();
        let map = id_map(&devices, &rules);
        let services = MockServices::new();
        let env = ActionEnvironment::new(&map, "reg1", &services);

        assert!(std::ptr::eq(env.rule("set_voltage_rule").unwrap(), &rules[0]));
        assert_eq!(
            env.rule("set_voltage_rule2").unwrap_err().to_string(),
            "Unable to find rule with ID \"set_voltage_rule2\""
        );
    }

    #[test]
    fn test_rule_depth_ceiling() {
        let (devices, rules) = fixtures();
        let map = id_map(&devices, &rules);
        let services = MockServices::new();
        let mut env = ActionEnvironment::new(&map, "reg1", &services).with_max_rule_depth(3);

        for _ in 0..3 {
            env.increment_rule_depth("set_voltage_rule").unwrap();
        }
        assert_eq!(env.rule_depth(), 3);

        let err = env.increment_rule_depth("set_voltage_rule").unwrap_err();
        assert_eq!(err.to_string(), "Maximum rule depth exceeded by rule set_voltage_rule.");
        assert_eq!(env.rule_depth(), 3);

        for _ in 0..5 {
            env.decrement_rule_depth();
        }
        assert_eq!(env.rule_depth(), 0);
    }

    #[test]
    fn test_phase_faults_deduplicated() {
        let (devices, rules) = fixtures();
        let map = id_map(&devices, &rules);
        let services = MockServices::new();
        let mut env = ActionEnvironment::new(&map, "reg1", &services);

        env.add_phase_fault(PhaseFaultType::NPlus1);
        env.add_phase_fault(PhaseFaultType::N);
        env.add_phase_fault(PhaseFaultType::NPlus1);
        let faults: Vec<_> = env.phase_faults().iter().copied().collect();
        assert_eq!(faults, vec![PhaseFaultType::N, PhaseFaultType::NPlus1]);
    }

    #[test]
    fn test_additional_error_data_and_volts() {
        let (devices, rules) = fixtures();
        let map = id_map(&devices, &rules);
        let services = MockServices::new();
        let mut env = ActionEnvironment::new(&map, "reg1", &services);

        env.add_additional_error_data("reg1_register_0x8C", "[ 0x21, 0x43 ]");
        env.add_additional_error_data("reg1_status", "0x01");
        env.add_additional_error_data("reg1_status", "0x02");
        assert_eq!(env.additional_error_data().len(), 2);
        assert_eq!(env.additional_error_data()["reg1_status"], "0x02");

        env.set_volts(1.31);
        assert_eq!(env.volts(), Some(1.31));
    }
}
