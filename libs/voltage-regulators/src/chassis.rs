//! Chassis containing regulator devices

use crate::action_environment::ExecutionContext;
use crate::device::Device;
use crate::report::Fault;

#[derive(Debug, PartialEq)]
pub struct Chassis {
    number: u32,
    devices: Vec<Device>,
}

impl Chassis {
    /// `number` is 1-based; the parser rejects 0.
    pub fn new(number: u32, devices: Vec<Device>) -> Self {
        Self { number, devices }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn configure(&self, ctx: &ExecutionContext<'_>) -> Vec<Fault> {
        self.devices
            .iter()
            .flat_map(|device| device.configure(ctx, self.number))
            .collect()
    }

    pub fn monitor_sensors(&self, ctx: &ExecutionContext<'_>) -> Vec<Fault> {
        self.devices
            .iter()
            .flat_map(|device| device.monitor_sensors(ctx, self.number))
            .collect()
    }

    pub fn detect_phase_faults(&self, ctx: &ExecutionContext<'_>) -> Vec<Fault> {
        self.devices
            .iter()
            .flat_map(|device| device.detect_phase_faults(ctx, self.number))
            .collect()
    }

    pub fn clear_cache(&self) {
        self.devices.iter().for_each(Device::clear_cache);
    }

    pub fn clear_error_history(&self) {
        self.devices.iter().for_each(Device::clear_error_history);
    }
}
