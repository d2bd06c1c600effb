//! Hardware device, typically a voltage regulator
//!
//! Device operations never fail: errors are logged to the journal and
//! returned as [`Fault`]s so the caller can move on to the next device.

use tracing::{debug, warn};

use crate::action_environment::ExecutionContext;
use crate::configuration::Configuration;
use crate::error::Error;
use crate::i2c::I2cInterface;
use crate::phase_fault_detection::PhaseFaultDetection;
use crate::presence_detection::PresenceDetection;
use crate::rail::Rail;
use crate::report::{Fault, Operation};

#[derive(Debug, PartialEq)]
pub struct Device {
    id: String,
    is_regulator: bool,
    fru: String,
    i2c_interface: I2cInterface,
    presence_detection: Option<PresenceDetection>,
    configuration: Option<Configuration>,
    phase_fault_detection: Option<PhaseFaultDetection>,
    rails: Vec<Rail>,
}

impl Device {
    pub fn new(
        id: impl Into<String>,
        is_regulator: bool,
        fru: impl Into<String>,
        i2c_interface: I2cInterface,
    ) -> Self {
        Self {
            id: id.into(),
            is_regulator,
            fru: fru.into(),
            i2c_interface,
            presence_detection: None,
            configuration: None,
            phase_fault_detection: None,
            rails: Vec::new(),
        }
    }

    pub fn with_presence_detection(mut self, presence_detection: PresenceDetection) -> Self {
        self.presence_detection = Some(presence_detection);
        self
    }

    pub fn with_configuration(mut self, configuration: Configuration) -> Self {
        self.configuration = Some(configuration);
        self
    }

    pub fn with_phase_fault_detection(mut self, phase_fault_detection: PhaseFaultDetection) -> Self {
        self.phase_fault_detection = Some(phase_fault_detection);
        self
    }

    /// Add a rail. Only regulators have rails; the parser rejects rails on
    /// other devices.
    pub fn add_rail(&mut self, rail: Rail) {
        self.rails.push(rail);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_regulator(&self) -> bool {
        self.is_regulator
    }

    /// Inventory path of the FRU containing the device
    pub fn fru(&self) -> &str {
        &self.fru
    }

    pub fn i2c_interface(&self) -> &I2cInterface {
        &self.i2c_interface
    }

    pub fn presence_detection(&self) -> Option<&PresenceDetection> {
        self.presence_detection.as_ref()
    }

    pub fn configuration(&self) -> Option<&Configuration> {
        self.configuration.as_ref()
    }

    pub fn phase_fault_detection(&self) -> Option<&PhaseFaultDetection> {
        self.phase_fault_detection.as_ref()
    }

    pub fn rails(&self) -> &[Rail] {
        &self.rails
    }

    /// Whether the device is present; devices without presence detection
    /// are always present.
    pub fn is_present(&self, ctx: &ExecutionContext<'_>) -> bool {
        match &self.presence_detection {
            Some(presence_detection) => presence_detection.execute(ctx, self),
            None => true,
        }
    }

    /// Apply the device configuration, then each rail configuration.
    ///
    /// A failure in one configuration does not stop the others.
    pub fn configure(&self, ctx: &ExecutionContext<'_>, chassis: u32) -> Vec<Fault> {
        let mut faults = Vec::new();
        if !self.is_present(ctx) {
            debug!("Device {} not present; skipping configuration", self.id);
            return faults;
        }

        if let Some(configuration) = &self.configuration {
            if let Err(e) = configuration.execute(ctx, self, None) {
                faults.push(self.fault(ctx, chassis, None, Operation::Configure, &e));
            }
        }

        for rail in &self.rails {
            if let Some(configuration) = rail.configuration() {
                if let Err(e) = configuration.execute(ctx, self, Some(rail)) {
                    faults.push(self.fault(ctx, chassis, Some(rail.id()), Operation::Configure, &e));
                }
            }
        }
        faults
    }

    /// Read and publish the sensors of every rail.
    ///
    /// Each error type is reported once per rail until the error history is
    /// cleared.
    pub fn monitor_sensors(&self, ctx: &ExecutionContext<'_>, chassis: u32) -> Vec<Fault> {
        let mut faults = Vec::new();
        if !self.is_present(ctx) {
            return faults;
        }

        for rail in &self.rails {
            let Some(sensor_monitoring) = rail.sensor_monitoring() else {
                continue;
            };
            if let Err(e) = sensor_monitoring.execute(ctx, self, rail) {
                if sensor_monitoring.record_error(&e) {
                    faults.push(self.fault(ctx, chassis, Some(rail.id()), Operation::MonitorSensors, &e));
                }
            }
        }
        faults
    }

    pub fn detect_phase_faults(&self, ctx: &ExecutionContext<'_>, chassis: u32) -> Vec<Fault> {
        match &self.phase_fault_detection {
            Some(detection) if self.is_present(ctx) => detection.execute(ctx, self, chassis),
            _ => Vec::new(),
        }
    }

    /// Forget cached hardware state such as presence
    pub fn clear_cache(&self) {
        if let Some(presence_detection) = &self.presence_detection {
            presence_detection.clear_cache();
        }
    }

    /// Allow previously reported errors to be reported again
    pub fn clear_error_history(&self) {
        if let Some(detection) = &self.phase_fault_detection {
            detection.clear_error_history();
        }
        for sensor_monitoring in self.rails.iter().filter_map(Rail::sensor_monitoring) {
            sensor_monitoring.clear_error_history();
        }
    }

    fn fault(
        &self,
        ctx: &ExecutionContext<'_>,
        chassis: u32,
        rail_id: Option<&str>,
        operation: Operation,
        error: &Error,
    ) -> Fault {
        warn!("{} failed for {}: {}", operation, rail_id.unwrap_or(&self.id), error);
        let fault = Fault::from_error(chassis, &self.id, rail_id, operation, error);
        ctx.services.journal().log_error(&fault.messages());
        fault
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use crate::actions::{Action, ComparePresenceAction, I2cWriteByteAction, PmbusReadSensorAction};
    use crate::id_map::IdMap;
    use crate::pmbus_utils::SensorDataFormat;
    use crate::report::FaultKind;
    use crate::sensor_monitoring::SensorMonitoring;
    use crate::services::SensorType;
    use crate::test_utils::MockServices;

    const IFACE: I2cInterface = I2cInterface { bus: 1, address: 0x70 };

    fn regulator() -> Device {
        let fru = "/system/chassis/motherboard/reg1";
        let mut device = Device::new("reg1", true, fru, IFACE)
            .with_presence_detection(PresenceDetection::new(vec![Action::ComparePresence(
                ComparePresenceAction::new(fru, true),
            )]))
            .with_configuration(Configuration::new(
                None,
                vec![Action::I2cWriteByte(I2cWriteByteAction::new(0x10, 0x01, None))],
            ));
        device.add_rail(Rail::new(
            "vdd",
            Some(Configuration::new(
                Some(1.1),
                vec![Action::I2cWriteByte(I2cWriteByteAction::new(0x11, 0x02, None))],
            )),
            Some(SensorMonitoring::new(vec![Action::PmbusReadSensor(
                PmbusReadSensorAction::new(SensorType::Iout, 0x8C, SensorDataFormat::Linear11, None),
            )])),
        ));
        device
    }

    #[test]
    fn test_configure_device_and_rails() {
        let device = regulator();
        let mut map = IdMap::new();
        map.add_device(&device);
        let services = MockServices::new();
        services.presence.set(device.fru(), true);
        let ctx = ExecutionContext::new(&map, &services);

        assert!(device.configure(&ctx, 1).is_empty());
        assert_eq!(services.i2c.register(IFACE, 0x10), Some(vec![0x01]));
        assert_eq!(services.i2c.register(IFACE, 0x11), Some(vec![0x02]));
        assert_eq!(
            services.journal.debugs(),
            vec!["Configuring reg1", "Configuring vdd: volts=1.1"]
        );
    }

    #[test]
    fn test_configure_skips_missing_device() {
        let device = regulator();
        let mut map = IdMap::new();
        map.add_device(&device);
        let services = MockServices::new();
        services.presence.set(device.fru(), false);
        let ctx = ExecutionContext::new(&map, &services);

        assert!(device.configure(&ctx, 1).is_empty());
        assert!(services.i2c.writes().is_empty());
    }

    #[test]
    fn test_presence_error_assumes_present_and_caches() {
        let device = regulator();
        let mut map = IdMap::new();
        map.add_device(&device);
        let services = MockServices::new();
        let ctx = ExecutionContext::new(&map, &services);

        assert!(device.is_present(&ctx));
        assert!(device.is_present(&ctx));
        assert_eq!(services.presence.lookup_count(), 1);
        assert_eq!(
            services.journal.errors().last().unwrap(),
            "Unable to determine presence of reg1"
        );

        device.clear_cache();
        services.presence.set(device.fru(), false);
        assert!(!device.is_present(&ctx));
    }

    #[test]
    fn test_configure_continues_after_failure() {
        let device = regulator();
        let mut map = IdMap::new();
        map.add_device(&device);
        let services = MockServices::new();
        services.presence.set(device.fru(), true);
        services.i2c.fail_register(IFACE, 0x10);
        let ctx = ExecutionContext::new(&map, &services);

        let faults = device.configure(&ctx, 1);
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].rail_id, None);
        assert_eq!(faults[0].operation, Operation::Configure);
        assert_eq!(services.i2c.register(IFACE, 0x11), Some(vec![0x02]));
        assert_eq!(
            services.journal.errors(),
            vec![
                "I2CException: Failed to write: bus 1, addr 0x70, register 0x10: Input/output error",
                "ActionError: i2c_write_byte: { register: 0x10, value: 0x01, mask: 0xFF }",
            ]
        );
    }

    #[test]
    fn test_monitor_sensors_reports_error_once() {
        let device = regulator();
        let mut map = IdMap::new();
        map.add_device(&device);
        let services = MockServices::new();
        services.presence.set(device.fru(), true);
        let ctx = ExecutionContext::new(&map, &services);

        // Register 0x8C unset: read fails
        let faults = device.monitor_sensors(&ctx, 1);
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].rail_id.as_deref(), Some("vdd"));
        assert!(matches!(faults[0].kind, FaultKind::Error { .. }));
        assert!(device.monitor_sensors(&ctx, 1).is_empty());
        assert_eq!(services.sensors.finished_rails(), vec![("vdd".to_string(), true), ("vdd".to_string(), true)]);

        device.clear_error_history();
        assert_eq!(device.monitor_sensors(&ctx, 1).len(), 1);

        services.i2c.set_word(IFACE, 0x8C, 0x0040);
        assert!(device.monitor_sensors(&ctx, 1).is_empty());
        assert_eq!(services.sensors.readings().last().unwrap().value, 64.0);
        assert_eq!(services.sensors.finished_rails().last().unwrap(), &("vdd".to_string(), false));
    }
}
