//! In-memory collaborators for tests and dry runs
//!
//! [`MockServices`] bundles a register-backed I2C bus and recording doubles for
//! the journal, VPD, presence and sensors, so rule chains can run without
//! hardware.

use std::collections::{HashMap, HashSet};

use anyhow::anyhow;
use parking_lot::Mutex;

use crate::device::Device;
use crate::i2c::{I2cError, I2cInterface, I2cTransport};
use crate::services::{Journal, PresenceService, SensorType, Sensors, Services, Vpd};

type RegisterKey = (I2cInterface, u8);

/// Build a regulator device with no optional parts
pub fn device(id: &str, bus: u8, address: u8) -> Device {
    Device::new(
        id,
        true,
        format!("/xyz/openbmc_project/inventory/system/chassis/motherboard/{}", id),
        I2cInterface::new(bus, address),
    )
}

// ============================================================================
// I2C
// ============================================================================

/// Write recorded by [`MemoryI2c`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct I2cWrite {
    pub interface: I2cInterface,
    pub register: u8,
    pub data: Vec<u8>,
}

/// Register file keyed by interface and register
///
/// Each register holds a byte string. Byte access uses the first byte, word
/// access the first two (little-endian), block access the first `count`.
#[derive(Debug, Default)]
pub struct MemoryI2c {
    registers: Mutex<HashMap<RegisterKey, Vec<u8>>>,
    failing: Mutex<HashSet<RegisterKey>>,
    frozen: Mutex<HashSet<RegisterKey>>,
    writes: Mutex<Vec<I2cWrite>>,
}

impl MemoryI2c {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_register(&self, interface: I2cInterface, register: u8, data: &[u8]) {
        self.registers.lock().insert((interface, register), data.to_vec());
    }

    pub fn set_byte(&self, interface: I2cInterface, register: u8, value: u8) {
        self.set_register(interface, register, &[value]);
    }

    pub fn set_word(&self, interface: I2cInterface, register: u8, value: u16) {
        self.set_register(interface, register, &value.to_le_bytes());
    }

    pub fn register(&self, interface: I2cInterface, register: u8) -> Option<Vec<u8>> {
        self.registers.lock().get(&(interface, register)).cloned()
    }

    /// Make every access to `register` fail
    pub fn fail_register(&self, interface: I2cInterface, register: u8) {
        self.failing.lock().insert((interface, register));
    }

    /// Accept writes to `register` without changing its contents
    pub fn freeze_register(&self, interface: I2cInterface, register: u8) {
        self.frozen.lock().insert((interface, register));
    }

    pub fn writes(&self) -> Vec<I2cWrite> {
        self.writes.lock().clone()
    }

    fn read(&self, interface: &I2cInterface, register: u8, count: usize) -> Result<Vec<u8>, I2cError> {
        let key = (*interface, register);
        if self.failing.lock().contains(&key) {
            return Err(I2cError::read(interface, register, "Input/output error"));
        }
        match self.registers.lock().get(&key) {
            Some(data) if data.len() >= count => Ok(data[..count].to_vec()),
            _ => Err(I2cError::read(interface, register, "No such device or address")),
        }
    }

    fn write(&self, interface: &I2cInterface, register: u8, data: Vec<u8>) -> Result<(), I2cError> {
        let key = (*interface, register);
        if self.failing.lock().contains(&key) {
            return Err(I2cError::write(interface, register, "Input/output error"));
        }
        self.writes.lock().push(I2cWrite {
            interface: *interface,
            register,
            data: data.clone(),
        });
        if !self.frozen.lock().contains(&key) {
            self.registers.lock().insert(key, data);
        }
        Ok(())
    }
}

impl I2cTransport for MemoryI2c {
    fn read_byte(&self, interface: &I2cInterface, register: u8) -> Result<u8, I2cError> {
        Ok(self.read(interface, register, 1)?[0])
    }

    fn read_word(&self, interface: &I2cInterface, register: u8) -> Result<u16, I2cError> {
        let data = self.read(interface, register, 2)?;
        Ok(u16::from_le_bytes([data[0], data[1]]))
    }

    fn read_bytes(
        &self,
        interface: &I2cInterface,
        register: u8,
        count: u8,
    ) -> Result<Vec<u8>, I2cError> {
        self.read(interface, register, usize::from(count))
    }

    fn write_byte(
        &self,
        interface: &I2cInterface,
        register: u8,
        value: u8,
    ) -> Result<(), I2cError> {
        self.write(interface, register, vec![value])
    }

    fn write_word(
        &self,
        interface: &I2cInterface,
        register: u8,
        value: u16,
    ) -> Result<(), I2cError> {
        self.write(interface, register, value.to_le_bytes().to_vec())
    }

    fn write_bytes(
        &self,
        interface: &I2cInterface,
        register: u8,
        values: &[u8],
    ) -> Result<(), I2cError> {
        self.write(interface, register, values.to_vec())
    }
}

// ============================================================================
// Journal, VPD, presence, sensors
// ============================================================================

#[derive(Debug, Default)]
pub struct MockJournal {
    errors: Mutex<Vec<String>>,
    infos: Mutex<Vec<String>>,
    debugs: Mutex<Vec<String>>,
}

impl MockJournal {
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().clone()
    }

    pub fn infos(&self) -> Vec<String> {
        self.infos.lock().clone()
    }

    pub fn debugs(&self) -> Vec<String> {
        self.debugs.lock().clone()
    }
}

impl Journal for MockJournal {
    fn log_error(&self, messages: &[String]) {
        self.errors.lock().extend(messages.iter().cloned());
    }

    fn log_info(&self, message: &str) {
        self.infos.lock().push(message.to_string());
    }

    fn log_debug(&self, message: &str) {
        self.debugs.lock().push(message.to_string());
    }
}

/// VPD values keyed by inventory path and keyword
#[derive(Debug, Default)]
pub struct MockVpd {
    values: Mutex<HashMap<(String, String), String>>,
    lookups: Mutex<usize>,
}

impl MockVpd {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, inventory_path: &str, keyword: &str, value: &str) {
        self.values
            .lock()
            .insert((inventory_path.to_string(), keyword.to_string()), value.to_string());
    }

    /// Number of `get_value` calls so far
    pub fn lookup_count(&self) -> usize {
        *self.lookups.lock()
    }
}

impl Vpd for MockVpd {
    fn get_value(&self, inventory_path: &str, keyword: &str) -> anyhow::Result<String> {
        *self.lookups.lock() += 1;
        self.values
            .lock()
            .get(&(inventory_path.to_string(), keyword.to_string()))
            .cloned()
            .ok_or_else(|| anyhow!("D-Bus error: Invalid object path"))
    }
}

#[derive(Debug, Default)]
pub struct MockPresence {
    present: Mutex<HashMap<String, bool>>,
    lookups: Mutex<usize>,
}

impl MockPresence {
    pub fn set(&self, inventory_path: &str, present: bool) {
        self.present.lock().insert(inventory_path.to_string(), present);
    }

    pub fn lookup_count(&self) -> usize {
        *self.lookups.lock()
    }
}

impl PresenceService for MockPresence {
    fn is_present(&self, inventory_path: &str) -> anyhow::Result<bool> {
        *self.lookups.lock() += 1;
        self.present
            .lock()
            .get(inventory_path)
            .copied()
            .ok_or_else(|| anyhow!("Unable to determine presence of {}", inventory_path))
    }
}

/// Sensor value published by [`MockSensors`]
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    pub rail_id: String,
    pub sensor_type: SensorType,
    pub value: f64,
}

#[derive(Debug, Default)]
pub struct MockSensors {
    current_rail: Mutex<Option<String>>,
    readings: Mutex<Vec<SensorReading>>,
    finished: Mutex<Vec<(String, bool)>>,
}

impl MockSensors {
    pub fn readings(&self) -> Vec<SensorReading> {
        self.readings.lock().clone()
    }

    /// Rails finished so far with their error flag
    pub fn finished_rails(&self) -> Vec<(String, bool)> {
        self.finished.lock().clone()
    }
}

impl Sensors for MockSensors {
    fn start_rail(&self, rail_id: &str, _device_inventory_path: &str) {
        *self.current_rail.lock() = Some(rail_id.to_string());
    }

    fn set_value(&self, sensor_type: SensorType, value: f64) -> anyhow::Result<()> {
        let rail_id = self
            .current_rail
            .lock()
            .clone()
            .ok_or_else(|| anyhow!("No rail started"))?;
        self.readings.lock().push(SensorReading {
            rail_id,
            sensor_type,
            value,
        });
        Ok(())
    }

    fn end_rail(&self, error_occurred: bool) {
        if let Some(rail_id) = self.current_rail.lock().take() {
            self.finished.lock().push((rail_id, error_occurred));
        }
    }
}

/// [`Services`] backed entirely by in-memory doubles
#[derive(Debug, Default)]
pub struct MockServices {
    pub journal: MockJournal,
    pub vpd: MockVpd,
    pub presence: MockPresence,
    pub sensors: MockSensors,
    pub i2c: MemoryI2c,
}

impl MockServices {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Services for MockServices {
    fn journal(&self) -> &dyn Journal {
        &self.journal
    }

    fn vpd(&self) -> &dyn Vpd {
        &self.vpd
    }

    fn presence_service(&self) -> &dyn PresenceService {
        &self.presence
    }

    fn sensors(&self) -> &dyn Sensors {
        &self.sensors
    }

    fn i2c(&self) -> &dyn I2cTransport {
        &self.i2c
    }
}
