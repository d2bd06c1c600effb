//! Simulated hardware for `regsctl simulate`
//!
//! The hardware file describes register contents, VPD keywords and FRU
//! presence:
//!
//! ```json
//! {
//!   "registers": [ { "bus": 1, "address": "0x70", "register": "0x20", "data": ["0x18"] } ],
//!   "vpd": [ { "fru": "/system/chassis/motherboard/regulator2", "keyword": "CCIN", "value": "2D35" } ],
//!   "presence": [ { "fru": "/system/chassis/motherboard/regulator2", "present": true } ]
//! }
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use voltage_regulators::config_file_parser::parse_hex_byte;
use voltage_regulators::i2c::I2cTransport;
use voltage_regulators::services::{CachedVpd, TracingJournal};
use voltage_regulators::test_utils::{MemoryI2c, MockPresence, MockSensors, MockVpd};
use voltage_regulators::{I2cInterface, Journal, PresenceService, Sensors, Services, Vpd};

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HardwareFile {
    pub registers: Vec<RegisterEntry>,
    pub vpd: Vec<VpdEntry>,
    pub presence: Vec<PresenceEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterEntry {
    pub bus: u8,
    pub address: String,
    pub register: String,
    pub data: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VpdEntry {
    pub fru: String,
    pub keyword: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PresenceEntry {
    pub fru: String,
    pub present: bool,
}

impl HardwareFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read hardware file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Invalid hardware file {}", path.display()))
    }
}

fn hex_byte(text: &str) -> Result<u8> {
    parse_hex_byte(&Value::String(text.to_string()))
        .with_context(|| format!("Invalid byte {:?}", text))
}

/// Services backed by in-memory hardware; journal entries go to the log
pub struct SimServices {
    pub journal: TracingJournal,
    pub vpd: CachedVpd<MockVpd>,
    pub presence: MockPresence,
    pub sensors: MockSensors,
    pub i2c: MemoryI2c,
}

impl SimServices {
    pub fn new(hardware: &HardwareFile) -> Result<Self> {
        let services = Self {
            journal: TracingJournal,
            vpd: CachedVpd::new(MockVpd::new()),
            presence: MockPresence::default(),
            sensors: MockSensors::default(),
            i2c: MemoryI2c::new(),
        };

        for entry in &hardware.registers {
            let interface = I2cInterface::new(entry.bus, hex_byte(&entry.address)?);
            let register = hex_byte(&entry.register)?;
            let data = entry
                .data
                .iter()
                .map(|byte| hex_byte(byte))
                .collect::<Result<Vec<u8>>>()?;
            debug!("{} register 0x{:02X} = {:02X?}", interface, register, data);
            services.i2c.set_register(interface, register, &data);
        }
        for entry in &hardware.vpd {
            services.vpd.inner().set(&entry.fru, &entry.keyword, &entry.value);
        }
        for entry in &hardware.presence {
            services.presence.set(&entry.fru, entry.present);
        }
        Ok(services)
    }
}

impl Services for SimServices {
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

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_hardware_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "registers": [ {{ "bus": 1, "address": "0x70", "register": "0x8B", "data": ["0x00", "0x01"] }} ],
                "vpd": [ {{ "fru": "/reg2", "keyword": "CCIN", "value": "2D35" }} ],
                "presence": [ {{ "fru": "/reg2", "present": false }} ]
            }}"#
        )
        .unwrap();

        let hardware = HardwareFile::load(file.path()).unwrap();
        let services = SimServices::new(&hardware).unwrap();
        let interface = I2cInterface::new(1, 0x70);
        assert_eq!(services.i2c.read_word(&interface, 0x8B).unwrap(), 0x0100);
        assert_eq!(services.vpd.get_value("/reg2", "CCIN").unwrap(), "2D35");
        assert!(!services.presence.is_present("/reg2").unwrap());
    }

    #[test]
    fn test_invalid_register_byte() {
        let hardware: HardwareFile = serde_json::from_str(
            r#"{ "registers": [ { "bus": 1, "address": "0x7", "register": "0x20", "data": [] } ] }"#,
        )
        .unwrap();
        let err = SimServices::new(&hardware).err().unwrap();
        assert_eq!(err.to_string(), "Invalid byte \"0x7\"");
    }

    #[test]
    fn test_empty_hardware_file() {
        let hardware: HardwareFile = serde_json::from_str("{}").unwrap();
        assert!(hardware.registers.is_empty());
        assert!(serde_json::from_str::<HardwareFile>(r#"{ "fans": [] }"#).is_err());
    }
}
