//! Shared helpers for integration tests

#![allow(dead_code)]

use std::io::Write;

use serde_json::Value;
use tempfile::NamedTempFile;
use voltage_regulators::I2cInterface;

/// Interface of the regulator in [`server_config`]
pub const VDD_REGULATOR: I2cInterface = I2cInterface { bus: 1, address: 0x70 };

pub fn write_config(config: &Value) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(config.to_string().as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// One chassis with one regulator and one rail
pub fn server_config() -> Value {
    serde_json::json!({
        "comments": [ "Config file for a test server" ],
        "rules": [
            {
                "id": "set_voltage_rule",
                "actions": [
                    { "pmbus_write_vout_command": { "format": "linear", "is_verified": true } }
                ]
            },
            {
                "id": "read_sensors_rule",
                "actions": [
                    { "pmbus_read_sensor": { "type": "vout", "command": "0x8B", "format": "linear_16", "exponent": -8 } },
                    { "pmbus_read_sensor": { "type": "iout", "command": "0x8C", "format": "linear_11" } }
                ]
            },
            {
                "id": "detect_phase_faults_rule",
                "actions": [
                    {
                        "if": {
                            "condition": { "i2c_compare_bit": { "register": "0x02", "position": 3, "value": 1 } },
                            "then": [
                                { "i2c_capture_bytes": { "register": "0x02", "count": 1 } },
                                { "log_phase_fault": { "type": "n+1" } }
                            ]
                        }
                    }
                ]
            }
        ],
        "chassis": [
            {
                "number": 1,
                "devices": [
                    {
                        "id": "vdd_regulator",
                        "is_regulator": true,
                        "fru": "/system/chassis/motherboard/regulator2",
                        "i2c_interface": { "bus": 1, "address": "0x70" },
                        "configuration": {
                            "actions": [
                                { "i2c_write_byte": { "register": "0x7C", "value": "0x01" } }
                            ]
                        },
                        "phase_fault_detection": { "rule_id": "detect_phase_faults_rule" },
                        "rails": [
                            {
                                "id": "vdd",
                                "configuration": { "volts": 1.03, "rule_id": "set_voltage_rule" },
                                "sensor_monitoring": { "rule_id": "read_sensors_rule" }
                            }
                        ]
                    }
                ]
            }
        ]
    })
}
